//! Chat sessions: data model, persistence, request assembly, and the
//! application state driving them.

pub mod app;
pub mod context;
pub mod error;
pub mod grouping;
pub mod store;
pub mod types;

pub use app::{
    ChatApp, ImageAction, Notice, NoticeLevel, Outcome, SessionView, Settings, StateView,
    validate_image,
};
pub use error::{ChatError, ChatResult, StoreError};
pub use grouping::{DateGroup, SessionGroup, SessionSummary, group_sessions};
pub use store::SessionStore;
pub use types::{Message, Role, Session, SessionCollection, SessionId};
