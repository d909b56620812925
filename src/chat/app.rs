//! Explicit application state and the interaction handlers.
//!
//! Every mutation is followed by a save. A failed save becomes an error
//! notice; the in-memory state keeps the change. Each interaction runs to
//! completion before the next one starts, model and OCR calls included.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::llm::{BackendKind, LlmBackend, reply_or_error};
use crate::ocr::{ImageFormat, OCR_LANGUAGES, TextExtractor, encode_image};

use super::context::{self, SAVE_MARKER, UPLOAD_MARKER};
use super::error::{ChatError, ChatResult};
use super::grouping::{SessionGroup, group_sessions};
use super::store::SessionStore;
use super::types::{Message, Session, SessionCollection, SessionId};

/// Notice shown after a successful extraction.
pub const EXTRACT_SUCCESS: &str = "Text extracted successfully!";
/// Notice shown when the analyze action could not read the image.
pub const ANALYZE_FAILURE: &str = "Could not extract text from image";
/// Notice shown after a save.
pub const SAVE_SUCCESS: &str = "Image saved!";

/// Model and OCR language selections.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Settings {
    /// Backend serving completions; fixed for the process lifetime.
    pub backend: BackendKind,
    /// Selected model id.
    pub model: String,
    /// Selected OCR language code.
    pub ocr_language: String,
}

impl Settings {
    /// Default selections for `backend`.
    #[must_use]
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            model: backend.default_model().to_string(),
            ocr_language: OCR_LANGUAGES.first().copied().unwrap_or("eng").to_string(),
        }
    }

    /// Start from `language` instead of the first listed one.
    ///
    /// # Errors
    /// Returns an error if `language` is not an offered OCR language.
    pub fn with_language(mut self, language: &str) -> ChatResult<Self> {
        self.ocr_language = validated(language, OCR_LANGUAGES, "OCR language")?;
        Ok(self)
    }
}

fn validated(value: &str, allowed: &[&str], what: &str) -> ChatResult<String> {
    if allowed.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(ChatError::InvalidSetting(format!(
            "unknown {what} '{value}', expected one of: {}",
            allowed.join(", ")
        )))
    }
}

/// Severity of an inline notice.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Action completed.
    Success,
    /// Something needs attention but nothing failed.
    Warning,
    /// The action or a save failed.
    Error,
}

/// Inline message reported next to the view.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text shown to the user.
    pub text: String,
}

impl Notice {
    /// Success notice.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    /// Warning notice.
    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    /// Error notice.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Result of an operation plus the notices it raised.
#[derive(Clone, Debug, Serialize)]
pub struct Outcome<T> {
    /// Updated view.
    pub data: T,
    /// Inline notices, in the order they were raised.
    pub notices: Vec<Notice>,
}

impl<T> Outcome<T> {
    const fn new(data: T, notices: Vec<Notice>) -> Self {
        Self { data, notices }
    }
}

/// What to do with an uploaded image.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAction {
    /// Run OCR and store the text.
    #[default]
    Extract,
    /// Run OCR, store it, and ask the model about it.
    Analyze,
    /// Store the image, with OCR text when recognition succeeds.
    Save,
}

/// Full session as shown in the conversation pane.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SessionView {
    /// Session id.
    pub id: SessionId,
    /// Title.
    pub title: String,
    /// Creation time, if known.
    pub created: Option<NaiveDateTime>,
    /// Stored messages in order.
    pub messages: Vec<Message>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
            created: session.created,
            messages: session.messages().to_vec(),
        }
    }
}

/// Everything the sidebar and settings panel render.
#[derive(Clone, Debug, Serialize)]
pub struct StateView {
    /// Selected session.
    pub active: Option<SessionId>,
    /// Current selections.
    pub settings: Settings,
    /// Models the backend offers.
    pub models: &'static [&'static str],
    /// OCR languages on offer.
    pub ocr_languages: &'static [&'static str],
    /// Backend configuration problem, if any.
    pub warning: Option<String>,
    /// Sessions grouped by creation date.
    pub groups: Vec<SessionGroup>,
}

/// The session collection, its store, the settings, and the selection.
#[derive(Debug)]
pub struct ChatApp {
    sessions: SessionCollection,
    store: SessionStore,
    settings: Settings,
    active: Option<SessionId>,
}

impl ChatApp {
    /// Load the collection from `store`. Nothing is selected.
    #[must_use]
    pub fn new(store: SessionStore, settings: Settings) -> Self {
        let sessions = store.load();
        info!(
            path = %store.path().display(),
            sessions = sessions.len(),
            "chat history loaded"
        );
        Self {
            sessions,
            store,
            settings,
            active: None,
        }
    }

    /// All sessions.
    #[must_use]
    pub fn sessions(&self) -> &SessionCollection {
        &self.sessions
    }

    /// Current selections.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Selected session id.
    #[must_use]
    pub fn active(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    /// Look up one session.
    ///
    /// # Errors
    /// Returns `SessionNotFound` for an unknown id.
    pub fn session(&self, id: &SessionId) -> ChatResult<&Session> {
        self.sessions
            .get(id)
            .ok_or_else(|| ChatError::SessionNotFound(id.clone()))
    }

    /// Create a `New Chat` session and select it.
    pub fn new_chat(&mut self, now: DateTime<Local>) -> Outcome<SessionView> {
        let id = SessionId::generate(now, &self.sessions);
        let session = Session::new(id.clone(), now.naive_local());
        let view = SessionView::from(&session);

        self.sessions.insert(session);
        self.active = Some(id.clone());
        info!(session = %id, "new chat");

        let mut notices = Vec::new();
        self.persist(&mut notices);
        Outcome::new(view, notices)
    }

    /// Select a session.
    ///
    /// # Errors
    /// Returns `SessionNotFound` for an unknown id.
    pub fn select_chat(&mut self, id: &SessionId) -> ChatResult<SessionView> {
        let view = SessionView::from(self.session(id)?);
        self.active = Some(id.clone());
        Ok(view)
    }

    /// Delete a session, clearing the selection if it was selected.
    ///
    /// # Errors
    /// Returns `SessionNotFound` for an unknown id.
    pub fn delete_chat(&mut self, id: &SessionId) -> ChatResult<Outcome<()>> {
        self.sessions
            .remove(id)
            .ok_or_else(|| ChatError::SessionNotFound(id.clone()))?;
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        info!(session = %id, "chat deleted");

        let mut notices = Vec::new();
        self.persist(&mut notices);
        Ok(Outcome::new((), notices))
    }

    /// Change the model and/or OCR language.
    ///
    /// Both values are checked before either is applied.
    ///
    /// # Errors
    /// Returns `InvalidSetting` for a value outside the offered lists.
    pub fn update_settings(
        &mut self,
        model: Option<&str>,
        ocr_language: Option<&str>,
    ) -> ChatResult<Settings> {
        let model = model
            .map(|m| validated(m, self.settings.backend.models(), "model"))
            .transpose()?;
        let ocr_language = ocr_language
            .map(|l| validated(l, OCR_LANGUAGES, "OCR language"))
            .transpose()?;

        if let Some(model) = model {
            self.settings.model = model;
        }
        if let Some(language) = ocr_language {
            self.settings.ocr_language = language;
        }
        debug!(model = %self.settings.model, language = %self.settings.ocr_language, "settings updated");
        Ok(self.settings.clone())
    }

    /// Sessions grouped into Today, Yesterday and Older.
    #[must_use]
    pub fn sidebar(&self, today: NaiveDate) -> Vec<SessionGroup> {
        group_sessions(&self.sessions, today)
    }

    /// Sidebar, settings, and selection in one view.
    #[must_use]
    pub fn state_view(&self, today: NaiveDate, warning: Option<String>) -> StateView {
        StateView {
            active: self.active.clone(),
            settings: self.settings.clone(),
            models: self.settings.backend.models(),
            ocr_languages: OCR_LANGUAGES,
            warning,
            groups: self.sidebar(today),
        }
    }

    /// Handle a typed message: store it, ask the model, store the reply.
    ///
    /// # Errors
    /// Returns `EmptyInput` for blank input and `SessionNotFound` for an
    /// unknown id. Model failures become the reply text instead.
    pub fn send_message(
        &mut self,
        id: &SessionId,
        input: &str,
        backend: &dyn LlmBackend,
    ) -> ChatResult<Outcome<SessionView>> {
        if input.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }
        let session = self.session_mut(id)?;

        let request = context::assemble(session.messages(), input);
        session.push(Message::user(input));
        if session.apply_title_from(input) {
            debug!(session = %id, title = %session.title, "session titled");
        }
        self.active = Some(id.clone());

        let mut notices = Vec::new();
        self.persist(&mut notices);

        let reply = reply_or_error(backend, &request, &self.settings.model);
        self.session_mut(id)?.push(Message::assistant(reply));
        self.persist(&mut notices);

        Ok(Outcome::new(SessionView::from(self.session(id)?), notices))
    }

    /// Handle an uploaded image according to `action`.
    ///
    /// Extract stores the OCR text; analyze also asks the model about it;
    /// save stores the image with whatever text could be read.
    ///
    /// # Errors
    /// Returns `InvalidImage` for bytes that are not an image and
    /// `SessionNotFound` for an unknown id. OCR failures become notices.
    pub fn upload_image(
        &mut self,
        id: &SessionId,
        image: &[u8],
        action: ImageAction,
        ocr: &dyn TextExtractor,
        backend: &dyn LlmBackend,
    ) -> ChatResult<Outcome<SessionView>> {
        validate_image(image)?;
        self.session(id)?;

        let extracted = ocr.extract_text(image, &self.settings.ocr_language);
        let mut notices = Vec::new();

        let (content, text) = match (action, extracted) {
            (ImageAction::Extract, Ok(text)) => {
                notices.push(Notice::success(EXTRACT_SUCCESS));
                (format!("{UPLOAD_MARKER} Image uploaded"), Some(text))
            }
            (ImageAction::Analyze, Ok(text)) => {
                (format!("{UPLOAD_MARKER} Please analyze this image"), Some(text))
            }
            (ImageAction::Extract | ImageAction::Analyze, Err(err)) => {
                warn!(session = %id, error = %err, "text extraction failed");
                let shown = if action == ImageAction::Extract {
                    err.to_string()
                } else {
                    ANALYZE_FAILURE.to_string()
                };
                notices.push(Notice::error(shown));
                return Ok(Outcome::new(SessionView::from(self.session(id)?), notices));
            }
            (ImageAction::Save, recognized) => {
                notices.push(Notice::success(SAVE_SUCCESS));
                if let Err(err) = &recognized {
                    debug!(session = %id, error = %err, "saving image without text");
                    notices.push(Notice::warning(format!("Image saved without text: {err}")));
                }
                (format!("{SAVE_MARKER} Image saved"), recognized.ok())
            }
        };

        let request = match (action, &text) {
            (ImageAction::Analyze, Some(ocr_text)) => Some(context::analyze_request(ocr_text)),
            _ => None,
        };

        self.session_mut(id)?
            .push(Message::image(content, encode_image(image), text));
        self.active = Some(id.clone());
        info!(session = %id, ?action, "image stored");
        self.persist(&mut notices);

        if let Some(request) = request {
            let reply = reply_or_error(backend, &request, &self.settings.model);
            self.session_mut(id)?.push(Message::assistant(reply));
            self.persist(&mut notices);
        }

        Ok(Outcome::new(SessionView::from(self.session(id)?), notices))
    }

    fn session_mut(&mut self, id: &SessionId) -> ChatResult<&mut Session> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| ChatError::SessionNotFound(id.clone()))
    }

    fn persist(&self, notices: &mut Vec<Notice>) {
        if let Err(err) = self.store.save(&self.sessions) {
            warn!(error = %err, "failed to save chats");
            notices.push(Notice::error(format!("Error saving chats: {err}")));
        }
    }
}

/// Reject uploads that are not a supported image container.
///
/// # Errors
/// Returns `InvalidImage` when the format is not recognized.
pub fn validate_image(image: &[u8]) -> ChatResult<ImageFormat> {
    ImageFormat::sniff(image).ok_or_else(|| {
        ChatError::InvalidImage("expected PNG, JPEG, BMP, TIFF, GIF or WebP data".to_string())
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::TimeZone;
    use tempfile::TempDir;

    use super::*;
    use crate::chat::grouping::DateGroup;
    use crate::chat::types::Role;
    use crate::llm::{ChatMessage, LlmError, LlmResult};
    use crate::ocr::{OcrError, OcrResult};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

    /// Records every request and answers with a fixed reply.
    struct Recorder {
        reply: LlmResult<String>,
        seen: Mutex<Vec<(Vec<ChatMessage>, String)>>,
    }

    impl Recorder {
        fn answering(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(LlmError::MissingApiKey),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(Vec<ChatMessage>, String)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl LlmBackend for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn complete(&self, messages: &[ChatMessage], model: &str) -> LlmResult<String> {
            self.seen
                .lock()
                .unwrap()
                .push((messages.to_vec(), model.to_string()));
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(_) => Err(LlmError::MissingApiKey),
            }
        }
    }

    struct FixedOcr(Option<&'static str>);

    impl TextExtractor for FixedOcr {
        fn extract_text(&self, _image: &[u8], _language: &str) -> OcrResult<String> {
            self.0.map(str::to_string).ok_or(OcrError::NoText)
        }
    }

    fn app(dir: &TempDir) -> ChatApp {
        ChatApp::new(
            SessionStore::new(dir.path().join("chats.json")),
            Settings::new(BackendKind::Cloud),
        )
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn reload(dir: &TempDir) -> SessionCollection {
        SessionStore::new(dir.path().join("chats.json")).load()
    }

    #[test]
    fn test_new_chat_selected_and_saved() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        assert!(app.active().is_none());

        let created = app.new_chat(now());
        assert!(created.notices.is_empty());
        assert_eq!(created.data.title, "New Chat");
        assert_eq!(app.active(), Some(&created.data.id));
        assert!(reload(&dir).contains(&created.data.id));
    }

    #[test]
    fn test_select_and_delete() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let first = app.new_chat(now()).data.id;
        let second = app.new_chat(now()).data.id;
        assert_ne!(first, second);

        app.select_chat(&first).unwrap();
        assert_eq!(app.active(), Some(&first));

        app.delete_chat(&second).unwrap();
        assert_eq!(app.active(), Some(&first));
        app.delete_chat(&first).unwrap();
        assert!(app.active().is_none());
        assert!(reload(&dir).is_empty());

        let missing = SessionId::from("nope");
        assert!(matches!(app.select_chat(&missing), Err(ChatError::SessionNotFound(_))));
        assert!(matches!(app.delete_chat(&missing), Err(ChatError::SessionNotFound(_))));
    }

    #[test]
    fn test_send_message_titles_and_replies() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let id = app.new_chat(now()).data.id;
        let backend = Recorder::answering("Hello!");

        let outcome = app
            .send_message(&id, "What is in my forty-character long question?", &backend)
            .unwrap();
        assert_eq!(outcome.data.title, "What is in my forty-character ...");
        assert_eq!(outcome.data.messages.len(), 2);
        assert_eq!(outcome.data.messages[1].role, Role::Assistant);
        assert_eq!(outcome.data.messages[1].text(), Some("Hello!"));

        app.send_message(&id, "second", &backend).unwrap();
        assert_eq!(app.session(&id).unwrap().title, "What is in my forty-character ...");

        let requests = backend.requests();
        assert_eq!(requests[0].1, "llama-3.1-8b-instant");
        let last = requests[1].0.last().unwrap();
        assert_eq!(last, &ChatMessage::user("second"));
        assert_eq!(requests[1].0.len(), 3);

        let stored = reload(&dir);
        assert_eq!(stored.get(&id).unwrap().messages().len(), 4);
    }

    #[test]
    fn test_send_message_rejects_blank_input() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let id = app.new_chat(now()).data.id;
        let backend = Recorder::answering("unused");

        assert!(matches!(
            app.send_message(&id, "  ", &backend),
            Err(ChatError::EmptyInput)
        ));
        assert!(backend.requests().is_empty());
        assert!(app.session(&id).unwrap().messages().is_empty());
    }

    #[test]
    fn test_backend_failure_becomes_reply() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let id = app.new_chat(now()).data.id;

        let outcome = app.send_message(&id, "hi", &Recorder::failing()).unwrap();
        let reply = outcome.data.messages[1].text().unwrap();
        assert!(reply.starts_with("⚠️ "));
        assert!(reply.contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_extract_then_ask_uses_image_context() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let id = app.new_chat(now()).data.id;
        let backend = Recorder::answering("It is 42.");

        let outcome = app
            .upload_image(&id, PNG, ImageAction::Extract, &FixedOcr(Some("INVOICE #42")), &backend)
            .unwrap();
        assert_eq!(outcome.notices, vec![Notice::success(EXTRACT_SUCCESS)]);
        let stored = &outcome.data.messages[0];
        assert_eq!(stored.text(), Some("📷 Image uploaded"));
        assert_eq!(stored.ocr(), Some("INVOICE #42"));
        assert_eq!(stored.image_data.as_deref(), Some(encode_image(PNG).as_str()));
        assert!(backend.requests().is_empty());

        app.send_message(&id, "what's the invoice number?", &backend)
            .unwrap();
        let request = &backend.requests()[0].0;
        assert_eq!(request.len(), 3);
        assert!(request[0].content.contains("IMAGE 1:\nINVOICE #42"));
        assert_eq!(request[2], ChatMessage::user("what's the invoice number?"));

        let persisted = reload(&dir);
        let messages = persisted.get(&id).unwrap().messages();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.text() != Some(context::IMAGE_ACK)));
    }

    #[test]
    fn test_extract_failure_stores_nothing() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let id = app.new_chat(now()).data.id;

        let outcome = app
            .upload_image(&id, PNG, ImageAction::Extract, &FixedOcr(None), &Recorder::answering("x"))
            .unwrap();
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(outcome.notices[0].level, NoticeLevel::Error);
        assert!(outcome.notices[0].text.starts_with("ERROR"));
        assert!(outcome.data.messages.is_empty());
    }

    #[test]
    fn test_analyze_asks_single_turn() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let id = app.new_chat(now()).data.id;
        app.send_message(&id, "earlier question", &Recorder::answering("earlier answer"))
            .unwrap();
        let backend = Recorder::answering("An invoice.");

        let outcome = app
            .upload_image(&id, PNG, ImageAction::Analyze, &FixedOcr(Some("INVOICE #42")), &backend)
            .unwrap();
        let messages = &outcome.data.messages;
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].text(), Some("📷 Please analyze this image"));
        assert_eq!(messages[3].text(), Some("An invoice."));

        let request = &backend.requests()[0].0;
        assert_eq!(request.len(), 1);
        assert!(request[0].content.ends_with("\n\nINVOICE #42"));
    }

    #[test]
    fn test_analyze_failure_skips_backend() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let id = app.new_chat(now()).data.id;
        let backend = Recorder::answering("unused");

        let outcome = app
            .upload_image(&id, PNG, ImageAction::Analyze, &FixedOcr(None), &backend)
            .unwrap();
        assert_eq!(outcome.notices, vec![Notice::error(ANALYZE_FAILURE)]);
        assert!(backend.requests().is_empty());
        assert!(outcome.data.messages.is_empty());
    }

    #[test]
    fn test_save_keeps_image_without_text() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let id = app.new_chat(now()).data.id;
        let backend = Recorder::answering("unused");

        let outcome = app
            .upload_image(&id, PNG, ImageAction::Save, &FixedOcr(None), &backend)
            .unwrap();
        assert_eq!(outcome.notices.len(), 2);
        assert_eq!(outcome.notices[0], Notice::success(SAVE_SUCCESS));
        assert_eq!(outcome.notices[1].level, NoticeLevel::Warning);
        assert!(outcome.notices[1].text.contains("ERROR"));
        assert_eq!(outcome.data.messages[0].text(), Some("💾 Image saved"));
        assert_eq!(outcome.data.messages[0].ocr_text, None);

        let outcome = app
            .upload_image(&id, PNG, ImageAction::Save, &FixedOcr(Some("RECEIPT")), &backend)
            .unwrap();
        assert_eq!(outcome.notices, vec![Notice::success(SAVE_SUCCESS)]);
        assert_eq!(outcome.data.messages[1].ocr(), Some("RECEIPT"));
        assert!(backend.requests().is_empty());
    }

    #[test]
    fn test_upload_rejects_non_image() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let id = app.new_chat(now()).data.id;

        let result = app.upload_image(
            &id,
            b"hello",
            ImageAction::Save,
            &FixedOcr(Some("x")),
            &Recorder::answering("x"),
        );
        assert!(matches!(result, Err(ChatError::InvalidImage(_))));
    }

    #[test]
    fn test_settings_validated() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        let settings = app
            .update_settings(Some("gemma2-9b-it"), Some("fra"))
            .unwrap();
        assert_eq!(settings.model, "gemma2-9b-it");
        assert_eq!(settings.ocr_language, "fra");

        assert!(matches!(
            app.update_settings(Some("llama3.1:8b"), None),
            Err(ChatError::InvalidSetting(_))
        ));
        assert!(matches!(
            app.update_settings(Some("mixtral-8x7b-32768"), Some("klingon")),
            Err(ChatError::InvalidSetting(_))
        ));
        assert_eq!(app.settings().model, "gemma2-9b-it");
    }

    #[test]
    fn test_save_failure_reported_state_kept() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("chats.json");
        std::fs::create_dir_all(target.join("occupied")).unwrap();

        let mut app = ChatApp::new(SessionStore::new(&target), Settings::new(BackendKind::Local));
        let outcome = app.new_chat(now());
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(outcome.notices[0].level, NoticeLevel::Error);
        assert!(outcome.notices[0].text.starts_with("Error saving chats"));
        assert_eq!(app.sessions().len(), 1);
    }

    #[test]
    fn test_state_view_groups() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.new_chat(now());

        let view = app.state_view(now().date_naive(), Some("warn".to_string()));
        assert_eq!(view.groups.len(), 1);
        assert_eq!(view.groups[0].label, DateGroup::Today);
        assert_eq!(view.models.len(), 4);
        assert_eq!(view.warning.as_deref(), Some("warn"));
        assert_eq!(view.settings.backend, BackendKind::Cloud);
    }
}
