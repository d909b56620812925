//! Image-aware chat service: OCR-derived context, swappable LLM backends, and
//! file-persisted chat sessions behind a small HTTP API.

// Nothing slips through: warnings are errors
#![deny(warnings)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(dead_code)]
#![deny(non_camel_case_types)]
#![deny(unused_imports)]
#![deny(unused_variables)]
#![deny(unused_must_use)]
#![deny(non_snake_case)]
#![deny(non_upper_case_globals)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::missing_const_for_fn)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::module_inception)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::shadow_unrelated)]
#![deny(clippy::too_many_arguments)]
#![deny(clippy::cognitive_complexity)]
// Robustness
#![deny(overflowing_literals)]
// Tests assert with unwrap and build fixtures inline
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::too_many_lines,
        clippy::similar_names,
        clippy::items_after_statements,
        clippy::missing_const_for_fn,
        clippy::significant_drop_tightening
    )
)]

/// Sessions, context assembly, persistence, and the interaction handlers.
#[allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::doc_markdown,
    clippy::option_if_let_else,
    clippy::too_many_lines,
    clippy::needless_pass_by_value,
    clippy::missing_const_for_fn
)]
pub mod chat;
/// Runtime configuration resolved from the environment.
#[allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::missing_const_for_fn
)]
pub mod config;
/// LLM backends (cloud single-call and local streaming).
#[allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::option_if_let_else,
    clippy::missing_const_for_fn
)]
pub mod llm;
/// OCR collaborator.
#[allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::missing_const_for_fn
)]
pub mod ocr;
/// HTTP server and API routes.
#[allow(
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::unused_async,
    clippy::significant_drop_tightening,
    clippy::needless_pass_by_value,
    clippy::future_not_send
)]
pub mod server;
/// Entry helpers to start the chat server.
pub mod start;
