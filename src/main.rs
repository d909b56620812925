//! Binary entrypoint that serves the vision chat UI and API.

use std::process::ExitCode;

use vision_chat::start;

/// Load configuration, open the chat history, and serve until interrupted.
fn main() -> ExitCode {
    start::run()
}
