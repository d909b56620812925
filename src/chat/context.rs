//! Builds the outbound message list for one user turn.
//!
//! The image context is rebuilt on every call from the OCR text stored in the
//! session; the synthetic pair it produces only ever lives in the request.

use crate::llm::ChatMessage;

use super::types::Message;

/// Number of prior messages considered for the conversational window.
pub const HISTORY_WINDOW: usize = 10;

/// Content prefix of the upload entries written by the image actions.
pub const UPLOAD_MARKER: &str = "📷";

/// Content prefix of the save entries written by the image actions.
pub const SAVE_MARKER: &str = "💾";

/// Separator placed between image texts in the synthetic context message.
pub const IMAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Synthetic assistant acknowledgment that follows the image context.
pub const IMAGE_ACK: &str = "I understand. I have processed the image content you provided.";

/// Single-turn prompt used by the analyze action.
pub const ANALYZE_PROMPT: &str =
    "Here is text extracted from an image. Please analyze it and tell me what it's about:";

/// Build the messages sent to the backend for `input`.
///
/// `history` is the session history preceding the new input.
#[must_use]
pub fn assemble(history: &[Message], input: &str) -> Vec<ChatMessage> {
    let mut outbound = Vec::with_capacity(HISTORY_WINDOW + 3);

    if let Some(context) = image_context(history) {
        outbound.push(ChatMessage::user(context));
        outbound.push(ChatMessage::assistant(IMAGE_ACK));
    }

    outbound.extend(recent_messages(history).map(|m| ChatMessage {
        role: m.role,
        content: m.text().unwrap_or_default().to_string(),
    }));

    outbound.push(ChatMessage::user(input));
    outbound
}

/// Single-turn request for the analyze action.
#[must_use]
pub fn analyze_request(ocr_text: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!("{ANALYZE_PROMPT}\n\n{ocr_text}"))]
}

/// Synthetic user message enumerating every OCR text in append order.
fn image_context(history: &[Message]) -> Option<String> {
    let texts: Vec<&str> = history.iter().filter_map(Message::ocr).collect();
    if texts.is_empty() {
        return None;
    }

    let body = texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("IMAGE {}:\n{text}", i + 1))
        .collect::<Vec<_>>()
        .join(IMAGE_SEPARATOR);

    Some(format!(
        "I have uploaded {} image(s) with the following content:\n\n{body}",
        texts.len()
    ))
}

/// The last `HISTORY_WINDOW` messages, minus empty and marker entries.
fn recent_messages(history: &[Message]) -> impl Iterator<Item = &Message> {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    history[start..].iter().filter(|m| is_conversational(m))
}

fn is_conversational(message: &Message) -> bool {
    message
        .text()
        .is_some_and(|c| !c.starts_with(UPLOAD_MARKER) && !c.starts_with(SAVE_MARKER))
}
