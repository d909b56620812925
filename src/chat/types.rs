//! Session, message, and collection types persisted to the history file.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder title given to a freshly created session.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Maximum number of characters kept when deriving a title from user input.
pub const TITLE_MAX_CHARS: usize = 30;

/// Role of a stored or outbound message.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// User input (typed text or an uploaded image).
    #[default]
    User,
    /// Model reply.
    Assistant,
}

impl Role {
    /// Stable string form used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-derived session identifier, `<unix seconds>.<microseconds>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Build an identifier from `now` that is not already used in `existing`.
    #[must_use]
    pub fn generate(now: DateTime<Local>, existing: &SessionCollection) -> Self {
        let mut micros = now.timestamp_micros();
        let mut candidate = Self::from_micros(micros);
        while existing.contains(&candidate) {
            micros += 1;
            candidate = Self::from_micros(micros);
        }
        candidate
    }

    fn from_micros(micros: i64) -> Self {
        Self(format!(
            "{}.{:06}",
            micros.div_euclid(1_000_000),
            micros.rem_euclid(1_000_000)
        ))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single stored message. Never mutated after it is appended.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    #[serde(default)]
    pub role: Role,
    /// Text content, absent for some legacy image entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Base64-encoded image bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    /// Text extracted from the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
}

impl Message {
    /// Plain user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Plain assistant reply.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// User entry carrying an uploaded image and, when available, its OCR text.
    #[must_use]
    pub fn image(
        content: impl Into<String>,
        image_data: impl Into<String>,
        ocr_text: Option<String>,
    ) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            image_data: Some(image_data.into()),
            ocr_text: ocr_text.filter(|text| !text.is_empty()),
        }
    }

    /// Non-empty text content.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }

    /// Non-empty OCR text.
    #[must_use]
    pub fn ocr(&self) -> Option<&str> {
        self.ocr_text.as_deref().filter(|t| !t.is_empty())
    }
}

/// One conversation thread.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Identifier; restored from the collection key on load.
    #[serde(skip)]
    pub id: SessionId,
    /// Display title.
    pub title: String,
    /// Local wall-clock creation time, `None` when the stored value is unusable.
    #[serde(
        default,
        with = "created_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<NaiveDateTime>,
    #[serde(default)]
    messages: Vec<Message>,
}

impl Session {
    /// Create an empty session with the placeholder title.
    #[must_use]
    pub fn new(id: SessionId, created: NaiveDateTime) -> Self {
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            created: Some(truncate_to_micros(created)),
            messages: Vec::new(),
        }
    }

    /// Messages in append order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Append a message to the end of the history.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace the placeholder title with one derived from `input`.
    ///
    /// Returns `true` when the title changed.
    pub fn apply_title_from(&mut self, input: &str) -> bool {
        if self.title != DEFAULT_TITLE {
            return false;
        }
        self.title = title_from_input(input);
        true
    }
}

/// Derive a session title: the first 30 characters, with `...` when cut.
#[must_use]
pub fn title_from_input(input: &str) -> String {
    if input.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = input.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str("...");
        title
    } else {
        input.to_string()
    }
}

/// All sessions, keyed by id. The single persisted root object.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SessionCollection {
    sessions: BTreeMap<SessionId, Session>,
}

impl SessionCollection {
    /// Empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Whether a session with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Look up a session.
    #[must_use]
    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Look up a session for mutation.
    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// Insert a session under its own id, replacing any previous entry.
    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    /// Remove a session.
    pub fn remove(&mut self, id: &SessionId) -> Option<Session> {
        self.sessions.remove(id)
    }

    /// Iterate over sessions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }
}

impl<'de> Deserialize<'de> for SessionCollection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut sessions = BTreeMap::<SessionId, Session>::deserialize(deserializer)?;
        for (id, session) in &mut sessions {
            session.id = id.clone();
        }
        Ok(Self { sessions })
    }
}

/// Drop sub-microsecond precision so the stored text form round-trips.
fn truncate_to_micros(value: NaiveDateTime) -> NaiveDateTime {
    let nanos = value.nanosecond();
    value.with_nanosecond(nanos - nanos % 1_000).unwrap_or(value)
}

/// Parse a stored creation time.
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.ffffff]`, the ISO-8601 `T` form, RFC 3339,
/// and a bare leading date.
#[must_use]
pub fn parse_created(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|d| d.naive_local())
        })
        .or_else(|| {
            let date = NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()?;
            date.and_hms_opt(0, 0, 0)
        })
}

mod created_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(created) => serializer.serialize_str(&created.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    // Unusable values degrade to `None` instead of failing the whole file.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(super::parse_created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> NaiveDateTime {
        parse_created(raw).unwrap()
    }

    #[test]
    fn test_title_short_input_kept_verbatim() {
        assert_eq!(title_from_input("hello"), "hello");
        let exactly = "a".repeat(30);
        assert_eq!(title_from_input(&exactly), exactly);
    }

    #[test]
    fn test_title_long_input_truncated_with_ellipsis() {
        let long = "b".repeat(31);
        assert_eq!(title_from_input(&long), format!("{}...", "b".repeat(30)));
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        let input = "é".repeat(31);
        let title = title_from_input(&input);
        assert_eq!(title.chars().count(), 33);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_title_applied_only_once() {
        let mut session = Session::new(SessionId::from("1"), at("2024-05-01 10:00:00"));
        assert!(session.apply_title_from("first question"));
        assert!(!session.apply_title_from("second question"));
        assert_eq!(session.title, "first question");
    }

    #[test]
    fn test_session_id_unique_in_collection() {
        let now = Local::now();
        let mut sessions = SessionCollection::new();
        let first = SessionId::generate(now, &sessions);
        sessions.insert(Session::new(first.clone(), now.naive_local()));
        let second = SessionId::generate(now, &sessions);
        assert_ne!(first, second);
        assert!(second.as_str().contains('.'));
    }

    #[test]
    fn test_parse_created_formats() {
        assert!(parse_created("2024-05-01 10:11:12.345678").is_some());
        assert!(parse_created("2024-05-01 10:11:12").is_some());
        assert!(parse_created("2024-05-01T10:11:12").is_some());
        assert!(parse_created("2024-05-01T10:11:12+02:00").is_some());
        assert_eq!(
            parse_created("2024-05-01 garbage").map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert!(parse_created("yesterday-ish").is_none());
    }

    #[test]
    fn test_legacy_file_shape_loads() {
        let raw = r#"{
            "1714550000.123456": {
                "title": "Invoices",
                "created": "2024-05-01 10:11:12.345678",
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "user", "content": "💾 Image saved", "image_data": "aGk=", "ocr_text": null},
                    {"content": "no role"}
                ]
            },
            "1714550001.000000": {"title": "Broken date", "created": 12, "messages": []}
        }"#;

        let sessions: SessionCollection = serde_json::from_str(raw).unwrap();
        assert_eq!(sessions.len(), 2);

        let first = sessions.get(&SessionId::from("1714550000.123456")).unwrap();
        assert_eq!(first.id.as_str(), "1714550000.123456");
        assert_eq!(first.messages().len(), 3);
        assert_eq!(first.messages()[1].ocr_text, None);
        assert_eq!(first.messages()[2].role, Role::User);

        let second = sessions.get(&SessionId::from("1714550001.000000")).unwrap();
        assert_eq!(second.created, None);
    }

    #[test]
    fn test_image_message_drops_empty_ocr() {
        let message = Message::image("💾 Image saved", "aGk=", Some(String::new()));
        assert_eq!(message.ocr_text, None);
        assert_eq!(message.ocr(), None);
    }
}
