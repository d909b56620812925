//! Sidebar grouping of sessions by creation date.

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::types::{Session, SessionCollection, SessionId, TITLE_MAX_CHARS};

/// Date bucket shown in the sidebar.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum DateGroup {
    /// Created on the current date.
    Today,
    /// Created the day before.
    Yesterday,
    /// Anything else, including sessions with an unknown creation time.
    Older,
}

impl DateGroup {
    /// Classify a creation time relative to `today`.
    #[must_use]
    pub fn classify(created: Option<NaiveDateTime>, today: NaiveDate) -> Self {
        let Some(date) = created.map(|c| c.date()) else {
            return Self::Older;
        };
        if date == today {
            Self::Today
        } else if Some(date) == today.checked_sub_days(Days::new(1)) {
            Self::Yesterday
        } else {
            Self::Older
        }
    }
}

/// Sidebar entry for one session.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Session id.
    pub id: SessionId,
    /// Title shortened for display.
    pub title: String,
    /// Creation time, if known.
    pub created: Option<NaiveDateTime>,
    /// Number of stored messages.
    pub message_count: usize,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.chars().take(TITLE_MAX_CHARS).collect(),
            created: session.created,
            message_count: session.messages().len(),
        }
    }
}

/// One non-empty sidebar group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SessionGroup {
    /// Bucket label.
    pub label: DateGroup,
    /// Sessions, newest first.
    pub sessions: Vec<SessionSummary>,
}

/// Group sessions into Today / Yesterday / Older, skipping empty groups.
#[must_use]
pub fn group_sessions(sessions: &SessionCollection, today: NaiveDate) -> Vec<SessionGroup> {
    let mut groups = [
        (DateGroup::Today, Vec::new()),
        (DateGroup::Yesterday, Vec::new()),
        (DateGroup::Older, Vec::new()),
    ];

    for session in sessions.iter() {
        let label = DateGroup::classify(session.created, today);
        if let Some((_, bucket)) = groups.iter_mut().find(|(l, _)| *l == label) {
            bucket.push(SessionSummary::from(session));
        }
    }

    groups
        .into_iter()
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(label, mut bucket)| {
            bucket.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id)));
            SessionGroup {
                label,
                sessions: bucket,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::parse_created;

    fn session(id: &str, created: &str) -> Session {
        Session::new(SessionId::from(id), parse_created(created).unwrap())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_classify() {
        let t = today();
        assert_eq!(DateGroup::classify(parse_created("2024-03-01 23:59:59"), t), DateGroup::Today);
        // Across a month boundary.
        assert_eq!(
            DateGroup::classify(parse_created("2024-02-29 00:00:01"), t),
            DateGroup::Yesterday
        );
        assert_eq!(DateGroup::classify(parse_created("2024-02-28 12:00:00"), t), DateGroup::Older);
        assert_eq!(DateGroup::classify(None, t), DateGroup::Older);
        // Future dates are not "today".
        assert_eq!(DateGroup::classify(parse_created("2024-03-02 08:00:00"), t), DateGroup::Older);
    }

    #[test]
    fn test_group_sessions_order_and_skip_empty() {
        let mut sessions = SessionCollection::new();
        sessions.insert(session("1", "2024-03-01 08:00:00"));
        sessions.insert(session("2", "2024-03-01 09:00:00"));
        sessions.insert(session("3", "2023-12-25 09:00:00"));
        let mut unknown = session("4", "2024-03-01 10:00:00");
        unknown.created = None;
        sessions.insert(unknown);

        let groups = group_sessions(&sessions, today());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, DateGroup::Today);
        let today_ids: Vec<&str> = groups[0].sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(today_ids, vec!["2", "1"]);
        assert_eq!(groups[1].label, DateGroup::Older);
        assert_eq!(groups[1].sessions.len(), 2);
    }

    #[test]
    fn test_summary_shortens_title() {
        let mut s = session("1", "2024-03-01 08:00:00");
        s.title = "x".repeat(33);
        assert_eq!(SessionSummary::from(&s).title.len(), 30);
    }

    #[test]
    fn test_grouping_is_pure() {
        let mut sessions = SessionCollection::new();
        sessions.insert(session("1", "2024-02-29 08:00:00"));

        let before = sessions.clone();
        let first = group_sessions(&sessions, today());
        let second = group_sessions(&sessions, today());
        assert_eq!(first, second);
        assert_eq!(sessions, before);

        let next_day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(group_sessions(&sessions, next_day)[0].label, DateGroup::Older);
    }
}
