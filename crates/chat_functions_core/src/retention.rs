use chrono::{DateTime, Duration, Utc};

use crate::collections::ANONYMOUS_CHATS;
use crate::contract::FIELD_TIMESTAMP;
use crate::document::Value;
use crate::query::CollectionQuery;

pub const RETENTION_WINDOW_HOURS: i64 = 24;

pub fn retention_window() -> Duration {
    Duration::hours(RETENTION_WINDOW_HOURS)
}

pub fn retention_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - retention_window()
}

/// Anonymous chats created at or before `cutoff`.
pub fn stale_chats_query(cutoff: DateTime<Utc>) -> CollectionQuery {
    CollectionQuery::new(ANONYMOUS_CHATS)
        .where_less_than_or_equal(FIELD_TIMESTAMP, Value::timestamp(cutoff))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::document::{Document, Fields};

    fn chat_at(timestamp: DateTime<Utc>) -> Document {
        Document::new(
            "projects/p/databases/(default)/documents/anonymous_chats/c1",
            Fields::from([(FIELD_TIMESTAMP.to_string(), Value::timestamp(timestamp))]),
        )
    }

    #[test]
    fn cutoff_is_one_day_before_now() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert_eq!(
            retention_cutoff(now),
            Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn stale_query_includes_the_cutoff_instant() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let cutoff = retention_cutoff(now);
        let query = stale_chats_query(cutoff);

        assert!(query.matches(&chat_at(cutoff)));
        assert!(query.matches(&chat_at(cutoff - Duration::days(3))));
        assert!(!query.matches(&chat_at(now)));
    }

    #[test]
    fn chats_without_timestamp_are_never_stale() {
        let query = stale_chats_query(Utc::now());
        let chat = Document::new(
            "projects/p/databases/(default)/documents/anonymous_chats/c2",
            Fields::new(),
        );

        assert!(!query.matches(&chat));
    }
}
