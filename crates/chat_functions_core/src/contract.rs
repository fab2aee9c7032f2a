use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collections::document_id_from_name;
use crate::document::Fields;

pub const FIELD_COLLEGE: &str = "college";
pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_MENTOR_ID: &str = "mentorId";
pub const FIELD_FCM_TOKEN: &str = "fcmToken";
pub const FIELD_NAME: &str = "name";
pub const FIELD_TIMESTAMP: &str = "timestamp";

/// Document-created trigger as delivered to the dispatcher.
///
/// `value` holds the new document; `params` carries the wildcard values of the
/// trigger path (`mentormessages/{messageId}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentCreatedEvent {
    #[serde(default)]
    pub value: Option<EventDocument>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDocument {
    #[serde(default)]
    pub name: String,
    /// Absent when the snapshot carries no readable data.
    #[serde(default)]
    pub fields: Option<Fields>,
}

impl DocumentCreatedEvent {
    /// Wildcard `messageId` when present, otherwise the id from the document name.
    pub fn message_id(&self) -> Option<&str> {
        if let Some(id) = self.params.get("messageId").filter(|id| !id.is_empty()) {
            return Some(id.as_str());
        }
        self.value
            .as_ref()
            .map(|document| document_id_from_name(&document.name))
            .filter(|id| !id.is_empty())
    }

    pub fn fields(&self) -> Option<&Fields> {
        self.value.as_ref().and_then(|document| document.fields.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentorMessage {
    pub college: String,
    pub message: String,
    pub mentor_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFields {
    pub fields: Vec<&'static str>,
}

impl std::fmt::Display for MissingFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "missing required message fields: {}", self.fields.join(", "))
    }
}

impl std::error::Error for MissingFields {}

impl MentorMessage {
    /// Extracts the required fields; every one must be a non-empty string.
    pub fn from_fields(fields: &Fields) -> Result<Self, MissingFields> {
        let read = |name: &'static str, missing: &mut Vec<&'static str>| {
            let value = fields
                .get(name)
                .and_then(|value| value.as_non_empty_str())
                .map(str::to_string);
            if value.is_none() {
                missing.push(name);
            }
            value
        };

        let mut missing = Vec::new();
        let college = read(FIELD_COLLEGE, &mut missing);
        let message = read(FIELD_MESSAGE, &mut missing);
        let mentor_id = read(FIELD_MENTOR_ID, &mut missing);

        match (college, message, mentor_id) {
            (Some(college), Some(message), Some(mentor_id)) => Ok(Self {
                college,
                message,
                mentor_id,
            }),
            _ => Err(MissingFields { fields: missing }),
        }
    }
}

/// Result reported by the notification dispatcher. The invocation itself
/// always succeeds; this value only describes what happened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Skipped {
        reason: SkipReason,
    },
    Sent {
        recipients: usize,
        success_count: usize,
        failure_count: usize,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoMessageData,
    MissingFields,
    NoStudentsWithTokens,
    NoValidTokens,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoMessageData => "no_message_data",
            Self::MissingFields => "missing_fields",
            Self::NoStudentsWithTokens => "no_students_with_tokens",
            Self::NoValidTokens => "no_valid_tokens",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SweepOutcome {
    pub cutoff: DateTime<Utc>,
    pub deleted_count: usize,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::Value;

    fn message_fields(college: Value, message: Value, mentor_id: Value) -> Fields {
        Fields::from([
            (FIELD_COLLEGE.to_string(), college),
            (FIELD_MESSAGE.to_string(), message),
            (FIELD_MENTOR_ID.to_string(), mentor_id),
        ])
    }

    #[test]
    fn extracts_complete_message() {
        let fields = message_fields(
            Value::string("iit"),
            Value::string("Office hours moved"),
            Value::string("M1"),
        );

        let message = MentorMessage::from_fields(&fields).expect("fields are complete");
        assert_eq!(message.college, "iit");
        assert_eq!(message.mentor_id, "M1");
    }

    #[test]
    fn reports_every_missing_field() {
        let fields = message_fields(Value::string(""), Value::null(), Value::integer(7));

        let error = MentorMessage::from_fields(&fields).expect_err("fields are incomplete");
        assert_eq!(
            error.fields,
            vec![FIELD_COLLEGE, FIELD_MESSAGE, FIELD_MENTOR_ID]
        );
        assert_eq!(
            error.to_string(),
            "missing required message fields: college, message, mentorId"
        );
    }

    #[test]
    fn message_id_prefers_trigger_params() {
        let event: DocumentCreatedEvent = serde_json::from_value(json!({
            "value": {
                "name": "projects/p/databases/(default)/documents/mentormessages/from-name",
                "fields": {}
            },
            "params": {"messageId": "from-params"}
        }))
        .expect("event should decode");

        assert_eq!(event.message_id(), Some("from-params"));
    }

    #[test]
    fn message_id_falls_back_to_document_name() {
        let event: DocumentCreatedEvent = serde_json::from_value(json!({
            "value": {
                "name": "projects/p/databases/(default)/documents/mentormessages/msg-42"
            }
        }))
        .expect("event should decode");

        assert_eq!(event.message_id(), Some("msg-42"));
        assert!(event.fields().is_none());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = DispatchOutcome::Skipped {
            reason: SkipReason::NoValidTokens,
        };
        assert_eq!(
            serde_json::to_value(outcome).expect("serialize"),
            json!({"status": "skipped", "reason": "no_valid_tokens"})
        );
    }
}
