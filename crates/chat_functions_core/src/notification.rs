use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::collections::STUDENTS;
use crate::contract::{MentorMessage, FIELD_COLLEGE, FIELD_FCM_TOKEN, FIELD_NAME};
use crate::document::{Document, Value};
use crate::query::CollectionQuery;

pub const DEFAULT_MENTOR_NAME: &str = "Mentor";
pub const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub click_action: String,
}

/// One notification fanned out to many device tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MulticastMessage {
    pub tokens: Vec<String>,
    pub notification: Notification,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MulticastReport {
    pub success_count: usize,
    pub failure_count: usize,
}

/// Students of `college` that have a device token registered.
pub fn recipients_query(college: &str) -> CollectionQuery {
    CollectionQuery::new(STUDENTS)
        .where_equal(FIELD_COLLEGE, Value::string(college))
        .where_not_null(FIELD_FCM_TOKEN)
}

/// Non-empty `fcmToken` values in result order.
pub fn collect_tokens(students: &[Document]) -> Vec<String> {
    students
        .iter()
        .filter_map(|student| student.non_empty_string(FIELD_FCM_TOKEN))
        .map(str::to_string)
        .collect()
}

pub fn mentor_display_name(mentor: Option<&Document>) -> String {
    mentor
        .and_then(|document| document.non_empty_string(FIELD_NAME))
        .unwrap_or(DEFAULT_MENTOR_NAME)
        .to_string()
}

pub fn build_multicast(
    message: &MentorMessage,
    message_id: &str,
    mentor_name: &str,
    tokens: Vec<String>,
) -> MulticastMessage {
    MulticastMessage {
        tokens,
        notification: Notification {
            title: format!("Message from {mentor_name}"),
            body: message.message.clone(),
            click_action: CLICK_ACTION.to_string(),
        },
        data: BTreeMap::from([
            ("mentorId".to_string(), message.mentor_id.clone()),
            ("college".to_string(), message.college.clone()),
            ("messageId".to_string(), message_id.to_string()),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Fields;

    fn student(id: &str, token: Value) -> Document {
        Document::new(
            format!("projects/p/databases/(default)/documents/students/{id}"),
            Fields::from([
                (FIELD_COLLEGE.to_string(), Value::string("iit")),
                (FIELD_FCM_TOKEN.to_string(), token),
            ]),
        )
    }

    fn mentor(name: Option<&str>) -> Document {
        let mut fields = Fields::new();
        if let Some(name) = name {
            fields.insert(FIELD_NAME.to_string(), Value::string(name));
        }
        Document::new("projects/p/databases/(default)/documents/mentors/M1", fields)
    }

    #[test]
    fn collects_tokens_in_order_skipping_null_and_empty() {
        let students = vec![
            student("s1", Value::string("A")),
            student("s2", Value::null()),
            student("s3", Value::string("")),
            student("s4", Value::string("B")),
        ];

        assert_eq!(collect_tokens(&students), vec!["A", "B"]);
    }

    #[test]
    fn mentor_name_defaults_when_document_missing_or_unnamed() {
        assert_eq!(mentor_display_name(None), "Mentor");
        assert_eq!(mentor_display_name(Some(&mentor(None))), "Mentor");
        assert_eq!(mentor_display_name(Some(&mentor(Some("Dr. Lee")))), "Dr. Lee");
    }

    #[test]
    fn builds_titled_multicast_with_data_block() {
        let message = MentorMessage {
            college: "iit".to_string(),
            message: "Office hours moved to 4pm".to_string(),
            mentor_id: "M1".to_string(),
        };

        let multicast = build_multicast(&message, "msg-1", "Dr. Lee", vec!["A".to_string()]);

        assert_eq!(multicast.notification.title, "Message from Dr. Lee");
        assert_eq!(multicast.notification.body, "Office hours moved to 4pm");
        assert_eq!(multicast.notification.click_action, CLICK_ACTION);
        assert_eq!(multicast.data["mentorId"], "M1");
        assert_eq!(multicast.data["college"], "iit");
        assert_eq!(multicast.data["messageId"], "msg-1");
        assert_eq!(multicast.tokens, vec!["A"]);
    }

    #[test]
    fn recipients_query_filters_by_college_and_token() {
        let query = recipients_query("iit");

        assert_eq!(query.collection, STUDENTS);
        assert!(query.matches(&student("s1", Value::string("A"))));
        assert!(!query.matches(&student("s2", Value::null())));
    }
}
