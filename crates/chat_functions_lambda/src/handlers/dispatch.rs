//! Push fan-out for newly created mentor messages.

use chat_functions_core::collections::MENTORS;
use chat_functions_core::contract::{
    DispatchOutcome, DocumentCreatedEvent, MentorMessage, SkipReason,
};
use chat_functions_core::notification::{
    build_multicast, collect_tokens, mentor_display_name, recipients_query,
};
use serde_json::Value;

use crate::adapters::document_store::DocumentStore;
use crate::adapters::push::PushSender;

const COMPONENT: &str = "notification_dispatcher";

/// Handles one `mentormessages/{messageId}` creation event.
///
/// Never fails: missing data ends the invocation early, and platform errors
/// while querying, reading or sending are logged and reported as
/// [`DispatchOutcome::Failed`].
pub fn handle_message_created(
    event: Value,
    store: &dyn DocumentStore,
    push: &dyn PushSender,
) -> DispatchOutcome {
    let event = match serde_json::from_value::<DocumentCreatedEvent>(event) {
        Ok(value) => value,
        Err(error) => {
            tracing::info!(component = COMPONENT, error = %error, "unreadable trigger event");
            return skipped(SkipReason::NoMessageData);
        }
    };

    let Some(fields) = event.fields() else {
        tracing::info!(component = COMPONENT, "no message data found");
        return skipped(SkipReason::NoMessageData);
    };

    let message = match MentorMessage::from_fields(fields) {
        Ok(value) => value,
        Err(missing) => {
            tracing::info!(
                component = COMPONENT,
                missing = ?missing.fields,
                "missing required message fields"
            );
            return skipped(SkipReason::MissingFields);
        }
    };
    let message_id = event.message_id().unwrap_or_default();

    match fan_out(&message, message_id, store, push) {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::error!(
                component = COMPONENT,
                message_id,
                college = %message.college,
                error = %error,
                "error sending notifications"
            );
            DispatchOutcome::Failed {
                error: error.to_string(),
            }
        }
    }
}

fn fan_out(
    message: &MentorMessage,
    message_id: &str,
    store: &dyn DocumentStore,
    push: &dyn PushSender,
) -> Result<DispatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
    let students = store.run_query(&recipients_query(&message.college))?;
    if students.is_empty() {
        tracing::info!(
            component = COMPONENT,
            college = %message.college,
            "no students with FCM tokens found for college"
        );
        return Ok(skipped(SkipReason::NoStudentsWithTokens));
    }

    let tokens = collect_tokens(&students);
    if tokens.is_empty() {
        tracing::info!(component = COMPONENT, college = %message.college, "no valid FCM tokens found");
        return Ok(skipped(SkipReason::NoValidTokens));
    }

    let mentor = store.get_document(MENTORS, &message.mentor_id)?;
    let mentor_name = mentor_display_name(mentor.as_ref());

    let multicast = build_multicast(message, message_id, &mentor_name, tokens);
    let recipients = multicast.tokens.len();
    let report = push.send_multicast(&multicast)?;

    tracing::info!(
        component = COMPONENT,
        message_id,
        recipients,
        success_count = report.success_count,
        failure_count = report.failure_count,
        "notifications sent"
    );

    Ok(DispatchOutcome::Sent {
        recipients,
        success_count: report.success_count,
        failure_count: report.failure_count,
    })
}

fn skipped(reason: SkipReason) -> DispatchOutcome {
    tracing::debug!(component = COMPONENT, reason = reason.as_str(), "dispatch skipped");
    DispatchOutcome::Skipped { reason }
}

#[cfg(test)]
mod tests {
    use chat_functions_core::collections::STUDENTS;
    use chat_functions_core::document::{Fields, Value as FieldValue};
    use serde_json::json;

    use super::*;
    use crate::adapters::memory::{InMemoryDocumentStore, RecordingPushSender};

    fn created_event(fields: serde_json::Value) -> Value {
        json!({
            "value": {
                "name": "projects/local/databases/(default)/documents/mentormessages/msg-1",
                "fields": fields
            },
            "params": {"messageId": "msg-1"}
        })
    }

    fn complete_message() -> Value {
        created_event(json!({
            "college": {"stringValue": "iit"},
            "message": {"stringValue": "Office hours moved"},
            "mentorId": {"stringValue": "M1"}
        }))
    }

    fn seed_student(store: &InMemoryDocumentStore, id: &str, college: &str, token: FieldValue) {
        store.insert(
            STUDENTS,
            id,
            Fields::from([
                ("college".to_string(), FieldValue::string(college)),
                ("fcmToken".to_string(), token),
            ]),
        );
    }

    #[test]
    fn event_without_fields_is_skipped() {
        let store = InMemoryDocumentStore::new();
        let push = RecordingPushSender::new();

        let outcome = handle_message_created(
            json!({"value": {"name": "projects/local/databases/(default)/documents/mentormessages/x"}}),
            &store,
            &push,
        );

        assert_eq!(
            outcome,
            DispatchOutcome::Skipped {
                reason: SkipReason::NoMessageData
            }
        );
        assert!(store.queries().is_empty());
    }

    #[test]
    fn non_object_event_is_skipped() {
        let store = InMemoryDocumentStore::new();
        let push = RecordingPushSender::new();

        let outcome = handle_message_created(json!("not an event"), &store, &push);

        assert_eq!(
            outcome,
            DispatchOutcome::Skipped {
                reason: SkipReason::NoMessageData
            }
        );
    }

    #[test]
    fn each_missing_field_prevents_any_query_or_send() {
        for absent in ["college", "message", "mentorId"] {
            let store = InMemoryDocumentStore::new();
            let push = RecordingPushSender::new();
            seed_student(&store, "s1", "iit", FieldValue::string("A"));

            let mut fields = json!({
                "college": {"stringValue": "iit"},
                "message": {"stringValue": "hello"},
                "mentorId": {"stringValue": "M1"}
            });
            fields
                .as_object_mut()
                .expect("object literal")
                .remove(absent);

            let outcome = handle_message_created(created_event(fields), &store, &push);

            assert_eq!(
                outcome,
                DispatchOutcome::Skipped {
                    reason: SkipReason::MissingFields
                },
                "field {absent}"
            );
            assert!(store.queries().is_empty());
            assert!(push.sent().is_empty());
        }
    }

    #[test]
    fn queries_students_of_the_message_college() {
        let store = InMemoryDocumentStore::new();
        let push = RecordingPushSender::new();
        seed_student(&store, "s1", "iit", FieldValue::string("A"));

        handle_message_created(complete_message(), &store, &push);

        assert_eq!(store.queries(), vec![recipients_query("iit")]);
    }

    #[test]
    fn push_failure_is_reported_not_raised() {
        let store = InMemoryDocumentStore::new();
        let push = RecordingPushSender::new();
        seed_student(&store, "s1", "iit", FieldValue::string("A"));
        push.fail_with("messaging quota exceeded");

        let outcome = handle_message_created(complete_message(), &store, &push);

        assert_eq!(
            outcome,
            DispatchOutcome::Failed {
                error: "messaging quota exceeded".to_string()
            }
        );
    }

    #[test]
    fn mentor_read_failure_is_reported_without_sending() {
        let store = InMemoryDocumentStore::new();
        let push = RecordingPushSender::new();
        seed_student(&store, "s1", "iit", FieldValue::string("A"));
        store.fail_reads_with("mentor lookup timed out");

        let outcome = handle_message_created(complete_message(), &store, &push);

        assert_eq!(
            outcome,
            DispatchOutcome::Failed {
                error: "mentor lookup timed out".to_string()
            }
        );
        assert!(push.sent().is_empty());
    }

    #[test]
    fn message_id_falls_back_to_document_name() {
        let store = InMemoryDocumentStore::new();
        let push = RecordingPushSender::new();
        seed_student(&store, "s1", "iit", FieldValue::string("A"));

        let mut event = complete_message();
        event
            .as_object_mut()
            .expect("object literal")
            .remove("params");

        handle_message_created(event, &store, &push);

        assert_eq!(push.sent()[0].data["messageId"], "msg-1");
    }

    #[test]
    fn rejected_tokens_are_counted_in_outcome() {
        let store = InMemoryDocumentStore::new();
        let push = RecordingPushSender::new();
        seed_student(&store, "s1", "iit", FieldValue::string("A"));
        seed_student(&store, "s2", "iit", FieldValue::string("B"));
        push.reject_token("B");

        let outcome = handle_message_created(complete_message(), &store, &push);

        assert_eq!(
            outcome,
            DispatchOutcome::Sent {
                recipients: 2,
                success_count: 1,
                failure_count: 1
            }
        );
    }
}
