pub const MENTOR_MESSAGES: &str = "mentormessages";
pub const STUDENTS: &str = "students";
pub const MENTORS: &str = "mentors";
pub const ANONYMOUS_CHATS: &str = "anonymous_chats";

pub const DEFAULT_DATABASE_ID: &str = "(default)";

/// `projects/{project}/databases/{database}/documents`
pub fn documents_root(project_id: &str, database_id: &str) -> String {
    format!(
        "projects/{}/databases/{}/documents",
        project_id.trim_matches('/'),
        database_id.trim_matches('/'),
    )
}

pub fn document_name(documents_root: &str, collection: &str, document_id: &str) -> String {
    format!(
        "{}/{collection}/{document_id}",
        documents_root.trim_end_matches('/')
    )
}

pub fn document_id_from_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches('/');
    trimmed
        .rsplit_once('/')
        .map(|(_, id)| id)
        .unwrap_or(trimmed)
}

/// Collection id of the document's immediate parent, if the name has one.
pub fn collection_from_name(name: &str) -> Option<&str> {
    let mut segments = name.trim_end_matches('/').rsplit('/');
    segments.next()?;
    segments.next().filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_default_database_document_names() {
        let root = documents_root("campus-app", DEFAULT_DATABASE_ID);
        assert_eq!(root, "projects/campus-app/databases/(default)/documents");
        assert_eq!(
            document_name(&root, MENTORS, "m-1"),
            "projects/campus-app/databases/(default)/documents/mentors/m-1"
        );
    }

    #[test]
    fn extracts_id_and_collection_from_resource_name() {
        let name = "projects/p/databases/(default)/documents/anonymous_chats/chat-9";
        assert_eq!(document_id_from_name(name), "chat-9");
        assert_eq!(collection_from_name(name), Some(ANONYMOUS_CHATS));
    }

    #[test]
    fn bare_id_is_its_own_name() {
        assert_eq!(document_id_from_name("abc"), "abc");
        assert_eq!(collection_from_name("abc"), None);
    }
}
