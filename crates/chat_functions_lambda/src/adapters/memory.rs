//! In-memory adapters for tests and local runs.

use std::sync::Mutex;

use chat_functions_core::collections::{document_name, documents_root};
use chat_functions_core::document::{Document, Fields};
use chat_functions_core::notification::{MulticastMessage, MulticastReport};
use chat_functions_core::query::CollectionQuery;

use crate::adapters::document_store::{DocumentStore, StoreError};
use crate::adapters::push::{PushError, PushSender};

pub const MEMORY_PROJECT_ID: &str = "local";

/// Documents kept in insertion order, which is also query result order.
pub struct InMemoryDocumentStore {
    documents: Mutex<Vec<Document>>,
    fail_reads: Mutex<Option<String>>,
    fail_queries: Mutex<Option<String>>,
    fail_commits: Mutex<Option<String>>,
    queries: Mutex<Vec<CollectionQuery>>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            fail_reads: Mutex::new(None),
            fail_queries: Mutex::new(None),
            fail_commits: Mutex::new(None),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn documents_root() -> String {
        documents_root(MEMORY_PROJECT_ID, "(default)")
    }

    /// Inserts or replaces `collection/document_id` and returns its full name.
    pub fn insert(&self, collection: &str, document_id: &str, fields: Fields) -> String {
        let name = document_name(&Self::documents_root(), collection, document_id);
        let mut documents = self.documents.lock().expect("poisoned mutex");
        documents.retain(|document| document.name != name);
        documents.push(Document::new(name.clone(), fields));
        name
    }

    pub fn fail_reads_with(&self, message: impl Into<String>) {
        *self.fail_reads.lock().expect("poisoned mutex") = Some(message.into());
    }

    pub fn fail_queries_with(&self, message: impl Into<String>) {
        *self.fail_queries.lock().expect("poisoned mutex") = Some(message.into());
    }

    pub fn fail_commits_with(&self, message: impl Into<String>) {
        *self.fail_commits.lock().expect("poisoned mutex") = Some(message.into());
    }

    pub fn contains(&self, collection: &str, document_id: &str) -> bool {
        let name = document_name(&Self::documents_root(), collection, document_id);
        self.documents
            .lock()
            .expect("poisoned mutex")
            .iter()
            .any(|document| document.name == name)
    }

    pub fn document_ids(&self, collection: &str) -> Vec<String> {
        let query = CollectionQuery::new(collection);
        self.documents
            .lock()
            .expect("poisoned mutex")
            .iter()
            .filter(|document| query.matches(document))
            .map(|document| document.id().to_string())
            .collect()
    }

    pub fn queries(&self) -> Vec<CollectionQuery> {
        self.queries.lock().expect("poisoned mutex").clone()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<Document>, StoreError> {
        if let Some(message) = self.fail_reads.lock().expect("poisoned mutex").clone() {
            return Err(StoreError::Unavailable(message));
        }

        let name = document_name(&Self::documents_root(), collection, document_id);
        Ok(self
            .documents
            .lock()
            .expect("poisoned mutex")
            .iter()
            .find(|document| document.name == name)
            .cloned())
    }

    fn run_query(&self, query: &CollectionQuery) -> Result<Vec<Document>, StoreError> {
        self.queries
            .lock()
            .expect("poisoned mutex")
            .push(query.clone());
        if let Some(message) = self.fail_queries.lock().expect("poisoned mutex").clone() {
            return Err(StoreError::Unavailable(message));
        }

        Ok(self
            .documents
            .lock()
            .expect("poisoned mutex")
            .iter()
            .filter(|document| query.matches(document))
            .cloned()
            .collect())
    }

    fn delete_batch(&self, document_names: &[String]) -> Result<usize, StoreError> {
        if let Some(message) = self.fail_commits.lock().expect("poisoned mutex").clone() {
            return Err(StoreError::Unavailable(message));
        }

        let mut documents = self.documents.lock().expect("poisoned mutex");
        documents.retain(|document| !document_names.contains(&document.name));
        Ok(document_names.len())
    }
}

/// Records every multicast instead of delivering it.
#[derive(Default)]
pub struct RecordingPushSender {
    sent: Mutex<Vec<MulticastMessage>>,
    rejected_tokens: Mutex<Vec<String>>,
    failure: Mutex<Option<String>>,
}

impl RecordingPushSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_token(&self, token: impl Into<String>) {
        self.rejected_tokens
            .lock()
            .expect("poisoned mutex")
            .push(token.into());
    }

    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().expect("poisoned mutex") = Some(message.into());
    }

    pub fn sent(&self) -> Vec<MulticastMessage> {
        self.sent.lock().expect("poisoned mutex").clone()
    }
}

impl PushSender for RecordingPushSender {
    fn send_multicast(&self, message: &MulticastMessage) -> Result<MulticastReport, PushError> {
        if let Some(error) = self.failure.lock().expect("poisoned mutex").clone() {
            return Err(PushError::Unavailable(error));
        }

        let rejected = self.rejected_tokens.lock().expect("poisoned mutex");
        let failure_count = message
            .tokens
            .iter()
            .filter(|token| rejected.contains(token))
            .count();
        self.sent
            .lock()
            .expect("poisoned mutex")
            .push(message.clone());

        Ok(MulticastReport {
            success_count: message.tokens.len() - failure_count,
            failure_count,
        })
    }
}
