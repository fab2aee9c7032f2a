use chat_functions_core::document::Document;
use chat_functions_core::query::CollectionQuery;

use crate::adapters::auth::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("document store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode document store response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Credentials(#[from] TokenError),
    #[error("{0}")]
    Unavailable(String),
}

/// Read, query and batch-delete access to the document database.
pub trait DocumentStore {
    /// Point read; `Ok(None)` when the document does not exist.
    fn get_document(&self, collection: &str, document_id: &str)
        -> Result<Option<Document>, StoreError>;

    fn run_query(&self, query: &CollectionQuery) -> Result<Vec<Document>, StoreError>;

    /// Deletes every named document in one atomic commit and returns the
    /// number of deletes applied. Either all deletes apply or none do.
    fn delete_batch(&self, document_names: &[String]) -> Result<usize, StoreError>;
}
