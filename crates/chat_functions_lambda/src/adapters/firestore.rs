//! Firestore REST v1 adapter.

use std::sync::Arc;

use chat_functions_core::collections::{document_name, documents_root};
use chat_functions_core::document::Document;
use chat_functions_core::query::{CollectionQuery, RunQueryResponseItem};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;

use crate::adapters::auth::AccessTokenProvider;
use crate::adapters::document_store::{DocumentStore, StoreError};

pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

#[derive(Debug, Clone)]
pub struct FirestoreClient {
    http: Client,
    base_url: String,
    documents_root: String,
    tokens: Arc<AccessTokenProvider>,
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    writes: Vec<DeleteWrite<'a>>,
}

#[derive(Debug, Serialize)]
struct DeleteWrite<'a> {
    delete: &'a str,
}

impl FirestoreClient {
    pub fn new(
        http: Client,
        base_url: &str,
        project_id: &str,
        database_id: &str,
        tokens: Arc<AccessTokenProvider>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            documents_root: documents_root(project_id, database_id),
            tokens,
        }
    }

    pub fn documents_root(&self) -> &str {
        &self.documents_root
    }

    pub async fn fetch_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let url = format!(
            "{}/v1/{}",
            self.base_url,
            document_name(&self.documents_root, collection, document_id)
        );
        let response = self.authorized(self.http.get(url)).await?.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = checked_body(response).await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    pub async fn query(&self, query: &CollectionQuery) -> Result<Vec<Document>, StoreError> {
        let url = format!("{}/v1/{}:runQuery", self.base_url, self.documents_root);
        let request = self
            .authorized(self.http.post(url))
            .await?
            .json(&query.to_run_query_request());

        let body = checked_body(request.send().await?).await?;
        let items: Vec<RunQueryResponseItem> = serde_json::from_str(&body)?;
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    pub async fn commit_deletes(&self, document_names: &[String]) -> Result<usize, StoreError> {
        if document_names.is_empty() {
            return Ok(0);
        }

        let url = format!("{}/v1/{}:commit", self.base_url, self.documents_root);
        let commit = CommitRequest {
            writes: document_names
                .iter()
                .map(|name| DeleteWrite { delete: name })
                .collect(),
        };
        let request = self.authorized(self.http.post(url)).await?.json(&commit);

        checked_body(request.send().await?).await?;
        Ok(document_names.len())
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, StoreError> {
        let token = self.tokens.access_token(&self.http).await?;
        Ok(request.bearer_auth(token))
    }
}

async fn checked_body(response: reqwest::Response) -> Result<String, StoreError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(StoreError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

impl DocumentStore for FirestoreClient {
    fn get_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<Document>, StoreError> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current()
                .block_on(self.fetch_document(collection, document_id))
        })
    }

    fn run_query(&self, query: &CollectionQuery) -> Result<Vec<Document>, StoreError> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(self.query(query))
        })
    }

    fn delete_batch(&self, document_names: &[String]) -> Result<usize, StoreError> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(self.commit_deletes(document_names))
        })
    }
}
