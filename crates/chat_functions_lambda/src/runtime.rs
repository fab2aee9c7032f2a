//! Process-wide setup shared by the Lambda binaries.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::adapters::auth::AccessTokenProvider;
use crate::adapters::fcm::FcmClient;
use crate::adapters::firestore::FirestoreClient;
use crate::config::PlatformConfig;

/// Platform handles built once at startup and shared by every invocation.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    pub store: FirestoreClient,
    pub push: FcmClient,
}

impl PlatformClient {
    pub fn new(config: &PlatformConfig) -> Self {
        let http = reqwest::Client::new();
        let tokens = Arc::new(AccessTokenProvider::new(config.token_source.clone()));
        Self {
            store: FirestoreClient::new(
                http.clone(),
                &config.firestore_base_url,
                &config.project_id,
                &config.database_id,
                Arc::clone(&tokens),
            ),
            push: FcmClient::new(
                http,
                &config.fcm_base_url,
                &config.project_id,
                tokens,
            ),
        }
    }
}

/// JSON log lines to stdout, filtered by `RUST_LOG` (default `info`).
/// CloudWatch stamps each line, so no timestamp is emitted.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .without_time()
                .with_current_span(false),
        )
        .init();
}
