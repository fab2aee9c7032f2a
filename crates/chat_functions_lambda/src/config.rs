use chat_functions_core::collections::DEFAULT_DATABASE_ID;

use crate::adapters::auth::{ServiceAccountKey, TokenSource, DEFAULT_METADATA_HOST};
use crate::adapters::fcm::DEFAULT_FCM_BASE_URL;
use crate::adapters::firestore::DEFAULT_FIRESTORE_BASE_URL;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{name} must not be blank")]
    Blank { name: &'static str },
    #[error("{name} does not hold a usable service account key: {reason}")]
    Credentials { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub project_id: String,
    pub database_id: String,
    pub firestore_base_url: String,
    pub fcm_base_url: String,
    pub token_source: TokenSource,
}

impl PlatformConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(name) {
                Some(value) if value.trim().is_empty() => Err(ConfigError::Blank { name }),
                Some(value) => Ok(Some(value.trim().to_string())),
                None => Ok(None),
            }
        };

        // Static token, then inline key, then key file, then the metadata server.
        let token_source = if let Some(token) = read("GOOGLE_OAUTH_ACCESS_TOKEN")? {
            TokenSource::Static(token)
        } else if let Some(json) = read("GOOGLE_SERVICE_ACCOUNT_JSON")? {
            TokenSource::ServiceAccount(parse_key("GOOGLE_SERVICE_ACCOUNT_JSON", &json)?)
        } else if let Some(path) = read("GOOGLE_APPLICATION_CREDENTIALS")? {
            let json = std::fs::read_to_string(&path).map_err(|error| ConfigError::Credentials {
                name: "GOOGLE_APPLICATION_CREDENTIALS",
                reason: format!("{path}: {error}"),
            })?;
            TokenSource::ServiceAccount(parse_key("GOOGLE_APPLICATION_CREDENTIALS", &json)?)
        } else {
            TokenSource::metadata(
                &read("GCE_METADATA_HOST")?.unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),
            )
        };

        let key_project = match &token_source {
            TokenSource::ServiceAccount(key) => key.project_id.clone(),
            _ => None,
        };
        let project_id = match read("FIREBASE_PROJECT_ID")? {
            Some(value) => value,
            None => read("GOOGLE_CLOUD_PROJECT")?
                .or(key_project)
                .ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))?,
        };

        Ok(Self {
            project_id,
            database_id: read("FIRESTORE_DATABASE_ID")?
                .unwrap_or_else(|| DEFAULT_DATABASE_ID.to_string()),
            firestore_base_url: read("FIRESTORE_BASE_URL")?
                .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.to_string()),
            fcm_base_url: read("FCM_BASE_URL")?
                .unwrap_or_else(|| DEFAULT_FCM_BASE_URL.to_string()),
            token_source,
        })
    }
}

fn parse_key(name: &'static str, json: &str) -> Result<ServiceAccountKey, ConfigError> {
    serde_json::from_str(json).map_err(|error| ConfigError::Credentials {
        name,
        reason: error.to_string(),
    })
}
