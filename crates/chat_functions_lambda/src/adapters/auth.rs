//! OAuth access tokens for the Firestore and FCM clients.
//!
//! Tokens come from a static value, a service-account key exchanged through
//! the JWT-bearer grant, or the compute metadata server. Fetched tokens are
//! cached by [`AccessTokenProvider`] until shortly before they expire.

use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const TOKEN_SCOPES: &str =
    "https://www.googleapis.com/auth/datastore https://www.googleapis.com/auth/firebase.messaging";

const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Cached tokens are refreshed this long before the issuer's expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to reach token endpoint: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to sign service account assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Fields of a Google service-account JSON key that the grant needs.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Where outbound bearer tokens come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Static(String),
    ServiceAccount(ServiceAccountKey),
    /// Default service account of the compute metadata server at `base_url`.
    Metadata { base_url: String },
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl TokenSource {
    pub fn metadata(host: &str) -> Self {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", host.trim_end_matches('/'))
        };
        Self::Metadata { base_url }
    }

    async fn fetch(&self, client: &Client) -> Result<TokenResponse, TokenError> {
        let request = match self {
            Self::Static(token) => {
                return Ok(TokenResponse {
                    access_token: token.clone(),
                    expires_in: None,
                })
            }
            Self::ServiceAccount(key) => {
                let assertion = sign_assertion(key)?;
                client.post(&key.token_uri).form(&[
                    ("grant_type", JWT_BEARER_GRANT),
                    ("assertion", assertion.as_str()),
                ])
            }
            Self::Metadata { base_url } => client
                .get(format!("{base_url}{METADATA_TOKEN_PATH}"))
                .header("Metadata-Flavor", "Google"),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<TokenResponse>().await?)
    }
}

fn sign_assertion(key: &ServiceAccountKey) -> Result<String, TokenError> {
    let issued_at = Utc::now().timestamp();
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: TOKEN_SCOPES,
        aud: &key.token_uri,
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(jsonwebtoken::encode(&header, &claims, &signing_key)?)
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Shared token cache in front of a [`TokenSource`].
pub struct AccessTokenProvider {
    source: TokenSource,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for AccessTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenProvider")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl AccessTokenProvider {
    pub fn new(source: TokenSource) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &TokenSource {
        &self.source
    }

    pub async fn access_token(&self, client: &Client) -> Result<String, TokenError> {
        if let TokenSource::Static(token) = &self.source {
            return Ok(token.clone());
        }

        // Held across the fetch so concurrent callers share one exchange.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| Instant::now() < token.refresh_at) {
            return Ok(token.access_token.clone());
        }

        let fetched = self.source.fetch(client).await?;
        let lifetime = Duration::from_secs(fetched.expires_in.unwrap_or(0));
        *cached = Some(CachedToken {
            access_token: fetched.access_token.clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN),
        });
        tracing::debug!(expires_in = lifetime.as_secs(), "access token refreshed");
        Ok(fetched.access_token)
    }
}
