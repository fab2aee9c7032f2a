use chat_functions_core::notification::{MulticastMessage, MulticastReport};

use crate::adapters::auth::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error(transparent)]
    Credentials(#[from] TokenError),
    #[error("{0}")]
    Unavailable(String),
}

pub trait PushSender {
    /// Sends one notification to every token in the message. Per-token
    /// delivery failures are counted in the report rather than returned as
    /// errors.
    fn send_multicast(&self, message: &MulticastMessage) -> Result<MulticastReport, PushError>;
}
