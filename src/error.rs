use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by the Rituals cloud client.
///
/// Callers are expected to surface the `Display` text as the user-visible
/// failure message.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad credentials or a login response without a success token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Timeout, DNS failure, connection refused.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status or a body we could not make sense of.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: StatusCode, body: String },

    /// Caller supplied a missing or out-of-range input.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    pub(crate) fn api(status: StatusCode, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// `true` when the upstream rejected the bearer token.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(
            self,
            Self::Api { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
