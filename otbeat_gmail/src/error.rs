use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GmailError>;

#[derive(Debug, Error)]
pub enum GmailError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Token expired or revoked")]
    AuthExpired,

    #[error("Credentials not found at {0}")]
    CredentialsNotFound(PathBuf),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Authorization cancelled: {0}")]
    AuthorizationCancelled(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl GmailError {
    /// Transport failures, throttling and server errors are worth another try.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Api { status, .. } => matches!(status, 408 | 429 | 500..=599),
            _ => false,
        }
    }
}
