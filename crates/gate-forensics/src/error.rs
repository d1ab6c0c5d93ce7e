//! Forensic client error types.

use thiserror::Error;

pub type ForensicResult<T> = Result<T, ForensicError>;

#[derive(Debug, Error)]
pub enum ForensicError {
    #[error("Forensic collaborator disabled")]
    Disabled,

    #[error("Forensic collaborator returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Forensic response exceeded {limit} bytes")]
    ResponseTooLarge { limit: usize },

    #[error("Forensic request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
