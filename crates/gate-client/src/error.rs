//! Guard client error types.

use thiserror::Error;

pub type GuardResult<T> = Result<T, GuardError>;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Service unavailable: HTTP {status}: {body}")]
    ServiceUnavailable { status: u16, body: String },

    #[error("Authentication failed: HTTP {status}")]
    AuthFailed { status: u16 },

    #[error("Backend rejected request: HTTP {status}: {body}")]
    BackendRejected { status: u16, body: String },

    #[error("Response too large (over {limit} bytes): {preview}")]
    ResponseTooLarge { limit: usize, preview: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GuardError {
    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        match status {
            401 | 403 => GuardError::AuthFailed { status },
            502..=504 => GuardError::ServiceUnavailable {
                status,
                body: body.into(),
            },
            _ => GuardError::BackendRejected {
                status,
                body: body.into(),
            },
        }
    }

    /// Classify a reqwest error raised while sending or reading.
    pub fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            GuardError::Timeout(timeout_ms)
        } else if err.is_connect() {
            GuardError::Connection(err.to_string())
        } else {
            GuardError::Network(err)
        }
    }

    /// Transport-level failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GuardError::ServiceUnavailable { .. }
                | GuardError::Timeout(_)
                | GuardError::Connection(_)
                | GuardError::Network(_)
        )
    }

    /// HTTP status carried by the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            GuardError::ServiceUnavailable { status, .. }
            | GuardError::AuthFailed { status }
            | GuardError::BackendRejected { status, .. } => Some(*status),
            GuardError::Timeout(_) => Some(504),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status_auth() {
        let err = GuardError::from_http_status(401, "nope");
        assert!(matches!(err, GuardError::AuthFailed { status: 401 }));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("Authentication failed"));
    }

    #[test]
    fn test_from_http_status_unavailable_is_retryable() {
        for status in [502, 503, 504] {
            let err = GuardError::from_http_status(status, "down");
            assert!(err.is_retryable(), "{status} should be retryable");
            assert!(err.to_string().contains("Service unavailable"));
        }
    }

    #[test]
    fn test_from_http_status_rejection_not_retryable() {
        let err = GuardError::from_http_status(422, "unknown field user_id");
        assert!(matches!(err, GuardError::BackendRejected { status: 422, .. }));
        assert!(!err.is_retryable());
        assert_eq!(err.http_status(), Some(422));
    }

    #[test]
    fn test_timeout_message() {
        assert_eq!(
            GuardError::Timeout(1500).to_string(),
            "Request timed out after 1500 ms"
        );
    }
}
