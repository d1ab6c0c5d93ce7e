//! Gateway error types.

use gate_client::GuardError;
use gate_models::ServiceId;
use thiserror::Error;

use crate::transform::TransformError;

pub type CoreResult<T> = Result<T, GatewayError>;

/// Every way an orchestrated call can fail.
///
/// The display text is what callers see in `OrchestrationResponse::error`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: request id required")]
    MissingRequestId,

    #[error("Validation error: unknown service '{0}'")]
    UnknownService(String),

    #[error("Validation error: service {0} is not configured")]
    NotConfigured(ServiceId),

    #[error("Validation error: service {0} is disabled")]
    ServiceDisabled(ServiceId),

    #[error("Circuit breaker is open for {0}")]
    CircuitOpen(ServiceId),

    #[error("Validation error: {0}")]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Local failures: fixed by the caller, never retried, never counted by a breaker.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GatewayError::Validation(_)
                | GatewayError::MissingRequestId
                | GatewayError::UnknownService(_)
                | GatewayError::NotConfigured(_)
                | GatewayError::ServiceDisabled(_)
                | GatewayError::Transform(_)
        )
    }

    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            e if e.is_validation() => "validation",
            GatewayError::CircuitOpen(_) => "circuit_open",
            GatewayError::Guard(GuardError::BackendRejected { .. })
            | GatewayError::Guard(GuardError::AuthFailed { .. }) => "backend",
            GatewayError::Guard(GuardError::ResponseTooLarge { .. })
            | GatewayError::Guard(GuardError::InvalidResponse(_)) => "response",
            GatewayError::Guard(_) => "transport",
            _ => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_request_id_message() {
        assert_eq!(
            GatewayError::MissingRequestId.to_string(),
            "Validation error: request id required"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(GatewayError::MissingRequestId.kind(), "validation");
        assert_eq!(GatewayError::CircuitOpen(ServiceId::BiasGuard).kind(), "circuit_open");
        assert_eq!(GatewayError::Guard(GuardError::Timeout(10)).kind(), "transport");
        assert_eq!(
            GatewayError::Guard(GuardError::from_http_status(422, "bad")).kind(),
            "backend"
        );
        assert_eq!(
            GatewayError::Guard(GuardError::InvalidResponse("x".into())).kind(),
            "response"
        );
        assert_eq!(GatewayError::config("bad url").kind(), "config");
    }

    #[test]
    fn test_guard_error_is_transparent() {
        let err: GatewayError = GuardError::Timeout(250).into();
        assert_eq!(err.to_string(), "Request timed out after 250 ms");
    }
}
