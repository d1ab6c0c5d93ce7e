//! Structured call logging utilities.
//!
//! Provides consistent, structured logging for orchestrated calls with
//! tracing spans and contextual information.

use gate_models::ServiceId;
use tracing::{info, warn, Span};

use crate::error::GatewayError;

/// Call logger carrying the request id and target service.
#[derive(Debug, Clone)]
pub struct CallLogger {
    request_id: String,
    service: String,
}

impl CallLogger {
    /// Create a new call logger.
    pub fn new(request_id: &str, service: ServiceId) -> Self {
        Self::from_parts(request_id, service.as_str())
    }

    /// Create a logger from raw strings (used before the service is known to be valid).
    pub fn from_parts(request_id: &str, service: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            service: service.to_string(),
        }
    }

    /// Log the start of a call.
    pub fn log_start(&self) {
        info!(
            request_id = %self.request_id,
            service = %self.service,
            "Guard call started"
        );
    }

    /// Log a successful call.
    pub fn log_completion(&self, duration_ms: u64) {
        info!(
            request_id = %self.request_id,
            service = %self.service,
            duration_ms,
            "Guard call completed"
        );
    }

    /// Log a failed call. Validation failures are expected traffic and stay at info.
    pub fn log_failure(&self, error: &GatewayError, duration_ms: u64) {
        if error.is_validation() {
            info!(
                request_id = %self.request_id,
                service = %self.service,
                kind = error.kind(),
                duration_ms,
                "Guard call rejected: {}", error
            );
        } else {
            warn!(
                request_id = %self.request_id,
                service = %self.service,
                kind = error.kind(),
                duration_ms,
                "Guard call failed: {}", error
            );
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Create a tracing span for this call.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "guard_call",
            request_id = %self.request_id,
            service = %self.service
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_logger_creation() {
        let logger = CallLogger::new("req-123", ServiceId::ContextGuard);
        assert_eq!(logger.request_id(), "req-123");
        assert_eq!(logger.service(), "context-guard");
    }

    #[test]
    fn test_call_logger_from_parts() {
        let logger = CallLogger::from_parts("", "vision-guard");
        assert_eq!(logger.request_id(), "");
        assert_eq!(logger.service(), "vision-guard");
    }
}
