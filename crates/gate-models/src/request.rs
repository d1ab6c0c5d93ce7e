//! Orchestration request contract.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::service::ServiceId;

/// Generic key/value payload carried by a request.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Maximum accepted length of a caller-supplied request id.
pub const MAX_REQUEST_ID_LEN: usize = 128;

/// A single logical call routed to one guard service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrchestrationRequest {
    /// Caller-supplied id, unique per logical call
    #[validate(length(min = 1, max = 128))]
    pub request_id: String,
    /// Target guard service
    pub service: ServiceId,
    /// Generic payload, transformed per service before forwarding
    #[serde(default)]
    pub payload: Payload,
    /// Optional timeout override in milliseconds; non-positive values are ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<i64>,
    /// Optional trace metadata (never forwarded in the body)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Payload>,
}

impl OrchestrationRequest {
    /// Create a request with an empty payload.
    pub fn new(request_id: impl Into<String>, service: ServiceId) -> Self {
        Self {
            request_id: request_id.into(),
            service,
            payload: Payload::new(),
            timeout_ms: None,
            trace: None,
        }
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Set the timeout override.
    pub fn with_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set trace metadata.
    pub fn with_trace(mut self, trace: Payload) -> Self {
        self.trace = Some(trace);
        self
    }

    /// The timeout override, if it is usable (strictly positive).
    pub fn effective_timeout_ms(&self) -> Option<u64> {
        self.timeout_ms.filter(|ms| *ms > 0).map(|ms| ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal() {
        let req: OrchestrationRequest =
            serde_json::from_value(json!({"request_id": "r1", "service": "trust-guard"})).unwrap();
        assert_eq!(req.request_id, "r1");
        assert_eq!(req.service, ServiceId::TrustGuard);
        assert!(req.payload.is_empty());
        assert!(req.timeout_ms.is_none());
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let req = OrchestrationRequest::new("", ServiceId::BiasGuard);
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("request_id"));
    }

    #[test]
    fn test_validate_rejects_oversized_id() {
        let req = OrchestrationRequest::new("x".repeat(200), ServiceId::BiasGuard);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_effective_timeout_ignores_non_positive() {
        let req = OrchestrationRequest::new("r", ServiceId::TokenGuard);
        assert_eq!(req.clone().with_timeout_ms(-5).effective_timeout_ms(), None);
        assert_eq!(req.clone().with_timeout_ms(0).effective_timeout_ms(), None);
        assert_eq!(req.with_timeout_ms(250).effective_timeout_ms(), Some(250));
    }
}
