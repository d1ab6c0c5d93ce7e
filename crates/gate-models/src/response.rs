//! Orchestration response contract.

use serde::{Deserialize, Serialize};

/// Uniform response for every orchestrated call.
///
/// Exactly one of `result` / `error` is populated, depending on `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResponse {
    /// Echo of the caller's request id (empty when the request was unreadable)
    pub request_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock processing time in milliseconds
    pub duration_ms: u64,
    /// Target service name as supplied by the caller
    pub service: String,
}

impl OrchestrationResponse {
    /// Build a successful response.
    pub fn ok(
        request_id: impl Into<String>,
        service: impl Into<String>,
        result: serde_json::Value,
        duration_ms: u64,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            success: true,
            result: Some(result),
            error: None,
            duration_ms,
            service: service.into(),
        }
    }

    /// Build a failed response.
    pub fn failed(
        request_id: impl Into<String>,
        service: impl Into<String>,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            result: None,
            error: Some(error.into()),
            duration_ms,
            service: service.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exactly_one_side_populated() {
        let ok = OrchestrationResponse::ok("r1", "trust-guard", json!({"valid": true}), 3);
        assert!(ok.success && ok.result.is_some() && ok.error.is_none());

        let failed = OrchestrationResponse::failed("r1", "trust-guard", "boom", 3);
        assert!(!failed.success && failed.result.is_none() && failed.error.is_some());
    }

    #[test]
    fn test_failed_serialization_omits_result() {
        let failed = OrchestrationResponse::failed("r2", "bias-guard", "bad", 1);
        let value = serde_json::to_value(&failed).unwrap();
        assert!(value.get("result").is_none());
        assert_eq!(value["error"], "bad");
    }
}
