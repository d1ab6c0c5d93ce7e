//! Gateway metrics collection.
//!
//! Provides standardized metrics for monitoring guard calls:
//! - Request counters by service and outcome
//! - Latency histograms
//! - Retry, circuit rejection and health check counters

use gate_models::{CircuitState, HealthStatus, ServiceId};
use metrics::{counter, gauge, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Orchestrated requests by service and outcome.
    pub const REQUESTS_TOTAL: &str = "gateway_requests_total";

    /// End-to-end request latency in seconds by service.
    pub const REQUEST_DURATION_SECONDS: &str = "gateway_request_duration_seconds";

    /// Extra attempts made after a retryable failure.
    pub const RETRIES_TOTAL: &str = "gateway_retries_total";

    /// Calls rejected by an open breaker.
    pub const CIRCUIT_REJECTIONS_TOTAL: &str = "gateway_circuit_rejections_total";

    /// Current breaker state (0 closed, 1 half-open, 2 open).
    pub const CIRCUIT_STATE: &str = "gateway_circuit_state";

    /// Health probes by service and resulting status.
    pub const HEALTH_CHECKS_TOTAL: &str = "gateway_health_checks_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record a completed orchestrated request.
pub fn record_request(service: ServiceId, outcome: &'static str, duration_secs: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "service" => service.as_str(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        names::REQUEST_DURATION_SECONDS,
        "service" => service.as_str()
    )
    .record(duration_secs);
}

/// Record retry attempts beyond the first.
pub fn record_retries(service: ServiceId, retries: u32) {
    counter!(names::RETRIES_TOTAL, "service" => service.as_str()).increment(u64::from(retries));
}

/// Record a call rejected by an open breaker.
pub fn record_circuit_rejection(service: ServiceId) {
    counter!(names::CIRCUIT_REJECTIONS_TOTAL, "service" => service.as_str()).increment(1);
}

/// Publish the current breaker state.
pub fn set_circuit_state(service: ServiceId, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    gauge!(names::CIRCUIT_STATE, "service" => service.as_str()).set(value);
}

/// Record a health probe result.
pub fn record_health_check(service: ServiceId, status: HealthStatus) {
    counter!(
        names::HEALTH_CHECKS_TOTAL,
        "service" => service.as_str(),
        "status" => status.as_str()
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================
