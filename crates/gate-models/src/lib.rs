//! Shared data models for the GuardGate gateway.
//!
//! This crate provides Serde-serializable types for:
//! - Guard service identifiers
//! - Orchestration requests and responses
//! - Service health records and circuit breaker snapshots
//! - The operational status surface

pub mod circuit;
pub mod health;
pub mod request;
pub mod response;
pub mod service;
pub mod status;

// Re-export common types
pub use circuit::{CircuitSnapshot, CircuitState};
pub use health::{HealthStatus, ServiceHealth};
pub use request::{OrchestrationRequest, Payload, MAX_REQUEST_ID_LEN};
pub use response::OrchestrationResponse;
pub use service::{ServiceId, ServiceIdError};
pub use status::{GatewayStatus, ServiceStatus};
