//! Guard orchestration core.
//!
//! This crate provides:
//! - Service registry and environment configuration
//! - Per-service circuit breakers
//! - Per-service payload transforms
//! - Background and on-demand health monitoring
//! - The request orchestrator tying them together

pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod health_monitor;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod registry;
pub mod transform;

pub use circuit_breaker::{CallPermit, CircuitBreaker};
pub use config::GatewayConfig;
pub use error::{CoreResult, GatewayError};
pub use health_monitor::{HealthMonitor, HealthTable};
pub use orchestrator::Orchestrator;
pub use registry::{ServiceConfig, ServiceRegistry, PROCESS_PATH};
pub use transform::{transform, transformer_for, TransformError, METADATA_FIELDS};
