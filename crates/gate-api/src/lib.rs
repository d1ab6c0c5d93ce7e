//! Axum HTTP surface for the gateway.
//!
//! This crate provides:
//! - The orchestration endpoint
//! - Status and on-demand health endpoints
//! - Request id, logging and CORS middleware
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
