//! HTTP client for guard backend services.
//!
//! This crate provides:
//! - Single-attempt JSON calls and health probes against a guard backend
//! - Bounded response body reads with truncated diagnostics
//! - Error classification (transport vs. backend vs. response)
//! - Retry with capped exponential backoff

pub mod client;
pub mod error;
pub mod retry;

pub use client::{truncate_for_diagnostics, GuardClient, GuardClientConfig};
pub use error::{GuardError, GuardResult};
pub use retry::{retry_async, RetryConfig, RetryResult};
