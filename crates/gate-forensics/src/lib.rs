//! Forensic escalation client.
//!
//! When a guard failure looks critical (breaker open, backend unavailable,
//! authentication or connection failures) the gateway asks an external
//! diagnostic collaborator for a root-cause analysis. Escalation is detached
//! from the caller's response and never fails the call it was raised for.
//!
//! The collaborator also offers architecture reviews, used outside the request
//! path for design validation.

pub mod client;
pub mod error;
pub mod patterns;
pub mod types;

pub use client::{ForensicClient, ForensicConfig};
pub use error::{ForensicError, ForensicResult};
pub use patterns::CriticalPatterns;
pub use types::{ArchitectureReview, ArchitectureReviewRequest, FailureAnalysis, FailureReport};
