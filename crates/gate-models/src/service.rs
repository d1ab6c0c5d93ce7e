//! Guard service identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backend guard service kinds. The set is closed and known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum ServiceId {
    /// Token accounting and limit enforcement
    TokenGuard,
    /// Content trust validation
    TrustGuard,
    /// Conversation context consistency
    ContextGuard,
    /// Bias detection
    BiasGuard,
    /// Health/metrics content validation
    HealthGuard,
    /// Security scanning (injection, secrets)
    SecurityGuard,
}

/// Error returned when parsing an unknown service name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown service: {0}")]
pub struct ServiceIdError(pub String);

impl ServiceId {
    /// All known services, in declaration order.
    pub const ALL: [ServiceId; 6] = [
        ServiceId::TokenGuard,
        ServiceId::TrustGuard,
        ServiceId::ContextGuard,
        ServiceId::BiasGuard,
        ServiceId::HealthGuard,
        ServiceId::SecurityGuard,
    ];

    /// Get string representation of the service.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::TokenGuard => "token-guard",
            ServiceId::TrustGuard => "trust-guard",
            ServiceId::ContextGuard => "context-guard",
            ServiceId::BiasGuard => "bias-guard",
            ServiceId::HealthGuard => "health-guard",
            ServiceId::SecurityGuard => "security-guard",
        }
    }

    /// Prefix used for this service's environment variables, e.g. `TRUST_GUARD`.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            ServiceId::TokenGuard => "TOKEN_GUARD",
            ServiceId::TrustGuard => "TRUST_GUARD",
            ServiceId::ContextGuard => "CONTEXT_GUARD",
            ServiceId::BiasGuard => "BIAS_GUARD",
            ServiceId::HealthGuard => "HEALTH_GUARD",
            ServiceId::SecurityGuard => "SECURITY_GUARD",
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ServiceId {
    type Err = ServiceIdError;

    /// Accepts kebab-case and snake_case names, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        ServiceId::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| ServiceIdError(s.to_string()))
    }
}

impl TryFrom<String> for ServiceId {
    type Error = ServiceIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
