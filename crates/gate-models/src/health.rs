//! Service health records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::service::ServiceId;

/// Health classification of a guard service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    /// Reachable, but only after retries
    Degraded,
    Unhealthy,
    /// Not probed yet, disabled, or unreachable
    #[default]
    Unknown,
}

impl HealthStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Latest health probe result for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub service: ServiceId,
    pub status: HealthStatus,
    /// When the last probe finished
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ServiceHealth {
    /// Initial record before the first probe completes.
    pub fn unknown(service: ServiceId) -> Self {
        Self {
            service,
            status: HealthStatus::Unknown,
            last_checked: None,
            last_error: None,
            latency_ms: None,
        }
    }

    /// Record a completed probe.
    pub fn checked(
        service: ServiceId,
        status: HealthStatus,
        latency_ms: u64,
        last_error: Option<String>,
    ) -> Self {
        Self {
            service,
            status,
            last_checked: Some(Utc::now()),
            last_error,
            latency_ms: Some(latency_ms),
        }
    }
}
