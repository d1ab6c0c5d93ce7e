//! Operational status surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::circuit::CircuitSnapshot;
use crate::health::ServiceHealth;
use crate::service::ServiceId;

/// Health and breaker state for one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub service: ServiceId,
    pub enabled: bool,
    pub health: ServiceHealth,
    pub circuit: CircuitSnapshot,
}

/// Status of every configured service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayStatus {
    pub services: Vec<ServiceStatus>,
    pub generated_at: DateTime<Utc>,
}

impl GatewayStatus {
    /// Look up one service's entry.
    pub fn service(&self, id: ServiceId) -> Option<&ServiceStatus> {
        self.services.iter().find(|s| s.service == id)
    }
}
