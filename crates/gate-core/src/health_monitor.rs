//! Guard service health monitoring.
//!
//! Probes each enabled service's health endpoint on a fixed interval and on
//! demand. Results are advisory: they feed status reporting and never gate
//! request routing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use gate_client::{retry_async, GuardClient, GuardError, RetryConfig, RetryResult};
use gate_models::{HealthStatus, ServiceHealth, ServiceId};

use crate::metrics;
use crate::registry::{ServiceConfig, ServiceRegistry};

const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Latest health record per service.
///
/// The map is built once for every registered service; only the records
/// themselves are mutated, each under its own lock.
#[derive(Debug)]
pub struct HealthTable {
    records: HashMap<ServiceId, RwLock<ServiceHealth>>,
}

impl HealthTable {
    pub fn new(ids: impl IntoIterator<Item = ServiceId>) -> Self {
        Self {
            records: ids
                .into_iter()
                .map(|id| (id, RwLock::new(ServiceHealth::unknown(id))))
                .collect(),
        }
    }

    pub async fn get(&self, id: ServiceId) -> Option<ServiceHealth> {
        match self.records.get(&id) {
            Some(record) => Some(record.read().await.clone()),
            None => None,
        }
    }

    async fn set(&self, health: ServiceHealth) {
        if let Some(record) = self.records.get(&health.service) {
            *record.write().await = health;
        }
    }
}

pub struct HealthMonitor {
    registry: Arc<ServiceRegistry>,
    client: GuardClient,
    table: Arc<HealthTable>,
    retry_base_delay: Duration,
    retry_max_delay: Duration,
}

impl HealthMonitor {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        client: GuardClient,
        retry_base_delay: Duration,
        retry_max_delay: Duration,
    ) -> Self {
        let table = Arc::new(HealthTable::new(registry.ids()));
        Self {
            registry,
            client,
            table,
            retry_base_delay,
            retry_max_delay,
        }
    }

    pub fn table(&self) -> &Arc<HealthTable> {
        &self.table
    }

    /// Probe one service now and store the result.
    ///
    /// Returns `None` for services that are not registered.
    pub async fn check_service(&self, id: ServiceId) -> Option<ServiceHealth> {
        let config = self.registry.get(id)?;

        let health = if config.enabled {
            self.probe(config).await
        } else {
            let mut health = ServiceHealth::unknown(id);
            health.last_error = Some("service disabled".to_string());
            health
        };

        metrics::record_health_check(id, health.status);
        self.table.set(health.clone()).await;
        Some(health)
    }

    /// Probe every registered service concurrently.
    pub async fn check_all(&self) -> Vec<ServiceHealth> {
        let checks = self.registry.ids().map(|id| self.check_service(id));
        join_all(checks).await.into_iter().flatten().collect()
    }

    /// Spawn the periodic health loop. It stops when `token` is cancelled.
    pub fn spawn(
        self: Arc<Self>,
        every: Duration,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(every, token).await })
    }

    async fn run(&self, every: Duration, token: CancellationToken) {
        // `interval` panics on a zero period
        let every = every.max(MIN_INTERVAL);
        info!("Starting health monitor (interval: {:?})", every);

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // In-flight probes are abandoned on cancellation
            tokio::select! {
                _ = token.cancelled() => break,
                results = self.check_all() => {
                    let unhealthy = results
                        .iter()
                        .filter(|h| h.status != HealthStatus::Healthy)
                        .count();
                    debug!(checked = results.len(), unhealthy, "Health check cycle complete");
                }
            }
        }

        info!("Health monitor stopped");
    }

    async fn probe(&self, config: &ServiceConfig) -> ServiceHealth {
        let url = config.health_url();
        let retry = RetryConfig::new(format!("{} health", config.id))
            .with_max_attempts(config.retry_attempts)
            .with_base_delay(self.retry_base_delay)
            .with_max_delay(self.retry_max_delay);

        let start = Instant::now();
        let result = retry_async(&retry, GuardError::is_retryable, || {
            self.client.probe(&url, config.timeout)
        })
        .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            RetryResult::Success { value: code, attempts } if (200..300).contains(&code) => {
                let status = if attempts == 1 {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                };
                ServiceHealth::checked(config.id, status, latency_ms, None)
            }
            RetryResult::Success { value: code, .. } => {
                warn!(service = %config.id, status = code, "Health check returned error status");
                ServiceHealth::checked(
                    config.id,
                    HealthStatus::Unhealthy,
                    latency_ms,
                    Some(format!("HTTP {}", code)),
                )
            }
            RetryResult::Failed { error, attempts } => {
                warn!(service = %config.id, attempts, "Health check failed: {}", error);
                ServiceHealth::checked(
                    config.id,
                    HealthStatus::Unknown,
                    latency_ms,
                    Some(error.to_string()),
                )
            }
        }
    }
}
