//! Request orchestrator.
//!
//! Owns the registry, one circuit breaker per service, the health monitor and
//! the forensic escalation client. Every call produces a structured
//! [`OrchestrationResponse`]; failures never escape as errors.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};
use validator::Validate;

use gate_client::{retry_async, GuardClient, GuardError, RetryConfig};
use gate_forensics::ForensicClient;
use gate_models::{
    GatewayStatus, OrchestrationRequest, OrchestrationResponse, Payload, ServiceHealth, ServiceId,
    ServiceStatus,
};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::GatewayConfig;
use crate::error::{CoreResult, GatewayError};
use crate::health_monitor::HealthMonitor;
use crate::logging::CallLogger;
use crate::metrics;
use crate::registry::ServiceRegistry;
use crate::transform::transform;

struct Background {
    handle: JoinHandle<()>,
    token: CancellationToken,
}

pub struct Orchestrator {
    config: GatewayConfig,
    registry: Arc<ServiceRegistry>,
    breakers: HashMap<ServiceId, CircuitBreaker>,
    monitor: Arc<HealthMonitor>,
    client: GuardClient,
    forensics: ForensicClient,
    background: Mutex<Option<Background>>,
}

impl Orchestrator {
    /// Build an orchestrator. Does not start the health loop; see [`Orchestrator::start`].
    pub fn new(config: GatewayConfig) -> CoreResult<Self> {
        let registry = Arc::new(ServiceRegistry::new(config.services.clone())?);
        let client = GuardClient::new(config.client.clone())
            .map_err(|e| GatewayError::config(format!("HTTP client: {}", e)))?;
        let forensics = ForensicClient::new(config.forensics.clone())
            .map_err(|e| GatewayError::config(format!("forensic client: {}", e)))?;

        let breakers = registry
            .iter()
            .map(|s| (s.id, CircuitBreaker::new(s.id, s.cb_threshold, s.cb_cooldown)))
            .collect();

        let monitor = Arc::new(HealthMonitor::new(
            Arc::clone(&registry),
            client.clone(),
            config.retry_base_delay,
            config.retry_max_delay,
        ));

        Ok(Self {
            config,
            registry,
            breakers,
            monitor,
            client,
            forensics,
            background: Mutex::new(None),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> CoreResult<Self> {
        Self::new(GatewayConfig::from_env())
    }

    /// Start the background health loop if enabled. Calling twice is a no-op.
    pub fn start(&self) {
        if !self.config.health_checks_enabled {
            info!("Background health checks are disabled");
            return;
        }

        let mut background = self.background.lock();
        if background.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let handle = Arc::clone(&self.monitor).spawn(self.config.health_check_interval, token.clone());
        *background = Some(Background { handle, token });
    }

    /// Stop the background health loop and wait for it. Idempotent.
    pub async fn shutdown(&self) {
        let background = self.background.lock().take();
        if let Some(Background { handle, token }) = background {
            token.cancel();
            if let Err(e) = handle.await {
                warn!("Health monitor task ended abnormally: {}", e);
            }
            info!("Orchestrator shut down");
        }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn breaker(&self, id: ServiceId) -> Option<&CircuitBreaker> {
        self.breakers.get(&id)
    }

    pub fn forensics(&self) -> &ForensicClient {
        &self.forensics
    }

    /// Process a raw JSON request.
    ///
    /// Malformed requests still produce a structured response, echoing any
    /// request id and service name that could be read.
    pub async fn process_value(&self, raw: Value) -> OrchestrationResponse {
        let request_id = raw
            .get("request_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let service = raw
            .get("service")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match parse_request(raw) {
            Ok(request) => self.process(request).await,
            Err(err) => {
                let logger = CallLogger::from_parts(&request_id, &service);
                logger.log_failure(&err, 0);
                OrchestrationResponse::failed(request_id, service, err.to_string(), 0)
            }
        }
    }

    /// Process a typed request.
    pub async fn process(&self, request: OrchestrationRequest) -> OrchestrationResponse {
        let logger = CallLogger::new(&request.request_id, request.service);
        let span = logger.create_span();

        async move {
            logger.log_start();
            let start = Instant::now();
            let outcome = self.execute(&request).await;
            let duration = start.elapsed();
            let duration_ms = duration.as_millis() as u64;

            match outcome {
                Ok(result) => {
                    metrics::record_request(request.service, "success", duration.as_secs_f64());
                    logger.log_completion(duration_ms);
                    OrchestrationResponse::ok(
                        request.request_id,
                        request.service.as_str(),
                        result,
                        duration_ms,
                    )
                }
                Err(err) => {
                    metrics::record_request(request.service, err.kind(), duration.as_secs_f64());
                    logger.log_failure(&err, duration_ms);
                    if !err.is_validation() {
                        self.escalate(&request, &err);
                    }
                    OrchestrationResponse::failed(
                        request.request_id,
                        request.service.as_str(),
                        err.to_string(),
                        duration_ms,
                    )
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, request: &OrchestrationRequest) -> CoreResult<Value> {
        validate_request(request)?;

        let service = request.service;
        let config = self
            .registry
            .get(service)
            .ok_or(GatewayError::NotConfigured(service))?;
        if !config.enabled {
            return Err(GatewayError::ServiceDisabled(service));
        }
        let breaker = self
            .breakers
            .get(&service)
            .ok_or(GatewayError::NotConfigured(service))?;

        let Some(permit) = breaker.acquire() else {
            metrics::record_circuit_rejection(service);
            return Err(GatewayError::CircuitOpen(service));
        };

        // An early return drops the permit, which frees a held trial slot
        let body = Value::Object(transform(service, &request.payload)?);

        let timeout = self
            .config
            .call_timeout(request.effective_timeout_ms(), config.timeout);
        let credential = self.registry.credential(service);
        let url = config.process_url();
        let retry = RetryConfig::new(service.as_str())
            .with_max_attempts(config.retry_attempts)
            .with_base_delay(self.config.retry_base_delay)
            .with_max_delay(self.config.retry_max_delay);

        let result = retry_async(&retry, GuardError::is_retryable, || {
            self.client.post_json(
                &url,
                &body,
                timeout,
                credential.as_deref(),
                &request.request_id,
            )
        })
        .await;

        if result.attempts() > 1 {
            metrics::record_retries(service, result.attempts() - 1);
        }

        match result.into_result() {
            Ok(value) => {
                permit.record_success();
                Ok(value)
            }
            Err(e) => {
                permit.record_failure();
                Err(e.into())
            }
        }
    }

    /// Hand a critical failure to the forensic collaborator without waiting.
    fn escalate(&self, request: &OrchestrationRequest, err: &GatewayError) {
        let mut context = Payload::new();
        context.insert("request_id".to_string(), Value::String(request.request_id.clone()));
        context.insert("error_kind".to_string(), Value::String(err.kind().to_string()));
        if let Some(trace) = &request.trace {
            context.insert("trace".to_string(), Value::Object(trace.clone()));
        }
        if let Some(breaker) = self.breakers.get(&request.service) {
            if let Ok(snapshot) = serde_json::to_value(breaker.snapshot()) {
                context.insert("circuit".to_string(), snapshot);
            }
        }

        // The handle is dropped: the analysis runs detached
        let _ = self
            .forensics
            .escalate(request.service, &err.to_string(), Some(context));
    }

    /// Probe one service now.
    pub async fn check_health(&self, id: ServiceId) -> Option<ServiceHealth> {
        self.monitor.check_service(id).await
    }

    /// Probe every service now.
    pub async fn check_all_health(&self) -> Vec<ServiceHealth> {
        self.monitor.check_all().await
    }

    /// Replace a service credential. Returns false for unknown services.
    pub fn rotate_credential(&self, id: ServiceId, secret: Option<String>) -> bool {
        self.registry.rotate_credential(id, secret)
    }

    /// Snapshot of configuration, health and breaker state for every service.
    pub async fn status(&self) -> GatewayStatus {
        let mut services = Vec::with_capacity(self.registry.len());
        for config in self.registry.iter() {
            let health = self
                .monitor
                .table()
                .get(config.id)
                .await
                .unwrap_or_else(|| ServiceHealth::unknown(config.id));
            let circuit = match self.breakers.get(&config.id) {
                Some(breaker) => breaker.snapshot(),
                None => continue,
            };
            services.push(ServiceStatus {
                service: config.id,
                enabled: config.enabled,
                health,
                circuit,
            });
        }

        GatewayStatus {
            services,
            generated_at: Utc::now(),
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if let Some(background) = self.background.get_mut().take() {
            background.token.cancel();
        }
    }
}

/// Parse a raw request, classifying failures into caller-facing validation errors.
fn parse_request(raw: Value) -> CoreResult<OrchestrationRequest> {
    let Some(object) = raw.as_object() else {
        return Err(GatewayError::validation("request must be a JSON object"));
    };

    match object.get("request_id") {
        None | Some(Value::Null) => return Err(GatewayError::MissingRequestId),
        Some(Value::String(id)) if id.trim().is_empty() => {
            return Err(GatewayError::MissingRequestId)
        }
        Some(Value::String(_)) => {}
        Some(_) => return Err(GatewayError::validation("request_id must be a string")),
    }

    match object.get("service") {
        Some(Value::String(name)) => {
            if name.parse::<ServiceId>().is_err() {
                return Err(GatewayError::UnknownService(name.clone()));
            }
        }
        _ => return Err(GatewayError::validation("service is required")),
    }

    serde_json::from_value(raw)
        .map_err(|e| GatewayError::validation(format!("malformed request: {}", e)))
}

fn validate_request(request: &OrchestrationRequest) -> CoreResult<()> {
    if request.request_id.trim().is_empty() {
        return Err(GatewayError::MissingRequestId);
    }
    request.validate().map_err(|_| {
        GatewayError::validation(format!(
            "request id exceeds {} characters",
            gate_models::MAX_REQUEST_ID_LEN
        ))
    })
}
