//! Forensic collaborator HTTP client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::counter;
use parking_lot::Mutex;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use gate_models::{Payload, ServiceId};

use crate::error::{ForensicError, ForensicResult};
use crate::patterns::CriticalPatterns;
use crate::types::{ArchitectureReview, ArchitectureReviewRequest, FailureAnalysis, FailureReport};

/// Escalations started, by service.
pub const ESCALATIONS_TOTAL: &str = "gateway_escalations_total";

const ERROR_EXCERPT_BYTES: usize = 256;

/// Configuration for the forensic client.
#[derive(Debug, Clone)]
pub struct ForensicConfig {
    /// Master switch; disabled clients never make network calls
    pub enabled: bool,
    /// Base URL of the forensic collaborator
    pub base_url: String,
    /// Timeout for each collaborator call, independent of the guard call
    pub timeout: Duration,
    /// Minimum spacing between escalations for the same service
    pub min_interval: Duration,
    /// Vocabulary that marks a failure as critical
    pub patterns: CriticalPatterns,
    /// Largest collaborator response body that will be buffered
    pub max_response_bytes: usize,
}

impl Default for ForensicConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:8090".to_string(),
            timeout: Duration::from_secs(10),
            min_interval: Duration::from_secs(30),
            patterns: CriticalPatterns::default(),
            max_response_bytes: 64 * 1024,
        }
    }
}

impl ForensicConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("FORENSICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            base_url: std::env::var("FORENSICS_URL")
                .unwrap_or_else(|_| "http://localhost:8090".to_string()),
            timeout: Duration::from_secs(
                std::env::var("FORENSICS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            min_interval: Duration::from_secs(
                std::env::var("FORENSICS_MIN_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            patterns: std::env::var("FORENSICS_CRITICAL_PATTERNS")
                .map(|list| CriticalPatterns::parse(&list))
                .unwrap_or_default(),
            max_response_bytes: std::env::var("FORENSICS_MAX_RESPONSE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64 * 1024),
        }
    }
}

/// Best-effort client for the forensic collaborator. Cheap to clone.
#[derive(Clone)]
pub struct ForensicClient {
    http: Client,
    config: Arc<ForensicConfig>,
    last_escalation: Arc<Mutex<HashMap<ServiceId, Instant>>>,
}

impl ForensicClient {
    /// Create a new forensic client.
    pub fn new(config: ForensicConfig) -> ForensicResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("gate-forensics/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
            last_escalation: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ForensicResult<Self> {
        Self::new(ForensicConfig::from_env())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn patterns(&self) -> &CriticalPatterns {
        &self.config.patterns
    }

    /// Escalate a failure if it matches the critical vocabulary.
    ///
    /// Returns immediately. The analysis runs on a detached task whose outcome
    /// is only logged; the handle is returned so callers may await it in tests.
    /// Returns `None` when disabled, not critical, or throttled.
    pub fn escalate(
        &self,
        service: ServiceId,
        error: &str,
        context: Option<Payload>,
    ) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            return None;
        }

        let matched = self.config.patterns.find_match(error)?.to_string();

        if !self.try_acquire_slot(service) {
            debug!(service = %service, "Forensic escalation throttled");
            return None;
        }

        counter!(ESCALATIONS_TOTAL, "service" => service.as_str()).increment(1);
        info!(service = %service, pattern = %matched, "Escalating critical failure for analysis");

        let report = FailureReport {
            service,
            error: error.to_string(),
            matched_pattern: Some(matched),
            context,
        };
        let client = self.clone();

        Some(tokio::spawn(async move {
            if let Some(analysis) = client.analyze_failure(&report).await {
                info!(
                    service = %report.service,
                    root_cause = %analysis.root_cause,
                    confidence = analysis.confidence,
                    steps = analysis.remediation_steps.len(),
                    "Forensic analysis received"
                );
            }
        }))
    }

    /// Request root-cause analysis. Any collaborator failure yields `None`.
    pub async fn analyze_failure(&self, report: &FailureReport) -> Option<FailureAnalysis> {
        match self.post("v1/analyze-failure", report).await {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                warn!(service = %report.service, "Forensic analysis unavailable: {}", e);
                None
            }
        }
    }

    /// Request an architecture review. Any collaborator failure yields `None`.
    pub async fn review_architecture(
        &self,
        request: &ArchitectureReviewRequest,
    ) -> Option<ArchitectureReview> {
        match self.post("v1/review-architecture", request).await {
            Ok(review) => Some(review),
            Err(e) => {
                warn!("Architecture review unavailable: {}", e);
                None
            }
        }
    }

    /// Claim the per-service escalation slot if the minimum interval has passed.
    fn try_acquire_slot(&self, service: ServiceId) -> bool {
        let mut last = self.last_escalation.lock();
        let now = Instant::now();
        match last.get(&service) {
            Some(at) if now.duration_since(*at) < self.config.min_interval => false,
            _ => {
                last.insert(service, now);
                true
            }
        }
    }

    async fn post<B, T>(&self, endpoint: &str, body: &B) -> ForensicResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if !self.config.enabled {
            return Err(ForensicError::Disabled);
        }

        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let response = self.http.post(&url).json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                ForensicError::Timeout
            } else {
                ForensicError::Network(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let (excerpt, _) = read_capped(response, ERROR_EXCERPT_BYTES).await?;
            return Err(ForensicError::RequestFailed {
                status,
                body: String::from_utf8_lossy(&excerpt).into_owned(),
            });
        }

        let limit = self.config.max_response_bytes;
        let (bytes, complete) = read_capped(response, limit).await?;
        if !complete {
            return Err(ForensicError::ResponseTooLarge { limit });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Buffer at most `limit` bytes of a body. The flag is false when the body
/// was cut short.
async fn read_capped(mut response: Response, limit: usize) -> ForensicResult<(Vec<u8>, bool)> {
    let mut buf = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if buf.len() + chunk.len() > limit {
            let remaining = limit - buf.len();
            buf.extend_from_slice(&chunk[..remaining]);
            return Ok((buf, false));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok((buf, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn enabled_config() -> ForensicConfig {
        ForensicConfig {
            enabled: true,
            min_interval: Duration::from_secs(60),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = ForensicConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_response_bytes, 64 * 1024);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("FORENSICS_ENABLED", "1");
        std::env::set_var("FORENSICS_CRITICAL_PATTERNS", "disk full,oom");
        std::env::set_var("FORENSICS_TIMEOUT_SECS", "not-a-number");
        let config = ForensicConfig::from_env();
        assert!(config.enabled);
        assert_eq!(config.patterns.patterns(), ["disk full", "oom"]);
        assert_eq!(config.timeout, Duration::from_secs(10));
        std::env::remove_var("FORENSICS_ENABLED");
        std::env::remove_var("FORENSICS_CRITICAL_PATTERNS");
        std::env::remove_var("FORENSICS_TIMEOUT_SECS");
    }

    #[tokio::test]
    async fn test_collaborator_bodies_are_capped() {
        use wiremock::matchers::path;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(path("/v1/too-big"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[".repeat(4096)))
            .mount(&server)
            .await;
        Mock::given(path("/v1/failing"))
            .respond_with(ResponseTemplate::new(500).set_body_string("e".repeat(4096)))
            .mount(&server)
            .await;

        let client = ForensicClient::new(ForensicConfig {
            base_url: server.uri(),
            max_response_bytes: 1024,
            ..enabled_config()
        })
        .unwrap();

        let err = client
            .post::<_, serde_json::Value>("v1/too-big", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ForensicError::ResponseTooLarge { limit: 1024 }));

        let err = client
            .post::<_, serde_json::Value>("v1/failing", &serde_json::json!({}))
            .await
            .unwrap_err();
        match err {
            ForensicError::RequestFailed { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), ERROR_EXCERPT_BYTES);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_disabled_client_never_escalates() {
        let client = ForensicClient::new(ForensicConfig::default()).unwrap();
        assert!(client
            .escalate(ServiceId::TrustGuard, "Circuit breaker is open for trust-guard", None)
            .is_none());
    }

    #[tokio::test]
    async fn test_non_critical_error_not_escalated() {
        let client = ForensicClient::new(enabled_config()).unwrap();
        assert!(client
            .escalate(ServiceId::TrustGuard, "Validation error: missing field", None)
            .is_none());
    }

    #[test]
    fn test_throttle_is_per_service() {
        let client = ForensicClient::new(enabled_config()).unwrap();
        assert!(client.try_acquire_slot(ServiceId::BiasGuard));
        assert!(!client.try_acquire_slot(ServiceId::BiasGuard));
        assert!(client.try_acquire_slot(ServiceId::TokenGuard));
    }
}
