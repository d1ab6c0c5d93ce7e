//! Guard service registry.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use gate_models::ServiceId;
use parking_lot::RwLock;
use tracing::info;
use url::Url;

use crate::error::{CoreResult, GatewayError};

/// Path appended to a service base URL for processing calls.
pub const PROCESS_PATH: &str = "/process";

/// Static configuration of one guard service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub id: ServiceId,
    /// Base URL, e.g. `http://trust-guard:8002`
    pub base_url: String,
    /// Health endpoint path
    pub health_path: String,
    pub enabled: bool,
    /// Default per-call timeout
    pub timeout: Duration,
    /// Total attempts per call (at least 1)
    pub retry_attempts: u32,
    /// Consecutive failures before the breaker opens
    pub cb_threshold: u32,
    pub cb_cooldown: Duration,
    /// Name of the environment variable holding the bearer credential
    pub credential_env: Option<String>,
}

impl ServiceConfig {
    /// Config with default settings for the given base URL.
    pub fn new(id: ServiceId, base_url: impl Into<String>) -> Self {
        Self {
            id,
            base_url: base_url.into(),
            health_path: "/health".to_string(),
            enabled: true,
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            cb_threshold: 5,
            cb_cooldown: Duration::from_secs(60),
            credential_env: None,
        }
    }

    /// Local development URL, one port per service in declaration order.
    pub fn default_url(id: ServiceId) -> String {
        let index = ServiceId::ALL.iter().position(|s| *s == id).unwrap_or(0);
        format!("http://localhost:{}", 8001 + index)
    }

    /// Create config from `<PREFIX>_*` environment variables.
    pub fn from_env(id: ServiceId) -> Self {
        let prefix = id.env_prefix();
        let var = |suffix: &str| std::env::var(format!("{prefix}_{suffix}")).ok();
        let parse_u64 = |suffix: &str, default: u64| {
            var(suffix).and_then(|s| s.parse().ok()).unwrap_or(default)
        };
        let parse_u32 = |suffix: &str, default: u32| {
            var(suffix).and_then(|s| s.parse().ok()).unwrap_or(default)
        };

        Self {
            id,
            base_url: var("URL").unwrap_or_else(|| Self::default_url(id)),
            health_path: var("HEALTH_PATH").unwrap_or_else(|| "/health".to_string()),
            enabled: var("ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            timeout: Duration::from_secs(parse_u64("TIMEOUT_SECS", 30)),
            retry_attempts: parse_u32("RETRY_ATTEMPTS", 3).max(1),
            cb_threshold: parse_u32("CB_THRESHOLD", 5).max(1),
            cb_cooldown: Duration::from_secs(parse_u64("CB_COOLDOWN_SECS", 60)),
            credential_env: var("CREDENTIAL_ENV").filter(|s| !s.is_empty()),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    pub fn with_circuit_breaker(mut self, threshold: u32, cooldown: Duration) -> Self {
        self.cb_threshold = threshold.max(1);
        self.cb_cooldown = cooldown;
        self
    }

    pub fn with_health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = path.into();
        self
    }

    pub fn with_credential_env(mut self, name: impl Into<String>) -> Self {
        self.credential_env = Some(name.into());
        self
    }

    pub fn process_url(&self) -> String {
        join_url(&self.base_url, PROCESS_PATH)
    }

    pub fn health_url(&self) -> String {
        join_url(&self.base_url, &self.health_path)
    }

    /// Check the base URL is an absolute http(s) URL.
    pub fn validate(&self) -> CoreResult<()> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            GatewayError::config(format!("{}: invalid base URL '{}': {}", self.id, self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GatewayError::config(format!(
                "{}: base URL must be http or https, got '{}'",
                self.id,
                url.scheme()
            )));
        }
        Ok(())
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Immutable set of configured services plus their rotatable credentials.
#[derive(Debug)]
pub struct ServiceRegistry {
    services: BTreeMap<ServiceId, ServiceConfig>,
    credentials: HashMap<ServiceId, RwLock<Option<String>>>,
}

impl ServiceRegistry {
    /// Build the registry. Rejects duplicate ids and invalid URLs.
    pub fn new(configs: Vec<ServiceConfig>) -> CoreResult<Self> {
        let mut services = BTreeMap::new();
        let mut credentials = HashMap::new();

        for config in configs {
            config.validate()?;
            let credential = config
                .credential_env
                .as_deref()
                .and_then(|name| std::env::var(name).ok())
                .filter(|s| !s.is_empty());
            credentials.insert(config.id, RwLock::new(credential));
            if services.insert(config.id, config).is_some() {
                return Err(GatewayError::config("duplicate service in registry"));
            }
        }

        info!(
            services = services.len(),
            enabled = services.values().filter(|s| s.enabled).count(),
            "Service registry loaded"
        );

        Ok(Self {
            services,
            credentials,
        })
    }

    pub fn get(&self, id: ServiceId) -> Option<&ServiceConfig> {
        self.services.get(&id)
    }

    pub fn contains(&self, id: ServiceId) -> bool {
        self.services.contains_key(&id)
    }

    /// Configured ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = ServiceId> + '_ {
        self.services.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceConfig> {
        self.services.values()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &ServiceConfig> {
        self.services.values().filter(|s| s.enabled)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Current credential for a service, if any.
    pub fn credential(&self, id: ServiceId) -> Option<String> {
        self.credentials.get(&id).and_then(|c| c.read().clone())
    }

    /// Replace a service credential. Returns false for unknown services.
    pub fn rotate_credential(&self, id: ServiceId, secret: Option<String>) -> bool {
        match self.credentials.get(&id) {
            Some(slot) => {
                *slot.write() = secret.filter(|s| !s.is_empty());
                info!(service = %id, "Service credential rotated");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_urls_follow_declaration_order() {
        assert_eq!(ServiceConfig::default_url(ServiceId::TokenGuard), "http://localhost:8001");
        assert_eq!(
            ServiceConfig::default_url(ServiceId::SecurityGuard),
            "http://localhost:8006"
        );
    }

    #[test]
    fn test_urls_are_joined_cleanly() {
        let config = ServiceConfig::new(ServiceId::BiasGuard, "http://bias:9000/")
            .with_health_path("healthz");
        assert_eq!(config.process_url(), "http://bias:9000/process");
        assert_eq!(config.health_url(), "http://bias:9000/healthz");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = ServiceConfig::new(ServiceId::BiasGuard, "not a url");
        assert!(ServiceRegistry::new(vec![config]).is_err());

        let config = ServiceConfig::new(ServiceId::BiasGuard, "ftp://bias");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_services_rejected() {
        let a = ServiceConfig::new(ServiceId::BiasGuard, "http://a");
        let b = ServiceConfig::new(ServiceId::BiasGuard, "http://b");
        assert!(ServiceRegistry::new(vec![a, b]).is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        std::env::set_var("TRUST_GUARD_URL", "http://trust:7000");
        std::env::set_var("TRUST_GUARD_ENABLED", "false");
        std::env::set_var("TRUST_GUARD_RETRY_ATTEMPTS", "0");
        std::env::set_var("TRUST_GUARD_CB_COOLDOWN_SECS", "5");

        let config = ServiceConfig::from_env(ServiceId::TrustGuard);
        assert_eq!(config.base_url, "http://trust:7000");
        assert!(!config.enabled);
        assert_eq!(config.retry_attempts, 1);
        assert_eq!(config.cb_cooldown, Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(30));

        std::env::remove_var("TRUST_GUARD_URL");
        std::env::remove_var("TRUST_GUARD_ENABLED");
        std::env::remove_var("TRUST_GUARD_RETRY_ATTEMPTS");
        std::env::remove_var("TRUST_GUARD_CB_COOLDOWN_SECS");
    }

    #[test]
    #[serial]
    fn test_credentials_resolve_and_rotate() {
        std::env::set_var("GATE_TEST_BIAS_TOKEN", "secret-1");
        let config = ServiceConfig::new(ServiceId::BiasGuard, "http://bias:9000")
            .with_credential_env("GATE_TEST_BIAS_TOKEN");
        let registry = ServiceRegistry::new(vec![config]).unwrap();
        std::env::remove_var("GATE_TEST_BIAS_TOKEN");

        assert_eq!(registry.credential(ServiceId::BiasGuard).as_deref(), Some("secret-1"));
        assert!(registry.rotate_credential(ServiceId::BiasGuard, Some("secret-2".into())));
        assert_eq!(registry.credential(ServiceId::BiasGuard).as_deref(), Some("secret-2"));
        assert!(!registry.rotate_credential(ServiceId::TokenGuard, None));
    }
}
