//! Gateway configuration.

use std::time::Duration;

use gate_client::GuardClientConfig;
use gate_forensics::ForensicConfig;
use gate_models::ServiceId;

use crate::registry::ServiceConfig;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Guard services to register
    pub services: Vec<ServiceConfig>,
    /// Background health check interval
    pub health_check_interval: Duration,
    /// Whether the background health loop runs at all
    pub health_checks_enabled: bool,
    /// Base delay for retry backoff
    pub retry_base_delay: Duration,
    /// Cap for retry backoff
    pub retry_max_delay: Duration,
    /// Ceiling for a caller-supplied per-request timeout
    pub max_call_timeout: Duration,
    /// Shared HTTP client settings
    pub client: GuardClientConfig,
    /// Forensic escalation settings
    pub forensics: ForensicConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            services: ServiceId::ALL
                .into_iter()
                .map(|id| ServiceConfig::new(id, ServiceConfig::default_url(id)))
                .collect(),
            health_check_interval: Duration::from_secs(30),
            health_checks_enabled: true,
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(2),
            max_call_timeout: Duration::from_secs(120),
            client: GuardClientConfig::default(),
            forensics: ForensicConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let env_u64 = |name: &str| std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok());

        Self {
            services: ServiceId::ALL.into_iter().map(ServiceConfig::from_env).collect(),
            health_check_interval: env_u64("GATEWAY_HEALTH_CHECK_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.health_check_interval),
            health_checks_enabled: !std::env::var("GATEWAY_DISABLE_HEALTH_CHECKS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            retry_base_delay: env_u64("GATEWAY_RETRY_BASE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            retry_max_delay: env_u64("GATEWAY_RETRY_MAX_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_max_delay),
            max_call_timeout: env_u64("GATEWAY_MAX_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_call_timeout),
            client: GuardClientConfig {
                max_response_bytes: env_u64("GATEWAY_MAX_RESPONSE_BYTES")
                    .map(|n| n as usize)
                    .unwrap_or(defaults.client.max_response_bytes),
                diagnostic_cap: env_u64("GATEWAY_DIAGNOSTIC_CAP")
                    .map(|n| n as usize)
                    .unwrap_or(defaults.client.diagnostic_cap),
                ..defaults.client
            },
            forensics: ForensicConfig::from_env(),
        }
    }

    /// Replace the service list.
    pub fn with_services(mut self, services: Vec<ServiceConfig>) -> Self {
        self.services = services;
        self
    }

    /// Toggle the health loop. A zero interval keeps the current one.
    pub fn with_health_checks(mut self, enabled: bool, interval: Duration) -> Self {
        self.health_checks_enabled = enabled;
        if !interval.is_zero() {
            self.health_check_interval = interval;
        }
        self
    }

    pub fn with_retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.retry_base_delay = base;
        self.retry_max_delay = max;
        self
    }

    /// Set the ceiling for per-request timeout overrides. Zero is ignored.
    pub fn with_max_call_timeout(mut self, ceiling: Duration) -> Self {
        if !ceiling.is_zero() {
            self.max_call_timeout = ceiling;
        }
        self
    }

    /// Timeout for one outbound call: the caller's override capped at
    /// `max_call_timeout`, or the service default.
    pub fn call_timeout(&self, override_ms: Option<u64>, service_default: Duration) -> Duration {
        match override_ms {
            Some(ms) => Duration::from_millis(ms).min(self.max_call_timeout),
            None => service_default,
        }
    }

    pub fn with_client(mut self, client: GuardClientConfig) -> Self {
        self.client = client;
        self
    }

    pub fn with_forensics(mut self, forensics: ForensicConfig) -> Self {
        self.forensics = forensics;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_registers_every_service() {
        let config = GatewayConfig::default();
        assert_eq!(config.services.len(), ServiceId::ALL.len());
        assert!(config.health_checks_enabled);
        assert_eq!(config.client.max_response_bytes, 1024 * 1024);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("GATEWAY_HEALTH_CHECK_INTERVAL_SECS", "5");
        std::env::set_var("GATEWAY_DISABLE_HEALTH_CHECKS", "true");
        std::env::set_var("GATEWAY_MAX_RESPONSE_BYTES", "2048");
        std::env::set_var("GATEWAY_RETRY_BASE_MS", "invalid");
        std::env::set_var("GATEWAY_MAX_TIMEOUT_MS", "45000");

        let config = GatewayConfig::from_env();
        assert_eq!(config.health_check_interval, Duration::from_secs(5));
        assert!(!config.health_checks_enabled);
        assert_eq!(config.client.max_response_bytes, 2048);
        assert_eq!(config.client.diagnostic_cap, 512);
        assert_eq!(config.retry_base_delay, Duration::from_millis(100));
        assert_eq!(config.max_call_timeout, Duration::from_secs(45));

        std::env::set_var("GATEWAY_MAX_TIMEOUT_MS", "0");
        assert_eq!(GatewayConfig::from_env().max_call_timeout, Duration::from_secs(120));

        std::env::remove_var("GATEWAY_HEALTH_CHECK_INTERVAL_SECS");
        std::env::remove_var("GATEWAY_DISABLE_HEALTH_CHECKS");
        std::env::remove_var("GATEWAY_MAX_RESPONSE_BYTES");
        std::env::remove_var("GATEWAY_RETRY_BASE_MS");
        std::env::remove_var("GATEWAY_MAX_TIMEOUT_MS");
    }

    #[test]
    fn test_zero_health_interval_is_ignored() {
        let config = GatewayConfig::default().with_health_checks(true, Duration::ZERO);
        assert!(config.health_checks_enabled);
        assert_eq!(config.health_check_interval, Duration::from_secs(30));

        let config = config
            .with_health_checks(true, Duration::from_secs(5))
            .with_health_checks(false, Duration::ZERO);
        assert!(!config.health_checks_enabled);
        assert_eq!(config.health_check_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_call_timeout_override_is_capped() {
        let config = GatewayConfig::default().with_max_call_timeout(Duration::from_secs(10));
        let service_default = Duration::from_secs(30);

        assert_eq!(config.call_timeout(None, service_default), service_default);
        assert_eq!(
            config.call_timeout(Some(250), service_default),
            Duration::from_millis(250)
        );
        assert_eq!(
            config.call_timeout(Some(i64::MAX as u64), service_default),
            Duration::from_secs(10)
        );
        assert_eq!(
            config.call_timeout(Some(60_000), service_default),
            Duration::from_secs(10)
        );
    }
}
