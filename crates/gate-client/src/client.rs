//! Guard backend HTTP client.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GuardError, GuardResult};

/// Configuration for the guard client.
#[derive(Debug, Clone)]
pub struct GuardClientConfig {
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Largest response body accepted from a backend
    pub max_response_bytes: usize,
    /// Longest body excerpt carried in error text
    pub diagnostic_cap: usize,
}

impl Default for GuardClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            max_response_bytes: 1024 * 1024, // 1 MiB
            diagnostic_cap: 512,
        }
    }
}

/// Client shared by every guard service; per-call timeouts come from the caller.
#[derive(Debug, Clone)]
pub struct GuardClient {
    http: Client,
    config: GuardClientConfig,
}

impl GuardClient {
    /// Create a new guard client.
    pub fn new(config: GuardClientConfig) -> GuardResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("gate-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GuardError::Network)?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GuardClientConfig {
        &self.config
    }

    /// POST a JSON body and parse the JSON response. Single attempt.
    pub async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
        credential: Option<&str>,
        request_id: &str,
    ) -> GuardResult<Value> {
        let timeout_ms = timeout.as_millis() as u64;
        debug!(url = %url, request_id = %request_id, timeout_ms, "Sending guard request");

        let mut builder = self
            .http
            .post(url)
            .timeout(timeout)
            .header("X-Request-ID", request_id)
            .json(body);
        if let Some(token) = credential {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GuardError::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        let bytes = self.read_body_bounded(response, timeout_ms).await?;

        if !status.is_success() {
            let body = truncate_for_diagnostics(&bytes, self.config.diagnostic_cap);
            warn!(url = %url, status = status.as_u16(), "Guard returned error status");
            return Err(GuardError::from_http_status(status.as_u16(), body));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            GuardError::InvalidResponse(format!(
                "{}: {}",
                e,
                truncate_for_diagnostics(&bytes, self.config.diagnostic_cap)
            ))
        })
    }

    /// GET a health endpoint and return its status code. Single attempt.
    pub async fn probe(&self, url: &str, timeout: Duration) -> GuardResult<u16> {
        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| GuardError::from_reqwest(e, timeout.as_millis() as u64))?;

        Ok(response.status().as_u16())
    }

    /// Read a response body without ever buffering more than the configured limit.
    async fn read_body_bounded(&self, mut response: Response, timeout_ms: u64) -> GuardResult<Vec<u8>> {
        let limit = self.config.max_response_bytes;
        let cap = self.config.diagnostic_cap;

        // A declared oversize body only needs enough bytes for the preview.
        let declared_too_large = response
            .content_length()
            .is_some_and(|len| len as usize > limit);
        let stop_at = if declared_too_large { cap.min(limit) } else { limit };

        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| GuardError::from_reqwest(e, timeout_ms))?
        {
            if buf.len() + chunk.len() > stop_at {
                let remaining = stop_at - buf.len();
                buf.extend_from_slice(&chunk[..remaining]);
                return Err(GuardError::ResponseTooLarge {
                    limit,
                    preview: truncate_for_diagnostics(&buf, cap),
                });
            }
            buf.extend_from_slice(&chunk);
        }

        if declared_too_large {
            return Err(GuardError::ResponseTooLarge {
                limit,
                preview: truncate_for_diagnostics(&buf, cap),
            });
        }

        Ok(buf)
    }
}

/// Lossy UTF-8 excerpt of at most `cap` bytes.
pub fn truncate_for_diagnostics(bytes: &[u8], cap: usize) -> String {
    let text = String::from_utf8_lossy(&bytes[..bytes.len().min(cap)]);
    let mut end = text.len().min(cap);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
