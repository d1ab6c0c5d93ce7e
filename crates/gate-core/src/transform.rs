//! Per-service payload transforms.
//!
//! Each guard expects its own field names. A transform reads the generic
//! payload (accepting a few aliases per field), normalizes scalar types and
//! emits only the fields the target service understands. Caller metadata
//! such as `user_id` or `session_id` is never forwarded.
//!
//! Transforms are pure and deterministic: the output is a `serde_json::Map`
//! (ordered by key) built only from the input.

use gate_models::{Payload, ServiceId};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Caller metadata that is dropped before forwarding.
pub const METADATA_FIELDS: &[&str] = &[
    "user_id",
    "session_id",
    "request_id",
    "trace_id",
    "correlation_id",
];

/// A transform signature: generic payload in, service body out.
pub type TransformFn = fn(&Payload) -> Result<Payload, TransformError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("{service} requires field '{field}'")]
    MissingField {
        service: ServiceId,
        field: &'static str,
    },

    #[error("{service} field '{field}' must be {expected}")]
    InvalidField {
        service: ServiceId,
        field: &'static str,
        expected: &'static str,
    },
}

/// Look up the transform for a service.
pub fn transformer_for(service: ServiceId) -> TransformFn {
    match service {
        ServiceId::TokenGuard => token_guard,
        ServiceId::TrustGuard => trust_guard,
        ServiceId::ContextGuard => context_guard,
        ServiceId::BiasGuard => bias_guard,
        ServiceId::HealthGuard => health_guard,
        ServiceId::SecurityGuard => security_guard,
    }
}

/// Transform a payload for the given service.
pub fn transform(service: ServiceId, payload: &Payload) -> Result<Payload, TransformError> {
    let out = transformer_for(service)(payload)?;

    let stripped: Vec<&str> = METADATA_FIELDS
        .iter()
        .copied()
        .filter(|f| payload.contains_key(*f))
        .collect();
    if !stripped.is_empty() {
        debug!(service = %service, stripped = ?stripped, "Stripped caller metadata");
    }

    Ok(out)
}

fn token_guard(payload: &Payload) -> Result<Payload, TransformError> {
    Fields::new(ServiceId::TokenGuard, payload)
        .required_text("text", &["text", "content", "prompt"])?
        .optional_text("model", &["model"])?
        .optional_number("max_tokens", &["max_tokens", "token_limit"])?
        .text_or("operation", &["operation"], "analyze")?
        .finish()
}

fn trust_guard(payload: &Payload) -> Result<Payload, TransformError> {
    Fields::new(ServiceId::TrustGuard, payload)
        .required_text("validation_type", &["validation_type", "type"])?
        .required_text("content", &["content", "text"])?
        .structured("context", &["context"])?
        .optional_number("threshold", &["threshold"])?
        .finish()
}

fn context_guard(payload: &Payload) -> Result<Payload, TransformError> {
    Fields::new(ServiceId::ContextGuard, payload)
        .required_text("current_content", &["current_content", "current", "content"])?
        .required_text("previous_content", &["previous_content", "previous", "history"])?
        .structured("context", &["context"])?
        .optional_number("session_window", &["session_window"])?
        .finish()
}

fn bias_guard(payload: &Payload) -> Result<Payload, TransformError> {
    Fields::new(ServiceId::BiasGuard, payload)
        .required_text("operation", &["operation", "mode"])?
        .required_text("text", &["text", "content"])?
        .array("categories", &["categories"])?
        .finish()
}

fn health_guard(payload: &Payload) -> Result<Payload, TransformError> {
    Fields::new(ServiceId::HealthGuard, payload)
        .required_text("content", &["content", "text"])?
        .structured("metrics", &["metrics"])?
        .text_or("check_type", &["check_type"], "standard")?
        .finish()
}

fn security_guard(payload: &Payload) -> Result<Payload, TransformError> {
    Fields::new(ServiceId::SecurityGuard, payload)
        .required_text("content", &["content", "text", "input"])?
        .structured("context", &["context"])?
        .text_or("scan_type", &["scan_type"], "full")?
        .finish()
}

/// Builder that copies whitelisted fields from the generic payload.
struct Fields<'a> {
    service: ServiceId,
    source: &'a Payload,
    out: Payload,
}

impl<'a> Fields<'a> {
    fn new(service: ServiceId, source: &'a Payload) -> Self {
        Self {
            service,
            source,
            out: Payload::new(),
        }
    }

    /// First alias holding a usable value. Null and blank strings count as missing.
    fn lookup(&self, aliases: &[&str]) -> Option<&'a Value> {
        aliases
            .iter()
            .filter_map(|alias| self.source.get(*alias))
            .find(|value| match value {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
    }

    fn invalid(&self, field: &'static str, expected: &'static str) -> TransformError {
        TransformError::InvalidField {
            service: self.service,
            field,
            expected,
        }
    }

    fn scalar_text(&self, field: &'static str, value: &Value) -> Result<String, TransformError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(self.invalid(field, "a string")),
        }
    }

    fn required_text(
        mut self,
        field: &'static str,
        aliases: &[&str],
    ) -> Result<Self, TransformError> {
        let value = self.lookup(aliases).ok_or(TransformError::MissingField {
            service: self.service,
            field,
        })?;
        let text = self.scalar_text(field, value)?;
        self.out.insert(field.to_string(), Value::String(text));
        Ok(self)
    }

    fn optional_text(
        mut self,
        field: &'static str,
        aliases: &[&str],
    ) -> Result<Self, TransformError> {
        if let Some(value) = self.lookup(aliases) {
            let text = self.scalar_text(field, value)?;
            self.out.insert(field.to_string(), Value::String(text));
        }
        Ok(self)
    }

    fn text_or(
        self,
        field: &'static str,
        aliases: &[&str],
        default: &str,
    ) -> Result<Self, TransformError> {
        let mut fields = self.optional_text(field, aliases)?;
        fields
            .out
            .entry(field.to_string())
            .or_insert_with(|| Value::String(default.to_string()));
        Ok(fields)
    }

    /// Numbers pass through; numeric strings are parsed.
    fn optional_number(
        mut self,
        field: &'static str,
        aliases: &[&str],
    ) -> Result<Self, TransformError> {
        let Some(value) = self.lookup(aliases) else {
            return Ok(self);
        };
        let number = match value {
            Value::Number(_) => value.clone(),
            Value::String(s) => serde_json::from_str::<serde_json::Number>(s.trim())
                .map(Value::Number)
                .map_err(|_| self.invalid(field, "a number"))?,
            _ => return Err(self.invalid(field, "a number")),
        };
        self.out.insert(field.to_string(), number);
        Ok(self)
    }

    /// Objects pass through; a string holding a JSON object is decoded.
    fn structured(
        mut self,
        field: &'static str,
        aliases: &[&str],
    ) -> Result<Self, TransformError> {
        let Some(value) = self.lookup(aliases) else {
            return Ok(self);
        };
        let object = match value {
            Value::Object(_) => value.clone(),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(parsed @ Value::Object(_)) => parsed,
                _ => return Err(self.invalid(field, "an object")),
            },
            _ => return Err(self.invalid(field, "an object")),
        };
        self.out.insert(field.to_string(), object);
        Ok(self)
    }

    fn array(mut self, field: &'static str, aliases: &[&str]) -> Result<Self, TransformError> {
        let Some(value) = self.lookup(aliases) else {
            return Ok(self);
        };
        if !value.is_array() {
            return Err(self.invalid(field, "an array"));
        }
        self.out.insert(field.to_string(), value.clone());
        Ok(self)
    }

    fn finish(self) -> Result<Payload, TransformError> {
        Ok(self.out)
    }
}
