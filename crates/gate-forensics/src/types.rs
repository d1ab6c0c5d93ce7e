//! Forensic collaborator request/response types.

use serde::{Deserialize, Serialize};

use gate_models::{Payload, ServiceId};

/// Failure submitted for root-cause analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub service: ServiceId,
    pub error: String,
    /// Phrase from the critical vocabulary that triggered escalation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Payload>,
}

/// Root-cause analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureAnalysis {
    pub root_cause: String,
    /// 0.0 - 1.0
    pub confidence: f64,
    #[serde(default)]
    pub remediation_steps: Vec<String>,
}

/// Architecture review request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectureReviewRequest {
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
}

/// Architecture review verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureReview {
    pub verdict: String,
    pub confidence: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
}
