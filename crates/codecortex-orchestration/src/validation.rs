//! Response validation against quality and latency gates

use codecortex_providers::AiResponse;
use serde::{Deserialize, Serialize};

/// Area a validation issue concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Accuracy,
    Safety,
    Privacy,
    Performance,
}

/// Issue severity (ordered: `Low < Medium < High < Critical`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub description: String,
}

/// Outcome of validating one response
///
/// `is_valid` is false exactly when at least one issue is critical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Confidence of the validated response
    pub confidence: f64,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    fn from_issues(confidence: f64, issues: Vec<ValidationIssue>) -> Self {
        let is_valid = !issues.iter().any(|i| i.severity == Severity::Critical);
        Self {
            is_valid,
            confidence,
            issues,
        }
    }

    pub fn critical_issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Critical)
    }

    /// Descriptions of critical issues joined with "; "
    pub fn critical_summary(&self) -> String {
        self.critical_issues()
            .map(|i| i.description.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Applies the confidence, latency and emptiness gates
#[derive(Debug, Clone, Copy)]
pub struct ResponseValidator {
    quality_threshold: f64,
    max_response_time_ms: u64,
}

impl ResponseValidator {
    pub fn new(quality_threshold: f64, max_response_time_ms: u64) -> Self {
        Self {
            quality_threshold,
            max_response_time_ms,
        }
    }

    pub fn validate(&self, response: &AiResponse) -> ValidationResult {
        let mut issues = Vec::new();

        if response.confidence < self.quality_threshold {
            issues.push(ValidationIssue {
                kind: IssueKind::Accuracy,
                severity: Severity::Medium,
                description: format!(
                    "confidence {:.2} below threshold {:.2}",
                    response.confidence, self.quality_threshold
                ),
            });
        }

        if response.processing_time_ms > self.max_response_time_ms {
            issues.push(ValidationIssue {
                kind: IssueKind::Performance,
                severity: Severity::High,
                description: format!(
                    "response took {} ms, limit {} ms",
                    response.processing_time_ms, self.max_response_time_ms
                ),
            });
        }

        if response.result.trim().is_empty() {
            issues.push(ValidationIssue {
                kind: IssueKind::Accuracy,
                severity: Severity::Critical,
                description: "response result is empty".to_string(),
            });
        }

        ValidationResult::from_issues(response.confidence, issues)
    }
}
