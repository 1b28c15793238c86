//! Error taxonomy shared by gateways and the orchestrator
//!
//! The set of [`AiError`] variants is closed. Each one carries a retryable
//! flag that callers use to decide whether to back off and try again; the
//! core itself never retries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while routing a request to an AI backend
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AiError {
    /// Request is malformed or rejected by the backend as such
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No model can serve the request, or the backend is down
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Local sliding window or backend quota exhausted
    #[error("Rate limit exceeded{}", retry_hint(.retry_after_ms))]
    RateLimitExceeded { retry_after_ms: Option<u64> },

    /// The backend answered, but the answer failed validation
    #[error("Quality threshold not met: {0}")]
    QualityThresholdNotMet(String),

    /// Request privacy level forbids the chosen backend
    #[error("Privacy violation: {0}")]
    PrivacyViolation(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Authentication failed (never includes key details)
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Admission control rejected the request
    #[error("Insufficient resources: {active} requests in flight, limit {limit}")]
    InsufficientResources { active: usize, limit: usize },

    /// Caller cancelled before the backend call was issued
    #[error("Request cancelled")]
    Cancelled,
}

fn retry_hint(retry_after_ms: &Option<u64>) -> String {
    match retry_after_ms {
        Some(ms) => format!(", retry after {} ms", ms),
        None => String::new(),
    }
}

/// Discriminant of [`AiError`], used for logging and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    ModelUnavailable,
    RateLimitExceeded,
    QualityThresholdNotMet,
    PrivacyViolation,
    NetworkError,
    Timeout,
    AuthenticationFailed,
    InsufficientResources,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::QualityThresholdNotMet => "quality_threshold_not_met",
            ErrorKind::PrivacyViolation => "privacy_violation",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::AuthenticationFailed => "authentication_failed",
            ErrorKind::InsufficientResources => "insufficient_resources",
            ErrorKind::Cancelled => "cancelled",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::ModelUnavailable
            | ErrorKind::RateLimitExceeded
            | ErrorKind::QualityThresholdNotMet
            | ErrorKind::NetworkError
            | ErrorKind::Timeout
            | ErrorKind::InsufficientResources => true,
            ErrorKind::InvalidRequest
            | ErrorKind::PrivacyViolation
            | ErrorKind::AuthenticationFailed
            | ErrorKind::Cancelled => false,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AiError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            AiError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            AiError::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            AiError::QualityThresholdNotMet(_) => ErrorKind::QualityThresholdNotMet,
            AiError::PrivacyViolation(_) => ErrorKind::PrivacyViolation,
            AiError::NetworkError(_) => ErrorKind::NetworkError,
            AiError::Timeout(_) => ErrorKind::Timeout,
            AiError::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            AiError::InsufficientResources { .. } => ErrorKind::InsufficientResources,
            AiError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether a caller may retry (after backoff)
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Result type alias for gateway and orchestration operations
pub type AiResult<T> = Result<T, AiError>;

/// Raw failure reported by a backend adapter, before classification
#[derive(Debug, Clone, PartialEq)]
pub enum BackendFailure {
    /// The backend answered with an HTTP-like status code
    Status {
        code: u16,
        message: String,
        retry_after_ms: Option<u64>,
    },
    /// The backend did not answer in time
    Timeout { elapsed_ms: u64 },
    /// The connection could not be established
    ConnectionRefused(String),
    /// Any other transport failure
    Transport(String),
}

impl BackendFailure {
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        BackendFailure::Status {
            code,
            message: message.into(),
            retry_after_ms: None,
        }
    }
}

impl From<BackendFailure> for AiError {
    fn from(failure: BackendFailure) -> Self {
        match failure {
            BackendFailure::Status {
                code,
                message,
                retry_after_ms,
            } => match code {
                401 | 403 => AiError::AuthenticationFailed,
                429 => AiError::RateLimitExceeded { retry_after_ms },
                400 => AiError::InvalidRequest(message),
                500..=599 => AiError::ModelUnavailable(format!("backend status {}: {}", code, message)),
                402..=499 => AiError::InvalidRequest(format!("backend status {}: {}", code, message)),
                _ => AiError::NetworkError(format!("unexpected status {}: {}", code, message)),
            },
            BackendFailure::Timeout { elapsed_ms } => AiError::Timeout(elapsed_ms),
            BackendFailure::ConnectionRefused(message) => {
                AiError::NetworkError(format!("connection refused: {}", message))
            }
            BackendFailure::Transport(message) => AiError::NetworkError(message),
        }
    }
}
