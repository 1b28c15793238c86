//! Core configuration types
//!
//! Every section deserializes with `#[serde(default)]`, so a file only needs
//! to name the values it overrides.

use codecortex_common::{
    collect_errors, LogLevel, LogOptions, NonEmptyStringValidator, RangeValidator,
    UnitIntervalValidator, Validatable, ValidationError, Validator,
};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub orchestrator: OrchestratorConfig,
    pub gateway: GatewayConfig,
    pub ranking: RankingConfig,
    pub completion: CompletionConfig,
    pub logging: LoggingConfig,
}

/// What the completion surface does when AI assistance fails
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackStrategy {
    /// Return the AI error to the caller
    FailFast,
    /// Log and fall back to local suggestions
    #[default]
    GracefulDegradation,
    /// Retry retryable errors with backoff, then fall back to local suggestions
    BestEffort,
}

/// Request orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Admission cap on in-flight requests
    pub max_concurrent_requests: usize,
    /// Upper bound on a single backend call
    pub request_timeout_ms: u64,
    /// Caller-level retry budget (used by best-effort fallback)
    pub retry_attempts: u32,
    pub fallback_strategy: FallbackStrategy,
    /// Responses below this confidence get an accuracy issue
    pub quality_threshold: f64,
    /// Responses slower than this get a performance issue
    pub max_response_time_ms: u64,
    /// Rolling performance window capacity
    pub metrics_window: usize,
    pub tuner: TunerConfig,
    pub feedback: FeedbackConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 10,
            request_timeout_ms: 30_000,
            retry_attempts: 3,
            fallback_strategy: FallbackStrategy::default(),
            quality_threshold: 0.7,
            max_response_time_ms: 200,
            metrics_window: 1000,
            tuner: TunerConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

/// Adaptive concurrency tuner settings
///
/// The constants are tuning defaults rather than derived values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TunerConfig {
    /// No adjustment until the window holds this many samples
    pub min_samples: usize,
    /// Number of most recent samples considered
    pub window: usize,
    pub target_response_time_ms: f64,
    /// Shrink when mean latency exceeds `target * shrink_above`
    pub shrink_above: f64,
    /// Grow when mean latency is under `target * grow_below`
    pub grow_below: f64,
    /// Growth also requires the mean error rate to stay under this
    pub max_error_rate_for_growth: f64,
    /// Fractional step applied on each adjustment
    pub step: f64,
    pub min_concurrency: usize,
    pub max_concurrency: usize,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            window: 100,
            target_response_time_ms: 200.0,
            shrink_above: 1.2,
            grow_below: 0.8,
            max_error_rate_for_growth: 0.05,
            step: 0.2,
            min_concurrency: 1,
            max_concurrency: 20,
        }
    }
}

/// User feedback log settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedbackConfig {
    pub capacity: usize,
    pub window: usize,
    /// Minimum entries in the window before the retraining signal can fire
    pub min_samples: usize,
    /// Ratings strictly below this count as negative
    pub low_rating: u8,
    pub low_rating_fraction: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            capacity: 5000,
            window: 100,
            min_samples: 50,
            low_rating: 3,
            low_rating_fraction: 0.3,
        }
    }
}

/// Exponential backoff settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Upper bound of the uniform jitter, as a fraction of the delay
    pub jitter_fraction: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter_fraction: 0.1,
        }
    }
}

/// Provider gateway settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Sliding-window cap per gateway
    pub requests_per_minute: usize,
    pub timeout_ms: u64,
    pub health_check_ttl_secs: u64,
    pub health_check_timeout_ms: u64,
    pub backoff: BackoffConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            timeout_ms: 30_000,
            health_check_ttl_secs: 60,
            health_check_timeout_ms: 5000,
            backoff: BackoffConfig::default(),
        }
    }
}

/// Per-factor weights for completion ranking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankingWeights {
    pub context_match: f64,
    pub usage_frequency: f64,
    pub recency: f64,
    pub type_compatibility: f64,
    pub scope_proximity: f64,
    pub pattern_match: f64,
    pub user_preference: f64,
    pub semantic: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            context_match: 0.25,
            usage_frequency: 0.20,
            recency: 0.15,
            type_compatibility: 0.15,
            scope_proximity: 0.10,
            pattern_match: 0.10,
            user_preference: 0.03,
            semantic: 0.02,
        }
    }
}

impl RankingWeights {
    pub fn total(&self) -> f64 {
        self.context_match
            + self.usage_frequency
            + self.recency
            + self.type_compatibility
            + self.scope_proximity
            + self.pattern_match
            + self.user_preference
            + self.semantic
    }

    fn all(&self) -> [(&'static str, f64); 8] {
        [
            ("context_match", self.context_match),
            ("usage_frequency", self.usage_frequency),
            ("recency", self.recency),
            ("type_compatibility", self.type_compatibility),
            ("scope_proximity", self.scope_proximity),
            ("pattern_match", self.pattern_match),
            ("user_preference", self.user_preference),
            ("semantic", self.semantic),
        ]
    }
}

/// Completion ranking settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankingConfig {
    pub max_suggestions: usize,
    /// Symbols below this confidence are never suggested
    pub min_confidence: f64,
    /// LRU bound on learned `(symbol, completion kind)` preferences
    pub preference_capacity: usize,
    /// LRU bound on `(file, completion kind)` usage patterns
    pub usage_pattern_capacity: usize,
    /// Multiplier applied to AI confidence when merging AI suggestions
    pub ai_weight: f64,
    /// Usage count treated as the maximum when normalizing frequency
    pub usage_normalization: f64,
    /// Recency decays to its floor over this many hours
    pub recency_window_hours: f64,
    pub weights: RankingWeights,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_suggestions: 20,
            min_confidence: 0.1,
            preference_capacity: 10_000,
            usage_pattern_capacity: 1000,
            ai_weight: 0.9,
            usage_normalization: 100.0,
            recency_window_hours: 24.0,
            weights: RankingWeights::default(),
        }
    }
}

/// Completion surface settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionConfig {
    pub ai_assist_enabled: bool,
    /// Lines of context captured on each side of the cursor
    pub surrounding_lines: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            ai_assist_enabled: true,
            surrounding_lines: 10,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Subscriber options for [`codecortex_common::logging::init`]
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            level: LogLevel::parse(&self.level),
            ..LogOptions::default()
        }
    }
}

impl Validatable for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        NonEmptyStringValidator::new("logging.level").validate(self.level.as_str())?;
        if LogLevel::parse(&self.level).is_none() {
            return Err(ValidationError::InvalidValue {
                field: "logging.level".to_string(),
                message: format!("unknown level {:?}", self.level),
            });
        }
        Ok(())
    }
}

impl Validatable for OrchestratorConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let tuner = &self.tuner;
        collect_errors(vec![
            RangeValidator::positive("orchestrator.max_concurrent_requests")
                .validate(&(self.max_concurrent_requests as u64)),
            RangeValidator::positive("orchestrator.request_timeout_ms")
                .validate(&self.request_timeout_ms),
            UnitIntervalValidator::new("orchestrator.quality_threshold")
                .validate(&self.quality_threshold),
            RangeValidator::positive("orchestrator.metrics_window")
                .validate(&(self.metrics_window as u64)),
            RangeValidator::positive("orchestrator.tuner.min_concurrency")
                .validate(&(tuner.min_concurrency as u64)),
            RangeValidator::new(
                "orchestrator.tuner.max_concurrency",
                tuner.min_concurrency as u64,
                u64::MAX,
            )
            .validate(&(tuner.max_concurrency as u64)),
            UnitIntervalValidator::new("orchestrator.tuner.step").validate(&tuner.step),
            UnitIntervalValidator::new("orchestrator.feedback.low_rating_fraction")
                .validate(&self.feedback.low_rating_fraction),
            RangeValidator::positive("orchestrator.feedback.capacity")
                .validate(&(self.feedback.capacity as u64)),
        ])
    }
}

impl Validatable for GatewayConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        collect_errors(vec![
            RangeValidator::positive("gateway.requests_per_minute")
                .validate(&(self.requests_per_minute as u64)),
            RangeValidator::positive("gateway.timeout_ms").validate(&self.timeout_ms),
            RangeValidator::new(
                "gateway.backoff.max_delay_ms",
                self.backoff.base_delay_ms,
                u64::MAX,
            )
            .validate(&self.backoff.max_delay_ms),
            UnitIntervalValidator::new("gateway.backoff.jitter_fraction")
                .validate(&self.backoff.jitter_fraction),
        ])
    }
}

impl Validatable for RankingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = vec![
            RangeValidator::positive("ranking.max_suggestions")
                .validate(&(self.max_suggestions as u64)),
            UnitIntervalValidator::new("ranking.min_confidence").validate(&self.min_confidence),
            UnitIntervalValidator::new("ranking.ai_weight").validate(&self.ai_weight),
            RangeValidator::positive("ranking.preference_capacity")
                .validate(&(self.preference_capacity as u64)),
            RangeValidator::positive("ranking.usage_pattern_capacity")
                .validate(&(self.usage_pattern_capacity as u64)),
        ];
        for (name, weight) in self.weights.all() {
            if !weight.is_finite() || weight < 0.0 {
                checks.push(Err(ValidationError::InvalidValue {
                    field: format!("ranking.weights.{}", name),
                    message: "weight must be a non-negative number".to_string(),
                }));
            }
        }
        if self.weights.total() <= 0.0 {
            checks.push(Err(ValidationError::InvalidValue {
                field: "ranking.weights".to_string(),
                message: "weights must not all be zero".to_string(),
            }));
        }
        if self.usage_normalization <= 0.0 || self.recency_window_hours <= 0.0 {
            checks.push(Err(ValidationError::InvalidValue {
                field: "ranking".to_string(),
                message: "usage_normalization and recency_window_hours must be positive"
                    .to_string(),
            }));
        }
        collect_errors(checks)
    }
}

impl Validatable for AppConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        collect_errors(vec![
            self.orchestrator.validate(),
            self.gateway.validate(),
            self.ranking.validate(),
            self.logging.validate(),
        ])
    }
}

/// Configuration manager trait
pub trait ConfigManager {
    /// Load configuration
    fn load_config(&mut self) -> Result<AppConfig, crate::error::ConfigError>;
    /// Save configuration
    fn save_config(&self, config: &AppConfig) -> Result<(), crate::error::ConfigError>;
    /// Validate configuration
    fn validate_config(&self, config: &AppConfig) -> Result<(), crate::error::ConfigError>;
}
