//! CodeCortex request orchestration
//!
//! The [`RequestOrchestrator`] admits a request, asks a [`ModelSelector`]
//! for a model, executes it through the provider's gateway, validates the
//! answer and feeds the outcome into a rolling performance window that
//! drives the concurrency tuner.

pub mod feedback;
pub mod metrics;
pub mod orchestrator;
pub mod performance;
pub mod retry;
pub mod selector;
pub mod validation;

pub use feedback::{FeedbackLog, RetrainingHook, RetrainingSignal, UserFeedback};
pub use metrics::{InMemoryMetricsSink, MetricsSink, NoopMetricsSink, TracingMetricsSink};
pub use orchestrator::{aggregate_responses, ActiveRequest, RequestOrchestrator};
pub use performance::{
    tune, PerformanceMetrics, PerformanceSnapshot, ResourceUsage, TunerDecision,
};
pub use retry::retry_with_backoff;
pub use selector::{cost_score, latency_score, ModelSelector, SelectionWeights, WeightedModelSelector};
pub use validation::{IssueKind, ResponseValidator, Severity, ValidationIssue, ValidationResult};
