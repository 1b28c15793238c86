//! Request orchestrator
//!
//! Admission control, model routing, gateway execution, response validation,
//! performance tracking and adaptive concurrency for AI requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use codecortex_common::BoundedBuffer;
use codecortex_config::OrchestratorConfig;
use codecortex_providers::{
    AiError, AiRequest, AiResponse, AiResult, GatewayRegistry, ModelDescriptor, ModelSelection,
    Priority, RequestType, TokenUsage,
};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::feedback::{FeedbackLog, RetrainingHook, RetrainingSignal, UserFeedback};
use crate::metrics::{MetricsSink, TracingMetricsSink};
use crate::performance::{
    tune, PerformanceMetrics, PerformanceSnapshot, ResourceUsage, TunerDecision,
};
use crate::selector::{ModelSelector, WeightedModelSelector};
use crate::validation::{ResponseValidator, ValidationResult};

/// Bookkeeping for a request that has been admitted
#[derive(Debug, Clone)]
pub struct ActiveRequest {
    pub request_type: RequestType,
    pub priority: Priority,
    pub started_at: Instant,
}

type ActiveMap = Mutex<HashMap<String, ActiveRequest>>;

/// Removes the in-flight entry when dropped
struct AdmissionGuard<'a> {
    active: &'a ActiveMap,
    id: String,
}

impl Drop for AdmissionGuard<'_> {
    fn drop(&mut self) {
        self.active.lock().remove(&self.id);
    }
}

/// Routes requests to models and keeps the system inside its latency budget
pub struct RequestOrchestrator {
    config: OrchestratorConfig,
    registry: Arc<GatewayRegistry>,
    selector: Arc<dyn ModelSelector>,
    validator: ResponseValidator,
    active: ActiveMap,
    max_concurrent: AtomicUsize,
    metrics: BoundedBuffer<PerformanceMetrics>,
    feedback: FeedbackLog,
    sink: Arc<dyn MetricsSink>,
}

impl RequestOrchestrator {
    /// Creates an orchestrator that selects among the registry's models
    ///
    /// # Arguments
    ///
    /// * `config` - Admission, validation and tuner settings
    /// * `registry` - Gateways keyed by provider id
    pub fn new(config: OrchestratorConfig, registry: Arc<GatewayRegistry>) -> Self {
        let selector = Arc::new(WeightedModelSelector::new(registry.clone()));
        info!(
            max_concurrent_requests = config.max_concurrent_requests,
            providers = registry.len(),
            "Creating RequestOrchestrator"
        );
        Self {
            validator: ResponseValidator::new(config.quality_threshold, config.max_response_time_ms),
            max_concurrent: AtomicUsize::new(config.max_concurrent_requests),
            metrics: BoundedBuffer::new(config.metrics_window),
            feedback: FeedbackLog::new(config.feedback.clone()),
            sink: Arc::new(TracingMetricsSink),
            config,
            registry,
            selector,
            active: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_selector(mut self, selector: Arc<dyn ModelSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_retraining_hook(mut self, hook: RetrainingHook) -> Self {
        self.feedback.set_hook(hook);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Processes one request end to end
    ///
    /// Every outcome, success or failure, is tracked as a performance sample
    /// and followed by a tuner pass. The orchestrator never retries.
    ///
    /// # Arguments
    ///
    /// * `request` - The request to serve
    /// * `cancel` - Polled before model selection and before the backend call
    ///
    /// # Returns
    ///
    /// The validated response, or the classified error
    pub async fn process_request(
        &self,
        request: &AiRequest,
        cancel: &CancellationToken,
    ) -> AiResult<AiResponse> {
        let started = Instant::now();
        let outcome = self.execute(request, cancel).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let usage = self.resource_usage();

        match &outcome {
            Ok(response) => {
                debug!(
                    request_id = %request.id(),
                    model = %response.model_used,
                    processing_time_ms = elapsed_ms as u64,
                    "Request completed"
                );
                self.track_performance_metrics(PerformanceMetrics::success(
                    elapsed_ms,
                    response.confidence,
                    usage,
                ));
            }
            Err(err) => {
                error!(
                    request_id = %request.id(),
                    kind = %err.kind(),
                    processing_time_ms = elapsed_ms as u64,
                    retryable = err.is_retryable(),
                    error = %err,
                    "Request failed"
                );
                self.track_performance_metrics(PerformanceMetrics::failure(elapsed_ms, usage));
            }
        }

        self.optimize_resource_allocation();
        outcome
    }

    async fn execute(&self, request: &AiRequest, cancel: &CancellationToken) -> AiResult<AiResponse> {
        validate_request(request)?;
        let _guard = self.admit(request)?;

        // Routing and the backend call share one deadline
        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        let response = tokio::time::timeout(timeout, self.route_and_call(request, cancel))
            .await
            .map_err(|_| AiError::Timeout(self.config.request_timeout_ms))??;

        let validation = self.validate_response(&response);
        if !validation.is_valid {
            return Err(AiError::QualityThresholdNotMet(validation.critical_summary()));
        }
        for issue in &validation.issues {
            warn!(
                request_id = %request.id(),
                kind = ?issue.kind,
                severity = ?issue.severity,
                "{}",
                issue.description
            );
        }
        Ok(response)
    }

    async fn route_and_call(
        &self,
        request: &AiRequest,
        cancel: &CancellationToken,
    ) -> AiResult<AiResponse> {
        if cancel.is_cancelled() {
            return Err(AiError::Cancelled);
        }
        let (selection, model) = self.route(request).await?;

        if cancel.is_cancelled() {
            return Err(AiError::Cancelled);
        }
        let gateway = self.registry.get(&selection.provider_id)?;
        gateway.process_request(request, &model, cancel).await
    }

    /// Checks the cap and inserts under one lock
    fn admit(&self, request: &AiRequest) -> AiResult<AdmissionGuard<'_>> {
        let mut active = self.active.lock();
        let limit = self.max_concurrent.load(Ordering::SeqCst);
        if active.len() >= limit {
            return Err(AiError::InsufficientResources {
                active: active.len(),
                limit,
            });
        }
        if active.contains_key(request.id()) {
            return Err(AiError::InvalidRequest(format!(
                "request {} is already in flight",
                request.id()
            )));
        }
        active.insert(
            request.id().to_string(),
            ActiveRequest {
                request_type: request.request_type(),
                priority: request.priority(),
                started_at: Instant::now(),
            },
        );
        Ok(AdmissionGuard {
            active: &self.active,
            id: request.id().to_string(),
        })
    }

    /// Picks the model that should serve `request`
    pub async fn route_to_optimal_model(&self, request: &AiRequest) -> AiResult<ModelSelection> {
        self.route(request).await.map(|(selection, _)| selection)
    }

    async fn route(&self, request: &AiRequest) -> AiResult<(ModelSelection, ModelDescriptor)> {
        let models = self.selector.available_models().await;
        if models.is_empty() {
            return Err(AiError::ModelUnavailable(
                "no models are currently available".to_string(),
            ));
        }

        let selection = self.selector.select_from(request, &models)?;
        let model = models
            .into_iter()
            .find(|m| m.model_id == selection.model_id && m.provider_id == selection.provider_id)
            .ok_or_else(|| {
                AiError::ModelUnavailable(format!("selected model {} is not listed", selection.model_id))
            })?;

        info!(
            request_id = %request.id(),
            model = %selection.model_id,
            provider = %selection.provider_id,
            confidence = selection.confidence,
            estimated_cost = selection.estimated_cost,
            estimated_latency_ms = selection.estimated_latency_ms,
            "Routed request"
        );
        Ok((selection, model))
    }

    /// Combines several responses to the same request into one
    ///
    /// Confidence is averaged, processing time is the maximum and token
    /// usage is summed. Identity and result come from the response with the
    /// best confidence per millisecond; the earliest wins ties.
    pub fn aggregate_responses(&self, responses: &[AiResponse]) -> AiResult<AiResponse> {
        aggregate_responses(responses)
    }

    pub fn validate_response(&self, response: &AiResponse) -> ValidationResult {
        self.validator.validate(response)
    }

    /// Appends a sample to the rolling window and forwards it to the sink
    pub fn track_performance_metrics(&self, metrics: PerformanceMetrics) {
        self.sink.record_metric("response_time", metrics.response_time_ms);
        self.sink.record_metric("throughput", metrics.throughput);
        self.sink.record_metric("error_rate", metrics.error_rate);
        self.sink
            .record_metric("user_satisfaction", metrics.user_satisfaction);
        self.metrics.push(metrics);
    }

    /// Runs one tuner pass over the recent window
    pub fn optimize_resource_allocation(&self) -> TunerDecision {
        let tuner = &self.config.tuner;
        let current = self.max_concurrent.load(Ordering::SeqCst);
        let recent = self.metrics.recent(tuner.window);
        let decision = tune(current, self.metrics.len(), &recent, tuner);

        match decision {
            TunerDecision::Shrink(next) | TunerDecision::Grow(next) => {
                self.max_concurrent.store(next, Ordering::SeqCst);
                info!(from = current, to = next, "Adjusted max concurrent requests");
            }
            TunerDecision::Hold => {}
        }
        decision
    }

    /// Records feedback and returns the retraining signal if one fired
    pub fn record_user_feedback(&self, feedback: UserFeedback) -> AiResult<Option<RetrainingSignal>> {
        self.feedback.record(feedback)
    }

    pub fn active_request_count(&self) -> usize {
        self.active.lock().len()
    }

    pub fn active_requests(&self) -> Vec<(String, ActiveRequest)> {
        self.active
            .lock()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect()
    }

    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }

    pub fn performance_snapshot(&self) -> PerformanceSnapshot {
        PerformanceSnapshot::from_samples(&self.metrics.recent(self.config.tuner.window))
    }

    pub fn recent_metrics(&self, n: usize) -> Vec<PerformanceMetrics> {
        self.metrics.recent(n)
    }

    pub fn recent_feedback(&self, n: usize) -> Vec<UserFeedback> {
        self.feedback.recent(n)
    }

    fn resource_usage(&self) -> ResourceUsage {
        ResourceUsage {
            active_requests: self.active_request_count(),
            max_concurrent_requests: self.max_concurrent_requests(),
        }
    }
}

fn validate_request(request: &AiRequest) -> AiResult<()> {
    if request.id().trim().is_empty() {
        return Err(AiError::InvalidRequest("request id is empty".to_string()));
    }
    if request.context().is_null() {
        return Err(AiError::InvalidRequest(format!(
            "request {} has no project context",
            request.id()
        )));
    }
    Ok(())
}

/// See [`RequestOrchestrator::aggregate_responses`]
pub fn aggregate_responses(responses: &[AiResponse]) -> AiResult<AiResponse> {
    let (first, rest) = responses
        .split_first()
        .ok_or_else(|| AiError::InvalidRequest("no responses to aggregate".to_string()))?;
    if rest.is_empty() {
        return Ok(first.clone());
    }

    let efficiency = |r: &AiResponse| r.confidence / r.processing_time_ms.max(1) as f64;
    let mut representative = first;
    for candidate in rest {
        if efficiency(candidate) > efficiency(representative) {
            representative = candidate;
        }
    }

    let count = responses.len() as f64;
    let usage = responses.iter().fold(
        TokenUsage {
            cost: Some(0.0),
            ..TokenUsage::default()
        },
        |acc, r| TokenUsage {
            prompt_tokens: acc.prompt_tokens.saturating_add(r.usage.prompt_tokens),
            completion_tokens: acc
                .completion_tokens
                .saturating_add(r.usage.completion_tokens),
            total_tokens: acc.total_tokens.saturating_add(r.usage.total_tokens),
            cost: Some(acc.cost.unwrap_or(0.0) + r.usage.cost.unwrap_or(0.0)),
        },
    );

    Ok(AiResponse {
        id: representative.id.clone(),
        request_id: representative.request_id.clone(),
        result: representative.result.clone(),
        confidence: responses.iter().map(|r| r.confidence).sum::<f64>() / count,
        model_used: representative.model_used.clone(),
        processing_time_ms: responses
            .iter()
            .map(|r| r.processing_time_ms)
            .max()
            .unwrap_or(0),
        usage,
    })
}
