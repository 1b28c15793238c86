//! Per-backend gateway
//!
//! A [`ProviderGateway`] wraps one [`Backend`]: it enforces the sliding-window
//! rate limit, converts shapes through its [`WireConverter`], races the call
//! against a timeout, classifies failures into [`AiError`] and estimates a
//! confidence for the answer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use codecortex_config::GatewayConfig;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{AiError, AiResult};
use crate::models::{AiRequest, AiResponse, FinishReason, ModelDescriptor, PrivacyLevel, ProviderResponse};
use crate::provider::{Backend, ProviderKind, WireConverter};
use crate::rate_limiter::SlidingWindowLimiter;

/// Rate-limited, classified access to one backend
pub struct ProviderGateway {
    backend: Arc<dyn Backend>,
    converter: WireConverter,
    limiter: Mutex<SlidingWindowLimiter>,
    timeout: Duration,
}

impl ProviderGateway {
    pub fn new(backend: Arc<dyn Backend>, config: &GatewayConfig) -> Self {
        let converter = WireConverter::for_kind(backend.kind());
        Self {
            backend,
            converter,
            limiter: Mutex::new(SlidingWindowLimiter::per_minute(config.requests_per_minute)),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Replace the kind's default converter pair
    pub fn with_converter(mut self, converter: WireConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> &str {
        self.backend.id()
    }

    pub fn kind(&self) -> ProviderKind {
        self.backend.kind()
    }

    pub fn is_local(&self) -> bool {
        self.backend.is_local()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Admissions currently inside the rate-limit window
    pub fn requests_in_window(&self) -> usize {
        self.limiter.lock().in_window()
    }

    /// Send `request` to `model` on this backend
    ///
    /// The call is raced against the gateway timeout; if the timeout wins,
    /// the backend's eventual answer is discarded.
    pub async fn process_request(
        &self,
        request: &AiRequest,
        model: &ModelDescriptor,
        cancel: &CancellationToken,
    ) -> AiResult<AiResponse> {
        if request.privacy() == PrivacyLevel::LocalOnly && !self.is_local() {
            return Err(AiError::PrivacyViolation(format!(
                "request {} is local-only but provider {} is remote",
                request.id(),
                self.id()
            )));
        }

        if cancel.is_cancelled() {
            return Err(AiError::Cancelled);
        }

        if let Err(err) = self.limiter.lock().try_acquire() {
            warn!(provider = %self.id(), request_id = %request.id(), "Rate limit window full");
            return Err(err);
        }

        let provider_request = (self.converter.to_provider_request)(request, model);
        debug!(
            provider = %self.id(),
            model = %model.model_id,
            request_id = %request.id(),
            "Sending request to backend"
        );

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.backend.send(provider_request)).await;
        let elapsed = started.elapsed();

        match outcome {
            Err(_) => {
                warn!(
                    provider = %self.id(),
                    request_id = %request.id(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Backend call timed out"
                );
                Err(AiError::Timeout(self.timeout.as_millis() as u64))
            }
            Ok(Err(failure)) => {
                let err = AiError::from(failure);
                warn!(
                    provider = %self.id(),
                    request_id = %request.id(),
                    kind = %err.kind(),
                    retryable = err.is_retryable(),
                    "Backend call failed"
                );
                Err(err)
            }
            Ok(Ok(response)) => {
                let response =
                    (self.converter.from_provider_response)(request, model, response, elapsed);
                debug!(
                    provider = %self.id(),
                    request_id = %request.id(),
                    confidence = response.confidence,
                    processing_time_ms = response.processing_time_ms,
                    "Backend call succeeded"
                );
                Ok(response)
            }
        }
    }

    /// Probe the backend, bounded by the gateway timeout
    pub async fn health_check(&self) -> AiResult<bool> {
        match tokio::time::timeout(self.timeout, self.backend.health_check()).await {
            Ok(result) => result.map_err(AiError::from),
            Err(_) => Err(AiError::Timeout(self.timeout.as_millis() as u64)),
        }
    }

    /// Models served by the backend that report non-zero availability
    pub async fn available_models(&self) -> AiResult<Vec<ModelDescriptor>> {
        let models = self.backend.list_models().await.map_err(AiError::from)?;
        Ok(models.into_iter().filter(|m| m.is_available()).collect())
    }
}

/// Heuristic confidence for a backend answer
///
/// Starts at 0.8, adjusts for the finish reason, then adds up to 0.1 for
/// answer length (saturating at 1000 characters) and up to 0.1 for the
/// completion/prompt token ratio. Clamped to `[0, 1]`.
pub fn estimate_confidence(response: &ProviderResponse) -> f64 {
    let mut confidence = 0.8;

    confidence += match response.finish_reason {
        FinishReason::Stop => 0.1,
        FinishReason::Length => -0.1,
        FinishReason::ContentFilter => -0.3,
        FinishReason::Other => 0.0,
    };

    let length = response.content.chars().count() as f64;
    confidence += (length / 1000.0 * 0.1).min(0.1);

    let prompt_tokens = response.usage.prompt_tokens as f64;
    if prompt_tokens > 0.0 {
        let ratio = response.usage.completion_tokens as f64 / prompt_tokens;
        confidence += (ratio * 0.1).min(0.1);
    }

    confidence.clamp(0.0, 1.0)
}
