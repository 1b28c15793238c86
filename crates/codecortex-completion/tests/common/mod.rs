#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use codecortex_config::{AppConfig, BackoffConfig, FallbackStrategy};
use codecortex_orchestration::RequestOrchestrator;
use codecortex_providers::*;

/// Backend that fails a fixed number of times before answering
pub struct FlakyBackend {
    content: String,
    failures_left: AtomicUsize,
    failure: BackendFailure,
    calls: AtomicUsize,
}

impl FlakyBackend {
    pub fn answering(content: &str) -> Self {
        Self::failing_then(0, content)
    }

    pub fn failing_then(failures: usize, content: &str) -> Self {
        Self {
            content: content.to_string(),
            failures_left: AtomicUsize::new(failures),
            failure: BackendFailure::status(503, "overloaded"),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_then(usize::MAX, "")
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FlakyBackend {
    fn id(&self) -> &str {
        "local"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn send(&self, _request: ProviderRequest) -> Result<ProviderResponse, BackendFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(self.failure.clone());
        }
        Ok(ProviderResponse {
            content: self.content.clone(),
            finish_reason: FinishReason::Stop,
            usage: ProviderUsage {
                prompt_tokens: 40,
                completion_tokens: 20,
            },
        })
    }

    async fn health_check(&self) -> Result<bool, BackendFailure> {
        Ok(true)
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, BackendFailure> {
        Ok(vec![ModelDescriptor {
            model_id: "coder".to_string(),
            provider_id: "local".to_string(),
            capabilities: vec![ModelCapability::Completion],
            cost_per_token: 0.0,
            max_tokens: 2048,
            response_time_ms: 50.0,
            accuracy: 0.9,
            availability: 1.0,
        }])
    }
}

/// Config with fast backoff so retry tests finish quickly
pub fn app_config(strategy: FallbackStrategy, retry_attempts: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.orchestrator.fallback_strategy = strategy;
    config.orchestrator.retry_attempts = retry_attempts;
    config.gateway.backoff = BackoffConfig {
        base_delay_ms: 1,
        max_delay_ms: 5,
        jitter_fraction: 0.0,
    };
    config
}

pub fn orchestrator(config: &AppConfig, backend: Arc<FlakyBackend>) -> Arc<RequestOrchestrator> {
    let mut registry = GatewayRegistry::with_config(&config.gateway);
    registry.register(Arc::new(ProviderGateway::new(backend, &config.gateway)));
    Arc::new(RequestOrchestrator::new(
        config.orchestrator.clone(),
        Arc::new(registry),
    ))
}
