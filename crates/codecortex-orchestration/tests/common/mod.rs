#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use codecortex_config::GatewayConfig;
use codecortex_providers::*;

/// In-process backend with a fixed answer and model list
pub struct MockBackend {
    pub id: String,
    pub kind: ProviderKind,
    pub content: String,
    pub delay: Duration,
    pub list_delay: Duration,
    pub failure: Option<BackendFailure>,
    pub models: Vec<ModelDescriptor>,
    pub calls: AtomicUsize,
}

impl MockBackend {
    pub fn new(id: &str, kind: ProviderKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            content: "fn main() {}".to_string(),
            delay: Duration::ZERO,
            list_delay: Duration::ZERO,
            failure: None,
            models: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_model(mut self, model: ModelDescriptor) -> Self {
        self.models.push(model);
        self
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Stall model listing, as a backend with a wedged catalog endpoint would
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    pub fn with_failure(mut self, failure: BackendFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn send(&self, _request: ProviderRequest) -> Result<ProviderResponse, BackendFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok(ProviderResponse {
            content: self.content.clone(),
            finish_reason: FinishReason::Stop,
            usage: ProviderUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
            },
        })
    }

    async fn health_check(&self) -> Result<bool, BackendFailure> {
        Ok(true)
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, BackendFailure> {
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }
        Ok(self.models.clone())
    }
}

pub fn model(
    provider: &str,
    id: &str,
    capabilities: Vec<ModelCapability>,
    accuracy: f64,
    response_time_ms: f64,
    cost_per_token: f64,
) -> ModelDescriptor {
    ModelDescriptor {
        model_id: id.to_string(),
        provider_id: provider.to_string(),
        capabilities,
        cost_per_token,
        max_tokens: 2048,
        response_time_ms,
        accuracy,
        availability: 1.0,
    }
}

pub fn completion_model(provider: &str, id: &str) -> ModelDescriptor {
    model(provider, id, vec![ModelCapability::Completion], 0.9, 100.0, 0.00001)
}

pub fn registry(backends: Vec<Arc<MockBackend>>) -> Arc<GatewayRegistry> {
    let config = GatewayConfig::default();
    let mut registry = GatewayRegistry::with_config(&config);
    for backend in backends {
        registry.register(Arc::new(ProviderGateway::new(backend, &config)));
    }
    Arc::new(registry)
}
