//! Gateway registry for registration, lookup and model discovery

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use codecortex_config::GatewayConfig;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{AiError, AiResult};
use crate::gateway::ProviderGateway;
use crate::health_check::HealthCheckCache;
use crate::models::ModelDescriptor;

/// Registry of the gateways available to the orchestrator
pub struct GatewayRegistry {
    gateways: HashMap<String, Arc<ProviderGateway>>,
    health: HealthCheckCache,
    /// Last successful listing per provider, reused for the health TTL
    listings: Mutex<HashMap<String, (Instant, Vec<ModelDescriptor>)>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::with_config(&GatewayConfig::default())
    }

    /// Registry whose health cache follows `config`
    pub fn with_config(config: &GatewayConfig) -> Self {
        Self {
            gateways: HashMap::new(),
            health: HealthCheckCache::from_config(config),
            listings: Mutex::new(HashMap::new()),
        }
    }

    /// Register a gateway, replacing any gateway with the same id
    pub fn register(&mut self, gateway: Arc<ProviderGateway>) {
        let id = gateway.id().to_string();
        self.listings.lock().remove(&id);
        if self.gateways.insert(id.clone(), gateway).is_some() {
            debug!(provider = %id, "Replaced registered gateway");
        }
    }

    pub fn unregister(&mut self, provider_id: &str) -> AiResult<()> {
        self.listings.lock().remove(provider_id);
        self.gateways
            .remove(provider_id)
            .map(|_| ())
            .ok_or_else(|| AiError::ModelUnavailable(format!("unknown provider {}", provider_id)))
    }

    pub fn get(&self, provider_id: &str) -> AiResult<Arc<ProviderGateway>> {
        self.gateways
            .get(provider_id)
            .cloned()
            .ok_or_else(|| AiError::ModelUnavailable(format!("unknown provider {}", provider_id)))
    }

    /// Registered provider ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.gateways.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }

    pub fn health(&self) -> &HealthCheckCache {
        &self.health
    }

    /// Drop the cached health probe and model listing of one provider
    pub fn invalidate(&self, provider_id: &str) {
        self.health.invalidate(provider_id);
        self.listings.lock().remove(provider_id);
    }

    /// Models of healthy gateways, sorted by provider then model id
    ///
    /// Listings are bounded by the health probe timeout and cached for the
    /// health TTL. A gateway whose listing fails or times out is skipped.
    pub async fn available_models(&self) -> Vec<ModelDescriptor> {
        let mut models = Vec::new();
        for id in self.ids() {
            let Some(gateway) = self.gateways.get(&id) else {
                continue;
            };
            if !self.health.check_health(gateway).await {
                debug!(provider = %id, "Skipping unhealthy gateway");
                continue;
            }
            if let Some(listed) = self.list_models(&id, gateway).await {
                models.extend(listed);
            }
        }
        models.sort_by(|a, b| {
            a.provider_id
                .cmp(&b.provider_id)
                .then_with(|| a.model_id.cmp(&b.model_id))
        });
        models
    }

    async fn list_models(&self, id: &str, gateway: &ProviderGateway) -> Option<Vec<ModelDescriptor>> {
        let cached = self
            .listings
            .lock()
            .get(id)
            .filter(|(listed_at, _)| listed_at.elapsed() < self.health.ttl())
            .map(|(_, listed)| listed.clone());
        if cached.is_some() {
            return cached;
        }

        let timeout = self.health.probe_timeout();
        match tokio::time::timeout(timeout, gateway.available_models()).await {
            Ok(Ok(listed)) => {
                self.listings
                    .lock()
                    .insert(id.to_string(), (Instant::now(), listed.clone()));
                Some(listed)
            }
            Ok(Err(e)) => {
                warn!(provider = %id, error = %e, "Listing models failed");
                None
            }
            Err(_) => {
                warn!(
                    provider = %id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Listing models timed out"
                );
                None
            }
        }
    }
}

impl Default for GatewayRegistry {
    fn default() -> Self {
        Self::new()
    }
}
