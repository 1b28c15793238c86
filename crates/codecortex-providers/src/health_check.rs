//! Cached gateway health probes
//!
//! The registry only counts a gateway's models as available while its last
//! probe succeeded. Probes are remembered for a TTL so model discovery does
//! not hit every backend on each request.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use codecortex_config::GatewayConfig;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::gateway::ProviderGateway;

/// Outcome of the latest probe for one provider
#[derive(Clone, Debug)]
pub struct HealthCheckResult {
    pub is_healthy: bool,
    pub checked_at: Instant,
    /// Probe error or timeout description for unhealthy results
    pub error: Option<String>,
    /// Failed probes in a row, reset by a healthy probe
    pub consecutive_failures: u32,
}

impl HealthCheckResult {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.checked_at.elapsed() < ttl
    }
}

/// Probe results keyed by provider id
pub struct HealthCheckCache {
    results: Mutex<HashMap<String, HealthCheckResult>>,
    ttl: Duration,
    probe_timeout: Duration,
}

impl HealthCheckCache {
    pub fn new(ttl: Duration, probe_timeout: Duration) -> Self {
        Self {
            results: Mutex::new(HashMap::new()),
            ttl,
            probe_timeout,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            Duration::from_secs(config.health_check_ttl_secs),
            Duration::from_millis(config.health_check_timeout_ms),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Whether `gateway` is healthy, probing only when the cached result is stale
    pub async fn check_health(&self, gateway: &ProviderGateway) -> bool {
        let provider_id = gateway.id();
        let previous = self.get_cached(provider_id);
        if let Some(result) = previous.as_ref().filter(|r| r.is_fresh(self.ttl)) {
            return result.is_healthy;
        }

        let error = match tokio::time::timeout(self.probe_timeout, gateway.health_check()).await {
            Ok(Ok(true)) => None,
            Ok(Ok(false)) => Some("backend reported unhealthy".to_string()),
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!(
                "probe timed out after {} ms",
                self.probe_timeout.as_millis()
            )),
        };

        let failures_before = previous.map(|r| r.consecutive_failures).unwrap_or(0);
        let result = HealthCheckResult {
            is_healthy: error.is_none(),
            checked_at: Instant::now(),
            consecutive_failures: if error.is_some() { failures_before + 1 } else { 0 },
            error,
        };

        match &result.error {
            Some(reason) => warn!(
                provider = %provider_id,
                failures = result.consecutive_failures,
                reason = %reason,
                "Health probe failed"
            ),
            None => debug!(provider = %provider_id, "Health probe succeeded"),
        }

        let healthy = result.is_healthy;
        self.results.lock().insert(provider_id.to_string(), result);
        healthy
    }

    /// Forget the cached probe so the next check hits the backend
    pub fn invalidate(&self, provider_id: &str) {
        self.results.lock().remove(provider_id);
    }

    pub fn invalidate_all(&self) {
        self.results.lock().clear();
    }

    pub fn get_cached(&self, provider_id: &str) -> Option<HealthCheckResult> {
        self.results.lock().get(provider_id).cloned()
    }
}

impl Default for HealthCheckCache {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}
