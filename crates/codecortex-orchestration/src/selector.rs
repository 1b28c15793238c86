//! Model selection
//!
//! [`ModelSelector`] is the seam between the orchestrator and the policy that
//! picks a model. [`WeightedModelSelector`] scores every eligible model on
//! accuracy, latency, cost and availability, with weights that shift with the
//! request priority.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use codecortex_providers::{
    AiError, AiRequest, AiResult, GatewayRegistry, ModelDescriptor, ModelSelection, Priority,
    PrivacyLevel,
};
use tracing::debug;

/// Picks the model that serves a request
#[async_trait]
pub trait ModelSelector: Send + Sync {
    /// Models that can currently take traffic
    async fn available_models(&self) -> Vec<ModelDescriptor>;

    /// Choose among `candidates` for `request`
    fn select_from(
        &self,
        request: &AiRequest,
        candidates: &[ModelDescriptor],
    ) -> AiResult<ModelSelection>;

    async fn select_model(&self, request: &AiRequest) -> AiResult<ModelSelection> {
        let models = self.available_models().await;
        self.select_from(request, &models)
    }
}

/// Factor weights for one priority level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionWeights {
    pub accuracy: f64,
    pub latency: f64,
    pub cost: f64,
    pub availability: f64,
}

impl SelectionWeights {
    /// Critical and high favor accuracy and latency, low favors cost
    pub fn for_priority(priority: Priority) -> Self {
        match priority {
            Priority::Critical => Self {
                accuracy: 0.45,
                latency: 0.35,
                cost: 0.05,
                availability: 0.15,
            },
            Priority::High => Self {
                accuracy: 0.40,
                latency: 0.30,
                cost: 0.10,
                availability: 0.20,
            },
            Priority::Normal => Self {
                accuracy: 0.35,
                latency: 0.25,
                cost: 0.20,
                availability: 0.20,
            },
            Priority::Low => Self {
                accuracy: 0.20,
                latency: 0.15,
                cost: 0.45,
                availability: 0.20,
            },
        }
    }
}

/// Per-factor scores of one candidate
#[derive(Debug, Clone, Copy)]
struct FactorScores {
    accuracy: f64,
    latency: f64,
    cost: f64,
    availability: f64,
}

impl FactorScores {
    fn of(model: &ModelDescriptor) -> Self {
        Self {
            accuracy: model.accuracy.clamp(0.0, 1.0),
            latency: latency_score(model.response_time_ms),
            cost: cost_score(model.cost_per_token),
            availability: model.availability.clamp(0.0, 1.0),
        }
    }

    fn weighted(&self, weights: &SelectionWeights) -> f64 {
        weights.accuracy * self.accuracy
            + weights.latency * self.latency
            + weights.cost * self.cost
            + weights.availability * self.availability
    }

    /// The two factors contributing most to the score, with their raw scores
    fn leading(&self, weights: &SelectionWeights) -> [(&'static str, f64); 2] {
        let mut contributions = [
            ("accuracy", weights.accuracy, self.accuracy),
            ("latency", weights.latency, self.latency),
            ("cost", weights.cost, self.cost),
            ("availability", weights.availability, self.availability),
        ];
        contributions.sort_by(|a, b| {
            (b.1 * b.2)
                .partial_cmp(&(a.1 * a.2))
                .unwrap_or(Ordering::Equal)
        });
        [
            (contributions[0].0, contributions[0].2),
            (contributions[1].0, contributions[1].2),
        ]
    }
}

/// `1 / (1 + latency / 200ms)`
pub fn latency_score(response_time_ms: f64) -> f64 {
    1.0 / (1.0 + response_time_ms.max(0.0) / 200.0)
}

/// `1 / (1 + cost_per_token * 1000)`
pub fn cost_score(cost_per_token: f64) -> f64 {
    1.0 / (1.0 + cost_per_token.max(0.0) * 1000.0)
}

/// Selects models from the healthy gateways of a registry
pub struct WeightedModelSelector {
    registry: Arc<GatewayRegistry>,
}

impl WeightedModelSelector {
    pub fn new(registry: Arc<GatewayRegistry>) -> Self {
        Self { registry }
    }

    fn is_local_provider(&self, provider_id: &str) -> bool {
        self.registry
            .get(provider_id)
            .map(|gateway| gateway.is_local())
            .unwrap_or(false)
    }
}

#[async_trait]
impl ModelSelector for WeightedModelSelector {
    async fn available_models(&self) -> Vec<ModelDescriptor> {
        self.registry.available_models().await
    }

    fn select_from(
        &self,
        request: &AiRequest,
        candidates: &[ModelDescriptor],
    ) -> AiResult<ModelSelection> {
        let capability = request.request_type().required_capability();
        let capable: Vec<&ModelDescriptor> = candidates
            .iter()
            .filter(|m| m.is_available() && m.supports(capability))
            .collect();

        if capable.is_empty() {
            return Err(AiError::ModelUnavailable(format!(
                "no available model supports {:?} for {}",
                capability,
                request.request_type().as_str()
            )));
        }

        let eligible: Vec<&ModelDescriptor> = if request.privacy() == PrivacyLevel::LocalOnly {
            capable
                .into_iter()
                .filter(|m| self.is_local_provider(&m.provider_id))
                .collect()
        } else {
            capable
        };

        if eligible.is_empty() {
            return Err(AiError::PrivacyViolation(format!(
                "request {} is local-only and no local model supports {:?}",
                request.id(),
                capability
            )));
        }

        let weights = SelectionWeights::for_priority(request.priority());
        let (best, factors, score) = eligible
            .into_iter()
            .map(|model| {
                let factors = FactorScores::of(model);
                let score = factors.weighted(&weights);
                (model, factors, score)
            })
            .min_by(|a, b| {
                b.2.partial_cmp(&a.2)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.0.model_id.cmp(&b.0.model_id))
            })
            .ok_or_else(|| AiError::ModelUnavailable("no eligible model".to_string()))?;

        let [(first, first_score), (second, second_score)] = factors.leading(&weights);
        let selection = ModelSelection {
            model_id: best.model_id.clone(),
            provider_id: best.provider_id.clone(),
            confidence: score.clamp(0.0, 1.0),
            estimated_cost: best.cost_per_token * best.max_tokens.min(1000) as f64,
            estimated_latency_ms: best.response_time_ms,
            reasoning: format!(
                "{} scored {:.3} for {:?} priority, led by {} ({:.2}) and {} ({:.2})",
                best.model_id,
                score,
                request.priority(),
                first,
                first_score,
                second,
                second_score
            ),
        };

        debug!(
            request_id = %request.id(),
            model = %selection.model_id,
            score = score,
            "Weighted selection"
        );
        Ok(selection)
    }
}
