//! Data models shared by gateways, the selector and the orchestrator

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of work a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestType {
    CodeCompletion,
    NaturalLanguageQuery,
    PredictiveAnalysis,
    DebugAssist,
    ContextAnalysis,
}

impl RequestType {
    /// Capability a model must declare to serve this request type
    pub fn required_capability(&self) -> ModelCapability {
        match self {
            RequestType::CodeCompletion => ModelCapability::Completion,
            RequestType::NaturalLanguageQuery => ModelCapability::Chat,
            RequestType::PredictiveAnalysis | RequestType::ContextAnalysis => {
                ModelCapability::Analysis
            }
            RequestType::DebugAssist => ModelCapability::Debugging,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::CodeCompletion => "code-completion",
            RequestType::NaturalLanguageQuery => "nl-query",
            RequestType::PredictiveAnalysis => "predictive-analysis",
            RequestType::DebugAssist => "debug-assist",
            RequestType::ContextAnalysis => "context-analysis",
        }
    }
}

/// Request priority (ordered: `Low < Normal < High < Critical`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// How far request data may travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrivacyLevel {
    Public,
    #[default]
    Internal,
    Confidential,
    /// Must never leave the machine
    LocalOnly,
}

/// A code-intelligence request
///
/// Immutable once built: fields are private and the builder methods consume
/// the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRequest {
    id: String,
    request_type: RequestType,
    context: serde_json::Value,
    payload: serde_json::Value,
    priority: Priority,
    privacy: PrivacyLevel,
    created_at: DateTime<Utc>,
}

impl AiRequest {
    /// Create a request with a fresh id, normal priority and internal privacy
    pub fn new(
        request_type: RequestType,
        context: serde_json::Value,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            request_type,
            context,
            payload,
            priority: Priority::default(),
            privacy: PrivacyLevel::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_privacy(mut self, privacy: PrivacyLevel) -> Self {
        self.privacy = privacy;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn context(&self) -> &serde_json::Value {
        &self.context
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn privacy(&self) -> PrivacyLevel {
        self.privacy
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Text sent to the model
    ///
    /// A string payload is used as-is; an object payload contributes its
    /// `prompt` field; anything else is serialized.
    pub fn prompt_text(&self) -> String {
        match &self.payload {
            serde_json::Value::String(text) => text.clone(),
            serde_json::Value::Object(map) => match map.get("prompt") {
                Some(serde_json::Value::String(prompt)) => prompt.clone(),
                _ => self.payload.to_string(),
            },
            other => other.to_string(),
        }
    }
}

/// Capabilities a model can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCapability {
    Completion,
    Chat,
    Analysis,
    Debugging,
}

/// A model registered by a backend, with observed statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub model_id: String,
    pub provider_id: String,
    pub capabilities: Vec<ModelCapability>,
    /// USD per token
    pub cost_per_token: f64,
    pub max_tokens: usize,
    /// Observed mean response time
    pub response_time_ms: f64,
    /// Observed accuracy in `[0, 1]`
    pub accuracy: f64,
    /// Fraction of recent probes that succeeded, in `[0, 1]`
    pub availability: f64,
}

impl ModelDescriptor {
    pub fn supports(&self, capability: ModelCapability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn is_available(&self) -> bool {
        self.availability > 0.0
    }
}

/// Outcome of model selection for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub model_id: String,
    pub provider_id: String,
    pub confidence: f64,
    pub estimated_cost: f64,
    pub estimated_latency_ms: f64,
    /// Human-readable justification
    pub reasoning: String,
}

/// Token accounting for one response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    /// USD, when the backend or converter can price the call
    pub cost: Option<f64>,
}

/// Answer to an [`AiRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub id: String,
    pub request_id: String,
    pub result: String,
    /// Heuristic confidence in `[0, 1]`
    pub confidence: f64,
    pub model_used: String,
    pub processing_time_ms: u64,
    pub usage: TokenUsage,
}

/// Why a backend stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Clean stop
    Stop,
    /// Hit the token limit
    Length,
    /// Output was filtered
    ContentFilter,
    Other,
}

/// Provider-neutral request handed to a backend adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: usize,
    /// Adapter hints (API style, request type, priority)
    pub metadata: BTreeMap<String, String>,
}

/// Token counts reported by a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Provider-neutral response returned by a backend adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub content: String,
    pub finish_reason: FinishReason,
    pub usage: ProviderUsage,
}
