//! Backend trait, provider kinds and the gateway registry

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::BackendFailure,
    models::{ModelDescriptor, ProviderRequest, ProviderResponse},
};

pub mod converter;
pub mod registry;

pub use converter::WireConverter;
pub use registry::GatewayRegistry;

/// Closed set of backend families
///
/// The kind selects the default [`WireConverter`] and decides whether the
/// backend runs on the local machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// OpenAI and API-compatible services
    OpenAiCompatible,
    Anthropic,
    /// Locally hosted models
    Ollama,
    Custom,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAiCompatible => "openai-compatible",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Custom => "custom",
        }
    }
}

/// Network adapter for one AI backend
///
/// Implementations own transport and wire format; they report failures as
/// [`BackendFailure`] and let the gateway classify them.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Unique provider identifier (registry key)
    fn id(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Whether requests stay on this machine
    fn is_local(&self) -> bool {
        self.kind() == ProviderKind::Ollama
    }

    /// Issue one generation call
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, BackendFailure>;

    /// Probe backend health
    async fn health_check(&self) -> Result<bool, BackendFailure>;

    /// Models the backend currently serves
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, BackendFailure>;
}
