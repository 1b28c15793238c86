//! codecortex configuration
//!
//! Typed configuration for the orchestrator, provider gateways and the
//! completion ranker, loaded from a TOML file layered under environment
//! variables.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ConfigError, Result};
pub use manager::ConfigManager;
pub use types::{
    AppConfig, BackoffConfig, CompletionConfig, ConfigManager as ConfigManagerTrait,
    FallbackStrategy, FeedbackConfig, GatewayConfig, LoggingConfig, OrchestratorConfig,
    RankingConfig, RankingWeights, TunerConfig,
};
