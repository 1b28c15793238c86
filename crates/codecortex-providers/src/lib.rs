//! CodeCortex AI gateways
//!
//! One [`ProviderGateway`] per backend: sliding-window rate limiting,
//! timeout racing, error classification into the closed [`AiError`]
//! taxonomy and a replaceable request/response converter seam.

pub mod error;
pub mod gateway;
pub mod health_check;
pub mod models;
pub mod provider;
pub mod rate_limiter;

pub use error::{AiError, AiResult, BackendFailure, ErrorKind};
pub use gateway::{estimate_confidence, ProviderGateway};
pub use health_check::{HealthCheckCache, HealthCheckResult};
pub use models::{
    AiRequest, AiResponse, FinishReason, ModelCapability, ModelDescriptor, ModelSelection,
    Priority, PrivacyLevel, ProviderRequest, ProviderResponse, ProviderUsage, RequestType,
    TokenUsage,
};
pub use provider::{Backend, GatewayRegistry, ProviderKind, WireConverter};
pub use rate_limiter::{ExponentialBackoff, SlidingWindowLimiter};
