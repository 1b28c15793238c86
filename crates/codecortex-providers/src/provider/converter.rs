//! Request/response shape conversion
//!
//! A [`WireConverter`] is a pair of pure functions: one maps an [`AiRequest`]
//! onto the provider-neutral [`ProviderRequest`] a backend adapter expects,
//! the other turns the adapter's [`ProviderResponse`] into an [`AiResponse`].
//! Provider-specific wire encoding stays inside the adapter.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::gateway::estimate_confidence;
use crate::models::{AiRequest, AiResponse, ModelDescriptor, ProviderRequest, ProviderResponse, TokenUsage};

use super::ProviderKind;

/// Maps a request onto the backend's request shape
pub type ToProviderRequest = fn(&AiRequest, &ModelDescriptor) -> ProviderRequest;

/// Maps a backend response (and the measured latency) onto an [`AiResponse`]
pub type FromProviderResponse =
    fn(&AiRequest, &ModelDescriptor, ProviderResponse, Duration) -> AiResponse;

/// Converter pair injected into a gateway
#[derive(Clone, Copy)]
pub struct WireConverter {
    pub to_provider_request: ToProviderRequest,
    pub from_provider_response: FromProviderResponse,
}

impl std::fmt::Debug for WireConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireConverter").finish_non_exhaustive()
    }
}

impl WireConverter {
    pub fn new(to: ToProviderRequest, from: FromProviderResponse) -> Self {
        Self {
            to_provider_request: to,
            from_provider_response: from,
        }
    }

    /// Default converter pair for a provider kind
    pub fn for_kind(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::OpenAiCompatible => Self::new(to_chat_request, from_neutral_response),
            ProviderKind::Anthropic => Self::new(to_messages_request, from_neutral_response),
            ProviderKind::Ollama => Self::new(to_generate_request, from_neutral_response),
            ProviderKind::Custom => Self::new(to_neutral_request, from_neutral_response),
        }
    }
}

fn base_metadata(request: &AiRequest, api_style: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("api_style".to_string(), api_style.to_string());
    metadata.insert(
        "request_type".to_string(),
        request.request_type().as_str().to_string(),
    );
    metadata.insert(
        "priority".to_string(),
        format!("{:?}", request.priority()).to_lowercase(),
    );
    metadata.insert("request_id".to_string(), request.id().to_string());
    metadata
}

fn to_neutral_request(request: &AiRequest, model: &ModelDescriptor) -> ProviderRequest {
    ProviderRequest {
        model: model.model_id.clone(),
        prompt: request.prompt_text(),
        max_tokens: model.max_tokens,
        metadata: base_metadata(request, "neutral"),
    }
}

fn to_chat_request(request: &AiRequest, model: &ModelDescriptor) -> ProviderRequest {
    ProviderRequest {
        metadata: base_metadata(request, "chat-completions"),
        ..to_neutral_request(request, model)
    }
}

// The messages API requires an explicit output budget
const MESSAGES_DEFAULT_MAX_TOKENS: usize = 4096;

fn to_messages_request(request: &AiRequest, model: &ModelDescriptor) -> ProviderRequest {
    let max_tokens = if model.max_tokens == 0 {
        MESSAGES_DEFAULT_MAX_TOKENS
    } else {
        model.max_tokens.min(MESSAGES_DEFAULT_MAX_TOKENS)
    };
    ProviderRequest {
        max_tokens,
        metadata: base_metadata(request, "messages"),
        ..to_neutral_request(request, model)
    }
}

fn to_generate_request(request: &AiRequest, model: &ModelDescriptor) -> ProviderRequest {
    ProviderRequest {
        metadata: base_metadata(request, "generate"),
        ..to_neutral_request(request, model)
    }
}

fn from_neutral_response(
    request: &AiRequest,
    model: &ModelDescriptor,
    response: ProviderResponse,
    elapsed: Duration,
) -> AiResponse {
    let prompt_tokens = response.usage.prompt_tokens;
    let completion_tokens = response.usage.completion_tokens;
    let total_tokens = prompt_tokens.saturating_add(completion_tokens);
    let confidence = estimate_confidence(&response);

    AiResponse {
        id: uuid::Uuid::new_v4().to_string(),
        request_id: request.id().to_string(),
        result: response.content,
        confidence,
        model_used: model.model_id.clone(),
        processing_time_ms: elapsed.as_millis() as u64,
        usage: TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens,
            cost: Some(total_tokens as f64 * model.cost_per_token),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FinishReason, ModelCapability, ProviderUsage, RequestType};
    use serde_json::json;

    fn model(max_tokens: usize) -> ModelDescriptor {
        ModelDescriptor {
            model_id: "m1".into(),
            provider_id: "p1".into(),
            capabilities: vec![ModelCapability::Completion],
            cost_per_token: 0.00001,
            max_tokens,
            response_time_ms: 100.0,
            accuracy: 0.9,
            availability: 1.0,
        }
    }

    #[test]
    fn test_messages_request_caps_max_tokens() {
        let request = AiRequest::new(RequestType::CodeCompletion, json!({}), json!("let x"));
        let converter = WireConverter::for_kind(ProviderKind::Anthropic);

        let converted = (converter.to_provider_request)(&request, &model(100_000));
        assert_eq!(converted.max_tokens, MESSAGES_DEFAULT_MAX_TOKENS);
        assert_eq!(converted.metadata["api_style"], "messages");

        let converted = (converter.to_provider_request)(&request, &model(0));
        assert_eq!(converted.max_tokens, MESSAGES_DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_neutral_request_carries_prompt_and_metadata() {
        let request = AiRequest::new(RequestType::DebugAssist, json!({}), json!({"prompt": "trace"}))
            .with_id("req-7");
        let converted = (WireConverter::for_kind(ProviderKind::Custom).to_provider_request)(
            &request,
            &model(512),
        );
        assert_eq!(converted.prompt, "trace");
        assert_eq!(converted.model, "m1");
        assert_eq!(converted.max_tokens, 512);
        assert_eq!(converted.metadata["request_type"], "debug-assist");
        assert_eq!(converted.metadata["request_id"], "req-7");
    }

    #[test]
    fn test_response_conversion_prices_tokens() {
        let request = AiRequest::new(RequestType::CodeCompletion, json!({}), json!("x")).with_id("r");
        let response = ProviderResponse {
            content: "value".into(),
            finish_reason: FinishReason::Stop,
            usage: ProviderUsage {
                prompt_tokens: 40,
                completion_tokens: 60,
            },
        };
        let converted = (WireConverter::for_kind(ProviderKind::Ollama).from_provider_response)(
            &request,
            &model(256),
            response,
            Duration::from_millis(42),
        );

        assert_eq!(converted.request_id, "r");
        assert_eq!(converted.model_used, "m1");
        assert_eq!(converted.processing_time_ms, 42);
        assert_eq!(converted.usage.total_tokens, 100);
        let cost = converted.usage.cost.unwrap();
        assert!((cost - 0.001).abs() < 1e-12);
    }
}
