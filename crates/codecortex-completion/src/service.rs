//! Completion service
//!
//! Glues the classifier, the ranker and (optionally) the request
//! orchestrator together. Local suggestions are always computed; model
//! suggestions are merged in when AI assist is on and the cursor is in code.

use std::sync::Arc;

use codecortex_common::format_error;
use codecortex_config::{AppConfig, BackoffConfig, CompletionConfig, FallbackStrategy};
use codecortex_orchestration::{retry_with_backoff, RequestOrchestrator};
use codecortex_providers::{
    AiError, AiRequest, AiResponse, AiResult, ExponentialBackoff, RequestType,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::context::{position_to_byte_offset, ContextExtractor, HeuristicContextClassifier};
use crate::language::Language;
use crate::ranker::RelevanceRanker;
use crate::types::*;

/// Suggestion pipeline for one editor session
pub struct CompletionService {
    extractor: Arc<dyn ContextExtractor>,
    ranker: Arc<RelevanceRanker>,
    orchestrator: Option<Arc<RequestOrchestrator>>,
    config: CompletionConfig,
    fallback: FallbackStrategy,
    retry_attempts: u32,
    backoff: BackoffConfig,
}

impl CompletionService {
    /// Local-only service; attach an orchestrator with [`Self::with_orchestrator`]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            extractor: Arc::new(HeuristicContextClassifier::new(&config.completion)),
            ranker: Arc::new(RelevanceRanker::new(config.ranking.clone())),
            orchestrator: None,
            config: config.completion.clone(),
            fallback: config.orchestrator.fallback_strategy,
            retry_attempts: config.orchestrator.retry_attempts,
            backoff: config.gateway.backoff.clone(),
        }
    }

    pub fn with_orchestrator(mut self, orchestrator: Arc<RequestOrchestrator>) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn ContextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_ranker(mut self, ranker: Arc<RelevanceRanker>) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn ranker(&self) -> &Arc<RelevanceRanker> {
        &self.ranker
    }

    /// Classify the cursor location without ranking
    pub fn context_at(&self, text: &str, position: Position, file: &str) -> CompletionContext {
        let mut context = self.extractor.extract_context(text, position, file);
        context.recent_usage = self.ranker.recent_usage(file, context.completion_kind);
        context
    }

    /// Suggestions for `position` in `text`
    ///
    /// `symbols` are caller-provided candidates (e.g. from a language server)
    /// ranked alongside the names found in the text. `query` defaults to the
    /// identifier prefix at the cursor.
    pub async fn complete(
        &self,
        text: &str,
        position: Position,
        file: &str,
        symbols: &[Symbol],
        query: Option<&str>,
        cancel: &CancellationToken,
    ) -> AiResult<Vec<RankedCompletion>> {
        if cancel.is_cancelled() {
            return Err(AiError::Cancelled);
        }

        let context = self.context_at(text, position, file);
        let candidates: Vec<Symbol> = symbols
            .iter()
            .chain(context.candidate_symbols.iter())
            .cloned()
            .collect();
        let query = query.or(Some(context.prefix.as_str()).filter(|p| !p.is_empty()));
        let local = self.ranker.rank_completions(&candidates, &context, query);

        let orchestrator = match &self.orchestrator {
            Some(orchestrator)
                if self.config.ai_assist_enabled && !context.suppresses_completion() =>
            {
                orchestrator
            }
            _ => return Ok(local),
        };

        let request = self.build_request(text, position, &context);
        match self.request_ai(orchestrator, &request, cancel).await {
            Ok(response) => {
                let suggestions = split_suggestions(&response, self.ranker.config().max_suggestions);
                debug!(
                    request_id = %request.id(),
                    local = local.len(),
                    ai = suggestions.len(),
                    "Merging model suggestions"
                );
                let max = self.ranker.config().max_suggestions;
                Ok(self.ranker.merge_with_ai(local, &suggestions, max))
            }
            Err(AiError::Cancelled) => Err(AiError::Cancelled),
            Err(err) if self.fallback == FallbackStrategy::FailFast => Err(err),
            Err(err) => {
                warn!(
                    request_id = %request.id(),
                    kind = %err.kind(),
                    error = %format_error(&err),
                    "Model suggestions unavailable, returning local suggestions"
                );
                Ok(local)
            }
        }
    }

    /// Feed an accept/reject decision back into the ranker
    pub fn record_selection(
        &self,
        completion: &RankedCompletion,
        accepted: bool,
        context: &CompletionContext,
    ) {
        self.ranker
            .update_user_preferences(completion, accepted, context);
    }

    async fn request_ai(
        &self,
        orchestrator: &Arc<RequestOrchestrator>,
        request: &AiRequest,
        cancel: &CancellationToken,
    ) -> AiResult<AiResponse> {
        match self.fallback {
            FallbackStrategy::BestEffort => {
                let mut backoff = ExponentialBackoff::from_config(&self.backoff);
                let orchestrator = orchestrator.as_ref();
                retry_with_backoff(&mut backoff, self.retry_attempts, cancel, move || {
                    orchestrator.process_request(request, cancel)
                })
                .await
            }
            FallbackStrategy::FailFast | FallbackStrategy::GracefulDegradation => {
                orchestrator.process_request(request, cancel).await
            }
        }
    }

    fn build_request(&self, text: &str, position: Position, context: &CompletionContext) -> AiRequest {
        let offset = position_to_byte_offset(text, position);
        let before = &text[..offset];
        let lines: Vec<&str> = before.split('\n').collect();
        let start = lines.len().saturating_sub(self.config.surrounding_lines + 1);
        let prompt = lines[start..].join("\n");

        AiRequest::new(
            RequestType::CodeCompletion,
            json!({
                "file": context.file,
                "language": Language::from_path(&context.file).as_str(),
                "line": position.line,
                "character": position.character,
                "completion_kind": context.completion_kind.as_str(),
                "scope_chain": context.scope_chain,
                "expected_type": context.expected_type,
            }),
            json!({
                "prompt": prompt,
                "prefix": context.prefix,
                "surrounding_code": context.surrounding_code,
            }),
        )
    }
}

/// One suggestion per non-empty line of model output, fences skipped
fn split_suggestions(response: &AiResponse, max: usize) -> Vec<AiSuggestion> {
    response
        .result
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .take(max)
        .map(|line| AiSuggestion::new(line, response.confidence))
        .collect()
}
