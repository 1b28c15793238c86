//! CodeCortex completion engine
//!
//! Local, heuristic completion with optional model assistance.
//!
//! # Architecture
//!
//! 1. **Context layer**: [`ContextExtractor`] classifies the text before the
//!    cursor ([`CompletionKind`]), sets syntactic flags and gathers the local
//!    names, imports and types a suggestion could refer to.
//! 2. **Ranking layer**: [`RelevanceRanker`] filters candidates for the
//!    position and scores them over eight weighted relevance factors. It
//!    learns per-symbol preferences and per-file usage patterns from
//!    accepted suggestions.
//! 3. **Service layer**: [`CompletionService`] runs both and, when AI assist
//!    is enabled, asks the request orchestrator for a code completion and
//!    merges the returned lines into the local list. Model failures follow the
//!    configured fallback strategy.
//!
//! # Example
//!
//! ```ignore
//! use codecortex_completion::*;
//! use codecortex_config::AppConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! let service = CompletionService::new(&AppConfig::default());
//! let text = "let total = 1;\nlet count = to";
//! let suggestions = service
//!     .complete(text, Position::new(1, 14), "src/lib.rs", &[], None, &CancellationToken::new())
//!     .await?;
//! assert_eq!(suggestions[0].symbol.name, "total");
//! ```

pub mod context;
pub mod history;
pub mod language;
pub mod ranker;
pub mod service;
pub mod types;

pub use context::{ContextExtractor, HeuristicContextClassifier};
pub use history::{UsagePatternStore, DEFAULT_SYMBOLS_PER_PATTERN};
pub use language::Language;
pub use ranker::{
    context_match_score, matches_query, pattern_match_score, type_score, RelevanceRanker,
};
pub use service::CompletionService;
pub use types::*;
