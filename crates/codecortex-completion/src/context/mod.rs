//! Context analysis for code completion
//!
//! Classifies the text before the cursor and collects the names a
//! completion could refer to. The analysis is regex and brace-scan based;
//! nothing here parses the language properly.

mod classifier;
mod utils;

pub use classifier::HeuristicContextClassifier;
pub use utils::{
    byte_offset_to_position, extract_prefix, indentation_level, line_before_cursor,
    position_to_byte_offset, surrounding_lines,
};

use crate::types::{CompletionContext, Position};

/// Builds a [`CompletionContext`] for a cursor position
///
/// # Example
///
/// ```ignore
/// use codecortex_completion::context::*;
/// use codecortex_completion::types::*;
///
/// let extractor = HeuristicContextClassifier::default();
/// let context = extractor.extract_context("let total = values.", Position::new(0, 19), "src/lib.rs");
/// assert_eq!(context.completion_kind, CompletionKind::MemberAccess);
/// ```
pub trait ContextExtractor: Send + Sync {
    /// Analyze `text` at `position`; `file` selects language heuristics by extension
    fn extract_context(&self, text: &str, position: Position, file: &str) -> CompletionContext;
}
