//! Core types for completion classification and ranking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position in a document (zero-based line and character)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// What the text before the cursor asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionKind {
    /// `value.` / `Type::`
    MemberAccess,
    /// Inside an argument list
    FunctionCall,
    VariableDeclaration,
    ImportStatement,
    TypeAnnotation,
    /// Statement start where a keyword may be typed
    Keyword,
    #[default]
    GenericExpression,
}

impl CompletionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionKind::MemberAccess => "member-access",
            CompletionKind::FunctionCall => "function-call",
            CompletionKind::VariableDeclaration => "variable-declaration",
            CompletionKind::ImportStatement => "import-statement",
            CompletionKind::TypeAnnotation => "type-annotation",
            CompletionKind::Keyword => "keyword",
            CompletionKind::GenericExpression => "generic-expression",
        }
    }
}

/// Symbol kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Variable,
    Parameter,
    Property,
    Field,
    Class,
    Interface,
    Type,
    Enum,
    Module,
    Constant,
    Keyword,
    /// Free-form text produced by a model
    Snippet,
}

/// Where a symbol is declared relative to the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolScope {
    Local,
    Imported,
    Global,
    #[default]
    Other,
}

/// A candidate symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declared or inferred type name
    pub type_name: Option<String>,
    pub scope: SymbolScope,
    /// Source confidence in `[0, 1]`
    pub confidence: f64,
    pub usage_count: u32,
    pub last_used: Option<DateTime<Utc>>,
    pub deprecated: bool,
    pub documentation: Option<String>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_name: None,
            scope: SymbolScope::Other,
            confidence: 1.0,
            usage_count: 0,
            last_used: None,
            deprecated: false,
            documentation: None,
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_scope(mut self, scope: SymbolScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_usage(mut self, usage_count: u32, last_used: Option<DateTime<Utc>>) -> Self {
        self.usage_count = usage_count;
        self.last_used = last_used;
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// Heuristic syntactic flags at the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyntacticFlags {
    pub in_string: bool,
    pub in_comment: bool,
    pub in_function: bool,
    pub in_class: bool,
    pub indentation_level: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SemanticHints {
    pub available_types: Vec<String>,
    pub imports: Vec<String>,
}

/// How often and how recently a symbol was accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolUsage {
    pub symbol: String,
    pub count: u32,
    pub last_used: DateTime<Utc>,
}

/// Accepted completions for one `(file, completion kind)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsagePattern {
    pub file: String,
    pub completion_kind: CompletionKind,
    pub usages: Vec<SymbolUsage>,
}

impl UsagePattern {
    pub fn new(file: impl Into<String>, completion_kind: CompletionKind) -> Self {
        Self {
            file: file.into(),
            completion_kind,
            usages: Vec::new(),
        }
    }

    pub fn usage(&self, symbol: &str) -> Option<&SymbolUsage> {
        self.usages.iter().find(|u| u.symbol == symbol)
    }
}

/// Everything known about the cursor location
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompletionContext {
    pub file: String,
    pub position: Position,
    /// Lines around the cursor
    pub surrounding_code: String,
    /// Identifier fragment immediately before the cursor
    pub prefix: String,
    pub imports: Vec<String>,
    pub local_functions: Vec<String>,
    pub local_variables: Vec<String>,
    /// Enclosing scopes, outermost first
    pub scope_chain: Vec<String>,
    pub completion_kind: CompletionKind,
    pub expected_type: Option<String>,
    pub candidate_symbols: Vec<Symbol>,
    pub recent_usage: Vec<UsagePattern>,
    pub flags: SyntacticFlags,
    pub hints: SemanticHints,
}

impl CompletionContext {
    /// Whether completions must be suppressed at this location
    pub fn suppresses_completion(&self) -> bool {
        self.flags.in_string || self.flags.in_comment
    }
}

/// Relevance factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelevanceFactorKind {
    ContextMatch,
    UsageFrequency,
    Recency,
    TypeCompatibility,
    ScopeProximity,
    PatternMatch,
    UserPreference,
    Semantic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceFactor {
    pub kind: RelevanceFactorKind,
    pub weight: f64,
    /// Factor score in `[0, 1]`
    pub score: f64,
    pub description: String,
}

/// One line of model output offered as a completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSuggestion {
    pub text: String,
    pub confidence: f64,
}

impl AiSuggestion {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionOrigin {
    Local,
    Ai,
}

/// A scored suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCompletion {
    pub symbol: Symbol,
    /// Weighted mean of the factor scores
    pub score: f64,
    pub confidence: f64,
    pub factors: Vec<RelevanceFactor>,
    pub insert_text: String,
    pub display_text: String,
    pub sort_key: String,
    pub filter_key: String,
    pub origin: CompletionOrigin,
}

impl RankedCompletion {
    pub fn factor(&self, kind: RelevanceFactorKind) -> Option<&RelevanceFactor> {
        self.factors.iter().find(|f| f.kind == kind)
    }
}
