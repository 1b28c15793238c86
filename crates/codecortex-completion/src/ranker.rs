use std::cmp::Ordering;

/// Completion ranking and filtering implementation
use chrono::Utc;
use codecortex_common::{CacheStats, LruStore};
use codecortex_config::RankingConfig;
use tracing::debug;

use crate::history::UsagePatternStore;
use crate::types::*;

/// Multi-factor relevance ranker
///
/// Learned state lives in two bounded stores: per-`(symbol, completion
/// kind)` preferences and per-`(file, completion kind)` usage patterns.
pub struct RelevanceRanker {
    config: RankingConfig,
    preferences: LruStore<(String, CompletionKind), f64>,
    usage: UsagePatternStore,
}

impl Default for RelevanceRanker {
    fn default() -> Self {
        Self::new(RankingConfig::default())
    }
}

impl RelevanceRanker {
    pub fn new(config: RankingConfig) -> Self {
        Self {
            preferences: LruStore::new(config.preference_capacity),
            usage: UsagePatternStore::new(config.usage_pattern_capacity),
            config,
        }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Filter, score, sort, dedupe and truncate `symbols` for `context`
    ///
    /// Nothing is suggested inside strings or comments. Ties keep input
    /// order, so identical inputs always rank identically.
    pub fn rank_completions(
        &self,
        symbols: &[Symbol],
        context: &CompletionContext,
        query: Option<&str>,
    ) -> Vec<RankedCompletion> {
        if context.suppresses_completion() {
            return Vec::new();
        }

        let query = query.filter(|q| !q.is_empty());
        let mut ranked: Vec<RankedCompletion> = symbols
            .iter()
            .filter(|s| kind_accepted(context.completion_kind, s.kind))
            .filter(|s| query.map_or(true, |q| matches_query(&s.name, q)))
            .filter(|s| s.confidence >= self.config.min_confidence)
            .map(|s| self.score_symbol(s, context, query))
            .collect();

        sort_by_score(&mut ranked);
        let ranked = finalize(ranked, self.config.max_suggestions);

        debug!(
            kind = context.completion_kind.as_str(),
            candidates = symbols.len(),
            ranked = ranked.len(),
            "Ranked completions"
        );
        ranked
    }

    fn score_symbol(
        &self,
        symbol: &Symbol,
        context: &CompletionContext,
        query: Option<&str>,
    ) -> RankedCompletion {
        let weights = &self.config.weights;
        let factors = vec![
            factor(
                RelevanceFactorKind::ContextMatch,
                weights.context_match,
                context_match_score(context.completion_kind, symbol.kind),
                "symbol kind fits the completion position",
            ),
            factor(
                RelevanceFactorKind::UsageFrequency,
                weights.usage_frequency,
                self.usage_score(symbol, context),
                "how often the symbol was accepted",
            ),
            factor(
                RelevanceFactorKind::Recency,
                weights.recency,
                self.recency_score(symbol, context),
                "how recently the symbol was used",
            ),
            factor(
                RelevanceFactorKind::TypeCompatibility,
                weights.type_compatibility,
                type_score(context.expected_type.as_deref(), symbol.type_name.as_deref()),
                "symbol type against the expected type",
            ),
            factor(
                RelevanceFactorKind::ScopeProximity,
                weights.scope_proximity,
                scope_score(symbol, context),
                "distance of the declaring scope",
            ),
            factor(
                RelevanceFactorKind::PatternMatch,
                weights.pattern_match,
                query.map_or(0.5, |q| pattern_match_score(&symbol.name, q)),
                "name against the typed query",
            ),
            factor(
                RelevanceFactorKind::UserPreference,
                weights.user_preference,
                (self.preference(&symbol.name, context.completion_kind) + 1.0) / 2.0,
                "learned acceptance preference",
            ),
            factor(
                RelevanceFactorKind::Semantic,
                weights.semantic,
                semantic_score(symbol, context),
                "semantic hints",
            ),
        ];

        let total_weight: f64 = factors.iter().map(|f| f.weight).sum();
        let score = if total_weight > 0.0 {
            factors.iter().map(|f| f.weight * f.score).sum::<f64>() / total_weight
        } else {
            0.0
        };

        let strong = factors.iter().filter(|f| f.score > 0.8).count() as f64;
        let mut confidence = symbol.confidence + 0.05 * strong;
        if symbol.deprecated {
            confidence /= 2.0;
        }

        let display_text = match &symbol.type_name {
            Some(type_name) => format!("{}: {}", symbol.name, type_name),
            None => symbol.name.clone(),
        };

        RankedCompletion {
            symbol: symbol.clone(),
            score,
            confidence: confidence.clamp(0.0, 1.0),
            factors,
            insert_text: symbol.name.clone(),
            display_text,
            sort_key: String::new(),
            filter_key: symbol.name.to_lowercase(),
            origin: CompletionOrigin::Local,
        }
    }

    /// Combined usage count from the symbol and the context's recent patterns
    fn usage_count(&self, symbol: &Symbol, context: &CompletionContext) -> u32 {
        context
            .recent_usage
            .iter()
            .filter_map(|p| p.usage(&symbol.name))
            .fold(symbol.usage_count, |acc, u| acc.saturating_add(u.count))
    }

    fn usage_score(&self, symbol: &Symbol, context: &CompletionContext) -> f64 {
        let normalization = self.config.usage_normalization.max(1.0);
        (self.usage_count(symbol, context) as f64 / normalization).min(1.0)
    }

    fn recency_score(&self, symbol: &Symbol, context: &CompletionContext) -> f64 {
        let last_used = context
            .recent_usage
            .iter()
            .filter_map(|p| p.usage(&symbol.name))
            .map(|u| u.last_used)
            .chain(symbol.last_used)
            .max();

        match last_used {
            Some(at) => {
                let hours = (Utc::now() - at).num_milliseconds() as f64 / 3_600_000.0;
                let window = self.config.recency_window_hours.max(f64::EPSILON);
                (1.0 - hours.max(0.0) / window).clamp(0.1, 1.0)
            }
            None => 0.1,
        }
    }

    /// Learned preference in `[-1, 1]`, 0 when unknown
    pub fn preference(&self, name: &str, kind: CompletionKind) -> f64 {
        self.preferences
            .get(&(name.to_string(), kind))
            .unwrap_or(0.0)
    }

    /// Learn from an accepted or rejected suggestion
    ///
    /// Acceptance also counts as a usage event for the context's file.
    pub fn update_user_preferences(
        &self,
        completion: &RankedCompletion,
        accepted: bool,
        context: &CompletionContext,
    ) {
        let delta = if accepted { 0.1 } else { -0.05 };
        let key = (completion.symbol.name.clone(), context.completion_kind);
        let updated = self.preferences.upsert(key, 0.0, |p| {
            *p = (*p + delta).clamp(-1.0, 1.0);
        });

        if accepted {
            self.usage
                .record(&context.file, context.completion_kind, &completion.symbol.name);
        }

        debug!(
            symbol = %completion.symbol.name,
            kind = context.completion_kind.as_str(),
            accepted,
            preference = updated,
            "Updated completion preference"
        );
    }

    /// Merge model suggestions into a locally ranked list
    pub fn merge_with_ai(
        &self,
        local: Vec<RankedCompletion>,
        ai_suggestions: &[AiSuggestion],
        max: usize,
    ) -> Vec<RankedCompletion> {
        let ai_weight = self.config.ai_weight;
        let mut merged = local;
        merged.extend(ai_suggestions.iter().map(|s| {
            let confidence = s.confidence.clamp(0.0, 1.0);
            RankedCompletion {
                symbol: Symbol::new(s.text.clone(), SymbolKind::Snippet)
                    .with_confidence(confidence),
                score: confidence * ai_weight,
                confidence,
                factors: Vec::new(),
                insert_text: s.text.clone(),
                display_text: s.text.clone(),
                sort_key: String::new(),
                filter_key: s.text.to_lowercase(),
                origin: CompletionOrigin::Ai,
            }
        }));

        sort_by_score(&mut merged);
        finalize(merged, max)
    }

    /// Usage patterns recorded for `(file, kind)`
    pub fn recent_usage(&self, file: &str, kind: CompletionKind) -> Vec<UsagePattern> {
        self.usage.patterns_for(file, kind)
    }

    pub fn clear_preferences(&self) {
        self.preferences.clear();
    }

    /// Hit, miss and eviction counts of the preference store
    pub fn preference_stats(&self) -> CacheStats {
        self.preferences.stats()
    }

    pub fn clear_usage_patterns(&self) {
        self.usage.clear();
    }
}

fn factor(kind: RelevanceFactorKind, weight: f64, score: f64, description: &str) -> RelevanceFactor {
    RelevanceFactor {
        kind,
        weight,
        score: score.clamp(0.0, 1.0),
        description: description.to_string(),
    }
}

/// Stable sort, highest score first
fn sort_by_score(items: &mut [RankedCompletion]) {
    items.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Dedupe by name (first wins), truncate and assign sort keys
fn finalize(items: Vec<RankedCompletion>, max: usize) -> Vec<RankedCompletion> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.symbol.name.clone()))
        .take(max)
        .enumerate()
        .map(|(rank, mut item)| {
            item.sort_key = format!("{:04}", rank);
            item
        })
        .collect()
}

type KindSets = (&'static [SymbolKind], &'static [SymbolKind]);

const MEMBER_ACCESS_KINDS: KindSets = (
    &[SymbolKind::Method],
    &[SymbolKind::Property, SymbolKind::Field],
);
const IMPORT_KINDS: KindSets = (
    &[SymbolKind::Module],
    &[SymbolKind::Class, SymbolKind::Function, SymbolKind::Constant],
);
const TYPE_ANNOTATION_KINDS: KindSets = (
    &[SymbolKind::Type],
    &[SymbolKind::Class, SymbolKind::Interface, SymbolKind::Enum],
);
const FUNCTION_CALL_KINDS: KindSets = (
    &[SymbolKind::Variable, SymbolKind::Parameter],
    &[SymbolKind::Function, SymbolKind::Method],
);

/// `(preferred, compatible)` symbol kinds; `None` means every kind is accepted
fn kind_sets(kind: CompletionKind) -> Option<KindSets> {
    match kind {
        CompletionKind::MemberAccess => Some(MEMBER_ACCESS_KINDS),
        CompletionKind::ImportStatement => Some(IMPORT_KINDS),
        CompletionKind::TypeAnnotation => Some(TYPE_ANNOTATION_KINDS),
        CompletionKind::FunctionCall => Some(FUNCTION_CALL_KINDS),
        CompletionKind::VariableDeclaration
        | CompletionKind::Keyword
        | CompletionKind::GenericExpression => None,
    }
}

fn kind_accepted(completion: CompletionKind, symbol: SymbolKind) -> bool {
    match kind_sets(completion) {
        Some((preferred, compatible)) => {
            preferred.contains(&symbol) || compatible.contains(&symbol)
        }
        None => true,
    }
}

/// 1.0 preferred, 0.7 compatible, 0.5 where every kind is accepted
pub fn context_match_score(completion: CompletionKind, symbol: SymbolKind) -> f64 {
    match completion {
        CompletionKind::GenericExpression | CompletionKind::Keyword => 0.5,
        CompletionKind::VariableDeclaration => {
            if matches!(
                symbol,
                SymbolKind::Variable | SymbolKind::Function | SymbolKind::Constant
            ) {
                1.0
            } else {
                0.7
            }
        }
        other => match kind_sets(other) {
            Some((preferred, _)) if preferred.contains(&symbol) => 1.0,
            Some((_, compatible)) if compatible.contains(&symbol) => 0.7,
            _ => 0.5,
        },
    }
}

fn normalize_type(name: &str) -> String {
    name.trim()
        .trim_start_matches('&')
        .trim_start_matches("mut ")
        .trim()
        .to_lowercase()
}

fn base_type(name: &str) -> &str {
    name.split(['<', '[']).next().unwrap_or(name).trim()
}

/// 1.0 same type, 0.7 related, 0.2 different, 0.5 when either side is unknown
pub fn type_score(expected: Option<&str>, actual: Option<&str>) -> f64 {
    let (Some(expected), Some(actual)) = (expected, actual) else {
        return 0.5;
    };
    let expected = normalize_type(expected);
    let actual = normalize_type(actual);

    if expected == actual {
        1.0
    } else if base_type(&expected) == base_type(&actual)
        || expected.contains(actual.as_str())
        || actual.contains(expected.as_str())
    {
        0.7
    } else {
        0.2
    }
}

fn scope_score(symbol: &Symbol, context: &CompletionContext) -> f64 {
    let is_local = context.local_variables.iter().any(|v| v == &symbol.name)
        || context.local_functions.iter().any(|f| f == &symbol.name);
    let is_imported = context.hints.imports.iter().any(|i| i == &symbol.name);

    let scope = if is_local {
        SymbolScope::Local
    } else if is_imported && symbol.scope != SymbolScope::Local {
        SymbolScope::Imported
    } else {
        symbol.scope
    };

    match scope {
        SymbolScope::Local => 1.0,
        SymbolScope::Imported => 0.8,
        SymbolScope::Global => 0.6,
        SymbolScope::Other => 0.4,
    }
}

fn semantic_score(symbol: &Symbol, context: &CompletionContext) -> f64 {
    let typed_hint = symbol.type_name.as_ref().is_some_and(|t| {
        context
            .hints
            .available_types
            .iter()
            .any(|available| available == t)
    });
    if typed_hint {
        1.0
    } else if symbol.documentation.is_some() {
        0.6
    } else {
        0.3
    }
}

/// Case-insensitive prefix, substring or subsequence match
pub fn matches_query(name: &str, query: &str) -> bool {
    let name = name.to_lowercase();
    let query = query.to_lowercase();
    name.contains(&query) || is_subsequence(&query, &name)
}

/// exact 1.0, prefix 0.9, acronym 0.8, substring 0.6, subsequence 0.4, otherwise 0.1
pub fn pattern_match_score(name: &str, query: &str) -> f64 {
    if query.is_empty() {
        return 0.5;
    }
    let lower_name = name.to_lowercase();
    let lower_query = query.to_lowercase();

    if lower_name == lower_query {
        1.0
    } else if lower_name.starts_with(&lower_query) {
        0.9
    } else if lower_query.chars().count() >= 2 && acronym(name).starts_with(&lower_query) {
        0.8
    } else if lower_name.contains(&lower_query) {
        0.6
    } else if is_subsequence(&lower_query, &lower_name) {
        0.4
    } else {
        0.1
    }
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut haystack = haystack.chars();
    needle.chars().all(|c| haystack.any(|h| h == c))
}

/// Lowercased initials of the words in a camelCase or snake_case name
fn acronym(name: &str) -> String {
    let mut initials = String::new();
    let mut prev: Option<char> = None;
    for ch in name.chars() {
        let starts_word = match prev {
            None => ch.is_alphanumeric(),
            Some(p) => {
                (ch.is_uppercase() && !p.is_uppercase())
                    || (ch.is_alphanumeric() && !p.is_alphanumeric())
            }
        };
        if starts_word {
            initials.extend(ch.to_lowercase());
        }
        prev = Some(ch);
    }
    initials
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str, kind: SymbolKind) -> Symbol {
        Symbol::new(name, kind)
    }

    fn context(kind: CompletionKind) -> CompletionContext {
        CompletionContext {
            file: "src/lib.rs".to_string(),
            completion_kind: kind,
            ..CompletionContext::default()
        }
    }

    #[test]
    fn test_pattern_match_tiers() {
        assert_eq!(pattern_match_score("parse", "parse"), 1.0);
        assert_eq!(pattern_match_score("Parse", "parse"), 1.0);
        assert_eq!(pattern_match_score("parser", "par"), 0.9);
        assert_eq!(pattern_match_score("getUserName", "gun"), 0.8);
        assert_eq!(pattern_match_score("get_user_name", "gu"), 0.8);
        assert_eq!(pattern_match_score("reparse", "par"), 0.6);
        assert_eq!(pattern_match_score("present", "pst"), 0.4);
        assert_eq!(pattern_match_score("alpha", "zz"), 0.1);
    }

    #[test]
    fn test_acronym() {
        assert_eq!(acronym("getUserName"), "gun");
        assert_eq!(acronym("get_user_name"), "gun");
        assert_eq!(acronym("HTTPServer"), "h");
    }

    #[test]
    fn test_type_score() {
        assert_eq!(type_score(Some("String"), Some("string")), 1.0);
        assert_eq!(type_score(Some("Vec<u8>"), Some("Vec<String>")), 0.7);
        assert_eq!(type_score(Some("&str"), Some("str")), 1.0);
        assert_eq!(type_score(Some("u32"), Some("String")), 0.2);
        assert_eq!(type_score(None, Some("String")), 0.5);
        assert_eq!(type_score(Some("u32"), None), 0.5);
    }

    #[test]
    fn test_context_match_score() {
        assert_eq!(
            context_match_score(CompletionKind::MemberAccess, SymbolKind::Method),
            1.0
        );
        assert_eq!(
            context_match_score(CompletionKind::MemberAccess, SymbolKind::Field),
            0.7
        );
        assert_eq!(
            context_match_score(CompletionKind::GenericExpression, SymbolKind::Method),
            0.5
        );
        assert_eq!(
            context_match_score(CompletionKind::VariableDeclaration, SymbolKind::Class),
            0.7
        );
    }

    #[test]
    fn test_member_access_filters_kinds() {
        let ranker = RelevanceRanker::default();
        let symbols = vec![
            sym("len", SymbolKind::Method),
            sym("Vec", SymbolKind::Type),
            sym("capacity", SymbolKind::Field),
        ];

        let ranked = ranker.rank_completions(&symbols, &context(CompletionKind::MemberAccess), None);
        let names: Vec<_> = ranked.iter().map(|r| r.symbol.name.as_str()).collect();
        assert_eq!(names, vec!["len", "capacity"]);
    }

    #[test]
    fn test_suppressed_inside_strings() {
        let ranker = RelevanceRanker::default();
        let mut ctx = context(CompletionKind::GenericExpression);
        ctx.flags.in_string = true;
        assert!(ranker
            .rank_completions(&[sym("x", SymbolKind::Variable)], &ctx, None)
            .is_empty());
    }

    #[test]
    fn test_low_confidence_symbols_are_dropped() {
        let ranker = RelevanceRanker::default();
        let symbols = vec![
            sym("keep", SymbolKind::Variable),
            sym("drop", SymbolKind::Variable).with_confidence(0.05),
        ];
        let ranked =
            ranker.rank_completions(&symbols, &context(CompletionKind::GenericExpression), None);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].symbol.name, "keep");
    }

    #[test]
    fn test_deprecated_halves_confidence() {
        let ranker = RelevanceRanker::default();
        let symbols = vec![
            sym("old", SymbolKind::Variable).with_confidence(0.8).deprecated(),
        ];
        let ranked =
            ranker.rank_completions(&symbols, &context(CompletionKind::GenericExpression), None);
        assert!(ranked[0].confidence <= 0.5);
    }

    #[test]
    fn test_dedupe_keeps_best_and_truncates() {
        let ranker = RelevanceRanker::new(RankingConfig {
            max_suggestions: 2,
            ..RankingConfig::default()
        });
        let symbols = vec![
            sym("value", SymbolKind::Variable),
            sym("value", SymbolKind::Variable).with_scope(SymbolScope::Local),
            sym("other", SymbolKind::Variable),
            sym("third", SymbolKind::Variable),
        ];
        let ranked =
            ranker.rank_completions(&symbols, &context(CompletionKind::GenericExpression), None);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].symbol.name, "value");
        assert_eq!(ranked[0].symbol.scope, SymbolScope::Local);
        assert_eq!(ranked[0].sort_key, "0000");
        assert_eq!(ranked[1].sort_key, "0001");
    }

    #[test]
    fn test_local_names_upgrade_scope() {
        let ranker = RelevanceRanker::default();
        let mut ctx = context(CompletionKind::GenericExpression);
        ctx.local_variables.push("total".to_string());
        let symbols = vec![sym("count", SymbolKind::Variable), sym("total", SymbolKind::Variable)];

        let ranked = ranker.rank_completions(&symbols, &ctx, None);
        assert_eq!(ranked[0].symbol.name, "total");
        assert_eq!(
            ranked[0].factor(RelevanceFactorKind::ScopeProximity).unwrap().score,
            1.0
        );
    }

    #[test]
    fn test_preferences_update_and_clamp() {
        let ranker = RelevanceRanker::default();
        let ctx = context(CompletionKind::GenericExpression);
        let ranked = ranker.rank_completions(&[sym("item", SymbolKind::Variable)], &ctx, None);

        for _ in 0..15 {
            ranker.update_user_preferences(&ranked[0], true, &ctx);
        }
        assert_eq!(ranker.preference("item", CompletionKind::GenericExpression), 1.0);
        assert_eq!(ranker.preference("item", CompletionKind::MemberAccess), 0.0);

        let patterns = ranker.recent_usage("src/lib.rs", CompletionKind::GenericExpression);
        assert_eq!(patterns[0].usage("item").unwrap().count, 15);

        ranker.update_user_preferences(&ranked[0], false, &ctx);
        assert!((ranker.preference("item", CompletionKind::GenericExpression) - 0.95).abs() < 1e-9);
        assert_eq!(ranker.preference_stats().size, 1);

        ranker.clear_preferences();
        assert_eq!(ranker.preference_stats().size, 0);
        ranker.clear_usage_patterns();
        assert_eq!(ranker.preference("item", CompletionKind::GenericExpression), 0.0);
        assert!(ranker
            .recent_usage("src/lib.rs", CompletionKind::GenericExpression)
            .is_empty());
    }

    #[test]
    fn test_merge_with_ai() {
        let ranker = RelevanceRanker::default();
        let local = ranker.rank_completions(
            &[sym("alpha", SymbolKind::Variable)],
            &context(CompletionKind::GenericExpression),
            None,
        );
        let local_score = local[0].score;

        let merged = ranker.merge_with_ai(
            local,
            &[
                AiSuggestion::new("alpha", 1.0),
                AiSuggestion::new("beta()", 0.2),
            ],
            10,
        );

        assert_eq!(merged.len(), 2);
        let alpha = merged.iter().find(|m| m.symbol.name == "alpha").unwrap();
        if local_score >= 0.9 {
            assert_eq!(alpha.origin, CompletionOrigin::Local);
        } else {
            assert_eq!(alpha.origin, CompletionOrigin::Ai);
        }
        let beta = merged.iter().find(|m| m.symbol.name == "beta()").unwrap();
        assert_eq!(beta.origin, CompletionOrigin::Ai);
        assert!((beta.score - 0.18).abs() < 1e-9);
    }
}
