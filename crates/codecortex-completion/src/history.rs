/// Usage-pattern tracking for frequency and recency scoring
use chrono::{DateTime, Utc};
use codecortex_common::LruStore;

use crate::types::{CompletionKind, SymbolUsage, UsagePattern};

/// Distinct symbols remembered per bucket unless configured otherwise
pub const DEFAULT_SYMBOLS_PER_PATTERN: usize = 128;

/// Accepted completions, bucketed by `(file, completion kind)`
///
/// Bounded by an LRU over buckets; the least recently touched bucket is
/// evicted when the store is full. Each bucket keeps at most
/// `symbols_per_pattern` symbols and drops the one used longest ago to make
/// room for a new one.
pub struct UsagePatternStore {
    patterns: LruStore<(String, CompletionKind), UsagePattern>,
    symbols_per_pattern: usize,
}

impl UsagePatternStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            patterns: LruStore::new(capacity),
            symbols_per_pattern: DEFAULT_SYMBOLS_PER_PATTERN,
        }
    }

    pub fn with_symbols_per_pattern(mut self, limit: usize) -> Self {
        self.symbols_per_pattern = limit.max(1);
        self
    }

    /// Record one acceptance of `symbol`
    pub fn record(&self, file: &str, kind: CompletionKind, symbol: &str) {
        self.record_at(file, kind, symbol, Utc::now());
    }

    pub fn record_at(&self, file: &str, kind: CompletionKind, symbol: &str, at: DateTime<Utc>) {
        let limit = self.symbols_per_pattern;
        self.patterns.modify(
            (file.to_string(), kind),
            || UsagePattern::new(file, kind),
            |pattern| {
                if let Some(usage) = pattern.usages.iter_mut().find(|u| u.symbol == symbol) {
                    usage.count = usage.count.saturating_add(1);
                    usage.last_used = usage.last_used.max(at);
                    return;
                }
                if pattern.usages.len() >= limit {
                    evict_stalest(&mut pattern.usages);
                }
                pattern.usages.push(SymbolUsage {
                    symbol: symbol.to_string(),
                    count: 1,
                    last_used: at,
                });
            },
        );
    }

    /// Usage of `symbol` in one bucket
    pub fn lookup(&self, file: &str, kind: CompletionKind, symbol: &str) -> Option<SymbolUsage> {
        self.patterns
            .peek(&(file.to_string(), kind))
            .and_then(|pattern| pattern.usage(symbol).cloned())
    }

    /// The bucket for `(file, kind)`, empty when nothing was recorded
    pub fn patterns_for(&self, file: &str, kind: CompletionKind) -> Vec<UsagePattern> {
        self.patterns
            .get(&(file.to_string(), kind))
            .into_iter()
            .collect()
    }

    pub fn clear(&self) {
        self.patterns.clear();
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Removes the usage with the oldest `last_used`, the rarer one on ties
fn evict_stalest(usages: &mut Vec<SymbolUsage>) {
    let stalest = usages
        .iter()
        .enumerate()
        .min_by_key(|(_, u)| (u.last_used, u.count))
        .map(|(i, _)| i);
    if let Some(index) = stalest {
        usages.remove(index);
    }
}

impl Default for UsagePatternStore {
    fn default() -> Self {
        Self::new(1000)
    }
}
