//! Metrics sinks
//!
//! The orchestrator forwards every tracked sample to a [`MetricsSink`].
//! Recording is fire-and-forget: sinks never fail the caller.

use dashmap::DashMap;
use tracing::debug;

/// Destination for named numeric samples
pub trait MetricsSink: Send + Sync {
    fn record_metric(&self, name: &str, value: f64);
}

/// Emits each sample as a `tracing` debug event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetricsSink;

impl MetricsSink for TracingMetricsSink {
    fn record_metric(&self, name: &str, value: f64) {
        debug!(target: "codecortex::metrics", metric = name, value, "metric");
    }
}

/// Discards every sample
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record_metric(&self, _name: &str, _value: f64) {}
}

/// Keeps every sample in memory, keyed by metric name
#[derive(Debug, Default)]
pub struct InMemoryMetricsSink {
    samples: DashMap<String, Vec<f64>>,
}

impl InMemoryMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All samples recorded under `name`, oldest first
    pub fn values(&self, name: &str) -> Vec<f64> {
        self.samples
            .get(name)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn last(&self, name: &str) -> Option<f64> {
        self.samples
            .get(name)
            .and_then(|entry| entry.value().last().copied())
    }

    pub fn count(&self, name: &str) -> usize {
        self.samples.get(name).map(|entry| entry.len()).unwrap_or(0)
    }

    /// Metric names seen so far, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.samples.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn clear(&self) {
        self.samples.clear();
    }
}

impl MetricsSink for InMemoryMetricsSink {
    fn record_metric(&self, name: &str, value: f64) {
        self.samples
            .entry(name.to_string())
            .or_default()
            .push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_sink_keeps_order() {
        let sink = InMemoryMetricsSink::new();
        sink.record_metric("response_time", 120.0);
        sink.record_metric("response_time", 80.0);
        sink.record_metric("error_rate", 0.0);

        assert_eq!(sink.values("response_time"), vec![120.0, 80.0]);
        assert_eq!(sink.last("response_time"), Some(80.0));
        assert_eq!(sink.count("error_rate"), 1);
        assert_eq!(sink.names(), vec!["error_rate", "response_time"]);

        sink.clear();
        assert_eq!(sink.count("response_time"), 0);
    }

    #[test]
    fn test_noop_and_tracing_sinks_accept_samples() {
        NoopMetricsSink.record_metric("x", 1.0);
        TracingMetricsSink.record_metric("x", 1.0);
    }
}
