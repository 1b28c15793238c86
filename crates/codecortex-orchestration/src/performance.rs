//! Rolling performance samples and the concurrency tuner
//!
//! The tuner is a hysteresis band around a latency target: it shrinks the
//! admission cap when the recent mean latency runs well above target and
//! grows it when latency is comfortably below target and errors are rare.

use chrono::{DateTime, Utc};
use codecortex_config::TunerConfig;
use serde::{Deserialize, Serialize};

// Guards the float steps against landing a hair above an integer
const STEP_EPSILON: f64 = 1e-9;

/// In-flight count and cap at the time a sample was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub active_requests: usize,
    pub max_concurrent_requests: usize,
}

/// One tracked request outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub response_time_ms: f64,
    /// Requests per second this request alone would sustain
    pub throughput: f64,
    /// 0 on success, 1 on failure
    pub error_rate: f64,
    pub resource_usage: ResourceUsage,
    /// Proxy for user satisfaction: the response confidence, 0 on failure
    pub user_satisfaction: f64,
    pub timestamp: DateTime<Utc>,
}

impl PerformanceMetrics {
    pub fn success(response_time_ms: f64, confidence: f64, resource_usage: ResourceUsage) -> Self {
        Self::sample(response_time_ms, 0.0, confidence, resource_usage)
    }

    pub fn failure(response_time_ms: f64, resource_usage: ResourceUsage) -> Self {
        Self::sample(response_time_ms, 1.0, 0.0, resource_usage)
    }

    fn sample(
        response_time_ms: f64,
        error_rate: f64,
        user_satisfaction: f64,
        resource_usage: ResourceUsage,
    ) -> Self {
        let throughput = if response_time_ms > 0.0 {
            1000.0 / response_time_ms
        } else {
            0.0
        };
        Self {
            response_time_ms,
            throughput,
            error_rate,
            resource_usage,
            user_satisfaction,
            timestamp: Utc::now(),
        }
    }
}

/// Summary of the recent performance window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub samples: usize,
    pub mean_response_time_ms: f64,
    pub mean_error_rate: f64,
}

impl PerformanceSnapshot {
    pub fn from_samples(samples: &[PerformanceMetrics]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        Self {
            samples: samples.len(),
            mean_response_time_ms: samples.iter().map(|s| s.response_time_ms).sum::<f64>() / n,
            mean_error_rate: samples.iter().map(|s| s.error_rate).sum::<f64>() / n,
        }
    }
}

/// What the tuner wants done with the admission cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunerDecision {
    Hold,
    Shrink(usize),
    Grow(usize),
}

/// Decide the next admission cap
///
/// `total_samples` is the size of the whole rolling buffer; `recent` is its
/// most recent `config.window` entries.
pub fn tune(
    current_cap: usize,
    total_samples: usize,
    recent: &[PerformanceMetrics],
    config: &TunerConfig,
) -> TunerDecision {
    if total_samples < config.min_samples || recent.is_empty() {
        return TunerDecision::Hold;
    }

    let snapshot = PerformanceSnapshot::from_samples(recent);
    let target = config.target_response_time_ms;

    if snapshot.mean_response_time_ms > target * config.shrink_above {
        let floor = config.min_concurrency.max(1);
        if current_cap <= floor {
            return TunerDecision::Hold;
        }
        let scaled = ((current_cap as f64) * (1.0 - config.step) + STEP_EPSILON).floor() as usize;
        let next = scaled.max(floor).min(current_cap - 1);
        return TunerDecision::Shrink(next);
    }

    if snapshot.mean_response_time_ms < target * config.grow_below
        && snapshot.mean_error_rate < config.max_error_rate_for_growth
    {
        let ceiling = config.max_concurrency;
        if current_cap >= ceiling {
            return TunerDecision::Hold;
        }
        let scaled = ((current_cap as f64) * (1.0 + config.step) - STEP_EPSILON).ceil() as usize;
        let next = scaled.min(ceiling).max(current_cap + 1);
        return TunerDecision::Grow(next);
    }

    TunerDecision::Hold
}
