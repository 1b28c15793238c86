//! Rate limiting and backoff for backend calls
//!
//! [`SlidingWindowLimiter`] caps how many calls a gateway issues within a
//! trailing window (60 seconds by default). [`ExponentialBackoff`] computes
//! retry delays for callers that choose to retry a retryable error.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use codecortex_config::BackoffConfig;

use crate::error::AiError;

/// Sliding-window rate limiter
///
/// Keeps the admission timestamps that fall inside the trailing window.
/// After a successful admission the window never holds more than `limit`
/// timestamps.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    limit: usize,
    window: Duration,
    timestamps: VecDeque<Instant>,
}

impl SlidingWindowLimiter {
    /// Limiter admitting `per_minute` calls per trailing minute
    pub fn per_minute(per_minute: usize) -> Self {
        Self::with_window(per_minute, Duration::from_secs(60))
    }

    pub fn with_window(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            timestamps: VecDeque::with_capacity(limit.min(1024)),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Admit a call now, or fail with `RateLimitExceeded`
    pub fn try_acquire(&mut self) -> Result<(), AiError> {
        self.try_acquire_at(Instant::now())
    }

    /// Admit a call at `now`
    pub fn try_acquire_at(&mut self, now: Instant) -> Result<(), AiError> {
        self.evict_expired(now);
        if self.timestamps.len() >= self.limit {
            return Err(AiError::RateLimitExceeded {
                retry_after_ms: Some(self.time_until_available_at(now).as_millis() as u64),
            });
        }
        self.timestamps.push_back(now);
        Ok(())
    }

    /// Number of admissions inside the window ending at `now`
    pub fn in_window_at(&mut self, now: Instant) -> usize {
        self.evict_expired(now);
        self.timestamps.len()
    }

    pub fn in_window(&mut self) -> usize {
        self.in_window_at(Instant::now())
    }

    /// Time until the oldest admission leaves the window
    pub fn time_until_available_at(&self, now: Instant) -> Duration {
        if self.timestamps.len() < self.limit {
            return Duration::ZERO;
        }
        match self.timestamps.front() {
            Some(oldest) => self
                .window
                .saturating_sub(now.saturating_duration_since(*oldest)),
            // limit == 0 never admits anything
            None => self.window,
        }
    }

    fn evict_expired(&mut self, now: Instant) {
        while let Some(oldest) = self.timestamps.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Exponential backoff with additive jitter
///
/// `delay(n) = min(max, base * 2^(n-1) + uniform(0, jitter * base * 2^(n-1)))`
/// for attempt `n >= 1`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Duration,
    jitter_fraction: f64,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(base_delay: Duration, max_delay: Duration, jitter_fraction: f64) -> Self {
        Self {
            base_delay,
            max_delay,
            jitter_fraction: jitter_fraction.clamp(0.0, 1.0),
            attempt: 0,
        }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.jitter_fraction,
        )
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(62) as i32;
        let raw = self.base_delay.as_secs_f64() * 2f64.powi(exponent);
        let jitter = if self.jitter_fraction > 0.0 {
            rand::random::<f64>() * self.jitter_fraction * raw
        } else {
            0.0
        };
        let capped = (raw + jitter).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }

    /// Advance to the next attempt and return its delay
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        self.delay_for_attempt(self.attempt)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::from_config(&BackoffConfig::default())
    }
}
