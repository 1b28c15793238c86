//! User feedback log and the retraining signal

use std::sync::Arc;

use chrono::{DateTime, Utc};
use codecortex_common::BoundedBuffer;
use codecortex_config::FeedbackConfig;
use codecortex_providers::{AiError, AiResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A user's verdict on one response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeedback {
    pub request_id: String,
    /// 1 (worst) to 5 (best)
    pub rating: u8,
    pub text: String,
    pub accepted: bool,
    pub timestamp: DateTime<Utc>,
    /// Free-form tag describing where the feedback came from
    pub context: String,
}

impl UserFeedback {
    pub fn new(request_id: impl Into<String>, rating: u8, accepted: bool) -> Self {
        Self {
            request_id: request_id.into(),
            rating,
            text: String::new(),
            accepted,
            timestamp: Utc::now(),
            context: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// Raised when recent feedback is predominantly negative
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrainingSignal {
    pub window: usize,
    pub low_ratings: usize,
    pub low_fraction: f64,
}

/// Callback invoked with every retraining signal
pub type RetrainingHook = Arc<dyn Fn(&RetrainingSignal) + Send + Sync>;

/// Bounded FIFO of user feedback
pub struct FeedbackLog {
    entries: BoundedBuffer<UserFeedback>,
    config: FeedbackConfig,
    hook: Option<RetrainingHook>,
}

impl FeedbackLog {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            entries: BoundedBuffer::new(config.capacity),
            config,
            hook: None,
        }
    }

    pub fn set_hook(&mut self, hook: RetrainingHook) {
        self.hook = Some(hook);
    }

    /// Append `feedback` and evaluate the retraining condition
    ///
    /// Ratings outside `1..=5` are rejected.
    pub fn record(&self, feedback: UserFeedback) -> AiResult<Option<RetrainingSignal>> {
        if !(1..=5).contains(&feedback.rating) {
            return Err(AiError::InvalidRequest(format!(
                "feedback rating {} outside 1..=5",
                feedback.rating
            )));
        }

        debug!(
            request_id = %feedback.request_id,
            rating = feedback.rating,
            accepted = feedback.accepted,
            "Recorded user feedback"
        );
        self.entries.push(feedback);

        let signal = self.evaluate();
        if let Some(signal) = &signal {
            warn!(
                window = signal.window,
                low_ratings = signal.low_ratings,
                low_fraction = signal.low_fraction,
                "Recent feedback suggests model retraining is needed"
            );
            if let Some(hook) = &self.hook {
                hook(signal);
            }
        }
        Ok(signal)
    }

    fn evaluate(&self) -> Option<RetrainingSignal> {
        let recent = self.entries.recent(self.config.window);
        if recent.len() < self.config.min_samples {
            return None;
        }
        let low_ratings = recent
            .iter()
            .filter(|f| f.rating < self.config.low_rating)
            .count();
        let low_fraction = low_ratings as f64 / recent.len() as f64;
        (low_fraction > self.config.low_rating_fraction).then_some(RetrainingSignal {
            window: recent.len(),
            low_ratings,
            low_fraction,
        })
    }

    /// Up to `n` most recent entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<UserFeedback> {
        self.entries.recent(n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
