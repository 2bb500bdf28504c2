//! Wait between retry attempts.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    /// Retry immediately
    None,
    /// Wait `initial_ms` before every retry
    #[default]
    Fixed,
    /// Start at `initial_ms`, grow by `multiplier`, cap at `max_ms`
    Exponential,
}

/// Backoff between attempts of one retry sequence.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Backoff {
    pub kind: BackoffKind,
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            kind: BackoffKind::Fixed,
            initial_ms: 500,
            max_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

impl Backoff {
    /// No wait at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            kind: BackoffKind::None,
            ..Self::default()
        }
    }

    /// Same wait before every retry.
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self {
            kind: BackoffKind::Fixed,
            initial_ms: delay_ms,
            max_ms: delay_ms,
            ..Self::default()
        }
    }

    /// Delay before the retry that follows failed attempt `attempt` (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let millis = match self.kind {
            BackoffKind::None => 0,
            BackoffKind::Fixed => self.initial_ms,
            BackoffKind::Exponential => {
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
                let delay = (self.initial_ms as f64) * self.multiplier.powi(attempt as i32);
                // Saturates on overflow
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let delay_ms = delay as u64;
                delay_ms.min(self.max_ms)
            }
        };
        Duration::from_millis(millis)
    }
}
