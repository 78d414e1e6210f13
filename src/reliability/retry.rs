use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategy {
    ExponentialBackoff,
    FixedDelay,
}

/// How many times an operation is attempted and how long to wait in between.
///
/// `max_attempts` counts the first try, so `1` means no retry at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub strategy: RetryStrategy,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            strategy: RetryStrategy::ExponentialBackoff,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A single attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Fixed delay between attempts, no jitter.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            strategy: RetryStrategy::FixedDelay,
            jitter: false,
        }
    }

    /// Exponential backoff starting at `base_delay`.
    pub fn backoff(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    /// True once `attempts` tries have been made.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }

    /// Delay before retry number `attempt` (0 = first retry).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_millis = self.base_millis();
        let delay = match self.strategy {
            RetryStrategy::ExponentialBackoff => {
                let multiplier = 2_u64.saturating_pow(attempt);
                Duration::from_millis(base_millis.saturating_mul(multiplier))
            }
            RetryStrategy::FixedDelay => self.base_delay,
        };

        let capped_delay = std::cmp::min(delay, self.max_delay);

        if self.jitter {
            apply_jitter(capped_delay)
        } else {
            capped_delay
        }
    }

    fn base_millis(&self) -> u64 {
        u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX)
    }
}

fn apply_jitter(delay: Duration) -> Duration {
    let mut rng = rand::rng();
    let jitter_factor = rng.random_range(0.5..1.5); // ±50% jitter
    Duration::from_secs_f64(delay.as_secs_f64() * jitter_factor)
}
