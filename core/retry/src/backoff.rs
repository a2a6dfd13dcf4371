//! Exponential backoff with jitter.

use std::time::Duration;

use agentkit_config::EngineConfig;
use rand::Rng;

pub struct BackoffController {
    base_delay: Duration,
    max_attempts: u32,
    jitter_fraction: f64,
}

impl BackoffController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            base_delay: config.retry_base_delay,
            max_attempts: config.retry_max_attempts,
            jitter_fraction: config.retry_jitter_fraction,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Delay before the n-th retry (n starting at 1), `base * 2^(n-1)` plus
    /// up to `jitter_fraction` of that delay, applied symmetrically.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let scaled = self.base_delay.as_secs_f64() * 2f64.powi(exponent as i32);
        let jitter_span = scaled * self.jitter_fraction;
        let jitter = rand::rng().random_range(-jitter_span..=jitter_span);
        Duration::from_secs_f64((scaled + jitter).max(0.0))
    }
}
