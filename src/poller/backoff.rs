//! Idle-wait pacing
//!
//! After a successful cycle the loop waits the plain interval. Each
//! consecutive failure doubles the wait up to a ceiling, with a random
//! extra fraction so several pollers do not retry in lockstep.

use crate::config::PollConfig;
use rand::Rng;
use std::time::Duration;

/// Exponent cap; 2^16 intervals is far beyond any sane ceiling anyway
const MAX_EXPONENT: u32 = 16;

/// Exponential backoff with jitter over a fixed base interval
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    jitter: f64,
    failures: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, jitter: f64) -> Self {
        Self {
            base,
            max: max.max(base),
            jitter: jitter.clamp(0.0, 1.0),
            failures: 0,
        }
    }

    pub fn from_config(config: &PollConfig) -> Self {
        Self::new(config.interval(), config.max_backoff(), config.jitter)
    }

    /// Consecutive failures since the last success
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Delay before the next cycle, without jitter
    pub fn base_delay(&self) -> Duration {
        if self.failures == 0 {
            return self.base;
        }
        let exponent = (self.failures - 1).min(MAX_EXPONENT);
        self.base
            .saturating_mul(1u32 << exponent)
            .min(self.max)
    }

    /// Delay before the next cycle
    ///
    /// Jitter only applies while backing off; the plain interval is exact.
    pub fn delay(&self) -> Duration {
        let delay = self.base_delay();
        if self.failures == 0 || self.jitter <= 0.0 {
            return delay;
        }
        let extra = rand::thread_rng().gen_range(0.0..self.jitter);
        delay.mul_f64(1.0 + extra).min(self.max)
    }
}
