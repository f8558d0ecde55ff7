//! Exponential retry backoff with jitter.
//!
//! The value for step `N` lies in `[initial * m^N, initial * m^(N + jitter)]`,
//! clipped to `[initial, max]`. Near the maximum the jitter range wins over
//! the range start.

use std::time::Duration;

use rand::Rng;

use beacon_core::errors::BackoffError;

#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    initial: f64,
    maximum: f64,
    multiplier: f64,
    jitter: f64,
    current_base: f64,
    current_range: f64,
    step: f64,
}

impl ExponentialBackoff {
    pub fn new(
        initial_ms: u64,
        maximum_ms: u64,
        multiplier: f64,
        jitter: f64,
    ) -> Result<Self, BackoffError> {
        let invalid = |reason: &str| BackoffError::InvalidConfig {
            config: format!("E,{initial_ms},{maximum_ms},{multiplier},{jitter}"),
            reason: reason.to_string(),
        };
        if initial_ms > maximum_ms {
            return Err(invalid("initial delay exceeds maximum"));
        }
        if !multiplier.is_finite() || multiplier <= 1.0 {
            return Err(invalid("multiplier must be greater than 1"));
        }
        if !jitter.is_finite() || jitter < 0.0 {
            return Err(invalid("jitter must be non-negative"));
        }
        let mut backoff = Self {
            initial: initial_ms as f64,
            maximum: maximum_ms as f64,
            multiplier,
            jitter,
            current_base: 0.0,
            current_range: 0.0,
            step: 0.0,
        };
        backoff.increase();
        Ok(backoff)
    }

    /// Parse `"E,<initial_ms>,<max_ms>,<multiplier>,<jitter>"`.
    pub fn from_config(config: &str) -> Result<Self, BackoffError> {
        let invalid = |reason: &str| BackoffError::InvalidConfig {
            config: config.to_string(),
            reason: reason.to_string(),
        };
        let parts: Vec<&str> = config.split(',').map(str::trim).collect();
        let [kind, initial, maximum, multiplier, jitter] = parts.as_slice() else {
            return Err(invalid("expected 5 comma-separated fields"));
        };
        if *kind != "E" {
            return Err(invalid("only exponential (E) backoff is supported"));
        }
        let initial = initial
            .parse::<u64>()
            .map_err(|_| invalid("initial delay is not an integer"))?;
        let maximum = maximum
            .parse::<u64>()
            .map_err(|_| invalid("maximum delay is not an integer"))?;
        let multiplier = multiplier
            .parse::<f64>()
            .map_err(|_| invalid("multiplier is not a number"))?;
        let jitter = jitter
            .parse::<f64>()
            .map_err(|_| invalid("jitter is not a number"))?;
        Self::new(initial, maximum, multiplier, jitter).map_err(|e| match e {
            BackoffError::InvalidConfig { reason, .. } => invalid(&reason),
        })
    }

    /// Current delay in milliseconds, with a random point inside the jitter range.
    pub fn value(&self) -> u64 {
        let mut value = self.current_base;
        if self.current_range > 0.0 {
            value += rand::rng().random::<f64>() * self.current_range;
        }
        value.floor() as u64
    }

    /// Advance one step. No-op once the range reaches the maximum.
    pub fn increase(&mut self) {
        if self.current_base + self.current_range >= self.maximum {
            return;
        }
        self.current_base = (self.initial * self.multiplier.powf(self.step)).floor();
        self.current_range = if self.jitter > 0.0 {
            (self.initial * self.multiplier.powf(self.step + self.jitter) - self.current_base)
                .floor()
        } else {
            0.0
        };
        if self.current_base + self.current_range > self.maximum {
            self.current_base = self.initial.max(self.maximum - self.current_range);
            self.current_range = self.current_range.min(self.maximum - self.current_base);
        }
        self.step += 1.0;
    }

    /// Back to the first step.
    pub fn reset(&mut self) {
        self.current_base = 0.0;
        self.current_range = 0.0;
        self.step = 0.0;
        self.increase();
    }
}

/// Backoff bound to its config string. A changed string is re-parsed before
/// each advance; an invalid one keeps the previous policy.
#[derive(Debug, Clone)]
pub struct ConfiguredBackoff {
    config: String,
    backoff: ExponentialBackoff,
}

impl ConfiguredBackoff {
    pub fn new(config: &str) -> Result<Self, BackoffError> {
        Ok(Self {
            config: config.to_string(),
            backoff: ExponentialBackoff::from_config(config)?,
        })
    }

    pub fn config(&self) -> &str {
        &self.config
    }

    /// Return the current delay, then step forward.
    pub fn advance(&mut self, config: &str) -> Duration {
        self.check_config_update(config);
        let delay = self.backoff.value();
        self.backoff.increase();
        Duration::from_millis(delay)
    }

    /// Current delay without stepping.
    pub fn current(&self) -> Duration {
        Duration::from_millis(self.backoff.value())
    }

    pub fn reset(&mut self) {
        self.backoff.reset();
    }

    fn check_config_update(&mut self, config: &str) {
        if config == self.config {
            return;
        }
        match ExponentialBackoff::from_config(config) {
            Ok(backoff) => {
                tracing::info!(config, "backoff configuration updated");
                self.backoff = backoff;
                self.config = config.to_string();
            }
            Err(e) => {
                tracing::warn!(error = %e, "invalid backoff configuration, keeping current settings");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_never_exceeds_maximum() {
        let mut b = ExponentialBackoff::new(1000, 5000, 2.0, 1.0).unwrap();
        for _ in 0..20 {
            assert!(b.current_base + b.current_range <= b.maximum);
            assert!(b.current_base >= b.initial);
            b.increase();
        }
    }
}
