// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Exponential retry policy with randomized jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry, before jitter.
    pub initial_interval: Duration,
    /// Growth applied to the interval after every retry.
    pub multiplier: f64,
    /// Each delay is drawn from `interval * (1 ± randomization_factor)`.
    pub randomization_factor: f64,
    /// Cap on the interval, before jitter.
    pub max_interval: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(100),
            multiplier: 1.5,
            randomization_factor: 0.5,
            max_interval: Duration::from_secs(60),
        }
    }
}

impl BackoffConfig {
    #[must_use]
    pub fn with_initial_interval(initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            ..Self::default()
        }
    }
}

/// Tracks the current interval of one retry sequence.
#[derive(Debug)]
pub struct BackoffState {
    config: BackoffConfig,
    current: Duration,
    rng: fastrand::Rng,
}

impl BackoffState {
    pub fn new(config: BackoffConfig) -> Self {
        Self::with_rng(config, fastrand::Rng::new())
    }

    pub fn with_rng(config: BackoffConfig, rng: fastrand::Rng) -> Self {
        Self {
            current: config.initial_interval,
            config,
            rng,
        }
    }

    /// Returns the delay before the next attempt and grows the interval.
    pub fn next_delay(&mut self) -> Duration {
        let interval = self.current.as_secs_f64();
        let delta = self.config.randomization_factor * interval;
        let low = interval - delta;
        let delay = low + self.rng.f64() * 2.0 * delta;

        let grown = interval * self.config.multiplier;
        self.current = Duration::from_secs_f64(grown.min(self.config.max_interval.as_secs_f64()));

        Duration::from_secs_f64(delay.max(0.0))
    }

    pub fn reset(&mut self) {
        self.current = self.config.initial_interval;
    }

    #[must_use]
    pub fn current_interval(&self) -> Duration {
        self.current
    }
}
