#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Multiplicative wave escalation policy.
//!
//! Enemy counts grow by a constant factor between waves and are rounded up,
//! so every wave is at least as large as the previous one. No ceiling is
//! applied beyond saturation at `u32::MAX`; the wave cap enforced by the
//! sequencer is the only bound on an encounter.

use thiserror::Error;
use wave_siege_core::{Wave, WaveIndex};

/// Products closer than this (relative) to an integer are treated as that integer.
const INTEGER_SNAP_TOLERANCE: f64 = 1e-9;

/// Errors raised when constructing an [`EscalationPolicy`].
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum EscalationError {
    /// The factor does not describe growth.
    #[error("escalation factor must be a finite number greater than 1, got {0}")]
    InvalidFactor(f64),
}

/// Computes the enemy count of the wave following one with `prev_count` enemies.
///
/// Returns `ceil(prev_count * factor)`. Floating point noise is snapped to the
/// nearest integer before rounding up so factors such as `1.1` that are not
/// exactly representable do not overshoot by one. The result saturates at
/// `u32::MAX` and is never smaller than `prev_count`.
#[must_use]
pub fn next_count(prev_count: u32, factor: f64) -> u32 {
    let product = f64::from(prev_count) * factor;
    if !product.is_finite() || product >= f64::from(u32::MAX) {
        return if product.is_nan() { prev_count } else { u32::MAX };
    }

    let nearest = product.round();
    let rounded = if (product - nearest).abs() <= nearest.abs() * INTEGER_SNAP_TOLERANCE {
        nearest
    } else {
        product.ceil()
    };

    (rounded.max(0.0) as u32).max(prev_count)
}

/// Validated growth factor applied between consecutive waves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EscalationPolicy {
    factor: f64,
}

impl EscalationPolicy {
    /// Creates a policy, rejecting factors that are not finite or not above one.
    pub fn new(factor: f64) -> Result<Self, EscalationError> {
        if !factor.is_finite() || factor <= 1.0 {
            return Err(EscalationError::InvalidFactor(factor));
        }
        Ok(Self { factor })
    }

    /// Growth factor applied between waves.
    #[must_use]
    pub const fn factor(&self) -> f64 {
        self.factor
    }

    /// Enemy count following a wave of `prev_count` enemies.
    #[must_use]
    pub fn next_count(&self, prev_count: u32) -> u32 {
        next_count(prev_count, self.factor)
    }

    /// Wave following the provided one.
    #[must_use]
    pub fn next_wave(&self, wave: Wave) -> Wave {
        Wave::new(wave.index().next(), self.next_count(wave.enemy_count()))
    }
}

/// Iterator over the waves of an encounter, starting at [`WaveIndex::FIRST`].
#[derive(Clone, Debug)]
pub struct WaveSchedule {
    policy: EscalationPolicy,
    upcoming: Option<Wave>,
    max_waves: Option<u32>,
}

impl WaveSchedule {
    /// Creates an unbounded schedule whose first wave holds `seed_count` enemies.
    #[must_use]
    pub fn new(policy: EscalationPolicy, seed_count: u32) -> Self {
        Self {
            policy,
            upcoming: Some(Wave::new(WaveIndex::FIRST, seed_count)),
            max_waves: None,
        }
    }

    /// Stops the schedule after `max_waves` waves.
    #[must_use]
    pub fn capped(mut self, max_waves: u32) -> Self {
        self.max_waves = Some(max_waves);
        self
    }
}

impl Iterator for WaveSchedule {
    type Item = Wave;

    fn next(&mut self) -> Option<Wave> {
        let wave = self.upcoming?;
        if self
            .max_waves
            .is_some_and(|max_waves| wave.index().get() > max_waves)
        {
            self.upcoming = None;
            return None;
        }

        self.upcoming = if wave.index().get() == u32::MAX {
            None
        } else {
            Some(self.policy.next_wave(wave))
        };
        Some(wave)
    }
}
