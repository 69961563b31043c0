use crate::synth::prelude::{sanitize_sample_rate, MIN_RAMP_SECONDS};

// Absorbs accumulated rounding so a ramp of N increments ends on sample N.
const RAMP_SNAP_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationState {
    Idle,
    Activating,
    Active,
    Deactivating,
}

/// Power-transition envelope in `[0, 1]`.
///
/// The per-sample increment is latched when a ramp starts and stays fixed
/// until the next ramp starts; later parameter changes never touch it.
#[derive(Clone, Debug)]
pub struct ActivationEnvelope {
    value: f64,
    increment: f64,
    state: ActivationState,
}

impl ActivationEnvelope {
    pub fn new() -> Self {
        Self {
            value: 0.0,
            increment: 0.0,
            state: ActivationState::Idle,
        }
    }

    /// Per-sample increment for a full-scale ramp of `seconds` at `sample_rate`.
    pub fn increment_for(seconds: f64, sample_rate: f64) -> f64 {
        let floor = f64::from(MIN_RAMP_SECONDS);
        let seconds = if seconds.is_finite() { seconds.max(floor) } else { floor };
        1.0 / (seconds * sanitize_sample_rate(sample_rate))
    }

    pub fn start_activation(&mut self, increment: f64) {
        self.increment = increment;
        self.state = if self.value >= 1.0 {
            ActivationState::Active
        } else {
            ActivationState::Activating
        };
    }

    pub fn start_deactivation(&mut self, increment: f64) {
        self.increment = increment;
        self.state = if self.value <= 0.0 {
            ActivationState::Idle
        } else {
            ActivationState::Deactivating
        };
    }

    /// Advances one sample and returns the new value.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        match self.state {
            ActivationState::Activating => {
                self.value += self.increment;
                if self.value >= 1.0 - RAMP_SNAP_EPSILON {
                    self.value = 1.0;
                    self.state = ActivationState::Active;
                }
            }
            ActivationState::Deactivating => {
                self.value -= self.increment;
                if self.value <= RAMP_SNAP_EPSILON {
                    self.value = 0.0;
                    self.state = ActivationState::Idle;
                }
            }
            ActivationState::Idle | ActivationState::Active => {}
        }
        self.value as f32
    }

    pub fn value(&self) -> f32 {
        self.value as f32
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn is_ramping(&self) -> bool {
        matches!(
            self.state,
            ActivationState::Activating | ActivationState::Deactivating
        )
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ActivationEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_second_ramp_lands_on_sample_96000() {
        let mut env = ActivationEnvelope::new();
        env.start_activation(ActivationEnvelope::increment_for(2.0, 48000.0));
        for _ in 0..95999 {
            env.next_value();
        }
        assert!(env.value() < 1.0);
        assert_eq!(env.state(), ActivationState::Activating);
        assert_eq!(env.next_value(), 1.0);
        assert_eq!(env.state(), ActivationState::Active);
    }

    #[test]
    fn deactivation_is_monotonic_and_clamped() {
        let mut env = ActivationEnvelope::new();
        env.start_activation(1.0);
        env.next_value();
        env.start_deactivation(ActivationEnvelope::increment_for(0.01, 1000.0));
        let mut prev = env.value();
        while env.is_ramping() {
            let v = env.next_value();
            assert!(v <= prev && v >= 0.0);
            prev = v;
        }
        assert_eq!(env.value(), 0.0);
        assert_eq!(env.state(), ActivationState::Idle);
    }

    #[test]
    fn degenerate_time_uses_floor() {
        let inc = ActivationEnvelope::increment_for(-3.0, 0.0);
        assert!((inc * 0.001 * 44100.0 - 1.0).abs() < 1e-6, "got {inc}");
    }

    #[test]
    fn release_from_idle_stays_idle() {
        let mut env = ActivationEnvelope::new();
        env.start_deactivation(0.5);
        assert_eq!(env.state(), ActivationState::Idle);
        assert_eq!(env.next_value(), 0.0);
    }
}
