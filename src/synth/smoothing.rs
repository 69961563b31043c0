use crate::synth::prelude::sanitize_sample_rate;

/// Linear ramp toward a target with a constant per-sample step.
///
/// The ramp length is fixed when a new target is set; `reset` only changes
/// the length used by subsequent targets, so an in-flight ramp keeps its step.
#[derive(Clone, Debug)]
pub struct SmoothedValue {
    current: f32,
    target: f32,
    step: f32,
    countdown: usize,
    steps_to_target: usize,
}

impl SmoothedValue {
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            countdown: 0,
            steps_to_target: 0,
        }
    }

    /// Sets the ramp length for future targets.
    pub fn reset(&mut self, sample_rate: f64, ramp_seconds: f64) {
        let samples = (sanitize_sample_rate(sample_rate) * ramp_seconds.max(0.0)).floor();
        self.steps_to_target = samples as usize;
    }

    /// Jumps straight to `value`, cancelling any ramp.
    pub fn set_current_and_target(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.countdown = 0;
    }

    /// Starts a ramp toward `value`. Re-setting the current target is a no-op.
    pub fn set_target(&mut self, value: f32) {
        if value == self.target {
            return;
        }
        if self.steps_to_target == 0 {
            self.set_current_and_target(value);
            return;
        }
        self.target = value;
        self.countdown = self.steps_to_target;
        self.step = (self.target - self.current) / self.countdown as f32;
    }

    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if self.countdown == 0 {
            return self.target;
        }
        self.countdown -= 1;
        if self.countdown == 0 {
            self.current = self.target;
        } else {
            self.current += self.step;
            // float drift must never carry us past the target
            if (self.step > 0.0 && self.current > self.target)
                || (self.step < 0.0 && self.current < self.target)
            {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Advances `samples` steps at once.
    pub fn skip(&mut self, samples: usize) -> f32 {
        if samples >= self.countdown {
            self.set_current_and_target(self.target);
            return self.target;
        }
        self.current += self.step * samples as f32;
        self.countdown -= samples;
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_smoothing(&self) -> bool {
        self.countdown > 0
    }
}

impl Default for SmoothedValue {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_target_after_ramp_length() {
        let mut v = SmoothedValue::new(0.0);
        v.reset(1000.0, 0.1);
        v.set_target(1.0);
        for _ in 0..99 {
            assert!(v.next_value() < 1.0);
        }
        assert_eq!(v.next_value(), 1.0);
        assert!(!v.is_smoothing());
    }

    #[test]
    fn monotonic_without_overshoot() {
        let mut v = SmoothedValue::new(5000.0);
        v.reset(48000.0, 0.05);
        v.set_target(120.0);
        let mut prev = v.current();
        for _ in 0..3000 {
            let next = v.next_value();
            assert!(next <= prev, "ramp reversed: {prev} -> {next}");
            assert!(next >= 120.0, "overshoot: {next}");
            prev = next;
        }
        assert_eq!(prev, 120.0);
    }

    #[test]
    fn same_target_does_not_restart_ramp() {
        let mut v = SmoothedValue::new(0.0);
        v.reset(100.0, 1.0);
        v.set_target(1.0);
        for _ in 0..50 {
            v.next_value();
        }
        v.set_target(1.0);
        for _ in 0..49 {
            v.next_value();
        }
        assert_eq!(v.next_value(), 1.0);
    }

    #[test]
    fn new_ramp_length_leaves_running_ramp_alone() {
        let mut v = SmoothedValue::new(0.0);
        v.reset(100.0, 1.0);
        v.set_target(1.0);
        v.next_value();
        v.reset(100.0, 10.0);
        let a = v.current();
        let b = v.next_value();
        assert!(((b - a) - 0.01).abs() < 1e-6);
    }

    #[test]
    fn zero_length_ramp_jumps() {
        let mut v = SmoothedValue::new(0.0);
        v.reset(48000.0, 0.0);
        v.set_target(0.7);
        assert_eq!(v.current(), 0.7);
    }

    #[test]
    fn skip_lands_on_target() {
        let mut v = SmoothedValue::new(0.0);
        v.reset(100.0, 1.0);
        v.set_target(2.0);
        assert_eq!(v.skip(1000), 2.0);
        assert!(!v.is_smoothing());
    }
}
