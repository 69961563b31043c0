use crate::synth::prelude::{sanitize_sample_rate, TAU};

/// Phase-accumulating sine oscillator.
///
/// Each instance is owned by exactly one engine (and one role inside it);
/// nothing shares phase state.
#[derive(Clone, Debug)]
pub struct Oscillator {
    phase: f32,
    frequency: f32,
    sample_rate: f32,
    phase_increment: f32, // cycles per sample
}

impl Oscillator {
    pub fn new(frequency: f32, sample_rate: f64) -> Self {
        let mut osc = Self {
            phase: 0.0,
            frequency,
            sample_rate: sanitize_sample_rate(sample_rate) as f32,
            phase_increment: 0.0,
        };
        osc.set_frequency(frequency);
        osc
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sanitize_sample_rate(sample_rate) as f32;
        self.set_frequency(self.frequency);
        self.reset();
    }

    /// Takes effect on the next sample; the phase is kept. Non-finite
    /// frequencies are ignored.
    #[inline]
    pub fn set_frequency(&mut self, frequency: f32) {
        if !frequency.is_finite() {
            return;
        }
        self.frequency = frequency;
        self.phase_increment = frequency / self.sample_rate;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Returns the current sample and advances the phase by one step.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let value = (self.phase * TAU).sin();
        self.advance();
        value
    }

    /// Advances the phase without evaluating the waveform.
    #[inline]
    pub fn advance(&mut self) {
        self.phase += self.phase_increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(440.0, 44100.0)
    }
}
