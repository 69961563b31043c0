use super::buffer::AudioBuffer;
use super::context::ProcessSpec;
use super::diagnostics::LoadMeter;
use super::engine::SoundEngine;
use super::oscillator::Oscillator;
use super::params::EngineParameterSet;
use super::prelude::{AUDIBILITY_THRESHOLD, MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};
use super::smoothing::SmoothedValue;

const FADE_SECONDS: f64 = 0.02;

/// Vibrato'd carrier pitch, clamped into the audible safety band.
#[inline]
pub fn modulated_pitch(pitch: f32, mod_depth: f32, lfo_sample: f32) -> f32 {
    let modulated = pitch + pitch * mod_depth * lfo_sample;
    if modulated.is_nan() {
        return MIN_FREQUENCY_HZ;
    }
    modulated.clamp(MIN_FREQUENCY_HZ, MAX_FREQUENCY_HZ)
}

/// Servo whine: one sine carrier with LFO-driven pitch modulation.
#[derive(Debug)]
pub struct ServoEngine {
    carrier: Oscillator,
    lfo: Oscillator,
    fade: SmoothedValue,
    enabled: bool,
    level: f32,
    pitch: f32,
    mod_depth: f32,
    mod_rate: f32,
    spec: ProcessSpec,
    meter: LoadMeter,
}

impl ServoEngine {
    pub fn new() -> Self {
        let spec = ProcessSpec::default();
        Self {
            carrier: Oscillator::new(440.0, spec.sample_rate),
            lfo: Oscillator::new(1.0, spec.sample_rate),
            fade: SmoothedValue::new(1.0),
            enabled: true,
            level: 0.0,
            pitch: 440.0,
            mod_depth: 0.1,
            mod_rate: 1.0,
            spec,
            meter: LoadMeter::new(spec.sample_rate),
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Carrier frequency applied on the most recent sample.
    pub fn current_pitch(&self) -> f32 {
        self.carrier.frequency()
    }
}

impl Default for ServoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundEngine for ServoEngine {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.spec = spec.sanitized();
        self.carrier.prepare(self.spec.sample_rate);
        self.lfo.prepare(self.spec.sample_rate);
        self.fade.reset(self.spec.sample_rate, FADE_SECONDS);
        self.meter.prepare(self.spec.sample_rate);
        self.reset();
    }

    fn reset(&mut self) {
        self.carrier.reset();
        self.lfo.reset();
        self.fade
            .set_current_and_target(if self.enabled { 1.0 } else { 0.0 });
    }

    fn update_parameters(&mut self, params: &EngineParameterSet) {
        let servo = &params.servo;
        self.level = servo.level;
        self.pitch = servo.pitch;
        self.mod_depth = servo.mod_depth;
        self.mod_rate = servo.mod_rate;
        self.lfo.set_frequency(self.mod_rate);
    }

    fn process_adding_to(&mut self, buffer: &mut AudioBuffer) {
        if !self.is_processing() {
            self.meter.record_idle();
            return;
        }
        if self.level.is_nan() || self.level < AUDIBILITY_THRESHOLD {
            // a pending enable/disable fade still has to run out
            self.fade.skip(buffer.num_samples());
            self.meter.record_idle();
            return;
        }
        let started = self.meter.start();

        for i in 0..buffer.num_samples() {
            let lfo_sample = self.lfo.next_sample();
            self.carrier
                .set_frequency(modulated_pitch(self.pitch, self.mod_depth, lfo_sample));
            let sample = self.carrier.next_sample() * self.level * self.fade.next_value();
            buffer.add_to_all_channels(i, sample);
        }

        self.meter.finish(started, buffer.num_samples());
    }

    fn set_enabled(&mut self, enabled: bool) {
        if enabled != self.enabled {
            log::debug!(target: "synth", "servo engine {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
        self.fade.set_target(if enabled { 1.0 } else { 0.0 });
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_processing(&self) -> bool {
        self.enabled || self.fade.is_smoothing()
    }

    fn cpu_usage(&self) -> f64 {
        self.meter.load()
    }

    fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared() -> ServoEngine {
        let mut servo = ServoEngine::new();
        servo.prepare(&ProcessSpec::new(48000.0, 128, 2));
        servo
    }

    fn params(level: f32, pitch: f32, mod_depth: f32, mod_rate: f32) -> EngineParameterSet {
        let mut p = EngineParameterSet::default();
        p.servo.level = level;
        p.servo.pitch = pitch;
        p.servo.mod_depth = mod_depth;
        p.servo.mod_rate = mod_rate;
        p
    }

    #[test]
    fn modulated_pitch_stays_in_band_for_extremes() {
        let values = [
            -1.0e9, -20000.0, -1.0, 0.0, 1.0, 19.0, 440.0, 20000.0, 1.0e9, f32::INFINITY,
        ];
        let lfo = [-1.0, -0.5, 0.0, 0.5, 1.0];
        for &pitch in &values {
            for &depth in &values {
                for &l in &lfo {
                    let p = modulated_pitch(pitch, depth, l);
                    assert!(
                        (MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&p),
                        "pitch {pitch} depth {depth} lfo {l} -> {p}"
                    );
                }
            }
        }
    }

    #[test]
    fn carrier_frequency_never_leaves_band_while_running() {
        let mut servo = prepared();
        servo.update_parameters(&params(0.5, 15000.0, 1.0, 30.0));
        let mut buffer = AudioBuffer::new(2, 128);
        for _ in 0..100 {
            buffer.clear();
            servo.process_adding_to(&mut buffer);
            let f = servo.current_pitch();
            assert!((MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&f));
        }
    }

    #[test]
    fn output_is_replicated_across_channels() {
        let mut servo = prepared();
        servo.update_parameters(&params(0.8, 440.0, 0.1, 1.0));
        let mut buffer = AudioBuffer::new(2, 128);
        servo.process_adding_to(&mut buffer);
        assert_eq!(buffer.channel(0), buffer.channel(1));
        assert!(buffer.peak() <= 0.8 + 1e-6);
        assert!(buffer.peak() > 0.1);
    }

    #[test]
    fn quiet_level_skips_processing() {
        let mut servo = prepared();
        servo.update_parameters(&params(0.0005, 440.0, 0.1, 1.0));
        let mut buffer = AudioBuffer::new(2, 128);
        servo.process_adding_to(&mut buffer);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn quiet_disable_still_finishes_the_fade() {
        let mut servo = prepared();
        servo.update_parameters(&params(0.0, 440.0, 0.1, 1.0));
        servo.set_enabled(false);
        let mut buffer = AudioBuffer::new(2, 128);
        for _ in 0..8 {
            buffer.clear();
            servo.process_adding_to(&mut buffer);
        }
        assert!(!servo.is_processing(), "fade should have run out while quiet");

        servo.update_parameters(&params(1.0, 440.0, 0.1, 1.0));
        buffer.clear();
        servo.process_adding_to(&mut buffer);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn disable_fades_then_leaves_pipeline() {
        let mut servo = prepared();
        servo.update_parameters(&params(1.0, 440.0, 0.0, 1.0));
        servo.set_enabled(false);
        assert!(servo.is_processing(), "fade tail should still be processed");
        let mut buffer = AudioBuffer::new(2, 128);
        for _ in 0..20 {
            buffer.clear();
            servo.process_adding_to(&mut buffer);
        }
        assert!(!servo.is_processing());
        buffer.clear();
        servo.process_adding_to(&mut buffer);
        assert_eq!(buffer.peak(), 0.0);
    }
}
