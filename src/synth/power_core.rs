//! Power-core hum: harmonic oscillator bank, energy shaping, pulsation,
//! per-channel tone filter and the activation (power-up/down) envelope.

use super::buffer::AudioBuffer;
use super::context::ProcessSpec;
use super::diagnostics::LoadMeter;
use super::engine::SoundEngine;
use super::envelope::{ActivationEnvelope, ActivationState};
use super::filter::SvfLowPass;
use super::oscillator::Oscillator;
use super::params::{EngineParameterSet, PowerCoreParams};
use super::prelude::{sanitize_ramp_seconds, MAX_FREQUENCY_HZ, SILENCE_THRESHOLD};
use super::smoothing::SmoothedValue;

pub const MAX_HARMONICS: usize = 5;

/// Fade-out duration forced by `set_enabled(false)`, independent of activation time.
pub const DISABLE_FADE_SECONDS: f64 = 0.1;

const CUTOFF_SMOOTHING_SECONDS: f64 = 0.05;

/// `floor(complexity * 5)`, with complexity clamped into `[0, 1]`.
pub fn active_harmonic_count(complexity: f32) -> usize {
    let complexity = if complexity.is_nan() {
        0.0
    } else {
        complexity.clamp(0.0, 1.0)
    };
    ((complexity * MAX_HARMONICS as f32) as usize).min(MAX_HARMONICS)
}

/// Frequency multiplier of harmonic `index`: odd partials 3, 5, 7, ...
#[inline]
pub fn harmonic_ratio(index: usize) -> f32 {
    2.0 * (index as f32 + 1.0) + 1.0
}

/// Energy-type timbre. Strictly above 0.5 saturates through tanh; 0.5 and
/// below is a plain linear gain. The step at 0.5 is intentional.
#[inline]
pub fn shape_energy(signal: f32, energy_type: f32) -> f32 {
    if energy_type > 0.5 {
        (signal * (1.0 + energy_type)).tanh()
    } else {
        signal * (0.5 + energy_type)
    }
}

/// Maps an LFO sample in `[-1, 1]` onto a tremolo gain in `[1 - depth, 1]`.
#[inline]
pub fn pulsation_gain(lfo_sample: f32, depth: f32) -> f32 {
    (1.0 - depth) + depth * (lfo_sample * 0.5 + 0.5)
}

fn sanitize_pitch(pitch: f32) -> f32 {
    if pitch.is_finite() {
        pitch.clamp(0.0, MAX_FREQUENCY_HZ)
    } else {
        0.0
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Replaces non-finite or out-of-range controls with safe values.
fn sanitize_params(p: PowerCoreParams) -> PowerCoreParams {
    let defaults = PowerCoreParams::default();
    PowerCoreParams {
        hum_level: finite_or(p.hum_level, 0.0).max(0.0),
        fundamental_pitch: sanitize_pitch(p.fundamental_pitch),
        hum_complexity: finite_or(p.hum_complexity, 0.0).clamp(0.0, 1.0),
        pulsation_rate: finite_or(p.pulsation_rate, 0.0).clamp(0.0, MAX_FREQUENCY_HZ),
        pulsation_depth: finite_or(p.pulsation_depth, 0.0).clamp(0.0, 1.0),
        activation_trigger: p.activation_trigger,
        activation_time: sanitize_ramp_seconds(p.activation_time),
        energy_type: finite_or(p.energy_type, 0.0).clamp(0.0, 1.0),
        filter_cutoff: finite_or(p.filter_cutoff, defaults.filter_cutoff).max(0.0),
        filter_resonance: finite_or(p.filter_resonance, defaults.filter_resonance),
    }
}

#[derive(Debug)]
pub struct PowerCoreEngine {
    fundamental: Oscillator,
    harmonics: [Oscillator; MAX_HARMONICS],
    pulsation_lfo: Oscillator,
    tone_filter: SvfLowPass,

    hum_level: SmoothedValue,
    filter_cutoff: SmoothedValue,
    activation: ActivationEnvelope,

    params: PowerCoreParams,
    activation_time: f32,
    last_trigger: bool,
    num_active_harmonics: usize,

    enabled: bool,
    spec: ProcessSpec,
    meter: LoadMeter,
}

impl PowerCoreEngine {
    pub fn new() -> Self {
        let spec = ProcessSpec::default();
        let params = PowerCoreParams::default();
        Self {
            fundamental: Oscillator::new(params.fundamental_pitch, spec.sample_rate),
            harmonics: std::array::from_fn(|i| {
                Oscillator::new(
                    params.fundamental_pitch * harmonic_ratio(i),
                    spec.sample_rate,
                )
            }),
            pulsation_lfo: Oscillator::new(params.pulsation_rate, spec.sample_rate),
            tone_filter: SvfLowPass::new(),
            hum_level: SmoothedValue::new(0.0),
            filter_cutoff: SmoothedValue::new(params.filter_cutoff),
            activation: ActivationEnvelope::new(),
            activation_time: params.activation_time,
            last_trigger: false,
            num_active_harmonics: active_harmonic_count(params.hum_complexity),
            params,
            enabled: true,
            spec,
            meter: LoadMeter::new(spec.sample_rate),
        }
    }

    pub fn activation_envelope(&self) -> f32 {
        self.activation.value()
    }

    pub fn activation_state(&self) -> ActivationState {
        self.activation.state()
    }

    pub fn activation_increment(&self) -> f64 {
        self.activation.increment()
    }

    pub fn num_active_harmonics(&self) -> usize {
        self.num_active_harmonics
    }

    pub fn hum_level_target(&self) -> f32 {
        self.hum_level.target()
    }

    pub fn smoothed_hum_level(&self) -> f32 {
        self.hum_level.current()
    }

    pub fn smoothed_cutoff(&self) -> f32 {
        self.filter_cutoff.current()
    }

    pub fn fundamental_phase(&self) -> f32 {
        self.fundamental.phase()
    }

    pub fn harmonic_phase(&self, index: usize) -> Option<f32> {
        self.harmonics.get(index).map(Oscillator::phase)
    }

    fn sample_rate(&self) -> f64 {
        self.spec.sample_rate
    }

    /// Edge detection on the trigger. The ramp rate is latched here from the
    /// activation time in effect at the edge.
    /// While disabled the edge is only remembered, so the forced fade-out
    /// keeps its rate and nothing can ramp the engine back up.
    fn handle_trigger(&mut self, trigger: bool) {
        if !self.enabled {
            self.last_trigger = trigger;
            return;
        }
        if trigger && !self.last_trigger {
            let increment = ActivationEnvelope::increment_for(
                f64::from(self.activation_time),
                self.sample_rate(),
            );
            self.activation.start_activation(increment);
        } else if !trigger && self.last_trigger {
            let increment = ActivationEnvelope::increment_for(
                f64::from(self.activation_time),
                self.sample_rate(),
            );
            self.activation.start_deactivation(increment);
        }
        self.last_trigger = trigger;
    }

    fn hum_target(&self) -> f32 {
        if self.enabled {
            self.params.hum_level
        } else {
            0.0
        }
    }

    /// Keeps every running oscillator and the cutoff ramp moving while muted.
    /// Harmonics above the active count are left where they are.
    #[inline]
    fn advance_silent(&mut self) {
        self.pulsation_lfo.advance();
        self.fundamental.advance();
        for osc in self.harmonics[..self.num_active_harmonics].iter_mut() {
            osc.advance();
        }
        self.filter_cutoff.next_value();
    }

    #[inline]
    fn render_sample(&mut self) -> f32 {
        let mut signal = self.fundamental.next_sample();

        let mut harmonic_content = 0.0;
        for (i, osc) in self.harmonics[..self.num_active_harmonics]
            .iter_mut()
            .enumerate()
        {
            harmonic_content += osc.next_sample() / (i as f32 + 2.0);
        }
        signal += harmonic_content * self.params.hum_complexity;

        signal = shape_energy(signal, self.params.energy_type);
        signal * pulsation_gain(self.pulsation_lfo.next_sample(), self.params.pulsation_depth)
    }
}

impl Default for PowerCoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundEngine for PowerCoreEngine {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.spec = spec.sanitized();
        let sample_rate = self.spec.sample_rate;

        self.fundamental.prepare(sample_rate);
        self.pulsation_lfo.prepare(sample_rate);
        for osc in self.harmonics.iter_mut() {
            osc.prepare(sample_rate);
        }
        self.tone_filter.prepare(sample_rate, self.spec.num_channels);

        self.hum_level
            .reset(sample_rate, sanitize_ramp_seconds(self.activation_time) as f64);
        self.filter_cutoff.reset(sample_rate, CUTOFF_SMOOTHING_SECONDS);
        self.meter.prepare(sample_rate);

        log::debug!(
            target: "synth",
            "power core prepared: {} Hz, {} channels, {} harmonics max",
            sample_rate,
            self.spec.num_channels,
            MAX_HARMONICS
        );
        self.reset();
    }

    fn reset(&mut self) {
        self.fundamental.reset();
        self.pulsation_lfo.reset();
        for osc in self.harmonics.iter_mut() {
            osc.reset();
        }
        self.tone_filter.reset();

        self.hum_level.set_current_and_target(0.0);
        self.filter_cutoff
            .set_current_and_target(self.params.filter_cutoff);
        self.activation.reset();
        // a trigger still held after reset re-arms on the next rising edge
        self.last_trigger = false;
    }

    fn update_parameters(&mut self, params: &EngineParameterSet) {
        let p = sanitize_params(params.power_core);
        self.params = p;
        self.activation_time = p.activation_time;

        self.handle_trigger(p.activation_trigger);

        self.hum_level
            .reset(self.sample_rate(), self.activation_time as f64);
        self.hum_level.set_target(self.hum_target());
        self.filter_cutoff.set_target(p.filter_cutoff);

        self.pulsation_lfo.set_frequency(p.pulsation_rate);

        let pitch = p.fundamental_pitch;
        self.num_active_harmonics = active_harmonic_count(p.hum_complexity);
        self.fundamental.set_frequency(pitch);
        for (i, osc) in self.harmonics[..self.num_active_harmonics]
            .iter_mut()
            .enumerate()
        {
            osc.set_frequency(pitch * harmonic_ratio(i));
        }

        self.tone_filter.set_resonance(p.filter_resonance);
    }

    fn process_adding_to(&mut self, buffer: &mut AudioBuffer) {
        if !self.is_processing() {
            self.meter.record_idle();
            return;
        }
        let started = self.meter.start();
        let num_channels = buffer.num_channels();

        for i in 0..buffer.num_samples() {
            let envelope = self.activation.next_value();
            let level = self.hum_level.next_value() * envelope;

            if level < SILENCE_THRESHOLD {
                self.advance_silent();
                continue;
            }

            let signal = self.render_sample();
            self.tone_filter
                .set_cutoff_frequency(self.filter_cutoff.next_value());

            for ch in 0..num_channels {
                let filtered = self.tone_filter.process_sample(ch, signal);
                buffer.add_sample(ch, i, filtered * level);
            }
        }

        self.meter.finish(started, buffer.num_samples());
    }

    fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            log::debug!(target: "synth", "power core enabled");
            self.hum_level.set_target(self.hum_target());
            return;
        }

        // Two independent fades: the envelope over 100 ms and the hum level
        // over the activation time.
        let increment =
            ActivationEnvelope::increment_for(DISABLE_FADE_SECONDS, self.sample_rate());
        self.activation.start_deactivation(increment);
        self.hum_level.set_target(0.0);
        log::debug!(
            target: "synth",
            "power core disabled, fading out from envelope {:.3}",
            self.activation.value()
        );
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_processing(&self) -> bool {
        self.enabled || self.activation.value() > 0.0
    }

    fn cpu_usage(&self) -> f64 {
        self.meter.load()
    }

    fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.tone_filter.heap_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(sample_rate: f64, block: usize) -> PowerCoreEngine {
        let mut engine = PowerCoreEngine::new();
        engine.prepare(&ProcessSpec::new(sample_rate, block, 2));
        engine
    }

    fn run_blocks(engine: &mut PowerCoreEngine, params: &EngineParameterSet, blocks: usize, block: usize) {
        let mut buffer = AudioBuffer::new(2, block);
        for _ in 0..blocks {
            buffer.clear();
            engine.update_parameters(params);
            engine.process_adding_to(&mut buffer);
        }
    }

    #[test]
    fn harmonic_count_follows_complexity() {
        assert_eq!(active_harmonic_count(0.0), 0);
        assert_eq!(active_harmonic_count(0.19), 0);
        assert_eq!(active_harmonic_count(0.2), 1);
        assert_eq!(active_harmonic_count(0.5), 2);
        assert_eq!(active_harmonic_count(0.99), 4);
        assert_eq!(active_harmonic_count(1.0), 5);
        assert_eq!(active_harmonic_count(7.0), 5);
        assert_eq!(active_harmonic_count(-1.0), 0);
        assert_eq!(active_harmonic_count(f32::NAN), 0);
    }

    #[test]
    fn harmonic_ratios_are_odd_partials() {
        let ratios: Vec<f32> = (0..MAX_HARMONICS).map(harmonic_ratio).collect();
        assert_eq!(ratios, vec![3.0, 5.0, 7.0, 9.0, 11.0]);
    }

    #[test]
    fn energy_type_half_takes_linear_branch() {
        // exactly 0.5 is soft: signal * (0.5 + 0.5) == signal
        assert_eq!(shape_energy(0.8, 0.5), 0.8);
        assert_eq!(shape_energy(-0.3, 0.5), -0.3);
        let above = shape_energy(0.8, 0.5 + f32::EPSILON);
        assert!((above - (0.8f32 * 1.5).tanh()).abs() < 1e-5);
        assert!(above < 0.84, "saturating branch expected, got {above}");
    }

    #[test]
    fn pulsation_maps_into_depth_window() {
        assert_eq!(pulsation_gain(-1.0, 0.0), 1.0);
        assert_eq!(pulsation_gain(1.0, 0.0), 1.0);
        assert_eq!(pulsation_gain(-1.0, 1.0), 0.0);
        assert_eq!(pulsation_gain(1.0, 1.0), 1.0);
        assert!((pulsation_gain(-1.0, 0.3) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn ramp_rate_is_latched_at_the_edge() {
        let mut engine = prepared(48000.0, 256);
        let mut params = EngineParameterSet::default();
        params.power_core.activation_trigger = true;
        params.power_core.activation_time = 2.0;
        run_blocks(&mut engine, &params, 1, 256);
        let latched = engine.activation_increment();

        params.power_core.activation_time = 0.5;
        run_blocks(&mut engine, &params, 4, 256);
        assert_eq!(engine.activation_increment(), latched);
        assert_eq!(engine.activation_state(), ActivationState::Activating);
    }

    #[test]
    fn falling_edge_deactivates() {
        let mut engine = prepared(1000.0, 100);
        let mut params = EngineParameterSet::default();
        params.power_core.activation_trigger = true;
        params.power_core.activation_time = 0.5;
        run_blocks(&mut engine, &params, 6, 100);
        assert_eq!(engine.activation_state(), ActivationState::Active);

        params.power_core.activation_trigger = false;
        params.power_core.activation_time = 1.0;
        run_blocks(&mut engine, &params, 5, 100);
        assert_eq!(engine.activation_state(), ActivationState::Deactivating);
        run_blocks(&mut engine, &params, 6, 100);
        assert_eq!(engine.activation_state(), ActivationState::Idle);
        assert_eq!(engine.activation_envelope(), 0.0);
    }

    #[test]
    fn muted_branch_keeps_phases_moving() {
        let mut engine = prepared(48000.0, 128);
        let mut params = EngineParameterSet::default();
        params.power_core.hum_level = 0.0;
        params.power_core.hum_complexity = 0.4;
        run_blocks(&mut engine, &params, 3, 128);
        assert!(engine.fundamental_phase() > 0.0);
        assert!(engine.harmonic_phase(0).unwrap_or(0.0) > 0.0);
        assert!(engine.harmonic_phase(1).unwrap_or(0.0) > 0.0);
        // harmonics above the active count stay parked
        assert_eq!(engine.harmonic_phase(2), Some(0.0));
    }

    #[test]
    fn muted_branch_adds_nothing() {
        let mut engine = prepared(48000.0, 128);
        let params = EngineParameterSet::default();
        let mut buffer = AudioBuffer::new(2, 128);
        buffer.channel_mut(0).fill(0.5);
        engine.update_parameters(&params);
        engine.process_adding_to(&mut buffer);
        assert!(buffer.channel(0).iter().all(|&s| s == 0.5));
        assert!(buffer.channel(1).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn cutoff_is_ramped_not_stepped() {
        let mut engine = prepared(48000.0, 240);
        let mut params = EngineParameterSet::default();
        params.power_core.filter_cutoff = 5000.0;
        run_blocks(&mut engine, &params, 1, 240);
        params.power_core.filter_cutoff = 500.0;
        run_blocks(&mut engine, &params, 1, 240);
        let mid = engine.smoothed_cutoff();
        assert!(mid < 5000.0 && mid > 500.0, "cutoff should be mid-ramp, got {mid}");
        run_blocks(&mut engine, &params, 10, 240);
        assert_eq!(engine.smoothed_cutoff(), 500.0);
    }

    #[test]
    fn disable_right_after_trigger_cancels_activation() {
        let mut engine = prepared(48000.0, 128);
        let mut params = EngineParameterSet::default();
        params.power_core.activation_trigger = true;
        engine.update_parameters(&params);
        engine.set_enabled(false);
        assert_eq!(engine.activation_state(), ActivationState::Idle);
        assert!(!engine.is_processing());

        engine.set_enabled(true);
        run_blocks(&mut engine, &params, 4, 128);
        assert_eq!(engine.activation_envelope(), 0.0, "re-enable needs a new edge");
    }

    #[test]
    fn non_finite_controls_do_not_poison_state() {
        let mut engine = prepared(48000.0, 480);
        let mut params = EngineParameterSet::default();
        params.power_core.hum_level = 0.8;
        params.power_core.activation_trigger = true;
        params.power_core.activation_time = 0.01;
        run_blocks(&mut engine, &params, 2, 480);

        let mut broken = params;
        broken.power_core.pulsation_rate = f32::NAN;
        broken.power_core.pulsation_depth = f32::INFINITY;
        broken.power_core.energy_type = f32::NAN;
        broken.power_core.hum_complexity = f32::NAN;
        broken.power_core.filter_cutoff = f32::NAN;
        broken.power_core.hum_level = f32::NEG_INFINITY;
        run_blocks(&mut engine, &broken, 1, 480);

        let mut buffer = AudioBuffer::new(2, 480);
        for _ in 0..100 {
            buffer.clear();
            engine.update_parameters(&params);
            engine.process_adding_to(&mut buffer);
        }
        assert!(engine.smoothed_cutoff().is_finite());
        assert!(engine.smoothed_hum_level().is_finite());
        for ch in 0..2 {
            assert!(buffer.channel(ch).iter().all(|s| s.is_finite()));
        }
        assert!(buffer.peak() > 0.0);
    }

    #[test]
    fn memory_usage_counts_filter_state() {
        let engine = prepared(48000.0, 128);
        assert!(engine.memory_usage() > std::mem::size_of::<PowerCoreEngine>());
    }
}
