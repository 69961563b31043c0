use super::buffer::AudioBuffer;
use super::context::ProcessSpec;
use super::filter::SvfLowPass;
use super::noise::NoiseGenerator;
use super::params::HissParams;
use super::prelude::{map_range, AUDIBILITY_THRESHOLD};

const Q_MIN: f32 = 0.1;
const Q_MAX: f32 = 18.0;
const RESONANCE_MIN: f32 = 0.1;
const RESONANCE_MAX: f32 = 0.95;

/// Maps the perceptual Q control onto the filter's native resonance range.
pub fn q_to_resonance(q: f32) -> f32 {
    let q = if q.is_finite() { q.clamp(Q_MIN, Q_MAX) } else { Q_MIN };
    map_range(q, Q_MIN, Q_MAX, RESONANCE_MIN, RESONANCE_MAX)
}

/// Filtered-noise base layer. Not pluggable: the orchestrator drives it
/// directly and it writes (rather than adds) into the buffer.
#[derive(Debug, Default)]
pub struct HissLayer {
    noise: NoiseGenerator,
    filter: SvfLowPass,
}

impl HissLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare(&mut self, spec: &ProcessSpec) {
        self.noise.prepare();
        self.filter.prepare(spec.sample_rate, spec.num_channels);
    }

    pub fn reset(&mut self) {
        self.noise.reset();
        self.filter.reset();
    }

    /// Renders the layer into `buffer`. Inaudible levels leave the buffer untouched,
    /// which relies on the caller having cleared it.
    pub fn process(&mut self, buffer: &mut AudioBuffer, params: &HissParams) {
        if params.level.is_nan() || params.level <= AUDIBILITY_THRESHOLD {
            return;
        }

        self.filter.set_cutoff_frequency(params.cutoff);
        self.filter.set_resonance(q_to_resonance(params.resonance_q));

        for ch in 0..buffer.num_channels() {
            let channel = buffer.channel_mut(ch);
            self.noise.fill(channel);
            self.filter.process_block(ch, channel);
        }
        buffer.apply_gain(params.level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn q_range_maps_linearly() {
        assert!((q_to_resonance(0.1) - 0.1).abs() < 1e-6);
        assert!((q_to_resonance(18.0) - 0.95).abs() < 1e-6);
        let mid = q_to_resonance(9.05);
        assert!((mid - 0.525).abs() < 1e-4, "got {mid}");
        assert!((q_to_resonance(100.0) - 0.95).abs() < 1e-6);
    }

    #[test]
    fn inaudible_level_leaves_buffer_as_received() {
        let mut hiss = HissLayer::new();
        hiss.prepare(&ProcessSpec::new(48000.0, 64, 2));
        let mut buffer = AudioBuffer::new(2, 64);
        buffer.channel_mut(0).fill(0.25);
        let params = HissParams {
            level: 0.001,
            ..HissParams::default()
        };
        hiss.process(&mut buffer, &params);
        assert!(buffer.channel(0).iter().all(|&s| s == 0.25));
        assert!(buffer.channel(1).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn audible_level_fills_every_channel() {
        let mut hiss = HissLayer::new();
        hiss.prepare(&ProcessSpec::new(48000.0, 256, 2));
        let mut buffer = AudioBuffer::new(2, 256);
        let params = HissParams {
            level: 0.5,
            ..HissParams::default()
        };
        hiss.process(&mut buffer, &params);
        for ch in 0..2 {
            assert!(buffer.channel(ch).iter().any(|&s| s != 0.0));
        }
        assert_ne!(buffer.channel(0), buffer.channel(1));
    }
}
