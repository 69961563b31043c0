use crate::synth::prelude::{sanitize_sample_rate, PI};

const MIN_RESONANCE: f32 = 0.01;
const DEFAULT_RESONANCE: f32 = std::f32::consts::FRAC_1_SQRT_2;

#[derive(Clone, Copy, Debug, Default)]
struct ChannelState {
    s1: f32,
    s2: f32,
}

/// Resonant low-pass, state-variable topology with trapezoidal (TPT) integrators.
///
/// `resonance` is the filter's native parameter: damping is `1 / resonance`,
/// so 1/sqrt(2) is Butterworth and larger values ring harder. Each channel
/// keeps its own integrator state.
#[derive(Clone, Debug)]
pub struct SvfLowPass {
    cutoff: f32,
    resonance: f32,
    sample_rate: f32,
    g: f32,
    r2: f32,
    h: f32,
    state: Vec<ChannelState>,
}

impl SvfLowPass {
    pub fn new() -> Self {
        let mut filter = Self {
            cutoff: 1000.0,
            resonance: DEFAULT_RESONANCE,
            sample_rate: 44100.0,
            g: 0.0,
            r2: 0.0,
            h: 0.0,
            state: vec![ChannelState::default(); 1],
        };
        filter.update_coefficients();
        filter
    }

    /// Sizes per-channel state. Allocates; call from `prepare` only.
    pub fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        self.sample_rate = sanitize_sample_rate(sample_rate) as f32;
        self.state = vec![ChannelState::default(); num_channels.max(1)];
        self.update_coefficients();
    }

    pub fn reset(&mut self) {
        self.state.fill(ChannelState::default());
    }

    pub fn set_cutoff_frequency(&mut self, cutoff: f32) {
        if cutoff != self.cutoff {
            self.cutoff = cutoff;
            self.update_coefficients();
        }
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        if resonance != self.resonance {
            self.resonance = resonance;
            self.update_coefficients();
        }
    }

    pub fn cutoff_frequency(&self) -> f32 {
        self.cutoff
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    pub fn num_channels(&self) -> usize {
        self.state.len()
    }

    /// Heap bytes held by the per-channel state.
    pub fn heap_size(&self) -> usize {
        self.state.capacity() * std::mem::size_of::<ChannelState>()
    }

    fn update_coefficients(&mut self) {
        let nyquist_guard = self.sample_rate * 0.49;
        let cutoff = if self.cutoff.is_finite() {
            self.cutoff.clamp(1.0, nyquist_guard)
        } else {
            nyquist_guard
        };
        let resonance = if self.resonance.is_finite() {
            self.resonance.max(MIN_RESONANCE)
        } else {
            DEFAULT_RESONANCE
        };
        self.g = (PI * cutoff / self.sample_rate).tan();
        self.r2 = 1.0 / resonance;
        self.h = 1.0 / (1.0 + self.r2 * self.g + self.g * self.g);
    }

    /// Filters one sample on `channel`. Channels beyond the prepared count
    /// share the last channel's state.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: f32) -> f32 {
        let last = self.state.len() - 1;
        let st = &mut self.state[channel.min(last)];

        let high = self.h * (input - st.s1 * (self.g + self.r2) - st.s2);
        let band = self.g * high + st.s1;
        st.s1 = self.g * high + band;
        let low = self.g * band + st.s2;
        st.s2 = self.g * band + low;
        low
    }

    /// Filters a whole channel slice in place.
    pub fn process_block(&mut self, channel: usize, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(channel, *sample);
        }
    }
}

impl Default for SvfLowPass {
    fn default() -> Self {
        Self::new()
    }
}
