/// Planar multi-channel audio buffer.
///
/// Storage is sized once (`new`/`resize`, both allocate) and the per-block
/// path only moves the active length around inside that capacity.
#[derive(Clone, Debug)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    num_samples: usize,
}

impl AudioBuffer {
    pub fn new(num_channels: usize, capacity: usize) -> Self {
        Self {
            channels: vec![vec![0.0; capacity]; num_channels],
            num_samples: capacity,
        }
    }

    /// Reallocates storage. Not real-time safe.
    pub fn resize(&mut self, num_channels: usize, capacity: usize) {
        self.channels.resize_with(num_channels, Vec::new);
        for channel in self.channels.iter_mut() {
            channel.clear();
            channel.resize(capacity, 0.0);
        }
        self.num_samples = capacity;
    }

    pub fn capacity(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Sets the active length for the next block, clamped to capacity.
    pub fn set_num_samples(&mut self, num_samples: usize) {
        self.num_samples = num_samples.min(self.capacity());
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index][..self.num_samples]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        let len = self.num_samples;
        &mut self.channels[index][..len]
    }

    pub fn clear(&mut self) {
        let len = self.num_samples;
        for channel in self.channels.iter_mut() {
            channel[..len].fill(0.0);
        }
    }

    pub fn apply_gain(&mut self, gain: f32) {
        let len = self.num_samples;
        for channel in self.channels.iter_mut() {
            for sample in channel[..len].iter_mut() {
                *sample *= gain;
            }
        }
    }

    /// Adds `value` at `index` on every channel (mono source, replicated).
    #[inline]
    pub fn add_to_all_channels(&mut self, index: usize, value: f32) {
        for channel in self.channels.iter_mut() {
            channel[index] += value;
        }
    }

    #[inline]
    pub fn add_sample(&mut self, channel: usize, index: usize, value: f32) {
        self.channels[channel][index] += value;
    }

    /// Writes the active region into an interleaved slice of `frames * out_channels`.
    ///
    /// Extra output channels repeat the last buffer channel; missing ones are dropped.
    pub fn write_interleaved(&self, output: &mut [f32], out_channels: usize) {
        if out_channels == 0 || self.channels.is_empty() {
            return;
        }
        let last = self.channels.len() - 1;
        for (i, frame) in output
            .chunks_mut(out_channels)
            .take(self.num_samples)
            .enumerate()
        {
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = self.channels[ch.min(last)][i];
            }
        }
    }

    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|c| c[..self.num_samples].iter())
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}
