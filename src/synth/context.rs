use crate::synth::prelude::{sanitize_sample_rate, DEFAULT_BLOCK_SIZE};

/// Processing configuration handed down by the host on (re)configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessSpec {
    pub sample_rate: f64,
    pub max_block_size: usize,
    pub num_channels: usize,
}

impl ProcessSpec {
    pub fn new(sample_rate: f64, max_block_size: usize, num_channels: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            num_channels,
        }
    }

    /// Returns a copy with degenerate values replaced by safe floors.
    pub fn sanitized(&self) -> Self {
        Self {
            sample_rate: sanitize_sample_rate(self.sample_rate),
            max_block_size: self.max_block_size.max(1),
            num_channels: self.num_channels.max(1),
        }
    }
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            max_block_size: DEFAULT_BLOCK_SIZE,
            num_channels: 2,
        }
    }
}
