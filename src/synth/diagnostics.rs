use std::time::{Duration, Instant};

// One-pole smoothing of successive block readings
const LOAD_SMOOTHING: f64 = 0.1;

/// Estimates how much of the real-time budget an engine uses.
///
/// Readings are `elapsed / block_duration`, so 1.0 means the engine alone
/// consumed the entire block. Only the meter's own fields are written.
#[derive(Clone, Debug, Default)]
pub struct LoadMeter {
    sample_rate: f64,
    load: f64,
}

impl LoadMeter {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            load: 0.0,
        }
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.load = 0.0;
    }

    pub fn start(&self) -> Instant {
        Instant::now()
    }

    pub fn finish(&mut self, started: Instant, num_samples: usize) {
        self.record(started.elapsed(), num_samples);
    }

    pub fn record(&mut self, elapsed: Duration, num_samples: usize) {
        if num_samples == 0 || self.sample_rate <= 0.0 {
            return;
        }
        let block_seconds = num_samples as f64 / self.sample_rate;
        let ratio = elapsed.as_secs_f64() / block_seconds;
        self.load += LOAD_SMOOTHING * (ratio - self.load);
    }

    /// Decays the reading when the engine had nothing to do this block.
    pub fn record_idle(&mut self) {
        self.load -= LOAD_SMOOTHING * self.load;
    }

    pub fn load(&self) -> f64 {
        self.load
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_converge_to_ratio() {
        let mut meter = LoadMeter::new(1000.0);
        for _ in 0..200 {
            // 25 ms of work for a 100 ms block
            meter.record(Duration::from_millis(25), 100);
        }
        assert!((meter.load() - 0.25).abs() < 1e-3, "got {}", meter.load());
    }

    #[test]
    fn empty_blocks_are_ignored() {
        let mut meter = LoadMeter::new(48000.0);
        meter.record(Duration::from_secs(1), 0);
        assert_eq!(meter.load(), 0.0);
    }
}
