use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Uniform white noise in `[-1, 1)`.
///
/// Reseeded from the OS entropy source on every `prepare`/`reset`, so the
/// output differs from run to run.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    pub fn prepare(&mut self) {
        self.reseed();
    }

    pub fn reset(&mut self) {
        self.reseed();
    }

    fn reseed(&mut self) {
        self.rng = SmallRng::from_os_rng();
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.rng.random_range(-1.0..1.0)
    }

    /// Overwrites `output` with fresh noise.
    pub fn fill(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.next_sample();
        }
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_in_range_and_centered() {
        let mut noise = NoiseGenerator::new();
        let mut sum = 0.0f64;
        for _ in 0..100_000 {
            let s = noise.next_sample();
            assert!((-1.0..1.0).contains(&s), "noise out of range: {s}");
            sum += s as f64;
        }
        let mean = sum / 100_000.0;
        assert!(mean.abs() < 0.02, "noise mean drifted: {mean}");
    }

    #[test]
    fn reseeding_changes_the_sequence() {
        let mut noise = NoiseGenerator::new();
        let mut first = [0.0f32; 32];
        let mut second = [0.0f32; 32];
        noise.fill(&mut first);
        noise.reset();
        noise.fill(&mut second);
        assert_ne!(first, second);
    }
}
