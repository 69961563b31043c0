// Shared constants for the synthesis core

pub use std::f32::consts::{PI, TAU};

/// Below this gain a layer is inaudible and its stage may be skipped.
pub const AUDIBILITY_THRESHOLD: f32 = 0.001;

/// Power-core output gain below which nothing is written to the buffer.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Safety band for any frequency fed to an oscillator.
pub const MIN_FREQUENCY_HZ: f32 = 20.0;
pub const MAX_FREQUENCY_HZ: f32 = 20000.0;

/// Fallbacks used when the host hands us degenerate configuration.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;
pub const DEFAULT_BLOCK_SIZE: usize = 512;
pub const MIN_RAMP_SECONDS: f32 = 0.001;

/// Sanitises a host sample rate: non-positive or non-finite values fall back to 44.1 kHz.
#[inline]
pub fn sanitize_sample_rate(sample_rate: f64) -> f64 {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        sample_rate
    } else {
        DEFAULT_SAMPLE_RATE
    }
}

/// Sanitises a ramp duration in seconds (activation time and friends).
#[inline]
pub fn sanitize_ramp_seconds(seconds: f32) -> f32 {
    if seconds.is_finite() && seconds > MIN_RAMP_SECONDS {
        seconds
    } else {
        MIN_RAMP_SECONDS
    }
}

/// Linear remap of `value` from `[src_min, src_max]` onto `[dst_min, dst_max]`.
#[inline]
pub fn map_range(value: f32, src_min: f32, src_max: f32, dst_min: f32, dst_max: f32) -> f32 {
    dst_min + (dst_max - dst_min) * ((value - src_min) / (src_max - src_min))
}
