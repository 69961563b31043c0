#[cfg(feature = "native")]
pub mod audio;
pub mod runtime;
pub mod synth;
