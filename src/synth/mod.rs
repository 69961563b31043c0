pub mod buffer;
pub mod context;
pub mod core;
pub mod diagnostics;
pub mod engine;
pub mod envelope;
pub mod filter;
pub mod hiss;
pub mod noise;
pub mod oscillator;
pub mod params;
pub mod power_core;
pub mod prelude;
pub mod servo;
pub mod smoothing;

pub use self::buffer::AudioBuffer;
pub use self::context::ProcessSpec;
pub use self::core::MechaSynth;
pub use self::engine::{Engine, EngineKind, SoundEngine};
pub use self::params::{EngineParameterSet, HissParams, PowerCoreParams, ServoParams};
