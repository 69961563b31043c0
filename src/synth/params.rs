//! Per-block parameter snapshot.
//!
//! Plain `Copy` aggregates, rebuilt wholesale at the start of every block and
//! never mutated while the block is being rendered.

/// Hydraulic hiss (base layer).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HissParams {
    pub level: f32,
    pub cutoff: f32,
    /// Perceptual Q, 0.1..=18.0.
    pub resonance_q: f32,
}

impl Default for HissParams {
    fn default() -> Self {
        Self {
            level: 0.0,
            cutoff: 5000.0,
            resonance_q: 1.0,
        }
    }
}

/// Servo whine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ServoParams {
    pub level: f32,
    pub pitch: f32,
    pub mod_depth: f32,
    pub mod_rate: f32,
}

impl Default for ServoParams {
    fn default() -> Self {
        Self {
            level: 0.0,
            pitch: 440.0,
            mod_depth: 0.1,
            mod_rate: 1.0,
        }
    }
}

/// Power-core hum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerCoreParams {
    pub hum_level: f32,
    pub fundamental_pitch: f32,
    pub hum_complexity: f32,
    pub pulsation_rate: f32,
    pub pulsation_depth: f32,
    pub activation_trigger: bool,
    /// Seconds.
    pub activation_time: f32,
    pub energy_type: f32,
    pub filter_cutoff: f32,
    pub filter_resonance: f32,
}

impl Default for PowerCoreParams {
    fn default() -> Self {
        Self {
            hum_level: 0.0,
            fundamental_pitch: 60.0,
            hum_complexity: 0.5,
            pulsation_rate: 1.0,
            pulsation_depth: 0.3,
            activation_trigger: false,
            activation_time: 2.0,
            energy_type: 0.5,
            filter_cutoff: 5000.0,
            filter_resonance: 1.0,
        }
    }
}

/// Everything the core needs for one block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngineParameterSet {
    pub hiss: HissParams,
    pub servo: ServoParams,
    pub power_core: PowerCoreParams,
}
