use crate::synth::params::{EngineParameterSet, HissParams, PowerCoreParams, ServoParams};
use crate::synth::engine::{EngineKind, ENGINE_COUNT};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("invalid value '{value}' for parameter '{id}'")]
    InvalidValue { id: &'static str, value: String },
}

/// Every host-automatable control, in storage order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamId {
    HissLevel,
    HissCutoff,
    HissResonance,
    ServoLevel,
    ServoPitch,
    ServoModDepth,
    ServoModRate,
    PowerCoreHumLevel,
    PowerCoreFundamentalPitch,
    PowerCoreHumComplexity,
    PowerCorePulsationRate,
    PowerCorePulsationDepth,
    PowerCoreActivationTrigger,
    PowerCoreActivationTime,
    PowerCoreEnergyType,
    PowerCoreFilterCutoff,
    PowerCoreFilterResonance,
    MasterGain,
}

pub const PARAM_COUNT: usize = 18;

/// Range and default of a parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

const fn info(id: &'static str, name: &'static str, min: f32, max: f32, default: f32) -> ParamInfo {
    ParamInfo {
        id,
        name,
        min,
        max,
        default,
    }
}

impl ParamId {
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::HissLevel,
        ParamId::HissCutoff,
        ParamId::HissResonance,
        ParamId::ServoLevel,
        ParamId::ServoPitch,
        ParamId::ServoModDepth,
        ParamId::ServoModRate,
        ParamId::PowerCoreHumLevel,
        ParamId::PowerCoreFundamentalPitch,
        ParamId::PowerCoreHumComplexity,
        ParamId::PowerCorePulsationRate,
        ParamId::PowerCorePulsationDepth,
        ParamId::PowerCoreActivationTrigger,
        ParamId::PowerCoreActivationTime,
        ParamId::PowerCoreEnergyType,
        ParamId::PowerCoreFilterCutoff,
        ParamId::PowerCoreFilterResonance,
        ParamId::MasterGain,
    ];

    pub fn info(self) -> ParamInfo {
        match self {
            ParamId::HissLevel => info("hissLevel", "Hiss Level", 0.0, 1.0, 0.0),
            ParamId::HissCutoff => info("hissCutoff", "Hiss Cutoff", 100.0, 18000.0, 5000.0),
            ParamId::HissResonance => info("hissResonance", "Hiss Resonance", 0.1, 18.0, 1.0),
            ParamId::ServoLevel => info("servoLevel", "Servo Level", 0.0, 1.0, 0.0),
            ParamId::ServoPitch => info("servoPitch", "Servo Pitch", 50.0, 5000.0, 440.0),
            ParamId::ServoModDepth => info("servoModDepth", "Servo Mod Depth", 0.0, 1.0, 0.1),
            ParamId::ServoModRate => info("servoModRate", "Servo Mod Rate", 0.1, 30.0, 1.0),
            ParamId::PowerCoreHumLevel => {
                info("powerCoreHumLevel", "Power Core Hum Level", 0.0, 1.0, 0.0)
            }
            ParamId::PowerCoreFundamentalPitch => {
                info("powerCoreFundamentalPitch", "Power Core Pitch", 20.0, 200.0, 60.0)
            }
            ParamId::PowerCoreHumComplexity => {
                info("powerCoreHumComplexity", "Power Core Complexity", 0.0, 1.0, 0.5)
            }
            ParamId::PowerCorePulsationRate => {
                info("powerCorePulsationRate", "Power Core Pulsation Rate", 0.1, 5.0, 1.0)
            }
            ParamId::PowerCorePulsationDepth => {
                info("powerCorePulsationDepth", "Power Core Pulsation Depth", 0.0, 1.0, 0.3)
            }
            ParamId::PowerCoreActivationTrigger => {
                info("powerCoreActivationTrigger", "Power Core Activation", 0.0, 1.0, 0.0)
            }
            ParamId::PowerCoreActivationTime => {
                info("powerCoreActivationTime", "Power Core Activation Time", 0.5, 10.0, 2.0)
            }
            ParamId::PowerCoreEnergyType => {
                info("powerCoreEnergyType", "Power Core Energy Type", 0.0, 1.0, 0.5)
            }
            ParamId::PowerCoreFilterCutoff => {
                info("powerCoreFilterCutoff", "Power Core Filter Cutoff", 100.0, 10000.0, 5000.0)
            }
            ParamId::PowerCoreFilterResonance => {
                info("powerCoreFilterResonance", "Power Core Filter Reso", 0.1, 10.0, 1.0)
            }
            ParamId::MasterGain => info("masterGain", "Master Gain", 0.0, 1.0, 0.707),
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_toggle(self) -> bool {
        self == ParamId::PowerCoreActivationTrigger
    }

    pub fn from_id(id: &str) -> Option<ParamId> {
        ParamId::ALL.iter().copied().find(|p| p.info().id == id)
    }
}

/// Lock-free parameter store shared between the control side and the audio callback.
///
/// Continuous values live as `f32` bit patterns in `AtomicU32`s, the toggle in
/// an `AtomicBool`. Each field is read atomically; a snapshot is not.
#[derive(Debug)]
pub struct ParameterStore {
    values: [AtomicU32; PARAM_COUNT],
    activation_trigger: AtomicBool,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            values: ParamId::ALL.map(|id| AtomicU32::new(id.info().default.to_bits())),
            activation_trigger: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        if id.is_toggle() {
            return if self.get_bool(id) { 1.0 } else { 0.0 };
        }
        f32::from_bits(self.values[id.index()].load(Ordering::Relaxed))
    }

    /// Toggle state; `false` for continuous parameters.
    #[inline]
    pub fn get_bool(&self, id: ParamId) -> bool {
        id.is_toggle() && self.activation_trigger.load(Ordering::Relaxed)
    }

    /// Stores `value` clamped into the parameter's range. Non-finite values are ignored.
    /// Toggles switch on above 0.5.
    pub fn set(&self, id: ParamId, value: f32) {
        if !value.is_finite() {
            return;
        }
        if id.is_toggle() {
            self.set_bool(id, value > 0.5);
            return;
        }
        let info = id.info();
        let value = value.clamp(info.min, info.max);
        self.values[id.index()].store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn set_bool(&self, id: ParamId, value: bool) {
        if id.is_toggle() {
            self.activation_trigger.store(value, Ordering::Relaxed);
        }
    }

    /// Parses a textual assignment from the control side.
    pub fn set_by_name(&self, name: &str, value: &str) -> Result<ParamId, ParamError> {
        let id = ParamId::from_id(name).ok_or_else(|| ParamError::UnknownParameter(name.to_string()))?;
        let invalid = || ParamError::InvalidValue {
            id: id.info().id,
            value: value.to_string(),
        };
        let parsed = match (id.is_toggle(), value) {
            (true, "on" | "true") => 1.0,
            (true, "off" | "false") => 0.0,
            _ => value.parse::<f32>().map_err(|_| invalid())?,
        };
        if !parsed.is_finite() {
            return Err(invalid());
        }
        self.set(id, parsed);
        Ok(id)
    }

    pub fn master_gain(&self) -> f32 {
        self.get(ParamId::MasterGain)
    }

    /// Reads every field once into a plain aggregate for one block.
    pub fn snapshot(&self) -> EngineParameterSet {
        EngineParameterSet {
            hiss: HissParams {
                level: self.get(ParamId::HissLevel),
                cutoff: self.get(ParamId::HissCutoff),
                resonance_q: self.get(ParamId::HissResonance),
            },
            servo: ServoParams {
                level: self.get(ParamId::ServoLevel),
                pitch: self.get(ParamId::ServoPitch),
                mod_depth: self.get(ParamId::ServoModDepth),
                mod_rate: self.get(ParamId::ServoModRate),
            },
            power_core: PowerCoreParams {
                hum_level: self.get(ParamId::PowerCoreHumLevel),
                fundamental_pitch: self.get(ParamId::PowerCoreFundamentalPitch),
                hum_complexity: self.get(ParamId::PowerCoreHumComplexity),
                pulsation_rate: self.get(ParamId::PowerCorePulsationRate),
                pulsation_depth: self.get(ParamId::PowerCorePulsationDepth),
                activation_trigger: self.get_bool(ParamId::PowerCoreActivationTrigger),
                activation_time: self.get(ParamId::PowerCoreActivationTime),
                energy_type: self.get(ParamId::PowerCoreEnergyType),
                filter_cutoff: self.get(ParamId::PowerCoreFilterCutoff),
                filter_resonance: self.get(ParamId::PowerCoreFilterResonance),
            },
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Readings the audio thread publishes for the control side.
#[derive(Debug, Default)]
pub struct RuntimeStatus {
    callback_load: AtomicU32,
    engine_load: [AtomicU32; ENGINE_COUNT],
    engine_memory: [AtomicU32; ENGINE_COUNT],
}

impl RuntimeStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish_callback_load(&self, load: f64) {
        self.callback_load
            .store((load as f32).to_bits(), Ordering::Relaxed);
    }

    pub fn publish_engine(&self, kind: EngineKind, load: f64, memory: usize) {
        self.engine_load[kind.index()].store((load as f32).to_bits(), Ordering::Relaxed);
        self.engine_memory[kind.index()]
            .store(u32::try_from(memory).unwrap_or(u32::MAX), Ordering::Relaxed);
    }

    /// Smoothed share of the real-time budget spent in the whole callback.
    pub fn callback_load(&self) -> f32 {
        f32::from_bits(self.callback_load.load(Ordering::Relaxed))
    }

    pub fn engine_load(&self, kind: EngineKind) -> f32 {
        f32::from_bits(self.engine_load[kind.index()].load(Ordering::Relaxed))
    }

    pub fn engine_memory(&self, kind: EngineKind) -> usize {
        self.engine_memory[kind.index()].load(Ordering::Relaxed) as usize
    }
}
