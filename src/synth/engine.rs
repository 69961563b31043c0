use super::buffer::AudioBuffer;
use super::context::ProcessSpec;
use super::params::EngineParameterSet;
use super::power_core::PowerCoreEngine;
use super::servo::ServoEngine;

/// Lifecycle and processing contract shared by every pluggable engine.
///
/// `prepare` is the only non-real-time call; everything else must be
/// allocation-free and non-blocking.
pub trait SoundEngine {
    /// Reconfigures for a new sample rate / block size / channel count. May allocate.
    fn prepare(&mut self, spec: &ProcessSpec);

    /// Returns phases, filter histories and ramps to quiescent values.
    fn reset(&mut self);

    /// Pulls this engine's sub-record out of the block snapshot.
    /// Calling it again with unchanged values has no audible side effect.
    fn update_parameters(&mut self, params: &EngineParameterSet);

    /// Adds this block's signal into `buffer`; existing content is never overwritten.
    fn process_adding_to(&mut self, buffer: &mut AudioBuffer);

    fn set_enabled(&mut self, enabled: bool);

    fn is_enabled(&self) -> bool;

    /// Whether the orchestrator should still call `process_adding_to`.
    /// Engines with a fade-out tail stay in the pipeline until it has decayed.
    fn is_processing(&self) -> bool {
        self.is_enabled()
    }

    /// Fraction of the real-time budget used by the last blocks (advisory).
    fn cpu_usage(&self) -> f64;

    /// Approximate bytes owned by the engine (advisory).
    fn memory_usage(&self) -> usize;
}

/// The closed set of pluggable engines, in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Servo,
    PowerCore,
}

pub const ENGINE_COUNT: usize = 2;

impl EngineKind {
    pub const ALL: [EngineKind; ENGINE_COUNT] = [EngineKind::Servo, EngineKind::PowerCore];

    pub fn index(self) -> usize {
        match self {
            EngineKind::Servo => 0,
            EngineKind::PowerCore => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Servo => "servo",
            EngineKind::PowerCore => "power_core",
        }
    }
}

/// Tagged engine slot; dispatches the contract without boxing.
#[derive(Debug)]
pub enum Engine {
    Servo(ServoEngine),
    PowerCore(PowerCoreEngine),
}

impl Engine {
    pub fn new(kind: EngineKind) -> Self {
        match kind {
            EngineKind::Servo => Self::Servo(ServoEngine::new()),
            EngineKind::PowerCore => Self::PowerCore(PowerCoreEngine::new()),
        }
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            Self::Servo(_) => EngineKind::Servo,
            Self::PowerCore(_) => EngineKind::PowerCore,
        }
    }

    pub fn as_servo(&self) -> Option<&ServoEngine> {
        match self {
            Self::Servo(engine) => Some(engine),
            _ => None,
        }
    }

    pub fn as_power_core(&self) -> Option<&PowerCoreEngine> {
        match self {
            Self::PowerCore(engine) => Some(engine),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn SoundEngine {
        match self {
            Self::Servo(engine) => engine,
            Self::PowerCore(engine) => engine,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SoundEngine {
        match self {
            Self::Servo(engine) => engine,
            Self::PowerCore(engine) => engine,
        }
    }
}

impl SoundEngine for Engine {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.inner_mut().prepare(spec)
    }

    fn reset(&mut self) {
        self.inner_mut().reset()
    }

    fn update_parameters(&mut self, params: &EngineParameterSet) {
        self.inner_mut().update_parameters(params)
    }

    fn process_adding_to(&mut self, buffer: &mut AudioBuffer) {
        self.inner_mut().process_adding_to(buffer)
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.inner_mut().set_enabled(enabled)
    }

    fn is_enabled(&self) -> bool {
        self.inner().is_enabled()
    }

    fn is_processing(&self) -> bool {
        self.inner().is_processing()
    }

    fn cpu_usage(&self) -> f64 {
        self.inner().cpu_usage()
    }

    fn memory_usage(&self) -> usize {
        self.inner().memory_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_index_their_slots() {
        for (i, kind) in EngineKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(Engine::new(*kind).kind(), *kind);
        }
    }

    #[test]
    fn dispatch_reaches_the_variant() {
        let mut engine = Engine::new(EngineKind::Servo);
        assert!(engine.is_enabled());
        engine.set_enabled(false);
        assert!(!engine.as_servo().map_or(true, |s| s.is_enabled()));
        assert!(engine.as_power_core().is_none());
    }
}
