use super::buffer::AudioBuffer;
use super::context::ProcessSpec;
use super::engine::{Engine, EngineKind, SoundEngine, ENGINE_COUNT};
use super::hiss::HissLayer;
use super::params::EngineParameterSet;

/// Owns the hiss base layer and the pluggable engines and runs the per-block pipeline.
#[derive(Debug)]
pub struct MechaSynth {
    hiss: HissLayer,
    engines: [Engine; ENGINE_COUNT],
    spec: ProcessSpec,
}

impl MechaSynth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconfigures every stage. Not real-time safe.
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        self.spec = spec.sanitized();
        log::info!(
            target: "synth",
            "preparing: {} Hz, block {} samples, {} channels",
            self.spec.sample_rate,
            self.spec.max_block_size,
            self.spec.num_channels
        );

        self.hiss.prepare(&self.spec);
        for engine in self.engines.iter_mut() {
            engine.prepare(&self.spec);
        }
        self.reset();
    }

    pub fn reset(&mut self) {
        self.hiss.reset();
        for engine in self.engines.iter_mut() {
            engine.reset();
        }
    }

    /// Renders one block into `buffer`, which the caller must have cleared.
    ///
    /// `buffer` may not have more channels than the last `prepare` asked for;
    /// filter state is sized per prepared channel.
    ///
    /// Order: parameters to every engine, then the hiss layer (writes), then
    /// each processing engine in registration order (adds).
    pub fn process(&mut self, buffer: &mut AudioBuffer, params: &EngineParameterSet) {
        debug_assert!(
            buffer.num_channels() <= self.spec.num_channels,
            "buffer has {} channels, prepared for {}",
            buffer.num_channels(),
            self.spec.num_channels
        );
        for engine in self.engines.iter_mut() {
            engine.update_parameters(params);
        }

        self.hiss.process(buffer, &params.hiss);

        for engine in self.engines.iter_mut() {
            if engine.is_processing() {
                engine.process_adding_to(buffer);
            }
        }
    }

    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    pub fn engine(&self, kind: EngineKind) -> &Engine {
        &self.engines[kind.index()]
    }

    pub fn engine_mut(&mut self, kind: EngineKind) -> &mut Engine {
        &mut self.engines[kind.index()]
    }

    pub fn engines(&self) -> impl Iterator<Item = &Engine> {
        self.engines.iter()
    }

    pub fn set_engine_enabled(&mut self, kind: EngineKind, enabled: bool) {
        self.engine_mut(kind).set_enabled(enabled);
    }
}

impl Default for MechaSynth {
    fn default() -> Self {
        Self {
            hiss: HissLayer::new(),
            engines: EngineKind::ALL.map(Engine::new),
            spec: ProcessSpec::default(),
        }
    }
}
