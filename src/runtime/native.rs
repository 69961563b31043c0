use crate::runtime::store::{ParameterStore, RuntimeStatus};
use crate::synth::diagnostics::LoadMeter;
use crate::synth::{AudioBuffer, EngineKind, MechaSynth, ProcessSpec, SoundEngine};
use std::sync::Arc;

/// Host-side driver for desktop backends.
///
/// Owns the synth and a pre-sized work buffer. The control side only ever
/// touches the shared `ParameterStore`; everything here runs on the audio thread
/// after `prepare`.
pub struct NativeRuntime {
    synth: MechaSynth,
    params: Arc<ParameterStore>,
    status: Arc<RuntimeStatus>,
    buffer: AudioBuffer,
    meter: LoadMeter,
    spec: ProcessSpec,
}

impl NativeRuntime {
    pub fn new(params: Arc<ParameterStore>, status: Arc<RuntimeStatus>) -> Self {
        let spec = ProcessSpec::default();
        let mut runtime = Self {
            synth: MechaSynth::new(),
            params,
            status,
            buffer: AudioBuffer::new(spec.num_channels, spec.max_block_size),
            meter: LoadMeter::new(spec.sample_rate),
            spec,
        };
        runtime.prepare(&spec);
        runtime
    }

    /// Sizes the work buffer and prepares the synth. Allocates.
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        self.spec = spec.sanitized();
        self.buffer
            .resize(self.spec.num_channels, self.spec.max_block_size);
        self.meter.prepare(self.spec.sample_rate);
        self.synth.prepare(&self.spec);
        log::debug!(
            target: "runtime",
            "work buffer sized to {} x {}",
            self.spec.num_channels,
            self.spec.max_block_size
        );
    }

    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    pub fn synth(&self) -> &MechaSynth {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut MechaSynth {
        &mut self.synth
    }

    /// Renders into an interleaved device buffer with `channels` samples per frame.
    ///
    /// Buffers longer than the prepared block size are rendered in chunks. A
    /// trailing partial frame is zeroed.
    pub fn process(&mut self, output: &mut [f32], channels: usize) {
        if channels == 0 {
            output.fill(0.0);
            return;
        }
        let started = self.meter.start();
        let frames = output.len() / channels;
        let chunk_len = self.buffer.capacity().max(1) * channels;

        for chunk in output[..frames * channels].chunks_mut(chunk_len) {
            self.render_chunk(chunk, channels);
        }
        output[frames * channels..].fill(0.0);

        self.meter.finish(started, frames);
        self.publish_status();
    }

    fn render_chunk(&mut self, chunk: &mut [f32], channels: usize) {
        let params = self.params.snapshot();
        let gain = self.params.master_gain();

        self.buffer.set_num_samples(chunk.len() / channels);
        self.buffer.clear();
        self.synth.process(&mut self.buffer, &params);
        self.buffer.apply_gain(gain);
        self.buffer.write_interleaved(chunk, channels);
    }

    fn publish_status(&self) {
        self.status.publish_callback_load(self.meter.load());
        for kind in EngineKind::ALL {
            let engine = self.synth.engine(kind);
            self.status
                .publish_engine(kind, engine.cpu_usage(), engine.memory_usage());
        }
    }
}
