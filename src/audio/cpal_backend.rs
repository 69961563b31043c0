use crate::audio::{AudioBackend, BackendError};
use crate::runtime::{NativeRuntime, ParameterStore, RuntimeStatus};
use crate::synth::ProcessSpec;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use std::sync::Arc;

const REQUESTED_BUFFER_FRAMES: u32 = 256;

/// Output stream on the default cpal host. A fresh `NativeRuntime` is moved
/// into each stream callback; the control side talks to it through the shared
/// parameter store only.
pub struct CpalBackend {
    stream: Option<Stream>,
    params: Arc<ParameterStore>,
    status: Arc<RuntimeStatus>,
}

impl CpalBackend {
    pub fn new(params: Arc<ParameterStore>, status: Arc<RuntimeStatus>) -> Self {
        Self {
            stream: None,
            params,
            status,
        }
    }

    fn select_output_device(&self, host: &cpal::Host) -> Result<cpal::Device, BackendError> {
        if cfg!(target_os = "linux") {
            self.select_linux_output_device(host)
        } else {
            host.default_output_device()
                .ok_or(BackendError::NoOutputDevice)
        }
    }

    // ALSA exposes a lot of raw hw devices; prefer the sound server.
    fn select_linux_output_device(&self, host: &cpal::Host) -> Result<cpal::Device, BackendError> {
        let mut fallback = None;
        for device in host.output_devices()? {
            let name = device.name().unwrap_or_default().to_lowercase();
            log::debug!(target: "audio", "found output device '{}'", name);
            if name.contains("pipewire") {
                return Ok(device);
            }
            if fallback.is_none() && name.starts_with("default") {
                fallback = Some(device);
            }
        }
        fallback
            .or_else(|| host.default_output_device())
            .ok_or(BackendError::NoOutputDevice)
    }

    fn build_stream(&self) -> Result<Stream, BackendError> {
        let host = cpal::default_host();
        let device = self.select_output_device(&host)?;
        log::info!(
            target: "audio",
            "selected device: {}",
            device.name().unwrap_or_default()
        );

        let supported_config = device.default_output_config()?;
        if supported_config.sample_format() != SampleFormat::F32 {
            return Err(BackendError::UnsupportedSampleFormat(
                supported_config.sample_format(),
            ));
        }

        let mut stream_config: cpal::StreamConfig = supported_config.into();
        stream_config.buffer_size = cpal::BufferSize::Fixed(REQUESTED_BUFFER_FRAMES);

        match self.build_stream_with(&device, &stream_config) {
            Ok(stream) => Ok(stream),
            Err(err) => {
                log::warn!(
                    target: "audio",
                    "fixed {}-frame buffer rejected ({}), using device default",
                    REQUESTED_BUFFER_FRAMES,
                    err
                );
                stream_config.buffer_size = cpal::BufferSize::Default;
                self.build_stream_with(&device, &stream_config)
            }
        }
    }

    fn build_stream_with(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
    ) -> Result<Stream, BackendError> {
        let channels = config.channels as usize;
        let spec = ProcessSpec::new(
            f64::from(config.sample_rate.0),
            REQUESTED_BUFFER_FRAMES as usize,
            channels,
        );
        log::info!(
            target: "audio",
            "stream config: {} Hz, {} channels",
            config.sample_rate.0,
            channels
        );

        let mut runtime = NativeRuntime::new(self.params.clone(), self.status.clone());
        runtime.prepare(&spec);

        let stream = device.build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                runtime.process(data, channels);
            },
            |err| log::error!(target: "audio", "stream error: {}", err),
            None,
        )?;
        Ok(stream)
    }
}

impl AudioBackend for CpalBackend {
    fn start(&mut self) -> Result<(), BackendError> {
        if let Some(stream) = &self.stream {
            stream.play()?;
            return Ok(());
        }
        let stream = self.build_stream()?;
        stream.play()?;
        self.stream = Some(stream);
        log::info!(target: "audio", "stream started");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        if let Some(stream) = self.stream.take() {
            stream.pause()?;
            log::info!(target: "audio", "stream stopped");
        }
        Ok(())
    }
}
