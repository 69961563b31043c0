mod cpal_backend;
pub use self::cpal_backend::CpalBackend;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no output device available")]
    NoOutputDevice,
    #[error("failed to enumerate devices: {0}")]
    Devices(#[from] cpal::DevicesError),
    #[error("failed to query output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("unsupported sample format {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("failed to start stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[error("failed to pause stream: {0}")]
    Pause(#[from] cpal::PauseStreamError),
}

pub trait AudioBackend {
    fn start(&mut self) -> Result<(), BackendError>;
    fn stop(&mut self) -> Result<(), BackendError>;
}
