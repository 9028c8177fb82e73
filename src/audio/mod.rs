pub mod backend;
pub mod convert;
pub mod encoding;
pub mod file;
pub mod probe;

#[cfg(feature = "hardware")]
pub mod microphone;

pub use backend::{
    AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource, BackendProvider,
    CaptureBackend, CaptureEvent,
};
pub use encoding::{negotiate, AudioBuffer, AudioEncoding, DEFAULT_PREFERENCE};
pub use file::{AudioFile, FileBackend};
pub use probe::{probe, AudioInfo};
