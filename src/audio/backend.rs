use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;

use super::encoding::AudioEncoding;
use super::file::FileBackend;
use crate::error::CaptureError;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since recording started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Playback length of this frame
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / (self.sample_rate as u64 * self.channels as u64)
    }
}

/// Event delivered by a capture backend while a recording session runs
///
/// All `Data` events of a session are delivered before its `Stopped` event.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    Data(AudioFrame),
    Error(String),
    Stopped,
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Target sample rate (will resample if needed)
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // 16kHz for speech recognition
            target_channels: 1,        // Mono
            buffer_duration_ms: 100,   // 100ms buffers
        }
    }
}

/// Audio capture backend trait
///
/// Implementations:
/// - Microphone: cpal default input device (`hardware` feature)
/// - File: replays a WAV file in real time (headless kiosks, tests)
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive capture events. The
    /// backend sends `CaptureEvent::Stopped` as the last event of the session.
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Whether frames from this backend can be delivered in `encoding`
    fn supports(&self, encoding: AudioEncoding) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Creates a fresh capture backend for every recording
pub trait BackendProvider: Send + Sync {
    fn create(&self) -> Result<Box<dyn CaptureBackend>, CaptureError>;
}

/// Audio source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Default microphone input
    Microphone,
    /// File input (headless kiosks, tests)
    File(PathBuf),
}

/// Audio backend factory
#[derive(Debug, Clone)]
pub struct AudioBackendFactory {
    source: AudioSource,
    config: AudioBackendConfig,
}

impl AudioBackendFactory {
    pub fn new(source: AudioSource, config: AudioBackendConfig) -> Self {
        Self { source, config }
    }

    /// Create audio backend based on platform and configuration
    pub fn create_backend(
        source: &AudioSource,
        config: AudioBackendConfig,
    ) -> Result<Box<dyn CaptureBackend>, CaptureError> {
        match source {
            AudioSource::Microphone => {
                #[cfg(feature = "hardware")]
                {
                    let backend = super::microphone::MicrophoneBackend::new(config)?;
                    Ok(Box::new(backend))
                }

                #[cfg(not(feature = "hardware"))]
                {
                    let _ = config;
                    Err(CaptureError::NoDevice(
                        "microphone capture requires the `hardware` feature".to_string(),
                    ))
                }
            }

            AudioSource::File(path) => {
                let backend = FileBackend::new(path, config)?;
                Ok(Box::new(backend))
            }
        }
    }
}

impl BackendProvider for AudioBackendFactory {
    fn create(&self) -> Result<Box<dyn CaptureBackend>, CaptureError> {
        Self::create_backend(&self.source, self.config.clone())
    }
}
