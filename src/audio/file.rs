use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use hound::WavReader;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::backend::{AudioBackendConfig, AudioFrame, CaptureBackend, CaptureEvent};
use super::convert::normalize_frame;
use super::encoding::AudioEncoding;
use crate::error::CaptureError;

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 /
            (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Split the file into fixed-duration frames at the target format
    pub fn frames(&self, config: &AudioBackendConfig) -> Result<Vec<AudioFrame>> {
        if self.sample_rate == 0 || self.channels == 0 {
            bail!("Invalid WAV format: {}Hz {}ch", self.sample_rate, self.channels);
        }

        let whole = normalize_frame(
            AudioFrame {
                samples: self.samples.clone(),
                sample_rate: self.sample_rate,
                channels: self.channels,
                timestamp_ms: 0,
            },
            config.target_sample_rate,
            config.target_channels,
        );

        let frame_ms = config.buffer_duration_ms.max(1);
        let samples_per_frame =
            (whole.sample_rate as u64 * whole.channels as u64 * frame_ms / 1000).max(1) as usize;

        Ok(whole
            .samples
            .chunks(samples_per_frame)
            .enumerate()
            .map(|(i, chunk)| AudioFrame {
                samples: chunk.to_vec(),
                sample_rate: whole.sample_rate,
                channels: whole.channels,
                timestamp_ms: i as u64 * frame_ms,
            })
            .collect())
    }
}

/// Capture backend that replays a WAV file at real-time pace
///
/// Each recording replays the file from the beginning; once the file is
/// exhausted the backend stays silent until stopped.
pub struct FileBackend {
    config: AudioBackendConfig,
    frames: Vec<AudioFrame>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    capturing: bool,
}

impl FileBackend {
    pub fn new(path: impl AsRef<Path>, config: AudioBackendConfig) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CaptureError::NoDevice(format!(
                "audio file not found: {}",
                path.display()
            )));
        }

        let file = AudioFile::open(path).map_err(|e| CaptureError::Device(format!("{e:#}")))?;
        let frames = file
            .frames(&config)
            .map_err(|e| CaptureError::Device(format!("{e:#}")))?;

        Ok(Self {
            config,
            frames,
            stop_tx: None,
            task: None,
            capturing: false,
        })
    }
}

#[async_trait::async_trait]
impl CaptureBackend for FileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>> {
        if self.capturing {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(100);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let frames = self.frames.clone();
        let period = Duration::from_millis(self.config.buffer_duration_ms.max(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately; frames are due one period later
            ticker.tick().await;

            let mut pending = frames.into_iter();
            loop {
                // A frame due at the stop instant is still delivered
                tokio::select! {
                    biased;
                    _ = ticker.tick() => {
                        if let Some(frame) = pending.next() {
                            debug!("File backend frame at {}ms", frame.timestamp_ms);
                            if tx.send(CaptureEvent::Data(frame)).await.is_err() {
                                return;
                            }
                        }
                    }
                    _ = &mut stop_rx => break,
                }
            }

            let _ = tx.send(CaptureEvent::Stopped).await;
        });

        self.stop_tx = Some(stop_tx);
        self.task = Some(task);
        self.capturing = true;

        info!("File audio capture started ({} frames)", self.frames.len());

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.capturing {
            return Ok(());
        }

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.context("File capture task panicked")?;
        }

        self.capturing = false;
        info!("File audio capture stopped");

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn supports(&self, encoding: AudioEncoding) -> bool {
        // Raw PCM only feeds the WAV writer
        encoding == AudioEncoding::Wav
    }

    fn name(&self) -> &str {
        "WAV file replay"
    }
}
