// Microphone backend using cpal's default input device

use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::backend::{AudioBackendConfig, AudioFrame, CaptureBackend, CaptureEvent};
use super::convert::{f32_to_i16, normalize_frame};
use super::encoding::AudioEncoding;
use crate::error::CaptureError;
use crate::permission::PlatformError;

/// Microphone backend
///
/// The cpal stream is not `Send` on every platform, so it lives on a
/// dedicated thread for the duration of one recording.
pub struct MicrophoneBackend {
    config: AudioBackendConfig,
    stop_tx: Option<std_mpsc::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
    capturing: bool,
}

impl MicrophoneBackend {
    pub fn new(config: AudioBackendConfig) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::NoDevice("no default input device".to_string()))?;

        info!(
            "Microphone backend initialized: {} ({}Hz, {} channels)",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.target_sample_rate,
            config.target_channels
        );

        Ok(Self {
            config,
            stop_tx: None,
            thread: None,
            capturing: false,
        })
    }
}

#[async_trait::async_trait]
impl CaptureBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>> {
        if self.capturing {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(256);
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), String>>();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let config = self.config.clone();

        let handle = thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || run_capture(config, tx, ready_tx, stop_rx))
            .context("Failed to spawn capture thread")?;

        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .context("Capture readiness task panicked")?
            .map_err(|_| anyhow!("Capture thread exited before starting"))?;

        if let Err(e) = ready {
            let _ = handle.join();
            bail!("Failed to start microphone: {}", e);
        }

        self.stop_tx = Some(stop_tx);
        self.thread = Some(handle);
        self.capturing = true;

        info!("Microphone capture started");

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.capturing {
            return Ok(());
        }

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.thread.take() {
            tokio::task::spawn_blocking(move || handle.join())
                .await
                .context("Capture join task panicked")?
                .map_err(|_| anyhow!("Capture thread panicked"))?;
        }

        self.capturing = false;
        info!("Microphone capture stopped");

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
        "cpal microphone"
    }
}

impl Drop for MicrophoneBackend {
    fn drop(&mut self) {
        // Dropping the sender wakes the capture thread, which releases the stream
        self.stop_tx.take();
    }
}

fn run_capture(
    config: AudioBackendConfig,
    tx: mpsc::Sender<CaptureEvent>,
    ready_tx: std_mpsc::Sender<Result<(), String>>,
    stop_rx: std_mpsc::Receiver<()>,
) {
    let stream = match build_input_stream(&config, tx.clone()) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("{e:#}")));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(e.to_string()));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    // Blocks until stop() or until the backend is dropped
    let _ = stop_rx.recv();
    drop(stream);

    let _ = tx.blocking_send(CaptureEvent::Stopped);
}

fn build_input_stream(
    config: &AudioBackendConfig,
    tx: mpsc::Sender<CaptureEvent>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .context("No default input device")?;
    let supported = device
        .default_input_config()
        .context("Failed to query input config")?;
    let stream_config: cpal::StreamConfig = supported.config();

    let source_rate = stream_config.sample_rate.0;
    let source_channels = stream_config.channels;
    let target_rate = config.target_sample_rate;
    let target_channels = config.target_channels;
    let started = Instant::now();

    let err_tx = tx.clone();
    let on_error = move |err: cpal::StreamError| {
        warn!("Microphone stream error: {}", err);
        let _ = err_tx.try_send(CaptureEvent::Error(err.to_string()));
    };

    let emit = move |samples: Vec<i16>| {
        let frame = normalize_frame(
            AudioFrame {
                samples,
                sample_rate: source_rate,
                channels: source_channels,
                timestamp_ms: started.elapsed().as_millis() as u64,
            },
            target_rate,
            target_channels,
        );
        if tx.try_send(CaptureEvent::Data(frame)).is_err() {
            warn!("Capture channel full, dropping audio fragment");
        }
    };

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| emit(f32_to_i16(data)),
            on_error,
            None,
        )?,
        cpal::SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| emit(data.to_vec()),
            on_error,
            None,
        )?,
        other => bail!("Unsupported input sample format: {:?}", other),
    };

    Ok(stream)
}

/// Open and immediately release a default-input stream to trigger the OS consent prompt
pub fn probe_default_input() -> Result<(), PlatformError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(PlatformError::NotFound)?;
    let supported = device.default_input_config().map_err(|e| match e {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => PlatformError::NotFound,
        other => classify(other.to_string()),
    })?;

    let stream = device
        .build_input_stream_raw(
            &supported.config(),
            supported.sample_format(),
            |_data: &cpal::Data, _: &cpal::InputCallbackInfo| {},
            |err| warn!("Probe stream error: {}", err),
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => PlatformError::NotFound,
            other => classify(other.to_string()),
        })?;
    drop(stream);

    Ok(())
}

fn classify(message: String) -> PlatformError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("not allowed") || lower.contains("denied") {
        PlatformError::NotAllowed
    } else {
        PlatformError::Other(message)
    }
}
