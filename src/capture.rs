//! Capture device adapter
//!
//! Owns the live capture backend for exactly one recording. `stop` consumes
//! the [`DeviceHandle`], so a handle can never be restarted while its stop is
//! still settling, and the backend is released on every exit path.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::audio::{
    negotiate, AudioBuffer, AudioEncoding, AudioFrame, BackendProvider, CaptureBackend,
    CaptureEvent, DEFAULT_PREFERENCE,
};
use crate::error::CaptureError;

/// Capture adapter configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Encodings in order of preference
    pub preference: Vec<AudioEncoding>,
    /// Recordings shorter than this are extended until this much audio is captured
    pub min_recording: Duration,
    /// How long past the floor a deferred stop waits for late frames
    pub floor_grace: Duration,
    /// Upper bound on backend acquisition attempts per `open`
    pub max_acquire_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            preference: DEFAULT_PREFERENCE.to_vec(),
            min_recording: Duration::from_millis(2000),
            floor_grace: Duration::from_millis(500),
            max_acquire_attempts: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Open,
    Recording,
}

#[derive(Debug, Default)]
struct Collected {
    fragments: Vec<AudioFrame>,
    error: Option<String>,
}

/// Live capture backend plus its negotiated encoder session
pub struct DeviceHandle {
    backend: Box<dyn CaptureBackend>,
    encoding: AudioEncoding,
    state: HandleState,
    started_at: Option<Instant>,
    captured: Option<watch::Receiver<Duration>>,
    collector: Option<JoinHandle<Collected>>,
}

impl DeviceHandle {
    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        if let Some(collector) = self.collector.take() {
            collector.abort();
        }
    }
}

pub struct CaptureDevice {
    provider: Arc<dyn BackendProvider>,
    config: CaptureConfig,
}

impl CaptureDevice {
    pub fn new(provider: Arc<dyn BackendProvider>, config: CaptureConfig) -> Self {
        Self { provider, config }
    }

    /// Acquire a backend and negotiate the recording encoding
    ///
    /// Retries transient acquisition failures up to `max_acquire_attempts`.
    /// `NoSupportedFormat` is terminal and never retried.
    pub async fn open(&self) -> Result<DeviceHandle, CaptureError> {
        let max_attempts = self.config.max_acquire_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.try_open() {
                Ok(handle) => return Ok(handle),
                Err(CaptureError::NoSupportedFormat) => {
                    error!("No supported audio format among {:?}", self.config.preference);
                    return Err(CaptureError::NoSupportedFormat);
                }
                Err(e) if attempt < max_attempts => {
                    warn!(
                        "Capture device acquisition failed (attempt {}/{}): {}",
                        attempt, max_attempts, e
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                Err(e) => {
                    error!(
                        "Capture device acquisition failed after {} attempts: {}",
                        attempt, e
                    );
                    return Err(e);
                }
            }
        }
    }

    fn try_open(&self) -> Result<DeviceHandle, CaptureError> {
        let backend = self.provider.create()?;
        let encoding = negotiate(&self.config.preference, backend.as_ref())
            .ok_or(CaptureError::NoSupportedFormat)?;

        info!(
            "Capture device opened: {} ({})",
            backend.name(),
            encoding.media_type()
        );

        Ok(DeviceHandle {
            backend,
            encoding,
            state: HandleState::Open,
            started_at: None,
            captured: None,
            collector: None,
        })
    }

    /// Start recording on an open handle; a handle already recording is left alone
    pub async fn start(&self, handle: &mut DeviceHandle) -> Result<(), CaptureError> {
        if handle.state == HandleState::Recording || handle.backend.is_capturing() {
            warn!("Capture already active on {}, ignoring start", handle.backend.name());
            return Ok(());
        }

        let events = handle
            .backend
            .start()
            .await
            .map_err(|e| CaptureError::Device(format!("{e:#}")))?;

        let (captured_tx, captured_rx) = watch::channel(Duration::ZERO);
        handle.collector = Some(tokio::spawn(collect(events, captured_tx)));
        handle.captured = Some(captured_rx);
        handle.started_at = Some(Instant::now());
        handle.state = HandleState::Recording;

        info!("Recording started on {}", handle.backend.name());

        Ok(())
    }

    /// Stop recording and assemble everything captured since `start`
    ///
    /// Stops earlier than `min_recording` after start are deferred until that
    /// much audio has been collected, or until `floor_grace` past the floor if
    /// the backend runs dry. The backend is released whatever the outcome.
    pub async fn stop(&self, mut handle: DeviceHandle) -> Result<AudioBuffer, CaptureError> {
        let started_at = match (handle.state, handle.started_at) {
            (HandleState::Recording, Some(at)) => at,
            _ => {
                warn!("Stop requested on a handle that is not recording");
                self.close(handle).await;
                return Err(CaptureError::Device("no active recording".to_string()));
            }
        };

        let elapsed = started_at.elapsed();
        if elapsed < self.config.min_recording {
            let remaining = self.config.min_recording - elapsed;
            info!(
                "Recording too short ({}ms), deferring stop by {}ms",
                elapsed.as_millis(),
                remaining.as_millis()
            );
            if let Some(captured) = handle.captured.as_mut() {
                let floor = self.config.min_recording;
                let wait = captured.wait_for(|captured| *captured >= floor);
                let timed_out = tokio::time::timeout(remaining + self.config.floor_grace, wait)
                    .await
                    .is_err();
                if timed_out {
                    let so_far = *captured.borrow();
                    warn!(
                        "Only {}ms captured by the {}ms floor, stopping anyway",
                        so_far.as_millis(),
                        floor.as_millis()
                    );
                }
            }
        }

        let stop_result = handle.backend.stop().await;
        let recorded_for = started_at.elapsed();

        let collected = match (stop_result, handle.collector.take()) {
            (Ok(()), Some(collector)) => match collector.await {
                Ok(collected) => collected,
                Err(e) => Collected {
                    fragments: Vec::new(),
                    error: Some(format!("capture collector failed: {e}")),
                },
            },
            (Ok(()), None) => Collected::default(),
            (Err(e), collector) => {
                if let Some(collector) = collector {
                    collector.abort();
                }
                Collected {
                    fragments: Vec::new(),
                    error: Some(format!("{e:#}")),
                }
            }
        };

        let encoding = handle.encoding;
        let backend_name = handle.backend.name().to_string();
        drop(handle);
        info!("Capture device released: {}", backend_name);

        if let Some(err) = collected.error {
            error!("Recording failed: {}", err);
            return Err(CaptureError::Device(err));
        }

        let buffer = AudioBuffer {
            encoding,
            fragments: collected.fragments,
            recorded_for,
        };

        info!(
            "Recording stopped: {} fragments, {}ms captured over {}ms",
            buffer.fragments.len(),
            buffer.captured_duration().as_millis(),
            recorded_for.as_millis()
        );

        Ok(buffer)
    }

    /// Release a handle without producing audio
    pub async fn close(&self, mut handle: DeviceHandle) {
        if handle.backend.is_capturing() {
            if let Err(e) = handle.backend.stop().await {
                warn!("Failed to stop capture backend on close: {:#}", e);
            }
        }
        if let Some(collector) = handle.collector.take() {
            collector.abort();
        }
        info!("Capture device closed: {}", handle.backend.name());
    }
}

async fn collect(
    mut events: mpsc::Receiver<CaptureEvent>,
    captured: watch::Sender<Duration>,
) -> Collected {
    let mut collected = Collected::default();

    while let Some(event) = events.recv().await {
        match event {
            CaptureEvent::Data(frame) => {
                if !frame.samples.is_empty() {
                    debug!("Captured {} samples at {}ms", frame.samples.len(), frame.timestamp_ms);
                    let duration = Duration::from_millis(frame.duration_ms());
                    collected.fragments.push(frame);
                    captured.send_modify(|total| *total += duration);
                }
            }
            CaptureEvent::Error(msg) => {
                error!("Capture device error: {}", msg);
                collected.error.get_or_insert(msg);
            }
            CaptureEvent::Stopped => break,
        }
    }

    collected
}
