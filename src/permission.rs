//! Microphone permission gate
//!
//! Performs the access check once per session lifetime and caches a grant.
//! Concurrent callers are serialized so the platform is never asked twice at
//! the same time.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::audio::{AudioFile, AudioSource};
use crate::error::PermissionError;

/// Current platform-level permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Not decided yet; acquiring a stream will prompt
    Prompt,
}

/// Failure while opening the probe stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("no capture device found")]
    NotFound,

    #[error("capture not allowed")]
    NotAllowed,

    #[error("{0}")]
    Other(String),
}

/// Platform access to microphone permissions
#[async_trait::async_trait]
pub trait MicrophonePlatform: Send + Sync {
    /// Query the permission state without prompting
    async fn query(&self) -> PermissionStatus;

    /// Open a short-lived stream to trigger the consent prompt, then release it
    async fn probe(&self) -> Result<(), PlatformError>;
}

/// Proof of granted microphone access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Granted;

pub struct PermissionGate {
    platform: Arc<dyn MicrophonePlatform>,
    /// Held across the whole check so concurrent callers never double-prompt
    check: Mutex<()>,
    /// Written only while `check` is held
    granted: AtomicBool,
    probes: AtomicUsize,
}

impl PermissionGate {
    pub fn new(platform: Arc<dyn MicrophonePlatform>) -> Self {
        Self {
            platform,
            check: Mutex::new(()),
            granted: AtomicBool::new(false),
            probes: AtomicUsize::new(0),
        }
    }

    pub async fn ensure_microphone_access(&self) -> Result<Granted, PermissionError> {
        let _check = self.check.lock().await;
        if self.granted.load(Ordering::SeqCst) {
            debug!("Microphone access already granted");
            return Ok(Granted);
        }

        let status = self.platform.query().await;
        info!("Microphone permission status: {:?}", status);
        if status == PermissionStatus::Denied {
            warn!("Microphone access denied, not prompting again");
            return Err(PermissionError::Denied);
        }

        self.probes.fetch_add(1, Ordering::SeqCst);
        info!("Requesting microphone access");

        match self.platform.probe().await {
            Ok(()) => {
                self.granted.store(true, Ordering::SeqCst);
                info!("Microphone access granted");
                Ok(Granted)
            }
            Err(PlatformError::NotFound) => {
                warn!("No microphone found");
                Err(PermissionError::NoDevice)
            }
            Err(PlatformError::NotAllowed) => {
                warn!("Microphone access refused");
                Err(PermissionError::Denied)
            }
            Err(PlatformError::Other(msg)) => {
                warn!("Microphone access failed: {}", msg);
                Err(PermissionError::Unknown(msg))
            }
        }
    }

    /// Whether a previous call granted access
    pub fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    /// Number of probe streams requested so far
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Forget the cached grant (session teardown)
    pub async fn reset(&self) {
        let _check = self.check.lock().await;
        self.granted.store(false, Ordering::SeqCst);
    }
}

/// Permission platform backed by a WAV file source
pub struct FilePlatform {
    path: PathBuf,
}

impl FilePlatform {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl MicrophonePlatform for FilePlatform {
    async fn query(&self) -> PermissionStatus {
        PermissionStatus::Prompt
    }

    async fn probe(&self) -> Result<(), PlatformError> {
        if !self.path.exists() {
            return Err(PlatformError::NotFound);
        }
        AudioFile::open(&self.path)
            .map(|_| ())
            .map_err(|e| PlatformError::Other(format!("{e:#}")))
    }
}

/// Permission platform for the cpal default input device
#[cfg(feature = "hardware")]
pub struct CpalPlatform;

#[cfg(feature = "hardware")]
#[async_trait::async_trait]
impl MicrophonePlatform for CpalPlatform {
    async fn query(&self) -> PermissionStatus {
        // cpal exposes no permission query; acquiring a stream is the prompt
        PermissionStatus::Prompt
    }

    async fn probe(&self) -> Result<(), PlatformError> {
        tokio::task::spawn_blocking(crate::audio::microphone::probe_default_input)
            .await
            .map_err(|e| PlatformError::Other(e.to_string()))?
    }
}

/// Platform used when microphone support is compiled out
#[cfg(not(feature = "hardware"))]
pub struct NoMicrophonePlatform;

#[cfg(not(feature = "hardware"))]
#[async_trait::async_trait]
impl MicrophonePlatform for NoMicrophonePlatform {
    async fn query(&self) -> PermissionStatus {
        PermissionStatus::Prompt
    }

    async fn probe(&self) -> Result<(), PlatformError> {
        Err(PlatformError::NotFound)
    }
}

/// Permission platform matching a capture source
pub fn platform_for(source: &AudioSource) -> Arc<dyn MicrophonePlatform> {
    match source {
        AudioSource::File(path) => Arc::new(FilePlatform::new(path.clone())),
        #[cfg(feature = "hardware")]
        AudioSource::Microphone => Arc::new(CpalPlatform),
        #[cfg(not(feature = "hardware"))]
        AudioSource::Microphone => Arc::new(NoMicrophonePlatform),
    }
}
