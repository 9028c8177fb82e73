//! Reply playback, gated on a user interaction

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::audio::probe::{self, extension_for};
use crate::remote::SynthesizedAudio;

/// Destination for synthesized audio
#[async_trait::async_trait]
pub trait AudioOutput: Send + Sync {
    /// Play the audio to completion
    async fn play(&self, audio: &SynthesizedAudio) -> Result<()>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Played,
    /// No user interaction yet; nothing was played
    Blocked,
}

pub struct PlaybackAdapter {
    interacted: AtomicBool,
    output: Arc<dyn AudioOutput>,
}

impl PlaybackAdapter {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        info!("Playback output: {}", output.name());
        Self {
            interacted: AtomicBool::new(false),
            output,
        }
    }

    /// Record a user interaction; returns true the first time
    pub fn mark_interacted(&self) -> bool {
        let first = !self.interacted.swap(true, Ordering::SeqCst);
        if first {
            info!("First user interaction, playback unlocked");
        }
        first
    }

    pub fn has_interacted(&self) -> bool {
        self.interacted.load(Ordering::SeqCst)
    }

    /// Forget the interaction (session teardown only)
    pub fn reset_interaction(&self) {
        self.interacted.store(false, Ordering::SeqCst);
    }

    pub async fn play(&self, audio: &SynthesizedAudio) -> Result<PlaybackOutcome> {
        if !self.has_interacted() {
            warn!("Playback blocked until the user interacts with the kiosk");
            return Ok(PlaybackOutcome::Blocked);
        }

        match probe::probe(&audio.bytes, &audio.media_type) {
            Ok(info) => info!(
                "Playing {} reply ({}ms)",
                info.codec,
                info.duration.map(|d| d.as_millis()).unwrap_or_default()
            ),
            Err(e) => warn!("Could not probe reply audio ({}): {:#}", audio.media_type, e),
        }

        self.output
            .play(audio)
            .await
            .with_context(|| format!("Playback failed on {}", self.output.name()))?;

        debug!("Playback finished");
        Ok(PlaybackOutcome::Played)
    }
}

/// Writes each reply into a spool directory for an external player
///
/// Only the most recent reply is kept on disk.
pub struct SpoolOutput {
    dir: PathBuf,
    previous: Mutex<Option<PathBuf>>,
}

impl SpoolOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            previous: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl AudioOutput for SpoolOutput {
    async fn play(&self, audio: &SynthesizedAudio) -> Result<()> {
        let mut previous = self.previous.lock().await;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create spool dir {}", self.dir.display()))?;

        let ext = extension_for(&audio.media_type).unwrap_or("bin");
        let path = self.dir.join(format!("reply-{}.{}", uuid::Uuid::new_v4(), ext));
        let written = tokio::fs::write(&path, &audio.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()));

        if let Some(old) = previous.take() {
            if let Err(e) = tokio::fs::remove_file(&old).await {
                warn!("Failed to remove previous reply {}: {}", old.display(), e);
            }
        }

        written?;
        info!("Reply spooled to {}", path.display());
        *previous = Some(path);
        Ok(())
    }

    fn name(&self) -> &str {
        "spool directory"
    }
}

/// Plays replies on the default output device
#[cfg(feature = "hardware")]
pub struct SpeakerOutput;

#[cfg(feature = "hardware")]
#[async_trait::async_trait]
impl AudioOutput for SpeakerOutput {
    async fn play(&self, audio: &SynthesizedAudio) -> Result<()> {
        let bytes = audio.bytes.to_vec();
        tokio::task::spawn_blocking(move || -> Result<()> {
            // Stream and sink are dropped on every path out of this closure
            let (_stream, handle) =
                rodio::OutputStream::try_default().context("No audio output device")?;
            let sink = rodio::Sink::try_new(&handle).context("Failed to create audio sink")?;
            let source = rodio::Decoder::new(std::io::Cursor::new(bytes))
                .context("Failed to decode reply audio")?;
            sink.append(source);
            sink.sleep_until_end();
            Ok(())
        })
        .await
        .context("Playback task panicked")?
    }

    fn name(&self) -> &str {
        "default speaker"
    }
}
