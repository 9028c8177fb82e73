//! Assembles a kiosk session from configuration

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use axum::Router;
use tracing::info;

use crate::audio::{AudioBackendConfig, AudioBackendFactory, AudioSource};
use crate::capture::{CaptureConfig, CaptureDevice};
use crate::config::{CaptureSource, Config, OutputKind};
use crate::http::{create_router, AppState};
use crate::location::{HttpLocation, LocationProvider, StaticLocation};
use crate::permission::{platform_for, PermissionGate};
use crate::playback::{AudioOutput, PlaybackAdapter, SpoolOutput};
use crate::presentation::TranscriptLog;
use crate::remote::{HttpReasoner, HttpSynthesizer, HttpTranscriber};
use crate::session::{ControllerConfig, SessionController, SessionServices};

/// A configured kiosk: the session controller and the log it presents to
pub struct Kiosk {
    pub controller: SessionController,
    pub log: Arc<TranscriptLog>,
}

impl Kiosk {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let source = match cfg.audio.source {
            CaptureSource::Microphone => AudioSource::Microphone,
            CaptureSource::File => match &cfg.audio.file_path {
                Some(path) => AudioSource::File(path.clone()),
                None => bail!("audio.file_path is required when audio.source = \"file\""),
            },
        };
        info!("Audio source: {:?}", source);

        let backend_config = AudioBackendConfig {
            target_sample_rate: cfg.audio.sample_rate,
            target_channels: cfg.audio.channels,
            buffer_duration_ms: cfg.audio.buffer_ms,
        };
        let capture = CaptureDevice::new(
            Arc::new(AudioBackendFactory::new(source.clone(), backend_config)),
            CaptureConfig {
                min_recording: Duration::from_millis(cfg.audio.min_recording_ms),
                max_acquire_attempts: cfg.audio.max_acquire_attempts,
                ..CaptureConfig::default()
            },
        );

        let timeout = cfg.remote.request_timeout();
        let transcriber = HttpTranscriber::new(&cfg.remote.transcribe_url, timeout)
            .context("Failed to create transcription client")?;
        let reasoner = HttpReasoner::new(&cfg.remote.ask_ai_url, timeout)
            .context("Failed to create reasoning client")?;
        let synthesizer = HttpSynthesizer::new(&cfg.remote.speak_url, timeout)
            .context("Failed to create synthesis client")?;

        let location_timeout = Duration::from_secs(cfg.location.timeout_secs);
        let location: Arc<dyn LocationProvider> = match (
            &cfg.location.url,
            cfg.location.latitude,
            cfg.location.longitude,
        ) {
            (Some(url), _, _) => Arc::new(
                HttpLocation::new(url, location_timeout)
                    .context("Failed to create location client")?,
            ),
            (None, Some(lat), Some(lon)) => Arc::new(StaticLocation::new(lat, lon)),
            _ => bail!("location needs either url or latitude and longitude"),
        };

        let output: Arc<dyn AudioOutput> = match cfg.playback.output {
            OutputKind::Spool => Arc::new(SpoolOutput::new(&cfg.playback.spool_dir)),
            #[cfg(feature = "hardware")]
            OutputKind::Speaker => Arc::new(crate::playback::SpeakerOutput),
            #[cfg(not(feature = "hardware"))]
            OutputKind::Speaker => {
                bail!("speaker playback requires the `hardware` feature; use playback.output = \"spool\"")
            }
        };

        let log = Arc::new(TranscriptLog::new());
        let services = SessionServices {
            permission: Arc::new(PermissionGate::new(platform_for(&source))),
            capture,
            transcriber: Arc::new(transcriber),
            reasoner: Arc::new(reasoner),
            synthesizer: Arc::new(synthesizer),
            location,
            playback: Arc::new(PlaybackAdapter::new(output)),
            sink: log.clone(),
        };

        let controller = SessionController::new(
            services,
            ControllerConfig {
                default_language: cfg.session.default_language,
                location_timeout,
            },
        );

        Ok(Self { controller, log })
    }

    pub fn router(&self) -> Router {
        create_router(AppState::new(self.controller.clone(), self.log.clone()))
    }
}
