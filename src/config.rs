use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::language::Language;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub remote: RemoteConfig,
    pub audio: AudioConfig,
    pub location: LocationConfig,
    pub playback: PlaybackConfig,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    pub transcribe_url: String,
    pub ask_ai_url: String,
    pub speak_url: String,
    pub request_timeout_secs: u64,
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Microphone,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub source: CaptureSource,
    /// WAV replayed when `source = "file"`
    pub file_path: Option<PathBuf>,
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_ms: u64,
    pub min_recording_ms: u64,
    pub max_acquire_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// JSON endpoint returning the kiosk position; wins over static coordinates
    pub url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Speaker,
    Spool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    pub output: OutputKind,
    pub spool_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub default_language: Language,
}

impl Config {
    /// Load defaults, then the optional file at `path`, then `KIOSK__*` env vars
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .set_default("service.name", "voice-kiosk")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8080)?
            .set_default("remote.transcribe_url", "http://127.0.0.1:5000/transcribe")?
            .set_default("remote.ask_ai_url", "http://127.0.0.1:5000/ask-ai")?
            .set_default("remote.speak_url", "http://127.0.0.1:5000/speak")?
            .set_default("remote.request_timeout_secs", 30)?
            .set_default("audio.source", "microphone")?
            .set_default("audio.sample_rate", 16000)?
            .set_default("audio.channels", 1)?
            .set_default("audio.buffer_ms", 100)?
            .set_default("audio.min_recording_ms", 2000)?
            .set_default("audio.max_acquire_attempts", 3)?
            .set_default("location.timeout_secs", 10)?
            .set_default("playback.output", "speaker")?
            .set_default("playback.spool_dir", "replies")?
            .set_default("session.default_language", "pt")?
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("KIOSK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        settings
            .try_deserialize()
            .context("Invalid kiosk configuration")
    }
}
