// Shared fixtures and in-process fakes for kiosk integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use tempfile::TempDir;
use voice_kiosk::audio::{AudioBackendConfig, AudioBackendFactory, AudioSource};
use voice_kiosk::capture::{CaptureConfig, CaptureDevice};
use voice_kiosk::permission::{MicrophonePlatform, PermissionStatus, PlatformError};
use voice_kiosk::playback::AudioOutput;
use voice_kiosk::remote::{
    AskRequest, AudioUpload, Reasoner, SpeakRequest, SynthesizedAudio, Synthesizer, Transcriber,
    Transcription,
};
use voice_kiosk::{
    BackendProvider, CaptureBackend, CaptureError, Coordinates, ControllerConfig, LocationProvider,
    PermissionGate, PlaybackAdapter, RemoteError, SessionController, SessionServices,
    StaticLocation, TranscriptLog,
};

/// Write a WAV file of a constant tone
pub fn write_wav(
    dir: &Path,
    name: &str,
    sample_rate: u32,
    channels: u16,
    total_samples: usize,
) -> Result<PathBuf> {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)?;
    for i in 0..total_samples {
        writer.write_sample(if i % 2 == 0 { 1200i16 } else { -1200i16 })?;
    }
    writer.finalize()?;
    Ok(path)
}

// ============================================================================
// Remote service fakes
// ============================================================================

pub struct FakeTranscriber {
    pub text: String,
    pub language_code: String,
    pub delay: Duration,
    pub calls: AtomicUsize,
    pub uploads: Mutex<Vec<AudioUpload>>,
}

impl FakeTranscriber {
    pub fn new(text: &str, language_code: &str) -> Self {
        Self {
            text: text.to_string(),
            language_code: language_code.to_string(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio: AudioUpload) -> Result<Transcription, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.uploads.lock().unwrap().push(audio);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Transcription {
            text: self.text.clone(),
            language_code: self.language_code.clone(),
        })
    }
}

pub struct FakeReasoner {
    pub reply: String,
    /// Respond with this HTTP status instead of a reply
    pub fail_status: Option<u16>,
    pub requests: Mutex<Vec<AskRequest>>,
}

impl FakeReasoner {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail_status: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Reasoner for FakeReasoner {
    async fn ask(&self, request: &AskRequest) -> Result<String, RemoteError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.fail_status {
            Some(status) => Err(RemoteError::Status {
                status,
                body: "upstream unavailable".to_string(),
            }),
            None => Ok(self.reply.clone()),
        }
    }
}

#[derive(Default)]
pub struct FakeSynthesizer {
    pub requests: Mutex<Vec<SpeakRequest>>,
}

impl FakeSynthesizer {
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn synthesize(&self, request: &SpeakRequest) -> Result<SynthesizedAudio, RemoteError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(SynthesizedAudio {
            bytes: Bytes::from_static(b"ID3 not really mp3"),
            media_type: "audio/mpeg".to_string(),
        })
    }
}

// ============================================================================
// Device and platform fakes
// ============================================================================

/// Permission platform that grants after a delay
pub struct SlowPlatform {
    pub delay: Duration,
    pub status: PermissionStatus,
    pub result: Result<(), PlatformError>,
}

#[async_trait::async_trait]
impl MicrophonePlatform for SlowPlatform {
    async fn query(&self) -> PermissionStatus {
        self.status
    }

    async fn probe(&self) -> Result<(), PlatformError> {
        tokio::time::sleep(self.delay).await;
        self.result.clone()
    }
}

/// Backend provider that fails a set number of times before delegating
pub struct FlakyProvider {
    pub inner: AudioBackendFactory,
    pub failures: AtomicUsize,
}

impl BackendProvider for FlakyProvider {
    fn create(&self) -> Result<Box<dyn CaptureBackend>, CaptureError> {
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(CaptureError::Device("device busy".to_string()));
        }
        self.inner.create()
    }
}

/// Location provider that never answers
pub struct HangingLocation;

#[async_trait::async_trait]
impl LocationProvider for HangingLocation {
    async fn current_position(&self) -> Result<Coordinates, RemoteError> {
        std::future::pending().await
    }
}

#[derive(Default)]
pub struct CountingOutput {
    pub plays: AtomicUsize,
}

#[async_trait::async_trait]
impl AudioOutput for CountingOutput {
    async fn play(&self, _audio: &SynthesizedAudio) -> Result<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct HarnessOptions {
    /// Samples in the replayed 16kHz mono WAV
    pub wav_samples: usize,
    pub transcriber: FakeTranscriber,
    pub reasoner: FakeReasoner,
    pub platform: SlowPlatform,
    pub location: Arc<dyn LocationProvider>,
    pub provider_failures: usize,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            wav_samples: 16000 * 5,
            transcriber: FakeTranscriber::new("Where is the museum?", "EN-US"),
            reasoner: FakeReasoner::new("Two blocks north."),
            platform: SlowPlatform {
                delay: Duration::from_millis(50),
                status: PermissionStatus::Prompt,
                result: Ok(()),
            },
            location: Arc::new(StaticLocation::new(-23.55, -46.63)),
            provider_failures: 0,
        }
    }
}

pub struct Harness {
    pub controller: SessionController,
    pub log: Arc<TranscriptLog>,
    pub permission: Arc<PermissionGate>,
    pub transcriber: Arc<FakeTranscriber>,
    pub reasoner: Arc<FakeReasoner>,
    pub synthesizer: Arc<FakeSynthesizer>,
    pub output: Arc<CountingOutput>,
    pub playback: Arc<PlaybackAdapter>,
    _dir: TempDir,
}

impl Harness {
    pub fn new(options: HarnessOptions) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let wav = write_wav(dir.path(), "utterance.wav", 16000, 1, options.wav_samples)?;

        let provider = FlakyProvider {
            inner: AudioBackendFactory::new(AudioSource::File(wav), AudioBackendConfig::default()),
            failures: AtomicUsize::new(options.provider_failures),
        };

        let permission = Arc::new(PermissionGate::new(Arc::new(options.platform)));
        let transcriber = Arc::new(options.transcriber);
        let reasoner = Arc::new(options.reasoner);
        let synthesizer = Arc::new(FakeSynthesizer::default());
        let output = Arc::new(CountingOutput::default());
        let playback = Arc::new(PlaybackAdapter::new(output.clone()));
        let log = Arc::new(TranscriptLog::new());

        let services = SessionServices {
            permission: permission.clone(),
            capture: CaptureDevice::new(Arc::new(provider), CaptureConfig::default()),
            transcriber: transcriber.clone(),
            reasoner: reasoner.clone(),
            synthesizer: synthesizer.clone(),
            location: options.location,
            playback: playback.clone(),
            sink: log.clone(),
        };

        Ok(Self {
            controller: SessionController::new(services, ControllerConfig::default()),
            log,
            permission,
            transcriber,
            reasoner,
            synthesizer,
            output,
            playback,
            _dir: dir,
        })
    }

    pub fn plays(&self) -> usize {
        self.output.plays.load(Ordering::SeqCst)
    }
}
