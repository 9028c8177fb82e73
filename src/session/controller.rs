use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

use super::config::SessionConfig;
use super::state::{TurnEvent, TurnPhase, TurnState};
use super::stats::{SessionStats, TurnCounters};
use crate::audio::AudioBuffer;
use crate::capture::{CaptureDevice, DeviceHandle};
use crate::error::{RemoteStage, TurnError};
use crate::language::{resolve_voice, Language};
use crate::location::LocationProvider;
use crate::permission::PermissionGate;
use crate::playback::{PlaybackAdapter, PlaybackOutcome};
use crate::presentation::{catalog, PresentationSink, Role, VisualState};
use crate::remote::{AskRequest, AudioUpload, Reasoner, SpeakRequest, Synthesizer, Transcriber};

/// Collaborators the controller drives
pub struct SessionServices {
    pub permission: Arc<PermissionGate>,
    pub capture: CaptureDevice,
    pub transcriber: Arc<dyn Transcriber>,
    pub reasoner: Arc<dyn Reasoner>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub location: Arc<dyn LocationProvider>,
    pub playback: Arc<PlaybackAdapter>,
    pub sink: Arc<dyn PresentationSink>,
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub default_language: Language,
    /// Bound on the geolocation fetch
    pub location_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            default_language: Language::Pt,
            location_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub enum StartOutcome {
    /// The device is recording
    Started,
    /// Another start is in flight or a turn is still running
    Ignored,
    /// The session was torn down while starting
    Superseded,
    Failed(TurnError),
}

#[derive(Debug)]
pub enum TurnOutcome {
    /// Not recording
    Ignored,
    /// The start has not settled; the stop runs once it does
    Deferred,
    Superseded,
    Completed(TurnSummary),
    Failed(TurnError),
}

/// What one successful turn produced
#[derive(Debug, Clone, Serialize)]
pub struct TurnSummary {
    pub sequence_id: u64,
    pub transcript: String,
    pub language: Language,
    pub voice: &'static str,
    pub reply: String,
    pub played: bool,
}

/// Why the pipeline stopped early
enum Halt {
    Superseded,
    Failed(TurnError),
}

impl From<TurnError> for Halt {
    fn from(err: TurnError) -> Self {
        Halt::Failed(err)
    }
}

struct Session {
    turn: TurnState,
    config: SessionConfig,
    device: Option<DeviceHandle>,
    counters: TurnCounters,
}

struct Inner {
    session: Mutex<Session>,
    phase_tx: watch::Sender<TurnPhase>,
    services: SessionServices,
    location_timeout: Duration,
}

/// Push-to-talk session controller
///
/// Single writer of the turn state. The session lock is never held across a
/// remote call or device operation; every result that arrives after an await
/// is checked against the turn sequence id before it is used.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(services: SessionServices, config: ControllerConfig) -> Self {
        let (phase_tx, _) = watch::channel(TurnPhase::Idle);
        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(Session {
                    turn: TurnState::new(),
                    config: SessionConfig::new(config.default_language),
                    device: None,
                    counters: TurnCounters::default(),
                }),
                phase_tx,
                services,
                location_timeout: config.location_timeout,
            }),
        }
    }

    pub async fn phase(&self) -> TurnPhase {
        self.inner.session.lock().await.turn.phase()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<TurnPhase> {
        self.inner.phase_tx.subscribe()
    }

    /// Resolve once the controller is back in `Idle`
    pub async fn wait_until_idle(&self) {
        let mut rx = self.subscribe_phase();
        let _ = rx.wait_for(|phase| *phase == TurnPhase::Idle).await;
    }

    pub async fn current_language(&self) -> Language {
        self.inner.session.lock().await.config.current_language
    }

    pub async fn current_voice(&self) -> &'static str {
        self.inner.session.lock().await.config.current_voice
    }

    pub async fn stats(&self) -> SessionStats {
        let session = self.inner.session.lock().await;
        let recording_elapsed_ms = match session.turn.phase() {
            TurnPhase::Recording | TurnPhase::Stopping => session
                .turn
                .recording_started_at
                .map(|at| at.elapsed().as_millis() as u64),
            _ => None,
        };

        SessionStats {
            phase: session.turn.phase(),
            is_starting: session.turn.is_starting,
            turn_sequence_id: session.turn.turn_sequence_id(),
            turns_completed: session.counters.turns_completed,
            turns_failed: session.counters.turns_failed,
            current_language: session.config.current_language,
            current_voice: session.config.current_voice.to_string(),
            recording_elapsed_ms,
            last_transcript: session.counters.last_transcript.clone(),
            started_at: session.counters.started_at,
        }
    }

    /// Record a user interaction, unlocking playback
    pub fn mark_interaction(&self) -> bool {
        self.inner.services.playback.mark_interacted()
    }

    /// Show the greeting in the current language
    pub async fn greet(&self) {
        let language = self.current_language().await;
        self.inner
            .services
            .sink
            .append_message(Role::System, catalog::greeting(language), None)
            .await;
    }

    fn transition(&self, session: &mut Session, event: TurnEvent) -> bool {
        match session.turn.apply(event) {
            Some(phase) => {
                self.inner.phase_tx.send_replace(phase);
                true
            }
            None => false,
        }
    }

    /// Begin a turn: acquire permission if needed, open and start the device
    pub async fn request_start(&self) -> StartOutcome {
        let services = &self.inner.services;

        let (sequence_id, needs_permission) = {
            let mut session = self.inner.session.lock().await;
            if session.turn.is_starting || session.turn.phase() != TurnPhase::Idle {
                warn!(
                    "Start ignored while {} (starting: {})",
                    session.turn.phase(),
                    session.turn.is_starting
                );
                return StartOutcome::Ignored;
            }

            let initialized = services.permission.is_granted();
            self.transition(&mut session, TurnEvent::StartRequested { initialized });
            session.turn.is_starting = true;
            let sequence_id = session.turn.begin_turn();
            info!("Turn {} starting", sequence_id);
            (sequence_id, !initialized)
        };

        if needs_permission {
            let result = services.permission.ensure_microphone_access().await;
            let mut session = self.inner.session.lock().await;
            if !session.turn.is_current(sequence_id) {
                return StartOutcome::Superseded;
            }
            match result {
                Ok(_) => {
                    self.transition(&mut session, TurnEvent::PermissionGranted);
                }
                Err(e) => {
                    self.transition(&mut session, TurnEvent::PermissionDenied);
                    drop(session);
                    let err = TurnError::from(e);
                    self.fail_turn(sequence_id, &err).await;
                    return StartOutcome::Failed(err);
                }
            }
        }

        let handle = match self.open_and_start().await {
            Ok(handle) => handle,
            Err(err) => {
                if !self.is_current(sequence_id).await {
                    return StartOutcome::Superseded;
                }
                self.fail_turn(sequence_id, &err).await;
                return StartOutcome::Failed(err);
            }
        };

        let deferred_stop = {
            let mut session = self.inner.session.lock().await;
            if !session.turn.is_current(sequence_id) {
                drop(session);
                services.capture.close(handle).await;
                return StartOutcome::Superseded;
            }
            session.turn.recording_started_at = handle.started_at();
            session.turn.is_starting = false;
            session.device = Some(handle);
            std::mem::take(&mut session.turn.stop_requested)
        };

        services
            .sink
            .set_visual_state(Some(VisualState::Recording))
            .await;
        info!("Turn {} recording", sequence_id);

        if deferred_stop {
            info!("Running stop deferred during start of turn {}", sequence_id);
            let controller = self.clone();
            tokio::spawn(async move {
                controller.request_stop().await;
            });
        }

        StartOutcome::Started
    }

    async fn open_and_start(&self) -> Result<DeviceHandle, TurnError> {
        let capture = &self.inner.services.capture;
        let mut handle = capture.open().await?;
        if let Err(e) = capture.start(&mut handle).await {
            capture.close(handle).await;
            return Err(e.into());
        }
        Ok(handle)
    }

    /// End the recording and run the turn pipeline to completion
    pub async fn request_stop(&self) -> TurnOutcome {
        let services = &self.inner.services;

        let (sequence_id, handle) = {
            let mut session = self.inner.session.lock().await;
            if session.turn.phase() != TurnPhase::Recording {
                warn!("Stop ignored while {}", session.turn.phase());
                return TurnOutcome::Ignored;
            }
            if session.turn.is_starting {
                info!("Stop requested before the device started, deferring");
                session.turn.stop_requested = true;
                return TurnOutcome::Deferred;
            }

            self.transition(&mut session, TurnEvent::StopRequested);
            (session.turn.turn_sequence_id(), session.device.take())
        };

        services
            .sink
            .set_visual_state(Some(VisualState::Releasing))
            .await;

        let stopped = match handle {
            Some(handle) => services.capture.stop(handle).await.map_err(TurnError::from),
            None => Err(TurnError::Unknown("no active recording".to_string())),
        };

        let buffer = match stopped {
            Ok(buffer) => buffer,
            Err(err) => {
                if !self.is_current(sequence_id).await {
                    return TurnOutcome::Superseded;
                }
                self.fail_turn(sequence_id, &err).await;
                return TurnOutcome::Failed(err);
            }
        };

        {
            let mut session = self.inner.session.lock().await;
            if !session.turn.is_current(sequence_id) {
                return TurnOutcome::Superseded;
            }
            session.turn.accumulated_audio = Some(buffer);
            self.transition(&mut session, TurnEvent::BufferReady);
        }

        match self.run_pipeline(sequence_id).await {
            Ok(summary) => {
                {
                    let mut session = self.inner.session.lock().await;
                    if !session.turn.is_current(sequence_id) {
                        return TurnOutcome::Superseded;
                    }
                    session.counters.turns_completed += 1;
                    self.transition(&mut session, TurnEvent::PipelineFinished);
                }
                services.sink.set_visual_state(None).await;
                info!("Turn {} completed", sequence_id);
                TurnOutcome::Completed(summary)
            }
            Err(Halt::Superseded) => {
                info!("Turn {} superseded, discarding its results", sequence_id);
                TurnOutcome::Superseded
            }
            Err(Halt::Failed(err)) => {
                self.fail_turn(sequence_id, &err).await;
                TurnOutcome::Failed(err)
            }
        }
    }

    async fn is_current(&self, sequence_id: u64) -> bool {
        self.inner.session.lock().await.turn.is_current(sequence_id)
    }

    async fn ensure_current(&self, sequence_id: u64) -> Result<(), Halt> {
        if self.is_current(sequence_id).await {
            Ok(())
        } else {
            Err(Halt::Superseded)
        }
    }

    async fn take_buffer(&self, sequence_id: u64) -> Result<AudioBuffer, Halt> {
        let mut session = self.inner.session.lock().await;
        if !session.turn.is_current(sequence_id) {
            return Err(Halt::Superseded);
        }
        match session.turn.accumulated_audio.take() {
            Some(buffer) if !buffer.is_empty() => Ok(buffer),
            _ => Err(Halt::Failed(TurnError::EmptyAudio)),
        }
    }

    /// Transcribe, reason, synthesize and play, strictly in that order
    async fn run_pipeline(&self, sequence_id: u64) -> Result<TurnSummary, Halt> {
        let services = &self.inner.services;

        let buffer = self.take_buffer(sequence_id).await?;
        info!(
            "Turn {}: {} samples over {}ms",
            sequence_id,
            buffer.sample_count(),
            buffer.recorded_for.as_millis()
        );

        let bytes = buffer
            .encode()
            .map_err(|e| TurnError::Unknown(format!("Failed to encode recording: {e:#}")))?;
        let upload = AudioUpload {
            bytes: bytes.into(),
            media_type: buffer.media_type().to_string(),
            file_name: buffer.file_name(),
        };

        let transcription = services
            .transcriber
            .transcribe(upload)
            .await
            .map_err(|e| TurnError::network(RemoteStage::Transcription, e))?;
        self.ensure_current(sequence_id).await?;

        let transcript = transcription.text.trim().to_string();
        if transcript.is_empty() {
            return Err(TurnError::EmptyTranscript.into());
        }

        let selection = resolve_voice(&transcription.language_code);
        {
            let mut session = self.inner.session.lock().await;
            if !session.turn.is_current(sequence_id) {
                return Err(Halt::Superseded);
            }
            session.config.apply(selection);
            session.counters.last_transcript = Some(transcript.clone());
        }
        let language = selection.language;

        services
            .sink
            .append_message(Role::User, &transcript, None)
            .await;
        services
            .sink
            .set_visual_state(Some(VisualState::Responding))
            .await;

        let position = match tokio::time::timeout(
            self.inner.location_timeout,
            services.location.current_position(),
        )
        .await
        {
            Ok(Ok(position)) => position,
            Ok(Err(e)) => return Err(TurnError::LocationUnavailable(e.to_string()).into()),
            Err(_) => {
                return Err(TurnError::LocationUnavailable(format!(
                    "timed out after {}s",
                    self.inner.location_timeout.as_secs()
                ))
                .into())
            }
        };

        let pending_id = format!("pending-{sequence_id}");
        {
            let mut session = self.inner.session.lock().await;
            if !session.turn.is_current(sequence_id) {
                return Err(Halt::Superseded);
            }
            session.turn.pending_message = Some(pending_id.clone());
        }
        services
            .sink
            .append_message(
                Role::Assistant,
                catalog::processing(language),
                Some(&pending_id),
            )
            .await;

        let ask = AskRequest {
            text: transcript.clone(),
            lat: position.latitude,
            lon: position.longitude,
            voice: selection.voice.to_string(),
            language,
        };
        let reply = services
            .reasoner
            .ask(&ask)
            .await
            .map_err(|e| TurnError::network(RemoteStage::Reasoning, e))?;
        self.ensure_current(sequence_id).await?;

        self.inner.session.lock().await.turn.pending_message = None;
        services
            .sink
            .append_message(Role::Assistant, &reply, Some(&pending_id))
            .await;

        let speak = SpeakRequest {
            text: reply.clone(),
            voice: selection.voice.to_string(),
            language,
        };
        let audio = services
            .synthesizer
            .synthesize(&speak)
            .await
            .map_err(|e| TurnError::network(RemoteStage::Synthesis, e))?;
        self.ensure_current(sequence_id).await?;

        let outcome = services
            .playback
            .play(&audio)
            .await
            .map_err(|e| TurnError::Unknown(format!("{e:#}")))?;
        if outcome == PlaybackOutcome::Blocked {
            warn!("Turn {}: {}", sequence_id, TurnError::PlaybackBlocked);
            services
                .sink
                .append_message(Role::System, catalog::playback_blocked(language), None)
                .await;
        }

        Ok(TurnSummary {
            sequence_id,
            transcript,
            language,
            voice: selection.voice,
            reply,
            played: outcome == PlaybackOutcome::Played,
        })
    }

    /// Report a failure and bring the controller back to `Idle`
    async fn fail_turn(&self, sequence_id: u64, err: &TurnError) {
        let services = &self.inner.services;

        let (device, pending) = {
            let mut session = self.inner.session.lock().await;
            if !session.turn.is_current(sequence_id) {
                return;
            }
            if session.turn.phase() != TurnPhase::ErrorRecovering {
                self.transition(&mut session, TurnEvent::Failed);
            }
            session.turn.is_starting = false;
            session.turn.stop_requested = false;
            session.turn.accumulated_audio = None;
            session.counters.turns_failed += 1;
            (session.device.take(), session.turn.pending_message.take())
        };

        error!("Turn {} failed: {}", sequence_id, err);

        if let Some(handle) = device {
            services.capture.close(handle).await;
        }

        // The error takes the place of the "processing" message
        match pending {
            Some(id) => {
                services
                    .sink
                    .append_message(Role::Error, &err.to_string(), Some(&id))
                    .await
            }
            None => services.sink.show_error(&err.to_string()).await,
        }
        services.sink.set_visual_state(None).await;

        let mut session = self.inner.session.lock().await;
        if session.turn.is_current(sequence_id) {
            self.transition(&mut session, TurnEvent::Recovered);
        }
    }

    /// Tear the session down: abandon the turn in flight, release the
    /// device, forget permission and interaction, then greet again
    pub async fn teardown(&self) {
        let services = &self.inner.services;

        let device = {
            let mut session = self.inner.session.lock().await;
            let sequence_id = session.turn.reset();
            self.inner.phase_tx.send_replace(session.turn.phase());
            session.config.reset();
            session.counters = TurnCounters::default();
            info!("Session torn down, turns before {} are discarded", sequence_id);
            session.device.take()
        };

        if let Some(handle) = device {
            services.capture.close(handle).await;
        }

        services.permission.reset().await;
        services.playback.reset_interaction();
        services.sink.set_visual_state(None).await;
        self.greet().await;
    }
}
