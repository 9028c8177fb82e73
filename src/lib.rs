pub mod app;
pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod language;
pub mod location;
pub mod permission;
pub mod playback;
pub mod presentation;
pub mod remote;
pub mod session;

pub use app::Kiosk;
pub use audio::{
    AudioBackendConfig, AudioBackendFactory, AudioBuffer, AudioEncoding, AudioFile, AudioFrame,
    AudioSource, BackendProvider, CaptureBackend, CaptureEvent, FileBackend,
};
pub use capture::{CaptureConfig, CaptureDevice, DeviceHandle};
pub use config::Config;
pub use error::{CaptureError, PermissionError, RemoteError, RemoteStage, TurnError};
pub use http::{create_router, AppState};
pub use language::{resolve_voice, Language, VoiceSelection};
pub use location::{Coordinates, LocationProvider, StaticLocation};
pub use permission::{MicrophonePlatform, PermissionGate, PermissionStatus, PlatformError};
pub use playback::{AudioOutput, PlaybackAdapter, PlaybackOutcome, SpoolOutput};
pub use presentation::{PresentationSink, Role, TranscriptLog, VisualState};
pub use remote::{Reasoner, Synthesizer, Transcriber};
pub use session::{
    ControllerConfig, SessionConfig, SessionController, SessionServices, SessionStats,
    StartOutcome, TurnOutcome, TurnPhase,
};
