//! Error types for the kiosk session

use std::fmt;

use thiserror::Error;

/// Remote stage that produced a network failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStage {
    Transcription,
    Reasoning,
    Synthesis,
}

impl fmt::Display for RemoteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteStage::Transcription => "transcription",
            RemoteStage::Reasoning => "reasoning",
            RemoteStage::Synthesis => "speech synthesis",
        };
        f.write_str(name)
    }
}

/// Outcome of a failed microphone access check
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Microphone access denied. Enable the microphone in the system settings.")]
    Denied,

    #[error("No microphone found. Connect a microphone and try again.")]
    NoDevice,

    #[error("Could not access the microphone: {0}")]
    Unknown(String),
}

/// Errors raised by the capture device adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("No capture device available: {0}")]
    NoDevice(String),

    #[error("No supported audio format found")]
    NoSupportedFormat,

    #[error("Capture device error: {0}")]
    Device(String),
}

/// Errors returned by the remote service clients
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Service(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else if err.is_decode() {
            RemoteError::InvalidResponse(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

/// Everything that can end a turn early
///
/// Every variant is caught at the session controller boundary and shown to the
/// user; none of them is fatal for the session.
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("Microphone permission denied. Allow microphone access and try again.")]
    PermissionDenied,

    #[error("No microphone found. Connect a microphone and try again.")]
    NoDevice,

    #[error("No supported audio format found")]
    NoSupportedFormat,

    #[error("No audio captured, try again")]
    EmptyAudio,

    #[error("No speech was transcribed, try speaking more clearly")]
    EmptyTranscript,

    #[error("Error during {stage}: {source}")]
    NetworkFailure {
        stage: RemoteStage,
        #[source]
        source: RemoteError,
    },

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Playback is waiting for a user interaction")]
    PlaybackBlocked,

    #[error("{0}")]
    Unknown(String),
}

impl TurnError {
    pub fn network(stage: RemoteStage, source: RemoteError) -> Self {
        TurnError::NetworkFailure { stage, source }
    }
}

impl From<PermissionError> for TurnError {
    fn from(err: PermissionError) -> Self {
        match err {
            PermissionError::Denied => TurnError::PermissionDenied,
            PermissionError::NoDevice => TurnError::NoDevice,
            PermissionError::Unknown(msg) => TurnError::Unknown(msg),
        }
    }
}

impl From<CaptureError> for TurnError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::NoDevice(_) => TurnError::NoDevice,
            CaptureError::NoSupportedFormat => TurnError::NoSupportedFormat,
            CaptureError::Device(msg) => TurnError::Unknown(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_errors_map_onto_turn_taxonomy() {
        assert!(matches!(
            TurnError::from(PermissionError::Denied),
            TurnError::PermissionDenied
        ));
        assert!(matches!(
            TurnError::from(PermissionError::NoDevice),
            TurnError::NoDevice
        ));
        match TurnError::from(PermissionError::Unknown("busy".into())) {
            TurnError::Unknown(msg) => assert_eq!(msg, "busy"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn network_failure_names_the_stage() {
        let err = TurnError::network(
            RemoteStage::Reasoning,
            RemoteError::Status {
                status: 502,
                body: "bad gateway".into(),
            },
        );
        assert_eq!(err.to_string(), "Error during reasoning: HTTP 502: bad gateway");
    }
}
