//! Clients for the remote transcription, reasoning and speech services
//!
//! Each client is stateless apart from its connection pool. Every request is
//! bounded by the configured timeout, and failures come back as
//! [`RemoteError`] for the controller to attribute to a pipeline stage.

pub mod messages;
pub mod reasoning;
pub mod synthesis;
pub mod transcription;

use std::time::Duration;

use bytes::Bytes;

use crate::error::RemoteError;

pub use messages::{AskRequest, AskResponse, SpeakRequest, TranscriptionResponse};
pub use reasoning::HttpReasoner;
pub use synthesis::HttpSynthesizer;
pub use transcription::HttpTranscriber;

/// Encoded recording ready for upload
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Bytes,
    pub media_type: String,
    pub file_name: String,
}

/// Transcribed text plus the detected language code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcription {
    pub text: String,
    pub language_code: String,
}

/// Synthesized reply audio
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub bytes: Bytes,
    pub media_type: String,
}

#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: AudioUpload) -> Result<Transcription, RemoteError>;
}

#[async_trait::async_trait]
pub trait Reasoner: Send + Sync {
    async fn ask(&self, request: &AskRequest) -> Result<String, RemoteError>;
}

#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, request: &SpeakRequest) -> Result<SynthesizedAudio, RemoteError>;
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, RemoteError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Turn a non-2xx response into [`RemoteError::Status`]
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}
