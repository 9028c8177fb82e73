use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use super::{build_client, check_status, AudioUpload, Transcriber, Transcription, TranscriptionResponse};
use crate::error::RemoteError;
use crate::language::DEFAULT_LANGUAGE_CODE;

/// Multipart upload client for the transcription endpoint
pub struct HttpTranscriber {
    client: reqwest::Client,
    url: String,
}

impl HttpTranscriber {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio: AudioUpload) -> Result<Transcription, RemoteError> {
        info!(
            "Uploading {} bytes of {} for transcription",
            audio.bytes.len(),
            audio.media_type
        );

        let part = Part::bytes(audio.bytes.to_vec())
            .file_name(audio.file_name)
            .mime_str(&audio.media_type)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let form = Form::new().part("audio", part);

        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: TranscriptionResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(RemoteError::Service(error));
        }

        let language_code = body
            .language_code
            .filter(|code| !code.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string())
            .to_ascii_uppercase();

        debug!("Transcribed {:?} ({})", body.text, language_code);

        Ok(Transcription {
            text: body.text,
            language_code,
        })
    }
}
