use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::info;

use super::{build_client, check_status, SpeakRequest, SynthesizedAudio, Synthesizer};
use crate::error::RemoteError;

const DEFAULT_MEDIA_TYPE: &str = "audio/mpeg";

/// JSON client for the speech synthesis endpoint
pub struct HttpSynthesizer {
    client: reqwest::Client,
    url: String,
}

impl HttpSynthesizer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, request: &SpeakRequest) -> Result<SynthesizedAudio, RemoteError> {
        let response = self.client.post(&self.url).json(request).send().await?;
        let response = check_status(response).await?;

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_MEDIA_TYPE)
            .to_string();
        let bytes = response.bytes().await?;

        if bytes.is_empty() {
            return Err(RemoteError::InvalidResponse("empty audio".to_string()));
        }

        info!(
            "Synthesized {} bytes of {} with voice {}",
            bytes.len(),
            media_type,
            request.voice
        );

        Ok(SynthesizedAudio { bytes, media_type })
    }
}
