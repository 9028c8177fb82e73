use std::time::Duration;

use tracing::{debug, info};

use super::{build_client, check_status, AskRequest, AskResponse, Reasoner};
use crate::error::RemoteError;

/// JSON client for the ask-AI endpoint
pub struct HttpReasoner {
    client: reqwest::Client,
    url: String,
}

impl HttpReasoner {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl Reasoner for HttpReasoner {
    async fn ask(&self, request: &AskRequest) -> Result<String, RemoteError> {
        info!(
            "Asking for a reply ({} chars, voice {})",
            request.text.len(),
            request.voice
        );

        let response = self.client.post(&self.url).json(request).send().await?;
        let response = check_status(response).await?;
        let body: AskResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(RemoteError::Service(error));
        }

        match body.response {
            Some(reply) if !reply.trim().is_empty() => {
                debug!("Reply: {:?}", reply);
                Ok(reply)
            }
            _ => Err(RemoteError::InvalidResponse("empty reply".to_string())),
        }
    }
}
