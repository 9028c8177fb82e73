use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Response from the transcription service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    #[serde(default)]
    pub text: String,
    /// Detected language, e.g. `PT-BR`; older deployments call it `language`
    #[serde(default, alias = "language")]
    pub language_code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Request body for the reasoning ("ask-AI") service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub text: String,
    pub lat: f64,
    pub lon: f64,
    pub voice: String,
    pub language: Language,
}

/// Response from the reasoning service
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Request body for the speech synthesis service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    pub voice: String,
    pub language: Language,
}
