//! Supported languages and the language → synthesis voice map

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Code assumed when the transcription service reports no language
pub const DEFAULT_LANGUAGE_CODE: &str = "PT-BR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Pt,
    En,
    Es,
    Fr,
    It,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Pt,
        Language::En,
        Language::Es,
        Language::Fr,
        Language::It,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::Pt => "pt",
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::It => "it",
        }
    }

    /// Synthesis voice used for replies in this language
    pub fn voice(self) -> &'static str {
        match self {
            Language::Pt => "pt-BR-YaraNeural",
            Language::En => "en-US-JennyNeural",
            // The service has a single Spanish voice for every region
            Language::Es => "es-AR-DaniaNeural",
            Language::Fr => "fr-FR-DeniseNeural",
            Language::It => "it-IT-IsabellaNeural",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pt" => Ok(Language::Pt),
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "fr" => Ok(Language::Fr),
            "it" => Ok(Language::It),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Language and voice a turn replies with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoiceSelection {
    pub language: Language,
    pub voice: &'static str,
}

impl From<Language> for VoiceSelection {
    fn from(language: Language) -> Self {
        Self {
            language,
            voice: language.voice(),
        }
    }
}

/// Resolve a detected language code (`ES-ES`, `en-us`, `fr`) to a voice
///
/// Total: unrecognized or empty codes resolve to Portuguese.
pub fn resolve_voice(code: &str) -> VoiceSelection {
    let upper = code.trim().to_ascii_uppercase();
    let primary = upper.split(['-', '_']).next().unwrap_or_default();

    let language = match primary {
        "PT" => Language::Pt,
        "EN" => Language::En,
        "ES" => Language::Es,
        "FR" => Language::Fr,
        "IT" => Language::It,
        _ => {
            debug!("Unrecognized language code {:?}, using default voice", code);
            Language::Pt
        }
    };

    VoiceSelection::from(language)
}
