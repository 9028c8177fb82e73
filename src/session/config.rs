use serde::Serialize;
use tracing::info;

use crate::language::{Language, VoiceSelection};

/// Language and voice the next turn replies with
#[derive(Debug, Clone, Serialize)]
pub struct SessionConfig {
    /// Language restored on reset
    pub default_language: Language,

    pub current_language: Language,

    /// Derived from the last detected language
    pub current_voice: &'static str,
}

impl SessionConfig {
    pub fn new(default_language: Language) -> Self {
        Self {
            default_language,
            current_language: default_language,
            current_voice: default_language.voice(),
        }
    }

    pub fn apply(&mut self, selection: VoiceSelection) {
        if selection.language != self.current_language {
            info!(
                "Session language {} -> {} ({})",
                self.current_language, selection.language, selection.voice
            );
        }
        self.current_language = selection.language;
        self.current_voice = selection.voice;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.default_language);
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Language::default())
    }
}
