use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::TurnPhase;
use crate::language::Language;

/// Snapshot of the kiosk session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub phase: TurnPhase,

    /// Whether a start is still acquiring permission or the device
    pub is_starting: bool,

    pub turn_sequence_id: u64,

    pub turns_completed: u64,

    pub turns_failed: u64,

    pub current_language: Language,

    pub current_voice: String,

    /// Time since the device started, while recording
    pub recording_elapsed_ms: Option<u64>,

    /// Text of the last successful transcription
    pub last_transcript: Option<String>,

    /// When the session (or its last reset) started
    pub started_at: DateTime<Utc>,
}

/// Counters kept across turns
#[derive(Debug, Clone)]
pub(crate) struct TurnCounters {
    pub turns_completed: u64,
    pub turns_failed: u64,
    pub last_transcript: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl Default for TurnCounters {
    fn default() -> Self {
        Self {
            turns_completed: 0,
            turns_failed: 0,
            last_transcript: None,
            started_at: Utc::now(),
        }
    }
}
