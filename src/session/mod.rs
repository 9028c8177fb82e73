//! Push-to-talk session management
//!
//! This module provides the `SessionController` that owns the single turn
//! state and sequences each turn:
//! - Permission check on the first turn
//! - Recording through the capture device adapter
//! - Transcription, reasoning, synthesis and playback
//! - Recovery to `Idle` after every failure

mod config;
mod controller;
mod state;
mod stats;

pub use config::SessionConfig;
pub use controller::{
    ControllerConfig, SessionController, SessionServices, StartOutcome, TurnOutcome, TurnSummary,
};
pub use state::{TurnEvent, TurnPhase, TurnState};
pub use stats::SessionStats;
