use std::fmt;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::audio::AudioBuffer;

/// Position of the controller in its turn state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    AcquiringPermission,
    Recording,
    Stopping,
    Processing,
    ErrorRecovering,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnPhase::Idle => "idle",
            TurnPhase::AcquiringPermission => "acquiring_permission",
            TurnPhase::Recording => "recording",
            TurnPhase::Stopping => "stopping",
            TurnPhase::Processing => "processing",
            TurnPhase::ErrorRecovering => "error_recovering",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    /// `initialized` is true once microphone access has been granted
    StartRequested { initialized: bool },
    PermissionGranted,
    PermissionDenied,
    StopRequested,
    BufferReady,
    PipelineFinished,
    Failed,
    Recovered,
    Teardown,
}

impl TurnPhase {
    /// Transition table; `None` means the event does not apply in this phase
    pub fn next(self, event: TurnEvent) -> Option<TurnPhase> {
        use TurnEvent::*;
        use TurnPhase::*;

        match (self, event) {
            (_, Teardown) => Some(Idle),
            (Idle, StartRequested { initialized: false }) => Some(AcquiringPermission),
            (Idle, StartRequested { initialized: true }) => Some(Recording),
            (AcquiringPermission, PermissionGranted) => Some(Recording),
            (AcquiringPermission, PermissionDenied) => Some(ErrorRecovering),
            (Recording, StopRequested) => Some(Stopping),
            (Stopping, BufferReady) => Some(Processing),
            (Processing, PipelineFinished) => Some(Idle),
            (AcquiringPermission | Recording | Stopping | Processing, Failed) => {
                Some(ErrorRecovering)
            }
            (ErrorRecovering, Recovered) => Some(Idle),
            _ => None,
        }
    }
}

/// Mutable state of the current turn
///
/// Only the session controller holds one of these, behind its session lock.
#[derive(Debug)]
pub struct TurnState {
    phase: TurnPhase,
    /// Set while permission and device start are in flight
    pub is_starting: bool,
    /// A stop arrived before the start settled
    pub stop_requested: bool,
    turn_sequence_id: u64,
    pub accumulated_audio: Option<AudioBuffer>,
    pub recording_started_at: Option<Instant>,
    /// Id of the "processing" message shown while the reply is pending
    pub pending_message: Option<String>,
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnState {
    pub fn new() -> Self {
        Self {
            phase: TurnPhase::Idle,
            is_starting: false,
            stop_requested: false,
            turn_sequence_id: 0,
            accumulated_audio: None,
            recording_started_at: None,
            pending_message: None,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn turn_sequence_id(&self) -> u64 {
        self.turn_sequence_id
    }

    /// Apply an event, returning the new phase when it applied
    pub fn apply(&mut self, event: TurnEvent) -> Option<TurnPhase> {
        match self.phase.next(event) {
            Some(next) => {
                debug!("Turn {}: {} -> {} on {:?}", self.turn_sequence_id, self.phase, next, event);
                self.phase = next;
                Some(next)
            }
            None => {
                warn!(
                    "Turn {}: ignoring {:?} while {}",
                    self.turn_sequence_id, event, self.phase
                );
                None
            }
        }
    }

    /// Open a new turn: bump the sequence id and clear the previous recording
    pub fn begin_turn(&mut self) -> u64 {
        self.turn_sequence_id = self.turn_sequence_id.wrapping_add(1);
        self.accumulated_audio = None;
        self.recording_started_at = None;
        self.stop_requested = false;
        self.pending_message = None;
        self.turn_sequence_id
    }

    pub fn is_current(&self, sequence_id: u64) -> bool {
        self.turn_sequence_id == sequence_id
    }

    /// Abandon whatever is in flight and return to `Idle`
    pub fn reset(&mut self) -> u64 {
        self.turn_sequence_id = self.turn_sequence_id.wrapping_add(1);
        self.apply(TurnEvent::Teardown);
        self.is_starting = false;
        self.stop_requested = false;
        self.accumulated_audio = None;
        self.recording_started_at = None;
        self.pending_message = None;
        self.turn_sequence_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TurnEvent::*;
    use TurnPhase::*;

    const PHASES: [TurnPhase; 6] = [
        Idle,
        AcquiringPermission,
        Recording,
        Stopping,
        Processing,
        ErrorRecovering,
    ];

    const EVENTS: [TurnEvent; 10] = [
        StartRequested { initialized: false },
        StartRequested { initialized: true },
        PermissionGranted,
        PermissionDenied,
        StopRequested,
        BufferReady,
        PipelineFinished,
        Failed,
        Recovered,
        Teardown,
    ];

    #[test]
    fn happy_path_returns_to_idle() {
        let mut state = TurnState::new();
        assert_eq!(state.apply(StartRequested { initialized: false }), Some(AcquiringPermission));
        assert_eq!(state.apply(PermissionGranted), Some(Recording));
        assert_eq!(state.apply(StopRequested), Some(Stopping));
        assert_eq!(state.apply(BufferReady), Some(Processing));
        assert_eq!(state.apply(PipelineFinished), Some(Idle));
    }

    #[test]
    fn initialized_start_skips_permission() {
        assert_eq!(Idle.next(StartRequested { initialized: true }), Some(Recording));
    }

    #[test]
    fn repeated_requests_are_ignored() {
        for phase in [AcquiringPermission, Recording] {
            assert_eq!(phase.next(StartRequested { initialized: true }), None);
            assert_eq!(phase.next(StartRequested { initialized: false }), None);
        }
        for phase in [Idle, AcquiringPermission, Stopping, Processing, ErrorRecovering] {
            assert_eq!(phase.next(StopRequested), None);
        }
    }

    #[test]
    fn ignored_event_leaves_phase_untouched() {
        let mut state = TurnState::new();
        state.apply(StartRequested { initialized: true });
        assert_eq!(state.apply(StartRequested { initialized: true }), None);
        assert_eq!(state.phase(), Recording);
    }

    #[test]
    fn every_busy_phase_can_fail_and_recover() {
        for phase in [AcquiringPermission, Recording, Stopping, Processing] {
            let recovering = phase.next(Failed);
            assert_eq!(recovering, Some(ErrorRecovering));
            assert_eq!(ErrorRecovering.next(Recovered), Some(Idle));
        }
        assert_eq!(Idle.next(Failed), None);
    }

    #[test]
    fn transitions_are_total_and_never_stick() {
        // Every phase reaches Idle within two events
        for phase in PHASES {
            for event in EVENTS {
                let _ = phase.next(event);
            }
            let settled = match phase.next(Failed) {
                Some(p) => p.next(Recovered).unwrap_or(p),
                None => phase,
            };
            assert!(settled == Idle || phase == ErrorRecovering);
            assert_eq!(phase.next(Teardown), Some(Idle));
        }
    }

    #[test]
    fn sequence_ids_only_move_forward() {
        let mut state = TurnState::new();
        let first = state.begin_turn();
        assert!(state.is_current(first));
        let after_reset = state.reset();
        assert!(after_reset > first);
        assert!(!state.is_current(first));
        assert_eq!(state.phase(), Idle);
    }
}
