//! Presentation sink: the visible message log and the sphere's visual state

pub mod catalog;
pub mod log;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use log::{ChatMessage, TranscriptLog, TranscriptSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Error,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Error => "error",
        };
        f.write_str(name)
    }
}

/// Sphere visual state; `None` is the resting sphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualState {
    Recording,
    Releasing,
    Responding,
}

/// Consumer of turn milestones
#[async_trait::async_trait]
pub trait PresentationSink: Send + Sync {
    /// Append a message; an `id` already in the log replaces that message
    async fn append_message(&self, role: Role, text: &str, id: Option<&str>);

    async fn set_visual_state(&self, state: Option<VisualState>);

    async fn show_error(&self, message: &str);
}
