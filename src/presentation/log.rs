use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::{PresentationSink, Role, VisualState};

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptSnapshot {
    pub visual_state: Option<VisualState>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Default)]
struct LogState {
    messages: Vec<ChatMessage>,
    visual_state: Option<VisualState>,
}

/// In-memory message log
#[derive(Default)]
pub struct TranscriptLog {
    state: RwLock<LogState>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.read().await.messages.clone()
    }

    pub async fn visual_state(&self) -> Option<VisualState> {
        self.state.read().await.visual_state
    }

    pub async fn snapshot(&self) -> TranscriptSnapshot {
        let state = self.state.read().await;
        TranscriptSnapshot {
            visual_state: state.visual_state,
            messages: state.messages.clone(),
        }
    }

    /// Drop every message (session reset)
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.messages.clear();
        state.visual_state = None;
    }
}

#[async_trait::async_trait]
impl PresentationSink for TranscriptLog {
    async fn append_message(&self, role: Role, text: &str, id: Option<&str>) {
        info!("[{}] {}", role, text);

        let message = ChatMessage {
            id: id
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            role,
            text: text.to_string(),
            timestamp: Utc::now(),
        };

        let mut state = self.state.write().await;
        match state.messages.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => *existing = message,
            None => state.messages.push(message),
        }
    }

    async fn set_visual_state(&self, visual_state: Option<VisualState>) {
        info!("Sphere state: {:?}", visual_state);
        self.state.write().await.visual_state = visual_state;
    }

    async fn show_error(&self, message: &str) {
        error!("{}", message);
        self.append_message(Role::Error, message, None).await;
    }
}
