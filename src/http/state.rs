use crate::presentation::TranscriptLog;
use crate::session::SessionController;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The kiosk's single session
    pub controller: SessionController,

    /// Message log the controller presents to
    pub log: Arc<TranscriptLog>,
}

impl AppState {
    pub fn new(controller: SessionController, log: Arc<TranscriptLog>) -> Self {
        Self { controller, log }
    }
}
