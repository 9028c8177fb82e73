//! HTTP API for the kiosk front end
//!
//! This module provides the REST API the sphere widget drives:
//! - POST /sphere/press - Start recording a turn
//! - POST /sphere/release - Stop recording and process the turn
//! - POST /interaction - Unlock reply playback
//! - POST /session/reset - Tear down and greet again
//! - GET /status - Session stats
//! - GET /transcript - Message log and sphere state
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
