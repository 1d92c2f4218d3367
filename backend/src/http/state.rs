//! Application state for the HTTP server.

use std::sync::Arc;

use crate::services::SessionPlanner;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Planning pipeline; holds no mutable state so one instance serves all requests
    pub planner: Arc<SessionPlanner>,
}

impl AppState {
    /// Create a new application state with the given planner.
    pub fn new(planner: Arc<SessionPlanner>) -> Self {
        Self { planner }
    }
}
