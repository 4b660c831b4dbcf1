//! Application state for the API server

use crate::config::Config;
use crate::service::TaskManager;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// Task backend
    pub manager: Arc<dyn TaskManager>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(manager: Arc<dyn TaskManager>, config: Arc<Config>) -> Self {
        Self { manager, config }
    }
}
