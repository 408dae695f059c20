pub mod config;
pub mod rest;
pub mod store;

use std::sync::Arc;

use config::Config;
use store::TaskStore;

/// Shared application state passed to every request handler.
///
/// The store's connection pool lives here as an injected dependency: opened
/// once at startup, drained at shutdown, and replaceable with an isolated
/// instance in tests.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<TaskStore>,
    pub started_at: std::time::Instant,
}
