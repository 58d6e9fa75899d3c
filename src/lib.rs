pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod reporter;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use config::AppConfig;
use reporter::ErrorReporter;
use storage::Storage;

/// Shared application state passed to every route handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub storage: Arc<Storage>,
    /// Best-effort error reporter (fire-and-forget, production only).
    pub reporter: Arc<ErrorReporter>,
    pub started_at: std::time::Instant,
}
