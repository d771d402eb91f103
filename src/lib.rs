pub mod auth;
pub mod config;
pub mod export;
pub mod import;
pub mod rest;
pub mod storage;
pub mod tasks;

use std::sync::Arc;

use config::ServerConfig;
use storage::Storage;
use tasks::TaskStore;

/// Shared application state passed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<Storage>,
    /// Owner-scoped task persistence (shares the storage SQLite pool).
    pub task_store: Arc<TaskStore>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: Arc<ServerConfig>, storage: Arc<Storage>) -> Self {
        let task_store = Arc::new(TaskStore::new(storage.pool()));
        Self {
            config,
            storage,
            task_store,
            started_at: std::time::Instant::now(),
        }
    }
}
