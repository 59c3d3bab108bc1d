use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::task::TaskStore;

/// Settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// directory the `file` request parameters are resolved against
    pub resource_dir: PathBuf,
    pub task_ttl: Duration,
    pub cleanup_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            resource_dir: PathBuf::from("test/resource"),
            task_ttl: TaskStore::DEFAULT_TTL,
            cleanup_interval: Duration::from_secs(5 * 60),
        }
    }
}
