use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::{DumpError, Result};
use crate::task::TaskStore;
use crate::utils::parser_registry::ParserRegistry;

/// State shared by every handler.
pub struct AppState {
    pub parser_registry: Arc<ParserRegistry>,
    pub resource_dir: PathBuf,
    pub task_store: Arc<TaskStore>,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            parser_registry: Arc::new(ParserRegistry::new()),
            resource_dir: config.resource_dir.clone(),
            task_store: Arc::new(TaskStore::with_ttl(config.task_ttl)),
        }
    }

    /// Maps a request's file name into the resource directory.
    /// Only bare file names are accepted.
    pub fn resolve(&self, file: &str) -> Result<PathBuf> {
        let name = Path::new(file);
        if file.is_empty() || name.file_name() != Some(name.as_os_str()) {
            return Err(DumpError::InvalidPath {
                file: file.to_string(),
            });
        }
        Ok(self.resource_dir.join(name))
    }
}
