//! File path utilities for locally stored data.
//!
//! Everything the browser writes to disk is located through [`DataPaths`]:
//! the favorites database and the rolling log files.

use crate::config::Config;
use std::path::PathBuf;

/// File path manager for data files
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
    favorites_db: PathBuf,
    logs_dir: PathBuf,
}

impl DataPaths {
    /// Resolve every location from the configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.data_dir(),
            favorites_db: config.database_path(),
            logs_dir: config.log_dir(),
        }
    }

    /// Get the favorites database path
    pub fn favorites_db(&self) -> PathBuf {
        self.favorites_db.clone()
    }

    /// Get logs directory
    pub fn logs_dir(&self) -> PathBuf {
        self.logs_dir.clone()
    }

    /// Create the data root, the log directory and the database's parent
    pub fn create_dirs(&self) -> std::io::Result<()> {
        let db_dir = self.favorites_db.parent().map(PathBuf::from);
        for dir in [Some(self.root.clone()), Some(self.logs_dir.clone()), db_dir]
            .into_iter()
            .flatten()
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            std::fs::create_dir_all(&dir)?;
        }

        Ok(())
    }
}
