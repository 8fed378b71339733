// Configuration - command-line flags with environment fallbacks
//
// Both binaries flatten StorageArgs so the console and the API server always
// agree on which backend and which file they use.

use crate::storage::{DbStorage, FileStorage, Storage};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// One JSON document on disk
    File,
    /// SQLite database
    Db,
}

#[derive(Debug, Clone, Args)]
pub struct StorageArgs {
    /// Storage backend
    #[arg(long = "storage", env = "HBNB_TYPE_STORAGE", value_enum, default_value = "file")]
    pub kind: StorageKind,

    /// JSON document used by the file backend
    #[arg(long, env = "HBNB_FILE_PATH", default_value = "file.json")]
    pub file_path: PathBuf,

    /// Database file used by the db backend
    #[arg(long, env = "HBNB_DB_PATH", default_value = "hbnb.db")]
    pub db_path: PathBuf,
}

impl StorageArgs {
    /// Open the selected backend. Unreadable persisted state is an error.
    pub fn open(&self) -> Result<Box<dyn Storage>> {
        let storage: Box<dyn Storage> = match self.kind {
            StorageKind::File => Box::new(
                FileStorage::open(&self.file_path)
                    .with_context(|| format!("Failed to load {}", self.file_path.display()))?,
            ),
            StorageKind::Db => Box::new(
                DbStorage::open(&self.db_path)
                    .with_context(|| format!("Failed to open database {}", self.db_path.display()))?,
            ),
        };

        Ok(storage)
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "HBNB_API_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "HBNB_API_PORT", default_value_t = 5000)]
    pub port: u16,
}

impl ServerArgs {
    /// Host and port as configured. Hostnames such as "localhost" are
    /// resolved when the listener binds.
    pub fn bind_target(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    pub fn display_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
