//! # Configuration
//!
//! Blocknote configuration is managed by [`confique`], which handles layered
//! loading from a TOML file and environment variables.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `BLOCKNOTE_DATA_DIR`, `BLOCKNOTE_KEY_PREFIX`,
//!    `BLOCKNOTE_LOG_LEVEL`.
//! 2. **Config file**: the path passed to [`NotesConfig::load`], if it exists.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `data_dir` | OS data dir | Directory holding the stored values |
//! | `key_prefix` | `""` | Prepended to every storage key |
//! | `log_level` | `info` | Level for [`crate::logging::init_logging`] |

use crate::error::{NoteError, Result};
use crate::notes::NoteStore;
use crate::store::fs_backend::FsBackend;
use crate::store::kv::KvRepository;
use crate::store::{FileRepository, StorageKeys};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for blocknote, stored in `blocknote.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NotesConfig {
    /// Directory for stored values. Defaults to the OS data directory.
    #[config(env = "BLOCKNOTE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Prefix for storage keys (e.g. "notion_" gives "notion_pages").
    #[config(env = "BLOCKNOTE_KEY_PREFIX", default = "")]
    pub key_prefix: String,

    #[config(env = "BLOCKNOTE_LOG_LEVEL", default = "info")]
    pub log_level: String,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            key_prefix: String::new(),
            log_level: "info".to_string(),
        }
    }
}

impl NotesConfig {
    /// Loads environment overrides on top of `file` (if given and present).
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(file) = file {
            builder = builder.file(file);
        }
        Ok(builder.load()?)
    }

    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        ProjectDirs::from("", "", "blocknote")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| NoteError::Config("No home directory to store notes in".to_string()))
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys::with_prefix(&self.key_prefix)
    }
}

/// Opens the file-backed store described by `config`.
pub fn open_store(config: &NotesConfig) -> Result<NoteStore<FileRepository>> {
    let backend = FsBackend::new(config.resolved_data_dir()?);
    NoteStore::open(KvRepository::with_keys(backend, config.storage_keys()))
}
