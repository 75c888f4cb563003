//! # Storage Layer
//!
//! This module defines the persistence abstraction for blocknote. The
//! [`NoteRepository`] trait is what the note store writes through to; it speaks
//! in pages, blocks, the current-page pointer and the generative-text credential.
//!
//! ## Write-Through Model
//!
//! The in-memory [`NoteStore`](crate::notes::NoteStore) is the source of truth for
//! a session. The repository is only read at startup. After that it mirrors every
//! mutation, one call per mutation, and never changes data on its own (the
//! exception is [`NoteRepository::doctor`], which is only run on request).
//!
//! ## Layers
//!
//! 1. [`backend::StorageBackend`]: raw string values under string keys.
//!    - [`mem_backend::MemBackend`]: in memory, for tests and ephemeral sessions.
//!    - [`fs_backend::FsBackend`]: one file per key, atomic replace.
//! 2. [`kv::KvRepository`]: serializes each collection as one JSON array under
//!    its key. A key-value store cannot update part of a value, so saving one
//!    page rewrites the `pages` value.
//!
//! ## Storage Layout
//!
//! | Key              | Value                      |
//! |------------------|----------------------------|
//! | `pages`          | JSON array of pages        |
//! | `blocks`         | JSON array of blocks       |
//! | `current_page`   | id of the last active page |
//! | `gemini_api_key` | credential, plain text     |
//!
//! Keys can carry a prefix (see [`StorageKeys::with_prefix`]).
//!
//! ## Save Semantics
//!
//! Saves are upserts. An unknown entity is appended as given. A known entity is
//! replaced and its `updated_at` is set to the save time.
//!
//! ## Consistency
//!
//! There are no transactions. Deleting a page writes `pages` and then `blocks`;
//! a failure in between leaves blocks without a page. `doctor` finds and purges
//! those.

use crate::error::Result;
use crate::model::{Block, BlockId, Page, PageId};

pub mod backend;
pub mod fs_backend;
pub mod kv;
pub mod mem_backend;
pub mod memory;

pub const PAGES_KEY: &str = "pages";
pub const BLOCKS_KEY: &str = "blocks";
pub const CURRENT_PAGE_KEY: &str = "current_page";
pub const API_KEY_KEY: &str = "gemini_api_key";

/// Names of the four values the repository keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub pages: String,
    pub blocks: String,
    pub current_page: String,
    pub api_key: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix("")
    }
}

impl StorageKeys {
    /// `with_prefix("notion_")` yields `notion_pages`, `notion_blocks`, ...
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            pages: format!("{}{}", prefix, PAGES_KEY),
            blocks: format!("{}{}", prefix, BLOCKS_KEY),
            current_page: format!("{}{}", prefix, CURRENT_PAGE_KEY),
            api_key: format!("{}{}", prefix, API_KEY_KEY),
        }
    }
}

/// Report from the `doctor` operation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DoctorReport {
    /// Blocks whose page no longer exists. These are removed.
    pub removed_orphan_blocks: usize,
    /// Pages whose parent no longer exists. These are reported, not changed.
    pub dangling_parent_pages: usize,
}

/// Abstract interface for note persistence.
///
/// Implementations must mirror writes faithfully and must not reorder,
/// deduplicate or validate entities beyond what their storage requires.
pub trait NoteRepository {
    /// All stored pages, in storage order.
    fn load_pages(&self) -> Result<Vec<Page>>;

    /// Save a page (create or update)
    fn save_page(&mut self, page: &Page) -> Result<()>;

    /// Remove pages by id. Unknown ids are ignored.
    fn delete_pages(&mut self, ids: &[PageId]) -> Result<()>;

    /// All stored blocks, in storage order.
    fn load_blocks(&self) -> Result<Vec<Block>>;

    /// Save a block (create or update)
    fn save_block(&mut self, block: &Block) -> Result<()>;

    /// Save several blocks with one write where the storage allows it.
    fn save_blocks(&mut self, blocks: &[Block]) -> Result<()>;

    /// Remove blocks by id. Unknown ids are ignored.
    fn delete_blocks(&mut self, ids: &[BlockId]) -> Result<()>;

    fn current_page_id(&self) -> Result<Option<PageId>>;

    /// `None` forgets the pointer.
    fn set_current_page_id(&mut self, id: Option<PageId>) -> Result<()>;

    fn api_key(&self) -> Result<Option<String>>;

    fn set_api_key(&mut self, key: &str) -> Result<()>;

    /// Verify and fix consistency issues
    fn doctor(&mut self) -> Result<DoctorReport>;
}

/// Repository persisted to files, the production setup.
pub type FileRepository = kv::KvRepository<fs_backend::FsBackend>;
