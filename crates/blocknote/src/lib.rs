//! # Blocknote
//!
//! A notebook organized as a tree of pages, each page an ordered list of typed
//! blocks (text, headings, lists, checkboxes, code), persisted to a local
//! key-value store.
//!
//! ## Layers
//!
//! - [`model`]: [`Page`] and [`Block`] and their partial updates.
//! - [`notes`]: [`NoteStore`], the in-memory source of truth. Every mutation is
//!   written through to a repository before it returns.
//! - [`store`]: the [`NoteRepository`] seam and its key-value implementation
//!   over memory or files.
//! - [`reorder`]: the drag-and-drop state machine that produces new block orders.
//! - [`assistant`]: the flow around an external text generator.
//! - [`config`] and [`logging`]: host setup.
//!
//! ## Example
//!
//! ```
//! use blocknote::{BlockType, InMemoryRepository, NoteStore};
//!
//! let mut store = NoteStore::open(InMemoryRepository::new()).unwrap();
//! let page = store.create_page("Getting Started", None).unwrap();
//! let first = store.create_block(page.id, BlockType::Heading1, None).unwrap();
//! let second = store.create_block(page.id, BlockType::Paragraph, None).unwrap();
//!
//! store.reorder_blocks(page.id, &[second.id, first.id]).unwrap();
//! let order: Vec<_> = store.page_blocks(page.id).iter().map(|b| b.id).collect();
//! assert_eq!(order, vec![second.id, first.id]);
//! ```

pub mod assistant;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod notes;
pub mod reorder;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use assistant::{AssistError, Assistant, TextGenerator};
pub use config::{open_store, NotesConfig};
pub use error::{NoteError, Result};
pub use logging::{init_logging, logging_status};
pub use model::{
    Block, BlockContent, BlockId, BlockPatch, BlockType, Page, PageId, PagePatch, UNTITLED,
};
pub use notes::NoteStore;
pub use reorder::{move_item, DragSession, DragState, DropEdge};
pub use store::memory::InMemoryRepository;
pub use store::{DoctorReport, FileRepository, NoteRepository, StorageKeys};
