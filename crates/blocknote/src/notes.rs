//! # Note Store
//!
//! [`NoteStore`] is the in-memory registry of every page and block for the
//! current session. All mutations go through it.
//!
//! ## Write-Through
//!
//! Each mutation first changes memory, then forwards the changed entity to the
//! [`NoteRepository`]. If the repository write fails the error is returned to
//! the caller and memory is *not* rolled back: memory stays the truth for the
//! rest of the session and storage may lag behind it.
//!
//! ## Missing Ids
//!
//! Updating or deleting an id that does not exist is not an error. The call
//! returns `Ok(())` without touching memory or storage.
//!
//! ## Ordering
//!
//! - A new page is appended to its sibling group: `position` = number of pages
//!   with the same `parent_id`.
//! - A new block defaults to the end of its page.
//! - [`NoteStore::reorder_blocks`] rewrites positions to `0..n` in the order given.
//!
//! Reads ([`NoteStore::page_blocks`], [`NoteStore::child_pages`]) sort by
//! `position`, ties keep storage order.
//!
//! ## Deletion
//!
//! Deleting a page removes the page, its direct children, and the blocks of all
//! removed pages. Grandchildren stay in place with a `parent_id` that no longer
//! resolves.

use crate::error::Result;
use crate::model::{
    Block, BlockId, BlockPatch, BlockType, Page, PageId, PagePatch, UNTITLED,
};
use crate::reorder::DragSession;
use crate::store::NoteRepository;
use chrono::Utc;
use log::{debug, warn};
use std::collections::HashSet;

pub struct NoteStore<R: NoteRepository> {
    repo: R,
    pages: Vec<Page>,
    blocks: Vec<Block>,
    current_page_id: Option<PageId>,
    selected_block_id: Option<BlockId>,
}

impl<R: NoteRepository> NoteStore<R> {
    /// Loads the previous session from `repo`.
    ///
    /// The saved current page is restored only if it still exists; otherwise the
    /// first stored page becomes current.
    pub fn open(repo: R) -> Result<Self> {
        let pages = repo.load_pages()?;
        let blocks = repo.load_blocks()?;
        let saved = repo.current_page_id()?;

        let current_page_id = match saved {
            Some(id) if pages.iter().any(|p| p.id == id) => Some(id),
            _ => pages.first().map(|p| p.id),
        };
        debug!(
            "opened store: {} pages, {} blocks, current page {:?}",
            pages.len(),
            blocks.len(),
            current_page_id
        );

        Ok(Self {
            repo,
            pages,
            blocks,
            current_page_id,
            selected_block_id: None,
        })
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    // --- Pages ---

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn create_page(
        &mut self,
        title: impl Into<String>,
        parent_id: Option<PageId>,
    ) -> Result<Page> {
        let position = self
            .pages
            .iter()
            .filter(|p| p.parent_id == parent_id)
            .count();
        let page = Page::new(title, parent_id, position);
        debug!("create page {} under {:?} at {}", page.id, parent_id, position);

        self.pages.push(page.clone());
        self.repo.save_page(&page)?;
        Ok(page)
    }

    pub fn update_page(&mut self, page_id: PageId, patch: PagePatch) -> Result<()> {
        let Some(page) = self.pages.iter_mut().find(|p| p.id == page_id) else {
            warn!("update_page: no page {}", page_id);
            return Ok(());
        };
        patch.apply_to(page);
        page.updated_at = Utc::now();
        let page = page.clone();
        debug!("update page {}", page_id);
        self.repo.save_page(&page)
    }

    pub fn delete_page(&mut self, page_id: PageId) -> Result<()> {
        if self.page(page_id).is_none() {
            warn!("delete_page: no page {}", page_id);
            return Ok(());
        }

        // One level only: grandchildren keep their (now dangling) parent_id.
        let removed: Vec<PageId> = self
            .pages
            .iter()
            .filter(|p| p.id == page_id || p.parent_id == Some(page_id))
            .map(|p| p.id)
            .collect();
        let removed_blocks: Vec<BlockId> = self
            .blocks
            .iter()
            .filter(|b| removed.contains(&b.page_id))
            .map(|b| b.id)
            .collect();

        self.pages.retain(|p| !removed.contains(&p.id));
        self.blocks.retain(|b| !removed_blocks.contains(&b.id));

        let current_removed = self
            .current_page_id
            .is_some_and(|current| removed.contains(&current));
        if current_removed {
            self.current_page_id = self.pages.first().map(|p| p.id);
            self.selected_block_id = None;
        }
        debug!(
            "delete page {}: {} pages, {} blocks removed",
            page_id,
            removed.len(),
            removed_blocks.len()
        );

        self.repo.delete_pages(&removed)?;
        self.repo.delete_blocks(&removed_blocks)?;
        if current_removed {
            self.repo.set_current_page_id(self.current_page_id)?;
        }
        Ok(())
    }

    /// Creates a page titled [`UNTITLED`], as the tree's "new page" action does.
    pub fn create_untitled_page(&mut self, parent_id: Option<PageId>) -> Result<Page> {
        self.create_page(UNTITLED, parent_id)
    }

    /// Pages under `parent_id` (`None` for root pages), by position.
    pub fn child_pages(&self, parent_id: Option<PageId>) -> Vec<&Page> {
        let mut children: Vec<&Page> = self
            .pages
            .iter()
            .filter(|p| p.parent_id == parent_id)
            .collect();
        children.sort_by_key(|p| p.position);
        children
    }

    // --- Current page & selection ---

    pub fn current_page_id(&self) -> Option<PageId> {
        self.current_page_id
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.current_page_id.and_then(|id| self.page(id))
    }

    pub fn set_current_page(&mut self, page_id: PageId) -> Result<()> {
        self.current_page_id = Some(page_id);
        self.selected_block_id = None;
        self.repo.set_current_page_id(Some(page_id))
    }

    pub fn selected_block_id(&self) -> Option<BlockId> {
        self.selected_block_id
    }

    pub fn set_selected_block(&mut self, block_id: Option<BlockId>) {
        self.selected_block_id = block_id;
    }

    // --- Blocks ---

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Creates an empty block. `position` defaults to the end of the page.
    ///
    /// An explicit position is used as-is; other blocks are not shifted.
    pub fn create_block(
        &mut self,
        page_id: PageId,
        block_type: BlockType,
        position: Option<usize>,
    ) -> Result<Block> {
        let position = position.unwrap_or_else(|| {
            self.blocks.iter().filter(|b| b.page_id == page_id).count()
        });
        let block = Block::new(page_id, block_type, position);
        debug!(
            "create {:?} block {} on page {} at {}",
            block_type, block.id, page_id, position
        );

        self.blocks.push(block.clone());
        self.repo.save_block(&block)?;
        Ok(block)
    }

    /// Creates a block right after `block_id`.
    ///
    /// Blocks of the same page positioned after the anchor move down by one
    /// and are saved before the new block is.
    /// Returns `None` when the reference block does not exist.
    pub fn insert_block_after(
        &mut self,
        block_id: BlockId,
        block_type: BlockType,
    ) -> Result<Option<Block>> {
        let Some(anchor) = self.block(block_id) else {
            warn!("insert_block_after: no block {}", block_id);
            return Ok(None);
        };
        let (page_id, anchor_position) = (anchor.page_id, anchor.position);

        let now = Utc::now();
        let mut shifted = Vec::new();
        for block in self
            .blocks
            .iter_mut()
            .filter(|b| b.page_id == page_id && b.position > anchor_position)
        {
            block.position += 1;
            block.updated_at = now;
            shifted.push(block.clone());
        }
        if !shifted.is_empty() {
            debug!("shift {} blocks on page {}", shifted.len(), page_id);
            self.repo.save_blocks(&shifted)?;
        }
        self.create_block(page_id, block_type, Some(anchor_position + 1))
            .map(Some)
    }

    /// A page is never shown empty: give it one paragraph if it has no blocks.
    pub fn ensure_page_has_block(&mut self, page_id: PageId) -> Result<Option<Block>> {
        if self.blocks.iter().any(|b| b.page_id == page_id) {
            return Ok(None);
        }
        self.create_block(page_id, BlockType::Paragraph, None).map(Some)
    }

    pub fn update_block(&mut self, block_id: BlockId, patch: BlockPatch) -> Result<()> {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == block_id) else {
            warn!("update_block: no block {}", block_id);
            return Ok(());
        };
        patch.apply_to(block);
        block.updated_at = Utc::now();
        let block = block.clone();
        debug!("update block {}", block_id);
        self.repo.save_block(&block)
    }

    pub fn toggle_checked(&mut self, block_id: BlockId) -> Result<()> {
        let Some(block) = self.block(block_id) else {
            return Ok(());
        };
        let mut content = block.content.clone();
        content.checked = Some(!content.is_checked());
        self.update_block(block_id, BlockPatch::content(content))
    }

    pub fn delete_block(&mut self, block_id: BlockId) -> Result<()> {
        if self.block(block_id).is_none() {
            warn!("delete_block: no block {}", block_id);
            return Ok(());
        }
        // parent_block_id is never set today; honour it anyway.
        let removed: Vec<BlockId> = self
            .blocks
            .iter()
            .filter(|b| b.id == block_id || b.parent_block_id == Some(block_id))
            .map(|b| b.id)
            .collect();
        self.blocks.retain(|b| !removed.contains(&b.id));
        if self.selected_block_id.is_some_and(|id| removed.contains(&id)) {
            self.selected_block_id = None;
        }
        debug!("delete block {}", block_id);
        self.repo.delete_blocks(&removed)
    }

    /// Assigns `position = index` to each id of `ordered_ids`.
    ///
    /// Ids that are unknown or belong to another page are skipped, as are
    /// repeats. Blocks of the page missing from the list keep their relative
    /// order and are placed after the listed ones, so positions stay `0..n`.
    pub fn reorder_blocks(&mut self, page_id: PageId, ordered_ids: &[BlockId]) -> Result<()> {
        let page_block_ids: Vec<BlockId> =
            self.page_blocks(page_id).iter().map(|b| b.id).collect();
        let on_page: HashSet<BlockId> = page_block_ids.iter().copied().collect();

        let mut seen = HashSet::new();
        let mut order: Vec<BlockId> = Vec::with_capacity(page_block_ids.len());
        for id in ordered_ids {
            if !on_page.contains(id) {
                warn!("reorder_blocks: block {} is not on page {}", id, page_id);
                continue;
            }
            if seen.insert(*id) {
                order.push(*id);
            }
        }
        if order.len() < page_block_ids.len() {
            warn!(
                "reorder_blocks: {} blocks of page {} not listed, appending",
                page_block_ids.len() - order.len(),
                page_id
            );
            order.extend(page_block_ids.iter().filter(|id| !seen.contains(*id)));
        }

        let now = Utc::now();
        let mut touched = Vec::with_capacity(order.len());
        for (index, id) in order.iter().enumerate() {
            if let Some(block) = self.blocks.iter_mut().find(|b| b.id == *id) {
                block.position = index;
                block.updated_at = now;
                touched.push(block.clone());
            }
        }
        debug!("reorder {} blocks on page {}", touched.len(), page_id);
        self.repo.save_blocks(&touched)
    }

    /// Completes a drag over this page's blocks and applies the resulting order.
    /// Returns `false` if no drag was in progress.
    pub fn drop_block(
        &mut self,
        page_id: PageId,
        session: &mut DragSession<BlockId>,
        target_index: usize,
    ) -> Result<bool> {
        let ids: Vec<BlockId> = self.page_blocks(page_id).iter().map(|b| b.id).collect();
        match session.drop_at(target_index, &ids) {
            Some(order) => {
                self.reorder_blocks(page_id, &order)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Blocks of `page_id`, by position.
    pub fn page_blocks(&self, page_id: PageId) -> Vec<&Block> {
        let mut blocks: Vec<&Block> = self
            .blocks
            .iter()
            .filter(|b| b.page_id == page_id)
            .collect();
        blocks.sort_by_key(|b| b.position);
        blocks
    }

    // --- Credential ---

    pub fn api_key(&self) -> Result<Option<String>> {
        self.repo.api_key()
    }

    pub fn set_api_key(&mut self, key: &str) -> Result<()> {
        self.repo.set_api_key(key)
    }
}
