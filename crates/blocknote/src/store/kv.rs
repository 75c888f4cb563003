use super::backend::StorageBackend;
use super::{DoctorReport, NoteRepository, StorageKeys};
use crate::error::Result;
use crate::model::{Block, BlockId, Page, PageId};
use chrono::Utc;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// Repository that keeps each collection as one JSON value in a key-value backend.
pub struct KvRepository<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    keys: StorageKeys,
}

impl<B: StorageBackend> KvRepository<B> {
    pub fn with_backend(backend: B) -> Self {
        Self::with_keys(backend, StorageKeys::default())
    }

    pub fn with_keys(backend: B, keys: StorageKeys) -> Self {
        Self { backend, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn load_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.backend.read(key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.backend.write(key, &raw)
    }
}

/// Replaces entries sharing an id (refreshing `updated_at`) or appends new ones.
fn upsert_pages(pages: &mut Vec<Page>, incoming: &Page) {
    if let Some(existing) = pages.iter_mut().find(|p| p.id == incoming.id) {
        *existing = Page {
            updated_at: Utc::now(),
            ..incoming.clone()
        };
    } else {
        pages.push(incoming.clone());
    }
}

fn upsert_blocks(blocks: &mut Vec<Block>, incoming: &Block) {
    if let Some(existing) = blocks.iter_mut().find(|b| b.id == incoming.id) {
        *existing = Block {
            updated_at: Utc::now(),
            ..incoming.clone()
        };
    } else {
        blocks.push(incoming.clone());
    }
}

impl<B: StorageBackend> NoteRepository for KvRepository<B> {
    fn load_pages(&self) -> Result<Vec<Page>> {
        self.load_list(&self.keys.pages)
    }

    fn save_page(&mut self, page: &Page) -> Result<()> {
        let mut pages = self.load_pages()?;
        upsert_pages(&mut pages, page);
        self.save_list(&self.keys.pages, &pages)
    }

    fn delete_pages(&mut self, ids: &[PageId]) -> Result<()> {
        let pages: Vec<Page> = self
            .load_pages()?
            .into_iter()
            .filter(|p| !ids.contains(&p.id))
            .collect();
        self.save_list(&self.keys.pages, &pages)
    }

    fn load_blocks(&self) -> Result<Vec<Block>> {
        self.load_list(&self.keys.blocks)
    }

    fn save_block(&mut self, block: &Block) -> Result<()> {
        self.save_blocks(std::slice::from_ref(block))
    }

    fn save_blocks(&mut self, incoming: &[Block]) -> Result<()> {
        let mut blocks = self.load_blocks()?;
        for block in incoming {
            upsert_blocks(&mut blocks, block);
        }
        self.save_list(&self.keys.blocks, &blocks)
    }

    fn delete_blocks(&mut self, ids: &[BlockId]) -> Result<()> {
        let blocks: Vec<Block> = self
            .load_blocks()?
            .into_iter()
            .filter(|b| !ids.contains(&b.id))
            .collect();
        self.save_list(&self.keys.blocks, &blocks)
    }

    fn current_page_id(&self) -> Result<Option<PageId>> {
        let Some(raw) = self.backend.read(&self.keys.current_page)? else {
            return Ok(None);
        };
        match Uuid::parse_str(raw.trim()) {
            Ok(id) => Ok(Some(id)),
            Err(err) => {
                warn!("ignoring unreadable current page pointer {:?}: {}", raw, err);
                Ok(None)
            }
        }
    }

    fn set_current_page_id(&mut self, id: Option<PageId>) -> Result<()> {
        match id {
            Some(id) => self
                .backend
                .write(&self.keys.current_page, &id.to_string()),
            None => self.backend.remove(&self.keys.current_page),
        }
    }

    fn api_key(&self) -> Result<Option<String>> {
        self.backend.read(&self.keys.api_key)
    }

    fn set_api_key(&mut self, key: &str) -> Result<()> {
        self.backend.write(&self.keys.api_key, key)
    }

    fn doctor(&mut self) -> Result<DoctorReport> {
        let pages = self.load_pages()?;
        let page_ids: HashSet<PageId> = pages.iter().map(|p| p.id).collect();
        let mut report = DoctorReport {
            dangling_parent_pages: pages
                .iter()
                .filter(|p| p.parent_id.is_some_and(|parent| !page_ids.contains(&parent)))
                .count(),
            ..Default::default()
        };

        let blocks = self.load_blocks()?;
        let before = blocks.len();
        let kept: Vec<Block> = blocks
            .into_iter()
            .filter(|b| page_ids.contains(&b.page_id))
            .collect();
        report.removed_orphan_blocks = before - kept.len();

        if report.removed_orphan_blocks > 0 {
            self.save_list(&self.keys.blocks, &kept)?;
        }
        debug!(
            "doctor: removed {} orphan blocks, {} pages with dangling parent",
            report.removed_orphan_blocks, report.dangling_parent_pages
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NoteError;
    use crate::model::BlockType;
    use crate::store::mem_backend::MemBackend;
    use chrono::Duration;

    const CURRENT_PAGE: &str = crate::store::CURRENT_PAGE_KEY;

    fn make_repo() -> KvRepository<MemBackend> {
        KvRepository::with_backend(MemBackend::new())
    }

    // --- Pages ---

    #[test]
    fn test_empty_store_loads_empty_collections() {
        let repo = make_repo();
        assert!(repo.load_pages().unwrap().is_empty());
        assert!(repo.load_blocks().unwrap().is_empty());
        assert_eq!(repo.current_page_id().unwrap(), None);
        assert_eq!(repo.api_key().unwrap(), None);
    }

    #[test]
    fn test_new_page_is_stored_verbatim() {
        let mut repo = make_repo();
        let page = Page::new("Inbox", None, 0);
        repo.save_page(&page).unwrap();

        assert_eq!(repo.load_pages().unwrap(), vec![page]);
    }

    #[test]
    fn test_saving_existing_page_refreshes_updated_at() {
        let mut repo = make_repo();
        let mut page = Page::new("Inbox", None, 0);
        page.updated_at = Utc::now() - Duration::hours(2);
        repo.save_page(&page).unwrap();

        page.title = "Renamed".to_string();
        let before = Utc::now();
        repo.save_page(&page).unwrap();

        let stored = repo.load_pages().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Renamed");
        assert_eq!(stored[0].created_at, page.created_at);
        assert!(stored[0].updated_at >= before);
    }

    #[test]
    fn test_delete_pages_ignores_unknown_ids() {
        let mut repo = make_repo();
        let a = Page::new("A", None, 0);
        let b = Page::new("B", None, 1);
        repo.save_page(&a).unwrap();
        repo.save_page(&b).unwrap();

        repo.delete_pages(&[a.id, Uuid::new_v4()]).unwrap();

        let ids: Vec<PageId> = repo.load_pages().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b.id]);
    }

    // --- Blocks ---

    #[test]
    fn test_save_blocks_upserts_in_one_write() {
        let mut repo = make_repo();
        let page_id = Uuid::new_v4();
        let mut x = Block::new(page_id, BlockType::Paragraph, 0);
        let y = Block::new(page_id, BlockType::Bullet, 1);
        repo.save_block(&x).unwrap();

        x.position = 1;
        let mut y2 = y.clone();
        y2.position = 0;
        repo.save_blocks(&[x.clone(), y2]).unwrap();

        let stored = repo.load_blocks().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, x.id);
        assert_eq!(stored[0].position, 1);
        assert_eq!(stored[1].id, y.id);
        assert_eq!(stored[1].position, 0);
    }

    #[test]
    fn test_delete_blocks() {
        let mut repo = make_repo();
        let page_id = Uuid::new_v4();
        let x = Block::new(page_id, BlockType::Paragraph, 0);
        let y = Block::new(page_id, BlockType::Paragraph, 1);
        repo.save_blocks(&[x.clone(), y.clone()]).unwrap();

        repo.delete_blocks(&[x.id]).unwrap();

        let stored = repo.load_blocks().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, y.id);
    }

    // --- Pointers ---

    #[test]
    fn test_current_page_is_plain_string() {
        let mut repo = make_repo();
        let id = Uuid::new_v4();
        repo.set_current_page_id(Some(id)).unwrap();

        assert_eq!(repo.backend.raw(CURRENT_PAGE), Some(id.to_string()));
        assert_eq!(repo.current_page_id().unwrap(), Some(id));

        repo.set_current_page_id(None).unwrap();
        assert_eq!(repo.current_page_id().unwrap(), None);
    }

    #[test]
    fn test_unreadable_current_page_is_ignored() {
        let repo = make_repo();
        repo.backend.write(CURRENT_PAGE, "not-a-uuid").unwrap();
        assert_eq!(repo.current_page_id().unwrap(), None);
    }

    #[test]
    fn test_api_key_round_trip() {
        let mut repo = make_repo();
        repo.set_api_key("secret-key").unwrap();
        assert_eq!(repo.api_key().unwrap().as_deref(), Some("secret-key"));
        assert_eq!(
            repo.backend.raw(crate::store::API_KEY_KEY).as_deref(),
            Some("secret-key")
        );
    }

    #[test]
    fn test_prefixed_keys() {
        let mut repo =
            KvRepository::with_keys(MemBackend::new(), StorageKeys::with_prefix("notion_"));
        repo.save_page(&Page::new("A", None, 0)).unwrap();
        repo.set_api_key("k").unwrap();

        assert_eq!(
            repo.backend.keys(),
            vec!["notion_gemini_api_key".to_string(), "notion_pages".to_string()]
        );
    }

    // --- Doctor ---

    #[test]
    fn test_doctor_purges_orphan_blocks_and_reports_dangling_parents() {
        let mut repo = make_repo();
        let root = Page::new("Root", None, 0);
        let orphan_child = Page::new("Lost", Some(Uuid::new_v4()), 0);
        repo.save_page(&root).unwrap();
        repo.save_page(&orphan_child).unwrap();

        let kept = Block::new(root.id, BlockType::Paragraph, 0);
        let orphan = Block::new(Uuid::new_v4(), BlockType::Paragraph, 0);
        repo.save_blocks(&[kept.clone(), orphan]).unwrap();

        let report = repo.doctor().unwrap();
        assert_eq!(report.removed_orphan_blocks, 1);
        assert_eq!(report.dangling_parent_pages, 1);

        let blocks = repo.load_blocks().unwrap();
        assert_eq!(blocks, vec![kept]);
        assert_eq!(repo.load_pages().unwrap().len(), 2);
    }

    #[test]
    fn test_doctor_on_clean_store_does_not_write() {
        let mut repo = make_repo();
        repo.backend.set_simulate_write_error(true);
        assert_eq!(repo.doctor().unwrap(), DoctorReport::default());
    }

    // --- Error Handling ---

    #[test]
    fn test_save_fails_on_write_error() {
        let mut repo = make_repo();
        repo.backend.set_simulate_write_error(true);

        let result = repo.save_page(&Page::new("Test", None, 0));
        assert!(matches!(result, Err(NoteError::Store(_))));
    }

    #[test]
    fn test_corrupt_collection_is_a_serialization_error() {
        let repo = make_repo();
        repo.backend.write(crate::store::PAGES_KEY, "{not json").unwrap();
        assert!(matches!(
            repo.load_pages(),
            Err(NoteError::Serialization(_))
        ));
    }
}
