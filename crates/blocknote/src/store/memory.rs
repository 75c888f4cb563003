use super::kv::KvRepository;
use super::mem_backend::MemBackend;

pub type InMemoryRepository = KvRepository<MemBackend>;

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        KvRepository::with_backend(MemBackend::new())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{Block, BlockContent, BlockType, Page, PageId};
    use crate::store::NoteRepository;

    /// Seeds a repository the way a previous session would have left it.
    pub struct RepoFixture {
        pub repo: InMemoryRepository,
    }

    impl Default for RepoFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RepoFixture {
        pub fn new() -> Self {
            Self {
                repo: InMemoryRepository::new(),
            }
        }

        pub fn with_page(mut self, page: &Page) -> Self {
            self.repo.save_page(page).unwrap();
            self
        }

        /// Appends paragraphs with the given texts at positions 0..n.
        pub fn with_blocks(mut self, page_id: PageId, texts: &[&str]) -> Self {
            let blocks: Vec<Block> = texts
                .iter()
                .enumerate()
                .map(|(position, text)| {
                    let mut block = Block::new(page_id, BlockType::Paragraph, position);
                    block.content = BlockContent::text(*text);
                    block
                })
                .collect();
            self.repo.save_blocks(&blocks).unwrap();
            self
        }

        pub fn with_current_page(mut self, page_id: PageId) -> Self {
            self.repo.set_current_page_id(Some(page_id)).unwrap();
            self
        }

        pub fn with_api_key(mut self, key: &str) -> Self {
            self.repo.set_api_key(key).unwrap();
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::RepoFixture;
    use super::*;
    use crate::model::Page;
    use crate::store::NoteRepository;

    #[test]
    fn test_fixture_seeds_repository() {
        let page = Page::new("Seeded", None, 0);
        let fixture = RepoFixture::default()
            .with_page(&page)
            .with_blocks(page.id, &["one", "two"])
            .with_current_page(page.id)
            .with_api_key("k");

        let blocks = fixture.repo.load_blocks().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].content.text, "two");
        assert_eq!(blocks[1].position, 1);
        assert_eq!(fixture.repo.current_page_id().unwrap(), Some(page.id));
        assert_eq!(fixture.repo.api_key().unwrap().as_deref(), Some("k"));
    }

    #[test]
    fn test_default_is_empty() {
        let repo = InMemoryRepository::default();
        assert!(repo.load_pages().unwrap().is_empty());
    }
}
