//! # Domain Model: Pages and Blocks
//!
//! This module defines the two entities blocknote stores: [`Page`] and [`Block`].
//!
//! ## Pages
//!
//! Pages form a forest. A page without `parent_id` is a root page; every other
//! page names its parent. `position` ranks a page among its siblings (pages that
//! share the same `parent_id`). Nothing prevents a page from being moved under
//! one of its own descendants.
//!
//! ## Blocks
//!
//! A block belongs to exactly one page and is ranked among that page's blocks by
//! `position`. Blocks are flat: `parent_block_id` is part of the stored shape but
//! no operation ever sets it.
//!
//! ## Persisted Shape
//!
//! Both entities serialize to camelCase JSON with RFC 3339 timestamps. Absent
//! optional fields are omitted:
//!
//! ```text
//! { "id": "…", "title": "Inbox", "position": 0,
//!   "createdAt": "2026-10-14T09:12:00Z", "updatedAt": "2026-10-14T09:12:00Z" }
//! ```
//!
//! ## Partial Updates
//!
//! [`PagePatch`] and [`BlockPatch`] carry the fields an update touches. Fields that
//! can be cleared (icon, cover, parent) are `Option<Option<T>>`: `Some(None)`
//! clears, `None` leaves the field alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PageId = Uuid;
pub type BlockId = Uuid;

/// Title given to pages created from the tree's "new page" action.
pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PageId>,
    pub position: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn new(title: impl Into<String>, parent_id: Option<PageId>, position: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            icon: None,
            cover: None,
            parent_id,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Bullet,
    Numbered,
    Checkbox,
    Code,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContent {
    pub text: String,
    /// Only meaningful for [`BlockType::Checkbox`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    /// Reserved for [`BlockType::Code`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl BlockContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn is_checked(&self) -> bool {
        self.checked.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    pub page_id: PageId,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: BlockContent,
    pub position: usize,
    /// Reserved. Blocks are flat within a page and this is always `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_block_id: Option<BlockId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Block {
    pub fn new(page_id: PageId, block_type: BlockType, position: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            page_id,
            block_type,
            content: BlockContent::default(),
            position,
            parent_block_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields to merge into an existing [`Page`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagePatch {
    pub title: Option<String>,
    pub icon: Option<Option<String>>,
    pub cover: Option<Option<String>>,
    pub parent_id: Option<Option<PageId>>,
    pub position: Option<usize>,
}

impl PagePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_cover(mut self, cover: Option<String>) -> Self {
        self.cover = Some(cover);
        self
    }

    pub fn with_parent(mut self, parent_id: Option<PageId>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Merges the patch into `page`. Does not touch `updated_at`.
    pub fn apply_to(self, page: &mut Page) {
        if let Some(title) = self.title {
            page.title = title;
        }
        if let Some(icon) = self.icon {
            page.icon = icon;
        }
        if let Some(cover) = self.cover {
            page.cover = cover;
        }
        if let Some(parent_id) = self.parent_id {
            page.parent_id = parent_id;
        }
        if let Some(position) = self.position {
            page.position = position;
        }
    }
}

/// Fields to merge into an existing [`Block`].
///
/// `content` replaces the whole content object, it is not merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockPatch {
    pub block_type: Option<BlockType>,
    pub content: Option<BlockContent>,
    pub position: Option<usize>,
}

impl BlockPatch {
    pub fn block_type(block_type: BlockType) -> Self {
        Self {
            block_type: Some(block_type),
            ..Default::default()
        }
    }

    pub fn content(content: BlockContent) -> Self {
        Self {
            content: Some(content),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::content(BlockContent::text(text))
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn apply_to(self, block: &mut Block) {
        if let Some(block_type) = self.block_type {
            block.block_type = block_type;
        }
        if let Some(content) = self.content {
            block.content = content;
        }
        if let Some(position) = self.position {
            block.position = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_serializes_camel_case_without_absent_fields() {
        let parent = Uuid::new_v4();
        let page = Page::new("Child", Some(parent), 2);
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["parentId"], parent.to_string());
        assert_eq!(json["position"], 2);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("icon").is_none());
        assert!(json.get("cover").is_none());
    }

    #[test]
    fn test_root_page_omits_parent() {
        let page = Page::new("Root", None, 0);
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("parentId").is_none());
        assert!(page.is_root());
    }

    #[test]
    fn test_block_type_uses_lowercase_names() {
        let block = Block::new(Uuid::new_v4(), BlockType::Heading2, 0);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "heading2");
        assert_eq!(json["content"]["text"], "");
        assert!(json["content"].get("checked").is_none());
        assert!(json.get("parentBlockId").is_none());
    }

    #[test]
    fn test_block_type_defaults_to_paragraph() {
        assert_eq!(BlockType::default(), BlockType::Paragraph);
    }

    #[test]
    fn test_block_parses_stored_shape() {
        let raw = r#"{
            "id": "6f1c0a5e-8d7b-4a7e-9a51-2b7c3f0e9d11",
            "pageId": "0b3e6f0a-1c2d-4e5f-8a9b-7c6d5e4f3a21",
            "type": "checkbox",
            "content": { "text": "buy milk", "checked": true },
            "position": 3,
            "createdAt": "2026-10-01T08:00:00.000Z",
            "updatedAt": "2026-10-01T08:05:00.000Z"
        }"#;
        let block: Block = serde_json::from_str(raw).unwrap();
        assert_eq!(block.block_type, BlockType::Checkbox);
        assert!(block.content.is_checked());
        assert_eq!(block.position, 3);
        assert!(block.parent_block_id.is_none());
    }

    #[test]
    fn test_page_patch_clears_nullable_fields() {
        let mut page = Page::new("Trip", None, 0);
        page.icon = Some("🌴".to_string());
        page.cover = Some("https://example.com/beach.jpg".to_string());

        PagePatch::default()
            .with_cover(None)
            .with_position(4)
            .apply_to(&mut page);

        assert_eq!(page.icon.as_deref(), Some("🌴"));
        assert!(page.cover.is_none());
        assert_eq!(page.position, 4);
        assert_eq!(page.title, "Trip");
    }

    #[test]
    fn test_block_patch_replaces_whole_content() {
        let mut block = Block::new(Uuid::new_v4(), BlockType::Checkbox, 0);
        block.content.checked = Some(true);

        BlockPatch::text("rewritten").apply_to(&mut block);

        assert_eq!(block.content.text, "rewritten");
        assert!(block.content.checked.is_none());
        assert_eq!(block.block_type, BlockType::Checkbox);
    }
}
