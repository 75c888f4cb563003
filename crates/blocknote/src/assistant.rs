//! # Generative-Text Assistant
//!
//! Rewrites a block's text through an external text generator. The generator
//! itself (HTTP client, model choice, prompt wording) lives outside this crate
//! behind [`TextGenerator`]; this module owns the flow around one call:
//!
//! 1. Read the credential from the store. Missing or blank fails early.
//! 2. Read the block's current text.
//! 3. Await the generator once. No retry, no timeout.
//! 4. Hand back the generated text, or remember the error's message so it can
//!    be shown to the user.
//!
//! Applying the result is a separate step ([`Assistant::apply`]) so the user can
//! look at it first.

use crate::error::NoteError;
use crate::model::{BlockId, BlockPatch};
use crate::notes::NoteStore;
use crate::store::NoteRepository;
use log::{debug, warn};
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("API key is not configured. Please add your API key in settings.")]
    MissingCredential,

    #[error("No prompt given")]
    EmptyPrompt,

    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    /// The remote call failed; carries the service's own message.
    #[error("{0}")]
    Remote(String),

    #[error("No content generated")]
    EmptyResponse,

    #[error(transparent)]
    Store(#[from] NoteError),
}

/// A single request/response call to a text generation service.
pub trait TextGenerator {
    fn generate(
        &self,
        prompt: &str,
        input: &str,
        credential: &str,
    ) -> impl Future<Output = Result<String, AssistError>>;
}

#[derive(Debug, Default)]
pub struct Assistant {
    is_processing: bool,
    last_error: Option<String>,
}

impl Assistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// Message of the most recent failure, cleared when the next request starts.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Runs `prompt` over the text of `block_id` and returns the generated text.
    pub async fn process<R, G>(
        &mut self,
        store: &NoteStore<R>,
        generator: &G,
        block_id: BlockId,
        prompt: &str,
    ) -> Result<String, AssistError>
    where
        R: NoteRepository,
        G: TextGenerator,
    {
        self.is_processing = true;
        self.last_error = None;

        let result = run(store, generator, block_id, prompt).await;

        self.is_processing = false;
        if let Err(err) = &result {
            warn!("assistant request for block {} failed: {}", block_id, err);
            self.last_error = Some(err.to_string());
        }
        result
    }

    /// Replaces the block's content with `result`.
    pub fn apply<R: NoteRepository>(
        &self,
        store: &mut NoteStore<R>,
        block_id: BlockId,
        result: &str,
    ) -> Result<(), NoteError> {
        store.update_block(block_id, BlockPatch::text(result))
    }
}

async fn run<R, G>(
    store: &NoteStore<R>,
    generator: &G,
    block_id: BlockId,
    prompt: &str,
) -> Result<String, AssistError>
where
    R: NoteRepository,
    G: TextGenerator,
{
    if prompt.trim().is_empty() {
        return Err(AssistError::EmptyPrompt);
    }
    let credential = store
        .api_key()?
        .filter(|key| !key.trim().is_empty())
        .ok_or(AssistError::MissingCredential)?;
    let input = store
        .block(block_id)
        .ok_or(AssistError::BlockNotFound(block_id))?
        .content
        .text
        .clone();

    debug!("assistant request for block {} ({} chars)", block_id, input.len());
    let output = generator.generate(prompt, &input, &credential).await?;
    if output.trim().is_empty() {
        return Err(AssistError::EmptyResponse);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockContent, BlockType};
    use crate::store::memory::InMemoryRepository;
    use std::cell::RefCell;
    use uuid::Uuid;

    /// Echoes a canned reply and records every call.
    struct FakeGenerator {
        reply: Result<String, String>,
        calls: RefCell<Vec<(String, String, String)>>,
    }

    impl FakeGenerator {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for FakeGenerator {
        async fn generate(
            &self,
            prompt: &str,
            input: &str,
            credential: &str,
        ) -> Result<String, AssistError> {
            self.calls.borrow_mut().push((
                prompt.to_string(),
                input.to_string(),
                credential.to_string(),
            ));
            self.reply.clone().map_err(AssistError::Remote)
        }
    }

    fn store_with_block(text: &str) -> (NoteStore<InMemoryRepository>, BlockId) {
        let mut store = NoteStore::open(InMemoryRepository::new()).unwrap();
        let page = store.create_page("P", None).unwrap();
        let block = store
            .create_block(page.id, BlockType::Checkbox, None)
            .unwrap();
        store
            .update_block(
                block.id,
                BlockPatch::content(BlockContent {
                    text: text.to_string(),
                    checked: Some(true),
                    language: None,
                }),
            )
            .unwrap();
        (store, block.id)
    }

    #[tokio::test]
    async fn test_process_passes_prompt_text_and_credential() {
        let (mut store, block_id) = store_with_block("rough draft");
        store.set_api_key("key-1").unwrap();
        let generator = FakeGenerator::replying("polished draft");
        let mut assistant = Assistant::new();

        let result = assistant
            .process(&store, &generator, block_id, "Improve:")
            .await
            .unwrap();

        assert_eq!(result, "polished draft");
        assert_eq!(
            generator.calls.borrow().as_slice(),
            &[(
                "Improve:".to_string(),
                "rough draft".to_string(),
                "key-1".to_string()
            )]
        );
        assert!(!assistant.is_processing());
        assert_eq!(assistant.last_error(), None);
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_calling() {
        let (store, block_id) = store_with_block("text");
        let generator = FakeGenerator::replying("unused");
        let mut assistant = Assistant::new();

        let err = assistant
            .process(&store, &generator, block_id, "Summarize:")
            .await
            .unwrap_err();

        assert!(matches!(err, AssistError::MissingCredential));
        assert!(generator.calls.borrow().is_empty());
        assert_eq!(
            assistant.last_error(),
            Some("API key is not configured. Please add your API key in settings.")
        );
    }

    #[tokio::test]
    async fn test_blank_credential_counts_as_missing() {
        let (mut store, block_id) = store_with_block("text");
        store.set_api_key("   ").unwrap();
        let mut assistant = Assistant::new();

        let err = assistant
            .process(&store, &FakeGenerator::replying("x"), block_id, "Expand:")
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::MissingCredential));
    }

    #[tokio::test]
    async fn test_remote_message_is_surfaced_verbatim() {
        let (mut store, block_id) = store_with_block("text");
        store.set_api_key("key").unwrap();
        let generator = FakeGenerator::failing("API key not valid. Please pass a valid API key.");
        let mut assistant = Assistant::new();

        let result = assistant.process(&store, &generator, block_id, "Clarify:").await;

        assert!(result.is_err());
        assert_eq!(
            assistant.last_error(),
            Some("API key not valid. Please pass a valid API key.")
        );
        assert_eq!(generator.calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let (mut store, block_id) = store_with_block("text");
        store.set_api_key("key").unwrap();
        let mut assistant = Assistant::new();

        let err = assistant
            .process(&store, &FakeGenerator::replying("\n"), block_id, "Expand:")
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::EmptyResponse));
        assert_eq!(assistant.last_error(), Some("No content generated"));
    }

    #[tokio::test]
    async fn test_error_clears_on_next_success() {
        let (mut store, block_id) = store_with_block("text");
        store.set_api_key("key").unwrap();
        let mut assistant = Assistant::new();

        let _ = assistant
            .process(&store, &FakeGenerator::failing("quota exceeded"), block_id, "Expand:")
            .await;
        assert_eq!(assistant.last_error(), Some("quota exceeded"));

        assistant
            .process(&store, &FakeGenerator::replying("ok"), block_id, "Expand:")
            .await
            .unwrap();
        assert_eq!(assistant.last_error(), None);
    }

    #[tokio::test]
    async fn test_unknown_block_and_empty_prompt() {
        let (mut store, _) = store_with_block("text");
        store.set_api_key("key").unwrap();
        let generator = FakeGenerator::replying("x");
        let mut assistant = Assistant::new();

        let missing = Uuid::new_v4();
        let err = assistant
            .process(&store, &generator, missing, "Expand:")
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::BlockNotFound(id) if id == missing));

        let err = assistant
            .process(&store, &generator, missing, "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::EmptyPrompt));
        assert!(generator.calls.borrow().is_empty());
    }

    #[test]
    fn test_apply_replaces_content() {
        let (mut store, block_id) = store_with_block("before");
        let assistant = Assistant::new();

        assistant.apply(&mut store, block_id, "after").unwrap();

        let block = store.block(block_id).unwrap();
        assert_eq!(block.content, BlockContent::text("after"));
        assert_eq!(block.block_type, BlockType::Checkbox);
        let stored = store.repository().load_blocks().unwrap();
        assert_eq!(stored[0].content.text, "after");
    }
}
