//! 翻訳ストアサービスのインターフェース

mod http;

pub use http::HttpStore;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

/// Why the store rejected a single key inside a batched create.
///
/// An explicit kind keeps the reconciler's duplicate-fallback branch
/// type-safe; wire messages are translated once, at the client boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The key already exists remotely.
    AlreadyExists,
    /// Any other per-key rejection.
    Rejected,
}

/// Transport-level store failures. Fatal for the run; idempotency makes a
/// blind retry safe.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Translation store unavailable: {0}")]
    Unavailable(String),

    #[error("Translation store rate limit hit")]
    RateLimited,

    #[error("Translation store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response from translation store: {0}")]
    Decode(String),
}

/// One key from the remote inventory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteKey {
    pub key_id: u64,
    /// Canonical name on the queried platform.
    pub name: String,
}

/// One page of the key inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPage {
    pub items: Vec<RemoteKey>,
    pub has_next_page: bool,
}

/// Translation payload of a key to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTranslation {
    /// ISO language code.
    pub language: String,
    pub value: String,
}

/// One key of a batched create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKey {
    pub name: String,
    pub platforms: Vec<String>,
    pub translations: Vec<NewTranslation>,
    /// Per-platform file assignment.
    pub filenames: BTreeMap<String, String>,
    pub tags: Vec<String>,
}

/// Per-key rejection inside a batched create response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateKeyError {
    pub name: String,
    pub kind: StoreErrorKind,
    pub message: String,
}

/// Batched create outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateKeysResult {
    pub created: Vec<RemoteKey>,
    pub errors: Vec<CreateKeyError>,
}

/// One translation of a key, as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTranslation {
    pub translation_id: u64,
    /// ISO language code.
    pub language: String,
    pub value: String,
}

/// A remote key with its per-language translations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteKeyDetail {
    pub key_id: u64,
    pub name: String,
    pub translations: Vec<RemoteTranslation>,
}

impl RemoteKeyDetail {
    /// Translation slot for one language, if the project carries it.
    #[must_use]
    pub fn translation_for(&self, language: &str) -> Option<&RemoteTranslation> {
        self.translations.iter().find(|translation| translation.language == language)
    }
}

/// Write access to the remote key/value translation store.
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// ISO codes of the project's configured languages.
    async fn list_languages(&self, project: &str) -> Result<Vec<String>, StoreError>;

    /// One page of the key inventory, filtered by platform. Pages start at 1.
    async fn list_keys(
        &self,
        project: &str,
        platform: &str,
        page: u32,
        page_size: u32,
    ) -> Result<KeyPage, StoreError>;

    /// Create keys in one batch; per-key rejections come back in the result.
    async fn create_keys(
        &self,
        project: &str,
        keys: Vec<NewKey>,
    ) -> Result<CreateKeysResult, StoreError>;

    /// Current state of exactly the named keys, with translation ids and
    /// values.
    async fn keys_with_translations(
        &self,
        project: &str,
        names: &[String],
    ) -> Result<Vec<RemoteKeyDetail>, StoreError>;

    /// Overwrite one translation's value.
    async fn update_translation(
        &self,
        project: &str,
        translation_id: u64,
        value: &str,
    ) -> Result<(), StoreError>;

    /// Delete keys by id in one call.
    async fn bulk_delete_keys(&self, project: &str, key_ids: &[u64]) -> Result<(), StoreError>;
}

/// Drain every page of the key inventory.
///
/// A partial inventory would cause false "key does not exist" creates, so
/// the loop runs until the store stops indicating further pages.
///
/// # Errors
/// - [`StoreError`] from any page request
pub async fn list_all_keys<S>(
    store: &S,
    project: &str,
    platform: &str,
    page_size: u32,
) -> Result<Vec<RemoteKey>, StoreError>
where
    S: TranslationStore + ?Sized,
{
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let batch = store.list_keys(project, platform, page, page_size).await?;
        items.extend(batch.items);
        if !batch.has_next_page {
            break;
        }
        page += 1;
    }
    Ok(items)
}
