//! One-shot bulk import of the working tree.
//!
//! The degenerate, non-diffing variant of reconciliation: every local key is
//! treated as changed relative to an empty baseline, then filtered against
//! the fully drained remote inventory so only keys absent remotely are
//! created. Keys already present remotely are left untouched.

use std::collections::HashSet;
use std::path::{
    Path,
    PathBuf,
};

use crate::config::{
    LANG_ISO_PLACEHOLDER,
    SyncSettings,
};
use crate::format::{
    self,
    TranslationDocument,
};
use crate::store::{
    self,
    TranslationStore,
};

use super::accumulate::NetChangeSet;
use super::normalize::KeyNormalizer;
use super::reconcile::{
    Reconciler,
    SyncReport,
};
use super::SyncError;

/// Remote key listing page size.
const PAGE_SIZE: u32 = 5000;

/// Push every local key that is absent remotely.
///
/// Languages are enumerated from the remote project; a language file that
/// cannot be read or parsed is skipped with a warning, never fatal.
///
/// # Errors
/// - [`SyncError::Store`] on transport-level store failures
pub async fn push_snapshot<S>(
    settings: &SyncSettings,
    store: &S,
    workspace_root: &Path,
) -> Result<SyncReport, SyncError>
where
    S: TranslationStore + ?Sized,
{
    let languages = store.list_languages(&settings.project_id).await?;
    tracing::info!(?languages, "Project language codes");

    let documents = read_language_files(settings, workspace_root, &languages).await;

    let inventory =
        store::list_all_keys(store, &settings.project_id, &settings.platform, PAGE_SIZE).await?;
    tracing::info!(count = inventory.len(), "Remote keys");
    let existing: HashSet<&str> = inventory.iter().map(|key| key.name.as_str()).collect();

    let normalizer = KeyNormalizer::from_settings(settings);
    let mut changes = NetChangeSet::default();
    for (language, document) in &documents {
        for (raw_key, value) in document {
            let key = normalizer.normalize(raw_key);
            if !existing.contains(key.as_str()) {
                changes.stage_create(&key, language, value);
            }
        }
    }

    if changes.is_empty() {
        tracing::info!("No new keys to push");
        return Ok(SyncReport::default());
    }

    let report = Reconciler::new(store, settings).reconcile(changes).await?;
    super::log_report(&report);
    Ok(report)
}

/// Read and parse every language's file concurrently.
///
/// Unreadable or malformed files are logged and dropped.
async fn read_language_files(
    settings: &SyncSettings,
    workspace_root: &Path,
    languages: &[String],
) -> Vec<(String, TranslationDocument)> {
    let reads = languages.iter().map(|language| async move {
        let path = language_file_path(settings, workspace_root, language);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(language = %language, path = %path.display(), %err, "Failed to read language file");
                return None;
            }
        };
        tracing::debug!(path = %path.display(), "Read language file");
        match format::parse(settings.format, &raw, &settings.key_separator) {
            Ok(document) => {
                tracing::info!(language = %language, count = document.len(), "Parsed language file");
                Some((language.clone(), document))
            }
            Err(err) => {
                tracing::warn!(language = %language, path = %path.display(), %err, "Failed to parse language file");
                None
            }
        }
    });

    futures::future::join_all(reads).await.into_iter().flatten().collect()
}

/// On-disk path of one language's file.
fn language_file_path(settings: &SyncSettings, workspace_root: &Path, language: &str) -> PathBuf {
    workspace_root
        .join(&settings.directory)
        .join(settings.filename.replace(LANG_ISO_PLACEHOLDER, language))
}
