//! Commit-range change extraction.
//!
//! Walks the commits ahead of a base ref, keeps the language files each
//! commit touched, and turns every touch into a structural delta against
//! the previous snapshot of that language.

use std::collections::BTreeMap;

use futures::{
    StreamExt,
    stream,
};

use crate::config::{
    LANG_ISO_PLACEHOLDER,
    MergeCommitPolicy,
    SyncSettings,
};
use crate::engine::diff::{
    StructuralDelta,
    diff,
};
use crate::format::{
    self,
    TranslationDocument,
};

use super::{
    Commit,
    CommitHistory,
    HistoryError,
};

/// Ordered per-language delta sequences for one run, oldest commit first.
pub type DiffSequences = BTreeMap<String, Vec<StructuralDelta>>;

/// Matches repository paths against the per-language file naming pattern and
/// extracts the embedded language code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageFilePattern {
    /// Everything before the language placeholder.
    prefix: String,
    /// Everything after the language placeholder.
    suffix: String,
}

impl LanguageFilePattern {
    /// Build the pattern from the configured directory and file name.
    #[must_use]
    pub fn from_settings(settings: &SyncSettings) -> Self {
        let full = if settings.directory.is_empty() {
            settings.filename.clone()
        } else {
            format!("{}/{}", settings.directory.trim_end_matches('/'), settings.filename)
        };
        match full.split_once(LANG_ISO_PLACEHOLDER) {
            Some((prefix, suffix)) => {
                Self { prefix: prefix.to_string(), suffix: suffix.to_string() }
            }
            // Unreachable for validated settings; degrade to exact match.
            None => Self { prefix: full, suffix: String::new() },
        }
    }

    /// Language code embedded in `path`, if the path matches the pattern.
    #[must_use]
    pub fn language_of(&self, path: &str) -> Option<String> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        let language = rest.strip_suffix(self.suffix.as_str())?;
        if language.is_empty() || language.contains('/') {
            return None;
        }
        Some(language.to_string())
    }

    /// Repository path of one language's file.
    #[must_use]
    pub fn path_for(&self, language: &str) -> String {
        format!("{}{}{}", self.prefix, language, self.suffix)
    }
}

/// One commit that touched one language's file.
#[derive(Debug, Clone)]
struct Touch {
    sha: String,
    parent: Option<String>,
}

/// Extract per-language delta sequences for the range `(base, head]`.
///
/// Returns `None` when the range holds no commits, so callers can
/// distinguish "nothing to do" from "no net change".
///
/// # Errors
/// - [`HistoryError`] on commit-history service failures; malformed file
///   content at an intermediate revision is skipped, not raised
pub async fn extract<H>(
    history: &H,
    settings: &SyncSettings,
    base: &str,
    head: &str,
) -> Result<Option<DiffSequences>, HistoryError>
where
    H: CommitHistory + ?Sized,
{
    let commits = history.commits_ahead(base, head).await?;
    if commits.is_empty() {
        return Ok(None);
    }
    tracing::debug!(count = commits.len(), %base, %head, "Commits ahead");

    let pattern = LanguageFilePattern::from_settings(settings);
    let touches = collect_touches(history, settings, &pattern, &commits).await?;

    // Languages are independent; commits within one language stay ordered.
    let concurrency = settings.effective_concurrency();
    let results: Vec<Result<(String, Vec<StructuralDelta>), HistoryError>> =
        stream::iter(touches.into_iter().map(|(language, touches)| {
            let pattern = &pattern;
            async move {
                let deltas = diff_language(history, settings, pattern, &language, &touches).await?;
                Ok((language, deltas))
            }
        }))
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let mut sequences = DiffSequences::new();
    for result in results {
        let (language, deltas) = result?;
        if !deltas.is_empty() {
            sequences.insert(language, deltas);
        }
    }

    Ok(Some(sequences))
}

/// Group the range's commits by the language they touched, preserving
/// commit order.
async fn collect_touches<H>(
    history: &H,
    settings: &SyncSettings,
    pattern: &LanguageFilePattern,
    commits: &[Commit],
) -> Result<BTreeMap<String, Vec<Touch>>, HistoryError>
where
    H: CommitHistory + ?Sized,
{
    let mut touches: BTreeMap<String, Vec<Touch>> = BTreeMap::new();

    for commit in commits {
        if commit.is_merge() && settings.merge_commits == MergeCommitPolicy::Skip {
            tracing::debug!(sha = %commit.sha, "Skipping merge commit");
            continue;
        }

        let files = history.changed_files(&commit.sha).await?;
        for path in files {
            if let Some(language) = pattern.language_of(&path) {
                touches
                    .entry(language)
                    .or_default()
                    .push(Touch { sha: commit.sha.clone(), parent: commit.parent.clone() });
            }
        }
    }

    Ok(touches)
}

/// Fold one language's touches into an ordered delta sequence.
///
/// The previous snapshot is cached after the first successful parse, so the
/// parent of the oldest touch is the only parent fetch for the whole range.
async fn diff_language<H>(
    history: &H,
    settings: &SyncSettings,
    pattern: &LanguageFilePattern,
    language: &str,
    touches: &[Touch],
) -> Result<Vec<StructuralDelta>, HistoryError>
where
    H: CommitHistory + ?Sized,
{
    let path = pattern.path_for(language);
    let mut previous: Option<TranslationDocument> = None;
    let mut deltas = Vec::new();

    for touch in touches {
        // Establish the baseline before looking at the commit itself: a
        // parsed baseline survives a malformed current revision, so a later
        // commit that fixes the file still diffs against the last good
        // snapshot.
        if previous.is_none() {
            previous = match &touch.parent {
                Some(parent) => fetch_document(history, settings, &path, parent).await?,
                // Initial commit: everything counts as added.
                None => Some(TranslationDocument::new()),
            };
        }
        let Some(baseline) = &previous else {
            tracing::warn!(
                language = %language,
                sha = %touch.sha,
                "Skipping revision with malformed parent content"
            );
            continue;
        };

        let Some(current) = fetch_document(history, settings, &path, &touch.sha).await? else {
            tracing::warn!(language = %language, sha = %touch.sha, "Skipping malformed revision");
            continue;
        };

        let delta = diff(baseline, &current);
        if !delta.is_empty() {
            deltas.push(delta);
        }
        previous = Some(current);
    }

    Ok(deltas)
}

/// Fetch and parse one snapshot.
///
/// `Ok(None)` marks a malformed revision the caller should skip; a missing
/// file parses as an empty document (all keys removed or not yet created).
async fn fetch_document<H>(
    history: &H,
    settings: &SyncSettings,
    path: &str,
    reference: &str,
) -> Result<Option<TranslationDocument>, HistoryError>
where
    H: CommitHistory + ?Sized,
{
    let raw = match history.file_content_at(path, reference).await {
        Ok(raw) => raw,
        Err(HistoryError::NotFound) => return Ok(Some(TranslationDocument::new())),
        Err(err) => return Err(err),
    };

    match format::parse(settings.format, &raw, &settings.key_separator) {
        Ok(document) => Ok(Some(document)),
        Err(err) => {
            tracing::warn!(path = %path, reference = %reference, %err, "Failed to parse revision");
            Ok(None)
        }
    }
}
