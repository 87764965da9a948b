//! 同期エンジン
//!
//! Wires the pipeline together: commit-range extraction, structural
//! diffing, change accumulation, and remote reconciliation.

pub mod accumulate;
pub mod diff;
pub mod normalize;
pub mod push;
pub mod reconcile;

use thiserror::Error;

use crate::config::{
    ConfigError,
    SyncSettings,
};
use crate::history::{
    CommitHistory,
    HistoryError,
    extractor,
};
use crate::store::{
    StoreError,
    TranslationStore,
};

pub use accumulate::NetChangeSet;
pub use diff::StructuralDelta;
pub use normalize::KeyNormalizer;
pub use push::push_snapshot;
pub use reconcile::{
    CreateFailure,
    Reconciler,
    SyncReport,
};

/// Fatal errors for a whole run.
///
/// Transient per-commit skips and duplicate-on-create reclassifications are
/// handled inside the pipeline and never surface here.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The compared range contains no commits; the remote store was not
    /// touched.
    NothingToDo,
    /// Reconciliation ran to completion (possibly with per-key failures).
    Completed(SyncReport),
}

/// Reconcile the remote store with the commit range `(base, head]`.
///
/// # Errors
/// - [`SyncError::History`] when the commit-history service fails
/// - [`SyncError::Store`] on transport-level store failures
pub async fn sync_range<H, S>(
    settings: &SyncSettings,
    history: &H,
    store: &S,
    base: &str,
    head: &str,
) -> Result<SyncOutcome, SyncError>
where
    H: CommitHistory + ?Sized,
    S: TranslationStore + ?Sized,
{
    let Some(sequences) = extractor::extract(history, settings, base, head).await? else {
        tracing::info!(%base, %head, "No commits ahead, nothing to do");
        return Ok(SyncOutcome::NothingToDo);
    };

    let normalizer = KeyNormalizer::from_settings(settings);
    let changes = accumulate::accumulate(&sequences, &normalizer);
    if changes.is_empty() {
        tracing::info!("No net changes across the range");
        return Ok(SyncOutcome::Completed(SyncReport::default()));
    }

    tracing::debug!(
        creates = changes.to_create.len(),
        updates = changes.to_update.len(),
        deletes = changes.to_delete.len(),
        "Net change set built"
    );

    let report = Reconciler::new(store, settings).reconcile(changes).await?;
    log_report(&report);

    Ok(SyncOutcome::Completed(report))
}

/// Emit the run summary.
pub fn log_report(report: &SyncReport) {
    for name in &report.created {
        tracing::info!(key = %name, "Created");
    }
    tracing::info!(
        created = report.created.len(),
        updated = report.updated,
        deleted = report.deleted,
        skipped = report.skipped,
        failed = report.failed.len(),
        "Sync finished"
    );
    for failure in &report.failed {
        tracing::warn!(key = %failure.name, reason = %failure.reason, "Create failed");
    }
}
