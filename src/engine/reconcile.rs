//! Three-phase reconciliation against the remote store.

use std::collections::BTreeMap;

use futures::{
    StreamExt,
    stream,
};

use crate::config::SyncSettings;
use crate::store::{
    NewKey,
    NewTranslation,
    RemoteKeyDetail,
    StoreError,
    StoreErrorKind,
    TranslationStore,
};

use super::accumulate::NetChangeSet;

/// One key the store rejected during the create phase for a reason other
/// than "already exists".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFailure {
    pub name: String,
    pub reason: String,
}

/// Counts and key names observable after one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Canonical names of the keys actually created.
    pub created: Vec<String>,
    /// Number of per-translation updates written.
    pub updated: usize,
    /// Number of keys deleted remotely.
    pub deleted: usize,
    /// (key, language) pairs dropped because the remote value already
    /// matched the staged one.
    pub skipped: usize,
    /// Create rejections surfaced to the caller.
    pub failed: Vec<CreateFailure>,
}

impl SyncReport {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Applies a [`NetChangeSet`] to the remote store with minimal writes.
///
/// Phases run strictly in order: create, then update, then delete. The
/// create phase is a hard predecessor of the update phase because keys
/// rejected as duplicates are reclassified into the update worklist.
#[derive(Debug)]
pub struct Reconciler<'a, S: TranslationStore + ?Sized> {
    store: &'a S,
    settings: &'a SyncSettings,
}

impl<'a, S: TranslationStore + ?Sized> Reconciler<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, settings: &'a SyncSettings) -> Self {
        Self { store, settings }
    }

    /// Run all three phases.
    ///
    /// Re-running with an unchanged change set against an already-reconciled
    /// store performs zero writes: creates fail as duplicates and fall back
    /// to updates, updates are pruned as already-matching, deletes miss
    /// their lookup and are treated as satisfied.
    ///
    /// # Errors
    /// - [`StoreError`] on transport-level failures; per-key create
    ///   rejections are reported, not raised
    pub async fn reconcile(&self, mut changes: NetChangeSet) -> Result<SyncReport, StoreError> {
        let mut report = SyncReport::default();

        self.create_phase(&mut changes, &mut report).await?;
        self.update_phase(&mut changes, &mut report).await?;
        self.delete_phase(&changes, &mut report).await?;

        Ok(report)
    }

    /// Phase 1: submit every staged create in one batched call.
    ///
    /// Duplicates stay in the update worklist (their value was mirrored
    /// there at accumulation time); keys created successfully leave it.
    async fn create_phase(
        &self,
        changes: &mut NetChangeSet,
        report: &mut SyncReport,
    ) -> Result<(), StoreError> {
        if changes.to_create.is_empty() {
            return Ok(());
        }

        let requests: Vec<NewKey> = changes
            .to_create
            .iter()
            .map(|(name, languages)| self.build_new_key(name, languages))
            .collect();

        tracing::info!(count = requests.len(), "Creating keys");
        let result = self.store.create_keys(&self.settings.project_id, requests).await?;

        for key in result.created {
            // Only the languages the create carried are satisfied; an edit
            // staged for another language still needs the update phase.
            if let Some(created_languages) = changes.to_create.get(&key.name)
                && let Some(staged) = changes.to_update.get_mut(&key.name)
            {
                staged.retain(|language, _| !created_languages.contains_key(language));
                if staged.is_empty() {
                    changes.to_update.remove(&key.name);
                }
            }
            report.created.push(key.name);
        }

        for error in result.errors {
            match error.kind {
                StoreErrorKind::AlreadyExists => {
                    // Reclassified: the staged value is already waiting in
                    // the update worklist.
                    tracing::debug!(key = %error.name, "Key exists remotely, falling back to update");
                }
                StoreErrorKind::Rejected => {
                    tracing::warn!(key = %error.name, reason = %error.message, "Key creation rejected");
                    changes.to_update.remove(&error.name);
                    report
                        .failed
                        .push(CreateFailure { name: error.name, reason: error.message });
                }
            }
        }

        Ok(())
    }

    /// Phase 2: fetch remote state for the worklist in one batched query,
    /// prune no-op pairs, and write the rest concurrently.
    async fn update_phase(
        &self,
        changes: &mut NetChangeSet,
        report: &mut SyncReport,
    ) -> Result<(), StoreError> {
        // Updating a key the delete phase is about to remove would be a
        // wasted write.
        let to_delete = &changes.to_delete;
        changes.to_update.retain(|name, _| !to_delete.contains(name));

        if changes.to_update.is_empty() {
            return Ok(());
        }

        let names: Vec<String> = changes.to_update.keys().cloned().collect();
        let details = self.store.keys_with_translations(&self.settings.project_id, &names).await?;
        let by_name: BTreeMap<&str, &RemoteKeyDetail> =
            details.iter().map(|detail| (detail.name.as_str(), detail)).collect();

        let mut pending: Vec<(u64, String)> = Vec::new();
        for (name, languages) in &changes.to_update {
            let Some(detail) = by_name.get(name.as_str()) else {
                tracing::debug!(key = %name, "Key absent remotely, nothing to update");
                continue;
            };
            for (language, staged) in languages {
                match detail.translation_for(language) {
                    Some(translation) if translation.value == *staged => {
                        // Already applied; a rerun must not resurface it.
                        report.skipped += 1;
                    }
                    Some(translation) => {
                        pending.push((translation.translation_id, staged.clone()));
                    }
                    None => {
                        tracing::warn!(key = %name, language = %language, "No remote translation slot for language");
                    }
                }
            }
        }

        if pending.is_empty() {
            return Ok(());
        }

        tracing::info!(count = pending.len(), "Updating translations");
        let project_id = self.settings.project_id.as_str();
        let store = self.store;
        let mut results = stream::iter(pending.into_iter().map(|(translation_id, value)| async move {
            store.update_translation(project_id, translation_id, &value).await
        }))
        .buffer_unordered(self.settings.effective_concurrency());

        while let Some(result) = results.next().await {
            result?;
            report.updated += 1;
        }

        Ok(())
    }

    /// Phase 3: resolve remote ids for the delete set and issue one bulk
    /// delete. Keys missing remotely are already deleted.
    async fn delete_phase(
        &self,
        changes: &NetChangeSet,
        report: &mut SyncReport,
    ) -> Result<(), StoreError> {
        if changes.to_delete.is_empty() {
            return Ok(());
        }

        let names: Vec<String> = changes.to_delete.iter().cloned().collect();
        let details = self.store.keys_with_translations(&self.settings.project_id, &names).await?;

        let found: Vec<&str> = details.iter().map(|detail| detail.name.as_str()).collect();
        for name in &changes.to_delete {
            if !found.contains(&name.as_str()) {
                tracing::debug!(key = %name, "Key already absent remotely");
            }
        }

        let key_ids: Vec<u64> = details.iter().map(|detail| detail.key_id).collect();
        if key_ids.is_empty() {
            return Ok(());
        }

        tracing::info!(count = key_ids.len(), "Deleting keys");
        self.store.bulk_delete_keys(&self.settings.project_id, &key_ids).await?;
        report.deleted = key_ids.len();

        Ok(())
    }

    /// Assemble the batched-create entry for one key.
    fn build_new_key(&self, name: &str, languages: &BTreeMap<String, String>) -> NewKey {
        NewKey {
            name: name.to_string(),
            platforms: vec![self.settings.platform.clone()],
            translations: languages
                .iter()
                .map(|(language, value)| NewTranslation {
                    language: language.clone(),
                    value: value.clone(),
                })
                .collect(),
            filenames: [(self.settings.platform.clone(), self.settings.filename.clone())]
                .into_iter()
                .collect(),
            tags: self.settings.vcs_ref.iter().cloned().collect(),
        }
    }
}
