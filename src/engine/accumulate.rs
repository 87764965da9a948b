//! Folding per-commit deltas into a net change set.

use std::collections::{
    BTreeMap,
    BTreeSet,
};

use super::diff::StructuralDelta;
use super::normalize::KeyNormalizer;

/// The collapsed, per-run decision of which keys to create, update, or
/// delete, after folding all intermediate history.
///
/// Creates and updates are keyed by canonical key, then by language.
/// Deletion is per-key: the remote store attaches one key to every
/// configured language, so removing it anywhere removes it everywhere.
///
/// Every staged create is mirrored into the update map, so that a create
/// which later fails as a duplicate already has its value staged for the
/// update fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetChangeSet {
    /// canonical key -> language -> value
    pub to_create: BTreeMap<String, BTreeMap<String, String>>,
    /// canonical key -> language -> value
    pub to_update: BTreeMap<String, BTreeMap<String, String>>,
    /// canonical keys to delete, language-agnostic
    pub to_delete: BTreeSet<String>,
}

impl NetChangeSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Stage a key for creation, mirroring the value into the update map.
    pub fn stage_create(&mut self, key: &str, language: &str, value: &str) {
        self.to_create
            .entry(key.to_string())
            .or_default()
            .insert(language.to_string(), value.to_string());
        self.to_update
            .entry(key.to_string())
            .or_default()
            .insert(language.to_string(), value.to_string());
    }

    /// Fold one commit's delta for one language into the change set.
    ///
    /// The last delta touching a key decides where it ends up; intermediate
    /// edits only contribute their final value.
    #[must_use]
    pub fn apply(mut self, language: &str, delta: &StructuralDelta, normalizer: &KeyNormalizer) -> Self {
        for (raw_key, value) in &delta.added {
            self.apply_added(&normalizer.normalize(raw_key), language, value);
        }
        for (raw_key, (_, new_value)) in &delta.edited {
            self.apply_edited(&normalizer.normalize(raw_key), language, new_value);
        }
        for raw_key in &delta.removed {
            self.apply_removed(&normalizer.normalize(raw_key), language);
        }
        self
    }

    /// A key (re)appeared in this language's file.
    fn apply_added(&mut self, key: &str, language: &str, value: &str) {
        // Recreated within the window: the earlier deletion no longer holds.
        self.to_delete.remove(key);

        if self.pending_create(key, language) {
            self.overwrite_create(key, language, value);
        } else if self.pending_update(key, language) {
            // Deleted then re-added for a key that predates the range:
            // net effect is an update, not a create.
            self.overwrite_update(key, language, value);
        } else {
            self.stage_create(key, language, value);
        }
    }

    /// A key's value changed in this language's file.
    fn apply_edited(&mut self, key: &str, language: &str, new_value: &str) {
        if self.pending_create(key, language) {
            // The create has not shipped yet; only its final value matters.
            self.overwrite_create(key, language, new_value);
        } else {
            self.overwrite_update(key, language, new_value);
        }
    }

    /// A key disappeared from this language's file.
    fn apply_removed(&mut self, key: &str, language: &str) {
        if self.pending_create(key, language) {
            // Created then deleted within the window nets to nothing for
            // this language.
            Self::discard(&mut self.to_create, key, language);
            Self::discard(&mut self.to_update, key, language);
        }
        self.to_delete.insert(key.to_string());
    }

    fn pending_create(&self, key: &str, language: &str) -> bool {
        self.to_create.get(key).is_some_and(|langs| langs.contains_key(language))
    }

    fn pending_update(&self, key: &str, language: &str) -> bool {
        self.to_update.get(key).is_some_and(|langs| langs.contains_key(language))
    }

    /// Overwrite a staged create's value, keeping the update mirror in sync.
    fn overwrite_create(&mut self, key: &str, language: &str, value: &str) {
        self.stage_create(key, language, value);
    }

    fn overwrite_update(&mut self, key: &str, language: &str, value: &str) {
        self.to_update
            .entry(key.to_string())
            .or_default()
            .insert(language.to_string(), value.to_string());
    }

    /// Drop one (key, language) pair, pruning the key once no language is
    /// left.
    fn discard(map: &mut BTreeMap<String, BTreeMap<String, String>>, key: &str, language: &str) {
        if let Some(langs) = map.get_mut(key) {
            langs.remove(language);
            if langs.is_empty() {
                map.remove(key);
            }
        }
    }
}

/// Fold ordered per-language delta sequences into one [`NetChangeSet`].
///
/// Sequences are processed in commit order, oldest first; languages are
/// independent and only merge within a key.
#[must_use]
pub fn accumulate(
    sequences: &BTreeMap<String, Vec<StructuralDelta>>,
    normalizer: &KeyNormalizer,
) -> NetChangeSet {
    let mut changes = NetChangeSet::default();
    for (language, deltas) in sequences {
        for delta in deltas {
            changes = changes.apply(language, delta, normalizer);
        }
    }
    changes
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::matchers::is_empty as empty;
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    fn normalizer() -> KeyNormalizer {
        KeyNormalizer::new(true, ".", "::")
    }

    fn added(key: &str, value: &str) -> StructuralDelta {
        StructuralDelta {
            added: [(key.to_string(), value.to_string())].into_iter().collect(),
            ..StructuralDelta::default()
        }
    }

    fn edited(key: &str, old: &str, new: &str) -> StructuralDelta {
        StructuralDelta {
            edited: [(key.to_string(), (old.to_string(), new.to_string()))]
                .into_iter()
                .collect(),
            ..StructuralDelta::default()
        }
    }

    fn removed(key: &str) -> StructuralDelta {
        StructuralDelta {
            removed: [key.to_string()].into_iter().collect(),
            ..StructuralDelta::default()
        }
    }

    fn fold(language: &str, deltas: Vec<StructuralDelta>) -> NetChangeSet {
        let sequences = [(language.to_string(), deltas)].into_iter().collect();
        accumulate(&sequences, &normalizer())
    }

    #[rstest]
    fn added_key_is_staged_as_create_and_mirrored_as_update() {
        let changes = fold("en", vec![added("a.b", "Hello")]);

        assert_that!(changes.to_create.get("a::b").and_then(|l| l.get("en")), some(eq("Hello")));
        assert_that!(changes.to_update.get("a::b").and_then(|l| l.get("en")), some(eq("Hello")));
        assert_that!(changes.to_delete, empty());
    }

    #[rstest]
    fn create_then_edit_collapses_to_one_create_with_final_value() {
        let changes = fold("en", vec![added("k", "a"), edited("k", "a", "b")]);

        assert_that!(changes.to_create.get("k").and_then(|l| l.get("en")), some(eq("b")));
        assert_that!(changes.to_update.get("k").and_then(|l| l.get("en")), some(eq("b")));
    }

    #[rstest]
    fn add_edit_remove_nets_to_delete_only() {
        let changes =
            fold("en", vec![added("k", "a"), edited("k", "a", "b"), removed("k")]);

        assert_that!(changes.to_create.contains_key("k"), eq(false));
        assert_that!(changes.to_update.contains_key("k"), eq(false));
        assert_that!(changes.to_delete, unordered_elements_are![eq("k")]);
    }

    #[rstest]
    fn edit_without_prior_create_stages_update() {
        let changes = fold("en", vec![edited("a.b", "Hello", "Hi")]);

        assert_that!(changes.to_create.contains_key("a::b"), eq(false));
        assert_that!(changes.to_update.get("a::b").and_then(|l| l.get("en")), some(eq("Hi")));
    }

    #[rstest]
    fn successive_edits_keep_only_the_final_value() {
        let changes =
            fold("en", vec![edited("k", "a", "b"), edited("k", "b", "c")]);

        assert_that!(changes.to_update.get("k").and_then(|l| l.get("en")), some(eq("c")));
    }

    #[rstest]
    fn remove_without_prior_create_keeps_pending_update_and_deletes() {
        // The key predates the range: an earlier edit stays staged, the
        // removal still wins at the key level.
        let changes = fold("en", vec![edited("k", "a", "b"), removed("k")]);

        assert_that!(changes.to_delete, unordered_elements_are![eq("k")]);
    }

    #[rstest]
    fn remove_then_re_add_cancels_the_deletion() {
        let changes = fold("en", vec![removed("k"), added("k", "back")]);

        assert_that!(changes.to_delete, empty());
        assert_that!(changes.to_update.get("k").and_then(|l| l.get("en")), some(eq("back")));
    }

    #[rstest]
    fn removal_of_pending_create_nets_to_nothing_for_that_language() {
        let changes = fold("en", vec![added("k", "a"), removed("k")]);

        assert_that!(changes.to_create.contains_key("k"), eq(false));
        assert_that!(changes.to_update.contains_key("k"), eq(false));
    }

    #[rstest]
    fn languages_merge_within_a_key() {
        let sequences = [
            ("en".to_string(), vec![added("k", "Hello")]),
            ("fr".to_string(), vec![added("k", "Bonjour")]),
        ]
        .into_iter()
        .collect();

        let changes = accumulate(&sequences, &normalizer());

        let langs = changes.to_create.get("k").unwrap();
        assert_that!(langs.get("en"), some(eq("Hello")));
        assert_that!(langs.get("fr"), some(eq("Bonjour")));
    }

    #[rstest]
    fn keys_are_normalized_before_merging() {
        let changes = fold("en", vec![added("menu.file.open", "Open")]);

        assert_that!(changes.to_create.contains_key("menu::file::open"), eq(true));
    }
}
