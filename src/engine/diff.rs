//! Structural diffing of translation documents.

use std::collections::{
    HashMap,
    HashSet,
};

use crate::format::TranslationDocument;

/// Net structural change between two snapshots of one language file.
///
/// A key appears in at most one of the three parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralDelta {
    /// Keys present only in the current snapshot, with their new values.
    pub added: HashMap<String, String>,
    /// Keys present only in the previous snapshot.
    pub removed: HashSet<String>,
    /// Keys present in both with differing values, as (old, new).
    pub edited: HashMap<String, (String, String)>,
}

impl StructuralDelta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.edited.is_empty()
    }
}

/// Compare two snapshots of the same language file.
///
/// Keys present in both documents with equal values are absent from the
/// delta. Two documents holding identical pairs yield an identical delta
/// regardless of insertion order.
#[must_use]
pub fn diff(previous: &TranslationDocument, current: &TranslationDocument) -> StructuralDelta {
    let mut delta = StructuralDelta::default();

    for (key, value) in current {
        match previous.get(key) {
            None => {
                delta.added.insert(key.clone(), value.clone());
            }
            Some(old) if old != value => {
                delta.edited.insert(key.clone(), (old.clone(), value.clone()));
            }
            Some(_) => {}
        }
    }

    for key in previous.keys() {
        if !current.contains_key(key) {
            delta.removed.insert(key.clone());
        }
    }

    delta
}
