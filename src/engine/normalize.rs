//! Canonical key normalization.

use crate::config::SyncSettings;

/// Maps format-specific raw keys to canonical flat keys.
///
/// Hierarchical formats replace the path separator with a delimiter that is
/// safe as a flat identifier in the remote store; flat formats pass keys
/// through unchanged. Normalization is total and deterministic.
#[derive(Debug, Clone)]
pub struct KeyNormalizer {
    /// Whether the source format carries path separators at all.
    hierarchical: bool,
    /// Path separator inside raw keys.
    separator: String,
    /// Replacement delimiter in canonical keys.
    delimiter: String,
}

impl KeyNormalizer {
    #[must_use]
    pub fn new(hierarchical: bool, separator: impl Into<String>, delimiter: impl Into<String>) -> Self {
        Self { hierarchical, separator: separator.into(), delimiter: delimiter.into() }
    }

    #[must_use]
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self::new(
            settings.format.is_hierarchical(),
            settings.key_separator.clone(),
            settings.flat_delimiter.clone(),
        )
    }

    /// Canonical flat key for a raw key.
    #[must_use]
    pub fn normalize(&self, raw_key: &str) -> String {
        if self.hierarchical {
            raw_key.replace(&self.separator, &self.delimiter)
        } else {
            raw_key.to_string()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    #[case("a.b", "a::b")]
    #[case("a.b.c", "a::b::c")]
    #[case("plain", "plain")]
    #[case("", "")]
    fn normalize_hierarchical(#[case] raw: &str, #[case] expected: &str) {
        let normalizer = KeyNormalizer::new(true, ".", "::");

        assert_that!(normalizer.normalize(raw), eq(expected));
    }

    #[rstest]
    fn normalize_flat_is_identity() {
        let normalizer = KeyNormalizer::new(false, ".", "::");

        assert_that!(normalizer.normalize("a.b"), eq("a.b"));
    }

    #[rstest]
    fn normalize_is_deterministic() {
        let normalizer = KeyNormalizer::new(true, ".", "::");

        assert_that!(normalizer.normalize("x.y"), eq(&normalizer.normalize("x.y")));
    }
}
