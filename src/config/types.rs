//! Sync settings and validation.

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::format::FileFormat;

/// Placeholder inside [`SyncSettings::filename`] that marks the language code.
pub const LANG_ISO_PLACEHOLDER: &str = "%LANG_ISO%";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "filename")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Render the collected validation errors as a numbered list.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// How merge commits in the compared range are treated.
///
/// The history walk cannot tell whether a merge commit's diff repeats work
/// already seen on the first-parent chain, so the behavior is a policy
/// rather than a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MergeCommitPolicy {
    /// Ignore merge commits entirely.
    #[default]
    Skip,
    /// Diff the merge result against its first parent, like any other commit.
    FirstParent,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Remote translation store project identifier.
    pub project_id: String,

    /// Repository slug (`owner/name`) queried for commit history.
    pub repository: String,

    /// Directory holding the language files, relative to the repository root.
    pub directory: String,

    /// File name pattern containing [`LANG_ISO_PLACEHOLDER`]
    /// (e.g., `%LANG_ISO%.json`).
    pub filename: String,

    pub format: FileFormat,

    /// Platform the keys are attached to in the remote store.
    pub platform: String,

    /// Path separator inside hierarchical keys (e.g., `.` in `a.b`).
    pub key_separator: String,

    /// Delimiter replacing [`Self::key_separator`] in canonical flat keys.
    pub flat_delimiter: String,

    /// VCS ref used to tag created keys, if any.
    #[serde(rename = "ref")]
    pub vcs_ref: Option<String>,

    pub merge_commits: MergeCommitPolicy,

    /// In-flight remote call cap.
    /// Default: 80% of CPU cores (minimum 1).
    pub concurrency: Option<usize>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            repository: String::new(),
            directory: "locales".to_string(),
            filename: format!("{LANG_ISO_PLACEHOLDER}.json"),
            format: FileFormat::default(),
            platform: "web".to_string(),
            key_separator: ".".to_string(),
            flat_delimiter: "::".to_string(),
            vcs_ref: None,
            merge_commits: MergeCommitPolicy::default(),
            concurrency: None,
        }
    }
}

impl SyncSettings {
    /// # Errors
    /// - Required field is empty
    /// - Filename pattern misses the language placeholder
    /// - Colliding separator and delimiter
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.project_id.is_empty() {
            errors.push(ValidationError::new(
                "projectId",
                "The project id cannot be empty. Copy it from the project settings page",
            ));
        }

        if !self.repository.contains('/')
            || self.repository.starts_with('/')
            || self.repository.ends_with('/')
        {
            errors.push(ValidationError::new(
                "repository",
                format!("Expected an 'owner/name' slug, got '{}'", self.repository),
            ));
        }

        if !self.filename.contains(LANG_ISO_PLACEHOLDER) {
            errors.push(ValidationError::new(
                "filename",
                format!(
                    "The pattern must contain {LANG_ISO_PLACEHOLDER}. Example: \"{LANG_ISO_PLACEHOLDER}.json\""
                ),
            ));
        }

        if self.platform.is_empty() {
            errors.push(ValidationError::new(
                "platform",
                "The platform cannot be empty. Example: \"web\"",
            ));
        }

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if self.flat_delimiter.is_empty() {
            errors.push(ValidationError::new(
                "flatDelimiter",
                "The delimiter cannot be empty. Please specify a delimiter, for example: \"::\"",
            ));
        } else if self.flat_delimiter == self.key_separator {
            errors.push(ValidationError::new(
                "flatDelimiter",
                "The delimiter must differ from the key separator, otherwise canonical keys collide",
            ));
        }

        if self.concurrency == Some(0) {
            errors.push(ValidationError::new(
                "concurrency",
                "The in-flight call cap must be at least 1",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Effective in-flight call cap.
    #[must_use]
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(|| (num_cpus::get().saturating_mul(4) / 5).max(1))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    /// Settings with the required fields filled in.
    fn valid_settings() -> SyncSettings {
        SyncSettings {
            project_id: "proj-123".to_string(),
            repository: "acme/webapp".to_string(),
            ..SyncSettings::default()
        }
    }

    #[rstest]
    fn validate_valid_settings() {
        let settings = valid_settings();

        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_partial_settings() {
        let json = r#"{"projectId": "proj-123", "repository": "acme/webapp"}"#;

        let settings: SyncSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.key_separator, eq("."));
        assert_that!(settings.flat_delimiter, eq("::"));
        assert_that!(settings.filename, eq("%LANG_ISO%.json"));
        assert_that!(settings.merge_commits, eq(MergeCommitPolicy::Skip));
    }

    #[rstest]
    fn deserialize_ref_and_merge_policy() {
        let json = r#"{"ref": "v1.2.0", "mergeCommits": "first-parent"}"#;

        let settings: SyncSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.vcs_ref, some(eq("v1.2.0")));
        assert_that!(settings.merge_commits, eq(MergeCommitPolicy::FirstParent));
    }

    #[rstest]
    fn validate_empty_project_id() {
        let settings = SyncSettings { project_id: String::new(), ..valid_settings() };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("projectId")),
                field!(ValidationError.message, contains_substring("cannot be empty"))
            ]])
        );
    }

    #[rstest]
    #[case("no-slash")]
    #[case("/leading")]
    #[case("trailing/")]
    fn validate_invalid_repository(#[case] slug: &str) {
        let settings = SyncSettings { repository: slug.to_string(), ..valid_settings() };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![field!(ValidationError.field_path, eq("repository"))])
        );
    }

    #[rstest]
    fn validate_filename_without_placeholder() {
        let settings = SyncSettings { filename: "en.json".to_string(), ..valid_settings() };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("filename")),
                field!(ValidationError.message, contains_substring("%LANG_ISO%"))
            ]])
        );
    }

    #[rstest]
    fn validate_colliding_delimiter() {
        let settings = SyncSettings {
            key_separator: "::".to_string(),
            flat_delimiter: "::".to_string(),
            ..valid_settings()
        };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("flatDelimiter")),
                field!(ValidationError.message, contains_substring("must differ"))
            ]])
        );
    }

    #[rstest]
    fn validate_zero_concurrency() {
        let settings = SyncSettings { concurrency: Some(0), ..valid_settings() };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![field!(ValidationError.field_path, eq("concurrency"))])
        );
    }

    #[rstest]
    fn effective_concurrency_is_never_zero() {
        let settings = valid_settings();

        assert_that!(settings.effective_concurrency(), ge(1_usize));
    }

    #[rstest]
    fn config_error_validation_errors_format() {
        let settings = SyncSettings {
            project_id: String::new(),
            repository: String::new(),
            ..SyncSettings::default()
        };

        let errors = settings.validate().unwrap_err();
        let config_error = ConfigError::ValidationErrors(errors);

        let error_message = format!("{config_error}");
        assert_that!(error_message, contains_substring("Configuration validation failed"));
        assert_that!(error_message, contains_substring("1. projectId"));
        assert_that!(error_message, contains_substring("2. repository"));
    }
}
