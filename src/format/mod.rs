//! 言語ファイルのパース

mod json;
mod properties;

use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// One language file's content at one point in history.
///
/// Raw keys map to translated strings; keys are unique within a document and
/// ordering carries no meaning.
pub type TranslationDocument = HashMap<String, String>;

/// Supported language file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Nested JSON, flattened into separator-joined keys.
    #[default]
    Json,
    /// Java-style `.properties`, already flat.
    Properties,
}

impl FileFormat {
    /// Whether keys of this format carry path separators that need
    /// normalization into a flat identifier.
    #[must_use]
    pub const fn is_hierarchical(self) -> bool {
        matches!(self, Self::Json)
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Top-level JSON value must be an object")]
    NotAnObject,
}

/// Parse raw file content into a [`TranslationDocument`].
///
/// `separator` joins nested segments for hierarchical formats and is ignored
/// for flat ones.
///
/// # Errors
/// - Malformed input for the given format
pub fn parse(
    format: FileFormat,
    raw: &str,
    separator: &str,
) -> Result<TranslationDocument, ParseError> {
    match format {
        FileFormat::Json => json::parse(raw, separator),
        FileFormat::Properties => Ok(properties::parse(raw)),
    }
}
