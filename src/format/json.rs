//! Nested JSON language files.

use serde_json::Value;

use super::{
    ParseError,
    TranslationDocument,
};

/// Parse a JSON language file and flatten it into separator-joined keys.
pub(super) fn parse(raw: &str, separator: &str) -> Result<TranslationDocument, ParseError> {
    let json: Value = serde_json::from_str(raw)?;
    if !json.is_object() {
        return Err(ParseError::NotAnObject);
    }

    let mut result = TranslationDocument::new();
    flatten_value(&json, separator, None, &mut result);
    Ok(result)
}

/// Recursively flatten a JSON value into `result`.
///
/// Objects join their keys with `separator`, arrays append `[index]`
/// segments, and non-string scalar leaves keep their JSON rendering.
fn flatten_value(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut TranslationDocument,
) {
    match json {
        Value::Object(map) => {
            for (key, value) in map {
                let full_key =
                    prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_value(value, separator, Some(&full_key), result);
            }
        }
        Value::Array(arr) => {
            for (index, value) in arr.iter().enumerate() {
                let full_key =
                    prefix.map_or_else(|| format!("[{index}]"), |p| format!("{p}[{index}]"));
                flatten_value(value, separator, Some(&full_key), result);
            }
        }
        Value::String(s) => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), s.clone());
            }
        }
        _ => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), json.to_string());
            }
        }
    }
}
