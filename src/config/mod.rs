//! 設定モジュール

mod loader;
mod types;

use std::path::Path;

pub use types::{
    ConfigError,
    LANG_ISO_PLACEHOLDER,
    MergeCommitPolicy,
    SyncSettings,
    ValidationError,
};

/// Load settings for a workspace and validate them.
///
/// Falls back to [`SyncSettings::default`] when no configuration file is
/// present.
///
/// # Errors
/// - File read or JSON parse error
/// - Validation error
pub fn load(workspace_root: &Path) -> Result<SyncSettings, ConfigError> {
    let settings =
        loader::load_from_workspace(workspace_root)?.map_or_else(SyncSettings::default, |ws| {
            tracing::debug!("Loaded workspace settings: {:?}", ws);
            ws
        });

    settings.validate().map_err(ConfigError::ValidationErrors)?;

    Ok(settings)
}
