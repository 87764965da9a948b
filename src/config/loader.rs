//! ワークスペース設定ファイルの探索と読み込み

use std::path::Path;

use super::{
    ConfigError,
    SyncSettings,
};

/// Per-workspace configuration file name.
const CONFIG_FILE_NAME: &str = ".i18n-sync.json";

/// Read the sync settings from the workspace root.
///
/// `Ok(None)` means no configuration file exists; the caller decides
/// whether defaults are acceptable.
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<SyncSettings>, ConfigError> {
    let path = workspace_root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No configuration file, using defaults");
        return Ok(None);
    }

    let raw = std::fs::read_to_string(&path)?;
    let settings = serde_json::from_str(&raw)?;
    tracing::debug!(path = %path.display(), "Configuration loaded");

    Ok(Some(settings))
}
