//! コマンドラインインターフェース

use std::path::PathBuf;

use clap::{
    Parser,
    Subcommand,
};

/// Keep a remote translation store in sync with version-controlled language
/// files.
#[derive(Debug, Parser)]
#[command(name = "i18n-sync", version, about)]
pub struct Cli {
    /// Workspace root holding `.i18n-sync.json` and the language files.
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Translation store API token.
    #[arg(long, env = "I18N_SYNC_STORE_TOKEN", hide_env_values = true)]
    pub store_token: String,

    /// Commit history service API token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub history_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile the remote store with a commit range.
    Sync {
        /// Base ref, exclusive.
        #[arg(long)]
        base: String,

        /// Head ref, inclusive.
        #[arg(long)]
        head: String,
    },

    /// Push every local key absent remotely (no history diffing).
    Push,
}
