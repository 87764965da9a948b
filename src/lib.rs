//! i18n-history-sync
//!
//! 翻訳ファイルの git 履歴からリモート翻訳ストアを同期するエンジン
//!
//! The engine walks a commit range, extracts the structural changes made to
//! each per-language translation file, collapses them into one net
//! create/update/delete decision per key, and applies that decision set to
//! the remote store with minimal, idempotent writes.

pub mod cli;
pub mod config;
pub mod engine;
pub mod format;
pub mod history;
pub mod store;

pub use config::SyncSettings;
pub use engine::{
    SyncError,
    SyncOutcome,
    SyncReport,
};
