//! コミット履歴サービスのインターフェース

pub mod extractor;
mod github;

pub use github::GithubHistory;

use async_trait::async_trait;
use thiserror::Error;

/// One commit in the compared range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    /// First parent, `None` for an initial commit.
    pub parent: Option<String>,
    /// Total parent count, used for merge detection.
    pub parent_count: usize,
}

impl Commit {
    #[must_use]
    pub const fn is_merge(&self) -> bool {
        self.parent_count > 1
    }
}

#[derive(Error, Debug)]
pub enum HistoryError {
    /// The path does not exist at the requested ref.
    #[error("Path not found at ref")]
    NotFound,

    #[error("Commit history service unavailable: {0}")]
    Unavailable(String),

    #[error("Commit history request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response from commit history service: {0}")]
    Decode(String),
}

/// Read access to the version-control history, the single source of truth
/// for what should exist remotely.
#[async_trait]
pub trait CommitHistory: Send + Sync {
    /// Commits in `(base, head]`, oldest first.
    async fn commits_ahead(&self, base: &str, head: &str) -> Result<Vec<Commit>, HistoryError>;

    /// Paths touched by one commit.
    async fn changed_files(&self, sha: &str) -> Result<Vec<String>, HistoryError>;

    /// Raw file content at a ref.
    ///
    /// # Errors
    /// - [`HistoryError::NotFound`] when the path does not exist at that ref
    async fn file_content_at(&self, path: &str, reference: &str)
    -> Result<String, HistoryError>;
}
