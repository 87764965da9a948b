//! GitHub REST API backed commit history.

use std::future::Future;

use async_trait::async_trait;
use reqwest::{
    Client,
    Response,
    StatusCode,
    header,
};
use serde::Deserialize;

use super::{
    Commit,
    CommitHistory,
    HistoryError,
};

/// Default API endpoint.
const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Commits requested per page of the compare endpoint.
const COMMITS_PER_PAGE: usize = 100;

/// Files the single-commit endpoint reports per page.
const FILES_PER_PAGE: usize = 300;

/// [`CommitHistory`] implementation over the GitHub REST v3 API.
#[derive(Debug, Clone)]
pub struct GithubHistory {
    client: Client,
    base_url: String,
    /// `owner/name` slug.
    repository: String,
    token: Option<String>,
}

/// Compare endpoint response.
#[derive(Debug, Deserialize)]
struct CompareResponse {
    commits: Vec<CommitEntry>,
}

/// One commit in the compare response.
#[derive(Debug, Deserialize)]
struct CommitEntry {
    sha: String,
    parents: Vec<ParentEntry>,
}

/// Parent reference of a commit.
#[derive(Debug, Deserialize)]
struct ParentEntry {
    sha: String,
}

/// Single-commit endpoint response, reduced to the changed-file list.
#[derive(Debug, Deserialize)]
struct CommitDetailResponse {
    #[serde(default)]
    files: Vec<FileEntry>,
}

/// One changed file of a commit.
#[derive(Debug, Deserialize)]
struct FileEntry {
    filename: String,
}

impl GithubHistory {
    #[must_use]
    pub fn new(repository: impl Into<String>, token: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, repository, token)
    }

    /// Point the client at a different endpoint (GitHub Enterprise, tests).
    #[must_use]
    pub fn with_base_url(
        base_url: impl Into<String>,
        repository: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            repository: repository.into(),
            token,
        }
    }

    /// Issue a GET with the standard headers applied.
    async fn get(&self, path: &str, accept: &str) -> Result<Response, HistoryError> {
        let mut request = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header(header::ACCEPT, accept)
            .header(header::USER_AGENT, "i18n-history-sync");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        check_status(request.send().await?)
    }
}

/// Fetch pages until one comes back short of `page_size`.
///
/// Both history endpoints cap their arrays per response, so a single read
/// would silently truncate a large range or a large commit. Stopping at the
/// first short page drains everything without an extra request in the
/// common single-page case.
async fn drain_pages<T, F, Fut>(page_size: usize, mut fetch: F) -> Result<Vec<T>, HistoryError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, HistoryError>>,
{
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let batch = fetch(page).await?;
        let batch_len = batch.len();
        items.extend(batch);
        if batch_len < page_size {
            break;
        }
        page += 1;
    }
    Ok(items)
}

/// Map response status onto the error taxonomy.
fn check_status(response: Response) -> Result<Response, HistoryError> {
    match response.status() {
        StatusCode::NOT_FOUND => Err(HistoryError::NotFound),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Err(HistoryError::Unavailable(
            "rate limited or forbidden by the API".to_string(),
        )),
        status if !status.is_success() => {
            Err(HistoryError::Unavailable(format!("unexpected status {status}")))
        }
        _ => Ok(response),
    }
}

#[async_trait]
impl CommitHistory for GithubHistory {
    async fn commits_ahead(&self, base: &str, head: &str) -> Result<Vec<Commit>, HistoryError> {
        let entries = drain_pages(COMMITS_PER_PAGE, |page| {
            let path = format!(
                "/repos/{}/compare/{base}...{head}?per_page={COMMITS_PER_PAGE}&page={page}",
                self.repository
            );
            async move {
                let response = self.get(&path, "application/vnd.github+json").await?;
                let compare: CompareResponse = response.json().await?;
                Ok(compare.commits)
            }
        })
        .await?;

        // The compare endpoint lists commits oldest first.
        Ok(entries
            .into_iter()
            .map(|entry| Commit {
                sha: entry.sha,
                parent: entry.parents.first().map(|parent| parent.sha.clone()),
                parent_count: entry.parents.len(),
            })
            .collect())
    }

    async fn changed_files(&self, sha: &str) -> Result<Vec<String>, HistoryError> {
        let files = drain_pages(FILES_PER_PAGE, |page| {
            let path = format!("/repos/{}/commits/{sha}?page={page}", self.repository);
            async move {
                let response = self.get(&path, "application/vnd.github+json").await?;
                let detail: CommitDetailResponse = response.json().await?;
                Ok(detail.files)
            }
        })
        .await?;

        Ok(files.into_iter().map(|file| file.filename).collect())
    }

    async fn file_content_at(
        &self,
        path: &str,
        reference: &str,
    ) -> Result<String, HistoryError> {
        let request_path = format!("/repos/{}/contents/{path}?ref={reference}", self.repository);
        let response = self.get(&request_path, "application/vnd.github.raw+json").await?;

        Ok(response.text().await?)
    }
}
