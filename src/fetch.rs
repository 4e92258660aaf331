//! Document fetching seam.
//!
//! The network client that lists and downloads agent definition documents is
//! an external collaborator. Implement [`DocumentFetcher`] to plug a real
//! client (or a test double) into the [`crate::scanner::ScanOrchestrator`];
//! fetch failures surface as errors that the orchestrator converts to
//! per-repository error strings without aborting the overall scan.

use anyhow::Result;
use async_trait::async_trait;

/// One raw document retrieved from a repository, before parsing.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Display name, typically the file name within the repository.
    pub name: String,
    /// Raw markdown content.
    pub content: String,
    /// Canonical URL of this document; doubles as the cache key.
    pub source_url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// Repository metadata reported by the fetch collaborator.
#[derive(Debug, Clone)]
pub struct RepositoryInfo {
    pub full_name: String,
    pub description: String,
    pub default_branch: String,
    pub updated_at: Option<String>,
}

/// Retrieves agent definition documents from a remote repository.
///
/// Called on the tokio runtime from the orchestrator's worker tasks, so
/// implementations must be `Send + Sync` and may perform network I/O.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// List and download every agent definition document in the repository.
    async fn fetch_repository_documents(&self, repo_url: &str) -> Result<Vec<FetchedDocument>>;

    /// Repository metadata, or `None` when the repository cannot be resolved.
    async fn repository_info(&self, repo_url: &str) -> Result<Option<RepositoryInfo>>;
}
