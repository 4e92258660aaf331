//! Repository scan orchestration.
//!
//! Coordinates the full discovery flow: registry → fetch → parse → cache →
//! index. Repositories fan out onto a bounded worker pool, and each
//! repository fans out a second, narrower pool over its documents, so the
//! worst case concurrency is the product of the two widths. One bad document
//! never aborts its repository's scan, and one bad repository never aborts
//! the overall scan: per-unit failures become error strings in the returned
//! result.
//!
//! A single operation lock serializes top-level `scan`/`sync` entry per
//! orchestrator instance. It is not held across the per-unit fetch and parse
//! work, which stays fully parallel.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStats, DefinitionCache};
use crate::fetch::{DocumentFetcher, FetchedDocument};
use crate::index::{CapabilityIndex, IndexStats, SearchQuery};
use crate::models::{AgentDefinition, CompatibleAgent, ProjectProfile, ScanResult, SyncResult};
use crate::parser;
use crate::registry::{RepositoryRegistry, RepositorySource};
use crate::scorer::CompatibilityScorer;

/// Default width of the repository-level worker pool.
const REPOSITORY_WORKERS: usize = 4;
/// Default width of the per-repository document worker pool.
const DOCUMENT_WORKERS: usize = 2;
/// Default aggregate timeout for one repository's fetch and parse work.
const REPOSITORY_TIMEOUT: Duration = Duration::from_secs(30);
/// Default timeout for parsing one document.
const PARSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Combined cache and index statistics.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorStats {
    pub cache: CacheStats,
    pub index: IndexStats,
}

/// Outcome of one repository's scan: parsed agents plus its partial result.
struct RepoScan {
    agents: Vec<Arc<AgentDefinition>>,
    result: ScanResult,
}

/// Outcome of one document's parse attempt.
enum DocumentOutcome {
    Parsed(Arc<AgentDefinition>),
    NotAnAgent,
    Failed(String),
}

/// Top-level coordinator for repository scanning, syncing, and matching.
pub struct ScanOrchestrator {
    registry: RepositoryRegistry,
    fetcher: Arc<dyn DocumentFetcher>,
    cache: Arc<DefinitionCache>,
    index: Mutex<CapabilityIndex>,
    scorer: CompatibilityScorer,
    op_lock: tokio::sync::Mutex<()>,
    repository_workers: usize,
    document_workers: usize,
    repository_timeout: Duration,
    parse_timeout: Duration,
}

impl ScanOrchestrator {
    pub fn new(registry: RepositoryRegistry, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            registry,
            fetcher,
            cache: Arc::new(DefinitionCache::new()),
            index: Mutex::new(CapabilityIndex::new()),
            scorer: CompatibilityScorer::new(),
            op_lock: tokio::sync::Mutex::new(()),
            repository_workers: REPOSITORY_WORKERS,
            document_workers: DOCUMENT_WORKERS,
            repository_timeout: REPOSITORY_TIMEOUT,
            parse_timeout: PARSE_TIMEOUT,
        }
    }

    /// Override the repository-level pool width (primarily for tests).
    pub fn with_repository_workers(mut self, workers: usize) -> Self {
        self.repository_workers = workers.max(1);
        self
    }

    /// Override the per-repository document pool width.
    pub fn with_document_workers(mut self, workers: usize) -> Self {
        self.document_workers = workers.max(1);
        self
    }

    /// Override the per-repository and per-document timeouts. Exists so
    /// tests can exercise the timeout paths without waiting out the
    /// defaults.
    pub fn with_timeouts(mut self, repository: Duration, parse: Duration) -> Self {
        self.repository_timeout = repository;
        self.parse_timeout = parse;
        self
    }

    /// Replace the default cache, e.g. with a short-TTL one in tests.
    pub fn with_cache(mut self, cache: DefinitionCache) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    pub fn registry(&self) -> &RepositoryRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RepositoryRegistry {
        &mut self.registry
    }

    /// Scan all enabled repositories, feeding successful parses into a
    /// freshly built index that replaces the served one at the end. Partial
    /// failures are collected, never propagated.
    pub async fn scan(&self, force_refresh: bool) -> ScanResult {
        let _guard = self.op_lock.lock().await;
        let started = Instant::now();
        let mut result = ScanResult::default();

        // Best-effort expiry sweep; logged inside, never fatal.
        self.cache.cleanup_expired();

        let enabled = self.registry.enabled_sources();
        result.repositories_scanned = enabled.len() as u64;

        if enabled.is_empty() {
            warn!("No enabled repositories found for scanning");
            result.scan_duration = started.elapsed();
            return result;
        }

        let mut new_index = CapabilityIndex::new();

        let semaphore = Arc::new(Semaphore::new(self.repository_workers));
        let mut tasks: JoinSet<(String, Option<RepoScan>)> = JoinSet::new();

        let document_workers = self.document_workers;
        let repository_timeout = self.repository_timeout;
        let parse_timeout = self.parse_timeout;

        for repo in enabled {
            let fetcher = self.fetcher.clone();
            let cache = self.cache.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("repository pool semaphore closed");
                let name = repo.name.clone();
                let scan = timeout(
                    repository_timeout,
                    scan_repository(
                        fetcher,
                        cache,
                        repo,
                        force_refresh,
                        document_workers,
                        parse_timeout,
                    ),
                )
                .await
                .ok();
                (name, scan)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Some(repo_scan))) => {
                    result.merge(repo_scan.result);
                    for agent in repo_scan.agents {
                        new_index.insert(agent);
                    }
                }
                Ok((name, None)) => {
                    let message = format!("Repository scan timeout for {name}");
                    error!("{message}");
                    result.errors.push(message);
                }
                Err(join_error) => {
                    let message = format!("Repository scan task failed: {join_error}");
                    error!("{message}");
                    result.errors.push(message);
                }
            }
        }

        *self.index.lock().expect("index lock poisoned") = new_index;

        result.scan_duration = started.elapsed();
        info!(
            duration = ?result.scan_duration,
            successful = result.successful_parses,
            failed = result.failed_parses,
            "Scan completed"
        );
        result
    }

    /// Rank indexed agents against a project snapshot.
    ///
    /// Queries the index with the project's characteristics, falls back to
    /// the full agent list when the filtered query matches nothing, skips
    /// candidates whose scoring fails, and returns the top `limit` by
    /// descending score (agent name breaks ties deterministically).
    pub fn find_compatible_agents(
        &self,
        project: &ProjectProfile,
        limit: usize,
    ) -> Vec<CompatibleAgent> {
        let query = SearchQuery {
            language: project.language.clone(),
            framework: project.framework.clone(),
            domain: project.domain.clone(),
            keywords: Vec::new(),
            complexity: Some(project.complexity),
        };

        let candidates = {
            let index = self.index.lock().expect("index lock poisoned");
            let filtered = index.search(&query);
            if filtered.is_empty() {
                index.all_agents()
            } else {
                filtered
            }
        };

        let mut scored: Vec<CompatibleAgent> = candidates
            .iter()
            .filter_map(|agent| match self.scorer.score(agent, project) {
                Ok(compatible) => Some(compatible),
                Err(e) => {
                    debug!(agent = %agent.name, "Skipping candidate that failed scoring: {e}");
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.compatibility_score
                .partial_cmp(&a.compatibility_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.agent.name.cmp(&b.agent.name))
        });
        scored.truncate(limit);
        scored
    }

    /// Re-fetch and re-parse every enabled repository with the cache
    /// bypassed, reporting repository- and agent-level counts. Like `scan`,
    /// the served index is replaced wholesale at the end.
    pub async fn sync_repositories(&self) -> SyncResult {
        let _guard = self.op_lock.lock().await;
        let started = Instant::now();
        let mut result = SyncResult::default();
        let mut new_index = CapabilityIndex::new();

        info!("Starting repository synchronization");

        for repo in self.registry.enabled_sources() {
            match self.fetcher.repository_info(&repo.url).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    result
                        .errors
                        .push(format!("Could not fetch repository info for {}", repo.name));
                    continue;
                }
                Err(e) => {
                    let message = format!("Failed to sync repository {}: {e}", repo.name);
                    error!("{message}");
                    result.errors.push(message);
                    continue;
                }
            }

            let repo_scan = match timeout(
                self.repository_timeout,
                scan_repository(
                    self.fetcher.clone(),
                    self.cache.clone(),
                    repo.clone(),
                    true,
                    self.document_workers,
                    self.parse_timeout,
                ),
            )
            .await
            {
                Ok(scan) => scan,
                Err(_) => {
                    result
                        .errors
                        .push(format!("Repository sync timeout for {}", repo.name));
                    continue;
                }
            };

            result.updated_repositories += 1;
            result.new_agents += repo_scan.result.successful_parses;
            result.errors.extend(repo_scan.result.errors);

            for agent in repo_scan.agents {
                new_index.insert(agent);
            }
        }

        *self.index.lock().expect("index lock poisoned") = new_index;

        result.sync_duration = started.elapsed();
        info!(
            duration = ?result.sync_duration,
            repositories = result.updated_repositories,
            agents = result.new_agents,
            "Sync completed"
        );
        result
    }

    /// Drop all cached definitions, returning how many were held. The index
    /// is left untouched: it holds actively served data.
    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    pub fn stats(&self) -> OrchestratorStats {
        OrchestratorStats {
            cache: self.cache.stats(),
            index: self.index.lock().expect("index lock poisoned").stats(),
        }
    }
}

/// Fetch one repository's documents and parse them on a bounded pool.
async fn scan_repository(
    fetcher: Arc<dyn DocumentFetcher>,
    cache: Arc<DefinitionCache>,
    repo: RepositorySource,
    force_refresh: bool,
    document_workers: usize,
    parse_timeout: Duration,
) -> RepoScan {
    let mut result = ScanResult::default();
    let mut agents = Vec::new();

    info!(repository = %repo.name, "Scanning repository");

    let documents = match fetcher.fetch_repository_documents(&repo.url).await {
        Ok(documents) => documents,
        Err(e) => {
            let message = format!("Repository scan failed for {}: {e}", repo.name);
            error!("{message}");
            result.errors.push(message);
            return RepoScan { agents, result };
        }
    };

    result.total_agents = documents.len() as u64;
    if documents.is_empty() {
        result
            .warnings
            .push(format!("No agent files found in repository {}", repo.name));
        return RepoScan { agents, result };
    }

    let semaphore = Arc::new(Semaphore::new(document_workers));
    let mut tasks: JoinSet<DocumentOutcome> = JoinSet::new();

    for document in documents {
        let cache = cache.clone();
        let semaphore = semaphore.clone();
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("document pool semaphore closed");
            let name = document.name.clone();
            match timeout(parse_timeout, process_document(cache, document, force_refresh)).await {
                Ok(outcome) => outcome,
                // The abandoned parse finishes on its blocking thread; its
                // result is discarded.
                Err(_) => DocumentOutcome::Failed(format!("Parse timeout for {name}")),
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(DocumentOutcome::Parsed(agent)) => {
                result.successful_parses += 1;
                agents.push(agent);
            }
            Ok(DocumentOutcome::NotAnAgent) => {
                result.failed_parses += 1;
            }
            Ok(DocumentOutcome::Failed(message)) => {
                result.failed_parses += 1;
                result.errors.push(message);
            }
            Err(join_error) => {
                result.failed_parses += 1;
                result
                    .errors
                    .push(format!("Document task failed: {join_error}"));
            }
        }
    }

    RepoScan { agents, result }
}

/// Parse one document, consulting the cache first unless `force_refresh`.
async fn process_document(
    cache: Arc<DefinitionCache>,
    document: FetchedDocument,
    force_refresh: bool,
) -> DocumentOutcome {
    if !force_refresh {
        if let Some(agent) = cache.get(&document.source_url) {
            return DocumentOutcome::Parsed(agent);
        }
    }

    let FetchedDocument {
        name,
        content,
        source_url,
        etag,
        last_modified,
    } = document;

    let parse_url = source_url.clone();
    let parsed =
        tokio::task::spawn_blocking(move || parser::parse_agent_file(&content, &parse_url)).await;

    match parsed {
        Ok(Ok(Some(definition))) => {
            let agent = Arc::new(definition);
            cache.set(&source_url, agent.clone(), etag, last_modified);
            DocumentOutcome::Parsed(agent)
        }
        Ok(Ok(None)) => {
            debug!(document = %name, "Document is not an agent definition");
            DocumentOutcome::NotAnAgent
        }
        Ok(Err(e)) => DocumentOutcome::Failed(format!("Failed to parse {name}: {e}")),
        Err(join_error) => DocumentOutcome::Failed(format!("Failed to parse {name}: {join_error}")),
    }
}
