//! Time-bounded agent definition cache.
//!
//! Keyed by document source URL so unchanged documents are not re-parsed.
//! All operations run under one mutex over the backing map; critical
//! sections are O(1) map operations, so contention stays negligible under
//! the orchestrator's parallel fan-out. Expiry is computed lazily on read
//! and during the periodic sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::models::AgentDefinition;

/// Fixed time-to-live for cached definitions.
const CACHE_TTL_HOURS: i64 = 6;

/// One cached definition with bookkeeping metadata.
///
/// The ETag / Last-Modified values are carried for observability only;
/// conditional refetching is the fetch collaborator's concern.
#[derive(Debug, Clone)]
struct CacheEntry {
    agent: Arc<AgentDefinition>,
    cached_at: DateTime<Utc>,
    source_etag: Option<String>,
    source_last_modified: Option<String>,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.cached_at > ttl
    }
}

/// Cache statistics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Mutex-guarded TTL cache over agent definitions.
#[derive(Debug)]
pub struct DefinitionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for DefinitionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionCache {
    /// Cache with the standard 6-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(CACHE_TTL_HOURS))
    }

    /// Cache with a custom TTL. Exists so tests can exercise expiry.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a cached definition, lazily deleting it when expired.
    pub fn get(&self, source_url: &str) -> Option<Arc<AgentDefinition>> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");

        match entries.get(source_url) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                debug!(source_url, "Cache hit");
                Some(entry.agent.clone())
            }
            Some(_) => {
                debug!(source_url, "Cache expired");
                entries.remove(source_url);
                None
            }
            None => None,
        }
    }

    /// Cache a definition with optional source metadata.
    pub fn set(
        &self,
        source_url: &str,
        agent: Arc<AgentDefinition>,
        etag: Option<String>,
        last_modified: Option<String>,
    ) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        debug!(source_url, agent = %agent.name, "Cached agent definition");
        entries.insert(
            source_url.to_string(),
            CacheEntry {
                agent,
                cached_at: Utc::now(),
                source_etag: etag,
                source_last_modified: last_modified,
            },
        );
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, source_url: &str) -> bool {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let removed = entries.remove(source_url).is_some();
        if removed {
            debug!(source_url, "Invalidated cache entry");
        }
        removed
    }

    /// Drop all entries, returning how many were held.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let count = entries.len();
        entries.clear();
        info!(count, "Cleared agent definition cache");
        count
    }

    /// Sweep out expired entries, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl));
        let removed = before - entries.len();
        if removed > 0 {
            info!(removed, "Cleaned up expired cache entries");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().expect("cache lock poisoned");
        let total_entries = entries.len();
        let expired_entries = entries
            .values()
            .filter(|entry| entry.is_expired(self.ttl))
            .count();
        CacheStats {
            total_entries,
            expired_entries,
            active_entries: total_entries - expired_entries,
        }
    }

    /// Source metadata for one entry, if cached: (etag, last_modified).
    pub fn source_metadata(&self, source_url: &str) -> Option<(Option<String>, Option<String>)> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        entries
            .get(source_url)
            .map(|e| (e.source_etag.clone(), e.source_last_modified.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComplexityLevel;

    fn agent(name: &str) -> Arc<AgentDefinition> {
        Arc::new(
            AgentDefinition {
                name: name.to_string(),
                description: "A test agent".to_string(),
                capabilities: Vec::new(),
                use_cases: Vec::new(),
                dependencies: Vec::new(),
                trigger_keywords: Vec::new(),
                framework_compatibility: Vec::new(),
                language_compatibility: Vec::new(),
                complexity: ComplexityLevel::Moderate,
                confidence_score: 0.5,
                source_url: "https://x/a.md".to_string(),
                repository_name: "x".to_string(),
            }
            .validated()
            .unwrap(),
        )
    }

    #[test]
    fn round_trip_preserves_name() {
        let cache = DefinitionCache::new();
        cache.set("https://x/a.md", agent("cached-agent"), None, None);

        let hit = cache.get("https://x/a.md").unwrap();
        assert_eq!(hit.name, "cached-agent");
    }

    #[test]
    fn expired_entry_is_lazily_deleted_on_get() {
        let cache = DefinitionCache::with_ttl(Duration::zero());
        cache.set("https://x/a.md", agent("stale"), None, None);
        std::thread::sleep(std::time::Duration::from_millis(2));

        assert!(cache.get("https://x/a.md").is_none());
        // Lazy deletion already removed it.
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn cleanup_expired_counts_exactly_the_expired() {
        let cache = DefinitionCache::with_ttl(Duration::zero());
        cache.set("https://x/a.md", agent("stale"), None, None);
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.cleanup_expired(), 0);
    }

    #[test]
    fn invalidate_reports_presence() {
        let cache = DefinitionCache::new();
        cache.set("https://x/a.md", agent("a"), None, None);

        assert!(cache.invalidate("https://x/a.md"));
        assert!(!cache.invalidate("https://x/a.md"));
    }

    #[test]
    fn clear_returns_count() {
        let cache = DefinitionCache::new();
        cache.set("https://x/a.md", agent("a"), None, None);
        cache.set("https://x/b.md", agent("b"), None, None);

        assert_eq!(cache.clear(), 2);
        assert!(cache.get("https://x/a.md").is_none());
    }

    #[test]
    fn metadata_is_kept_for_observability() {
        let cache = DefinitionCache::new();
        cache.set(
            "https://x/a.md",
            agent("a"),
            Some("etag-1".to_string()),
            Some("Tue, 01 Jan 2030 00:00:00 GMT".to_string()),
        );

        let (etag, last_modified) = cache.source_metadata("https://x/a.md").unwrap();
        assert_eq!(etag.as_deref(), Some("etag-1"));
        assert!(last_modified.is_some());
    }

    #[test]
    fn stats_split_active_and_expired() {
        let cache = DefinitionCache::new();
        cache.set("https://x/a.md", agent("a"), None, None);
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.active_entries, 1);
        assert_eq!(stats.expired_entries, 0);
    }
}
