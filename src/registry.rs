//! Repository source registry.
//!
//! Holds the list of remote repositories agent definitions are fetched from,
//! persisted as a YAML document. Every mutating operation re-validates its
//! input and writes the full registry back to disk immediately, so the state
//! surviving a crash is always the last successful mutation.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

/// One remote repository that agent definition documents are fetched from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepositorySource {
    /// Unique key within the registry.
    pub name: String,
    pub url: String,
    /// Lower priority is scanned first.
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
}

fn default_priority() -> i64 {
    1
}
fn default_enabled() -> bool {
    true
}

/// Partial update applied by [`RepositoryRegistry::update`].
#[derive(Debug, Clone, Default)]
pub struct SourceUpdate {
    pub url: Option<String>,
    pub priority: Option<i64>,
    pub enabled: Option<bool>,
    pub description: Option<String>,
}

/// On-disk registry document shape.
#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    version: String,
    repositories: Vec<RepositorySource>,
}

/// Registry of known repository sources with YAML persistence.
#[derive(Debug)]
pub struct RepositoryRegistry {
    path: PathBuf,
    sources: Vec<RepositorySource>,
}

fn default_sources() -> Vec<RepositorySource> {
    vec![
        RepositorySource {
            name: "community-agents".to_string(),
            url: "https://github.com/agent-scout/community-agents".to_string(),
            priority: 1,
            enabled: true,
            description: "Community-maintained agent definitions".to_string(),
        },
        RepositorySource {
            name: "universal-agents".to_string(),
            url: "https://github.com/agent-scout/universal-agents".to_string(),
            priority: 2,
            enabled: true,
            description: "Universal agents for common development tasks".to_string(),
        },
    ]
}

/// Returns `true` if the URL has an http/https scheme and a non-empty host.
pub fn is_valid_repository_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().map_or(false, |h| !h.is_empty())
        }
        Err(_) => false,
    }
}

impl RepositoryRegistry {
    /// Load the registry from `path`.
    ///
    /// A missing file seeds the built-in default sources and creates the
    /// file. A file that is not valid YAML is a configuration error. Entries
    /// failing validation are dropped with a warning; if none survive, the
    /// defaults are used.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            let registry = Self {
                path,
                sources: default_sources(),
            };
            registry.save()?;
            info!(path = %registry.path.display(), "Created default repository registry");
            return Ok(registry);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read repository registry: {}", path.display()))?;

        let file: RegistryFile = serde_yaml::from_str(&content)
            .with_context(|| "Invalid repository configuration: YAML parse error")?;

        let mut sources = Vec::new();
        for source in file.repositories {
            if source.name.is_empty() || !is_valid_repository_url(&source.url) {
                warn!(name = %source.name, url = %source.url, "Dropping invalid repository entry");
                continue;
            }
            sources.push(source);
        }

        if sources.is_empty() {
            sources = default_sources();
        }

        Ok(Self { path, sources })
    }

    /// Add a new repository, failing on an invalid URL or duplicate name/url.
    pub fn add(
        &mut self,
        url: &str,
        name: &str,
        priority: i64,
        description: &str,
        enabled: bool,
    ) -> Result<()> {
        if !is_valid_repository_url(url) {
            bail!("Repository URL is invalid: {}", url);
        }
        if self.sources.iter().any(|s| s.name == name || s.url == url) {
            bail!("Repository already exists: {} ({})", name, url);
        }

        self.sources.push(RepositorySource {
            name: name.to_string(),
            url: url.to_string(),
            priority,
            enabled,
            description: description.to_string(),
        });
        self.save()?;
        debug!(name, url, "Added repository");
        Ok(())
    }

    /// Remove a repository by name. Returns whether it was found.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let before = self.sources.len();
        self.sources.retain(|s| s.name != name);

        if self.sources.len() < before {
            self.save()?;
            debug!(name, "Removed repository");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Apply a partial update to a repository by name, re-validating any URL
    /// change. Returns whether the repository was found.
    pub fn update(&mut self, name: &str, changes: SourceUpdate) -> Result<bool> {
        if let Some(ref url) = changes.url {
            if !is_valid_repository_url(url) {
                bail!("Repository URL is invalid: {}", url);
            }
        }

        let Some(source) = self.sources.iter_mut().find(|s| s.name == name) else {
            return Ok(false);
        };

        if let Some(url) = changes.url {
            source.url = url;
        }
        if let Some(priority) = changes.priority {
            source.priority = priority;
        }
        if let Some(enabled) = changes.enabled {
            source.enabled = enabled;
        }
        if let Some(description) = changes.description {
            source.description = description;
        }

        self.save()?;
        debug!(name, "Updated repository");
        Ok(true)
    }

    /// Enabled repositories sorted ascending by priority.
    pub fn enabled_sources(&self) -> Vec<RepositorySource> {
        let mut enabled: Vec<RepositorySource> = self
            .sources
            .iter()
            .filter(|s| s.enabled)
            .cloned()
            .collect();
        enabled.sort_by_key(|s| s.priority);
        enabled
    }

    /// All registered repositories in insertion order.
    pub fn sources(&self) -> &[RepositorySource] {
        &self.sources
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create registry directory: {}", parent.display())
            })?;
        }

        let file = RegistryFile {
            version: "1.0".to_string(),
            repositories: self.sources.clone(),
        };
        let content =
            serde_yaml::to_string(&file).with_context(|| "Failed to serialize registry")?;

        std::fs::write(&self.path, content).with_context(|| {
            format!(
                "Failed to save repository registry: {}",
                self.path.display()
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry_in(tmp: &TempDir) -> RepositoryRegistry {
        RepositoryRegistry::load(tmp.path().join("repositories.yaml")).unwrap()
    }

    #[test]
    fn missing_file_seeds_defaults_and_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("repositories.yaml");
        let registry = RepositoryRegistry::load(&path).unwrap();

        assert_eq!(registry.sources().len(), 2);
        assert!(path.exists());

        // Reload reads the persisted defaults back.
        let reloaded = RepositoryRegistry::load(&path).unwrap();
        assert_eq!(reloaded.sources(), registry.sources());
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("repositories.yaml");
        std::fs::write(&path, "repositories: [not: {valid").unwrap();

        let err = RepositoryRegistry::load(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid repository configuration"));
    }

    #[test]
    fn add_rejects_invalid_url() {
        let tmp = TempDir::new().unwrap();
        let mut registry = registry_in(&tmp);
        assert!(registry.add("ftp://example.com/x", "r1", 1, "", true).is_err());
        assert!(registry.add("not a url", "r2", 1, "", true).is_err());
    }

    #[test]
    fn add_rejects_duplicate_name_and_leaves_registry_unchanged() {
        let tmp = TempDir::new().unwrap();
        let mut registry = registry_in(&tmp);
        registry.add("https://x/y", "r1", 1, "", true).unwrap();
        let before = registry.sources().len();

        assert!(registry.add("https://x/z", "r1", 2, "", true).is_err());
        assert_eq!(registry.sources().len(), before);
    }

    #[test]
    fn remove_reports_found() {
        let tmp = TempDir::new().unwrap();
        let mut registry = registry_in(&tmp);
        registry.add("https://x/y", "r1", 1, "", true).unwrap();

        assert!(registry.remove("r1").unwrap());
        assert!(!registry.remove("r1").unwrap());
    }

    #[test]
    fn update_revalidates_url() {
        let tmp = TempDir::new().unwrap();
        let mut registry = registry_in(&tmp);
        registry.add("https://x/y", "r1", 1, "", true).unwrap();

        let bad = SourceUpdate {
            url: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(registry.update("r1", bad).is_err());

        let good = SourceUpdate {
            priority: Some(9),
            enabled: Some(false),
            ..Default::default()
        };
        assert!(registry.update("r1", good).unwrap());
        let source = registry.sources().iter().find(|s| s.name == "r1").unwrap();
        assert_eq!(source.priority, 9);
        assert!(!source.enabled);
    }

    #[test]
    fn enabled_sources_sorted_by_priority() {
        let tmp = TempDir::new().unwrap();
        let mut registry = registry_in(&tmp);
        registry.remove("community-agents").unwrap();
        registry.remove("universal-agents").unwrap();
        registry.add("https://a/1", "low", 5, "", true).unwrap();
        registry.add("https://a/2", "high", 1, "", true).unwrap();
        registry.add("https://a/3", "off", 0, "", false).unwrap();

        let enabled = registry.enabled_sources();
        let names: Vec<&str> = enabled.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["high", "low"]);
    }

    #[test]
    fn mutations_survive_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("repositories.yaml");
        {
            let mut registry = RepositoryRegistry::load(&path).unwrap();
            registry.add("https://x/y", "r1", 3, "mine", true).unwrap();
        }
        let reloaded = RepositoryRegistry::load(&path).unwrap();
        assert!(reloaded.sources().iter().any(|s| s.name == "r1"));
    }
}
