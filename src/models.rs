//! Core data types used throughout agent-scout.
//!
//! These types represent the agent definitions, scored matches, and
//! scan/sync summaries that flow through the discovery and ranking pipeline.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Default capability assigned when a definition document declares none.
pub const DEFAULT_CAPABILITY: &str = "General development assistance";

/// How demanding a project (or an agent's target project) is expected to be.
///
/// The four tiers form an ordinal scale used by the compatibility scorer:
/// adjacent tiers are partial matches, distant tiers are poor matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Simple,
    #[default]
    Moderate,
    Complex,
    Enterprise,
}

impl ComplexityLevel {
    /// Ordinal rank on the simple=1 … enterprise=4 scale.
    pub fn rank(self) -> u8 {
        match self {
            ComplexityLevel::Simple => 1,
            ComplexityLevel::Moderate => 2,
            ComplexityLevel::Complex => 3,
            ComplexityLevel::Enterprise => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComplexityLevel::Simple => "simple",
            ComplexityLevel::Moderate => "moderate",
            ComplexityLevel::Complex => "complex",
            ComplexityLevel::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplexityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(ComplexityLevel::Simple),
            "moderate" => Ok(ComplexityLevel::Moderate),
            "complex" => Ok(ComplexityLevel::Complex),
            "enterprise" => Ok(ComplexityLevel::Enterprise),
            other => bail!("Unknown complexity level: '{}'", other),
        }
    }
}

/// Parsed agent definition from a repository document.
///
/// Definitions are immutable after construction: the parser builds one,
/// `validated()` gates it, and from then on it is shared as
/// `Arc<AgentDefinition>` by the cache, the index, and scored matches.
/// Updates are entry replacement, never in-place edits.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDefinition {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub use_cases: Vec<String>,
    pub dependencies: Vec<String>,
    pub trigger_keywords: Vec<String>,
    pub framework_compatibility: Vec<String>,
    pub language_compatibility: Vec<String>,
    pub complexity: ComplexityLevel,
    /// Completeness heuristic in [0.0, 1.0] assigned by the parser.
    pub confidence_score: f64,
    pub source_url: String,
    pub repository_name: String,
}

impl AgentDefinition {
    /// Validate the definition and apply field defaults.
    ///
    /// Fails on an empty name or description; an empty capability list is
    /// coerced to the single [`DEFAULT_CAPABILITY`] sentinel.
    pub fn validated(mut self) -> Result<Self> {
        if self.name.trim().is_empty() {
            bail!("Agent name cannot be empty");
        }
        if self.description.trim().is_empty() {
            bail!("Agent description cannot be empty");
        }
        if self.capabilities.is_empty() {
            self.capabilities.push(DEFAULT_CAPABILITY.to_string());
        }
        Ok(self)
    }
}

/// An agent paired with its compatibility score for a specific project.
#[derive(Debug, Clone)]
pub struct CompatibleAgent {
    pub agent: Arc<AgentDefinition>,
    pub compatibility_score: f64,
    /// Human-readable factors that matched, e.g. `"Language: python"`.
    pub matching_criteria: Vec<String>,
    /// Per-factor sub-scores keyed by factor name.
    pub confidence_factors: HashMap<String, f64>,
}

impl CompatibleAgent {
    /// Construct a scored match, rejecting scores outside [0.0, 1.0].
    pub fn new(
        agent: Arc<AgentDefinition>,
        compatibility_score: f64,
        matching_criteria: Vec<String>,
        confidence_factors: HashMap<String, f64>,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&compatibility_score) {
            bail!(
                "Compatibility score must be between 0.0 and 1.0, got {}",
                compatibility_score
            );
        }
        Ok(Self {
            agent,
            compatibility_score,
            matching_criteria,
            confidence_factors,
        })
    }
}

/// Summary of one repository scanning operation.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub total_agents: u64,
    pub successful_parses: u64,
    pub failed_parses: u64,
    pub repositories_scanned: u64,
    pub scan_duration: Duration,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ScanResult {
    /// Fold another result's counters and messages into this one.
    pub fn merge(&mut self, other: ScanResult) {
        self.total_agents += other.total_agents;
        self.successful_parses += other.successful_parses;
        self.failed_parses += other.failed_parses;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Summary of one repository synchronization operation.
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    pub updated_repositories: u64,
    pub new_agents: u64,
    pub sync_duration: Duration,
    pub errors: Vec<String>,
}

/// Detected characteristics of the project being matched against.
///
/// Supplied read-only by the host's project analyzer; consumed by the
/// compatibility scorer and the index search.
#[derive(Debug, Clone, Default)]
pub struct ProjectProfile {
    pub language: Option<String>,
    pub framework: Option<String>,
    pub domain: Option<String>,
    pub complexity: ComplexityLevel,
    pub project_type: Option<String>,
    pub architecture: Option<String>,
    pub databases: Vec<String>,
    pub test_frameworks: Vec<String>,
}
