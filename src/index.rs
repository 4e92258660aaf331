//! In-memory capability index.
//!
//! A multi-dimensional reverse index over parsed agent definitions:
//! posting lists keyed by normalized language, framework, complexity tier,
//! trigger keyword, and domain labels synthesized from capability text.
//! Search intersects the supplied filters (AND semantics). The index itself
//! is append-only; the orchestrator builds a fresh instance per scan and
//! swaps it in, so served data never mutates in place.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::models::{AgentDefinition, ComplexityLevel};

/// Fixed capability-keyword → domain-label table used to synthesize domain
/// postings from free-text capabilities.
const DOMAIN_LABELS: &[(&[&str], &str)] = &[
    (&["web", "frontend", "backend", "full-stack"], "web development"),
    (&["api", "rest", "graphql"], "api development"),
    (&["test", "testing", "qa"], "testing"),
    (&["deploy", "deployment", "devops", "ci/cd"], "deployment"),
    (&["database", "sql", "nosql"], "database"),
    (&["mobile", "ios", "android"], "mobile development"),
    (&["data", "analytics", "ml", "ai"], "data science"),
];

/// Search filters; `None`/empty fields do not narrow the result.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub language: Option<String>,
    pub framework: Option<String>,
    pub domain: Option<String>,
    pub keywords: Vec<String>,
    pub complexity: Option<ComplexityLevel>,
}

impl SearchQuery {
    fn is_empty(&self) -> bool {
        self.language.is_none()
            && self.framework.is_none()
            && self.domain.is_none()
            && self.keywords.is_empty()
            && self.complexity.is_none()
    }
}

/// Index statistics per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub total_agents: usize,
    pub languages: usize,
    pub frameworks: usize,
    pub domains: usize,
    pub complexity_levels: usize,
    pub keywords: usize,
}

/// Append-only reverse index over shared agent definitions.
///
/// Posting lists hold indices into the master list, so an agent indexed
/// under several keys is still a single shared definition.
#[derive(Debug, Default)]
pub struct CapabilityIndex {
    agents: Vec<Arc<AgentDefinition>>,
    by_language: HashMap<String, Vec<usize>>,
    by_framework: HashMap<String, Vec<usize>>,
    by_domain: HashMap<String, Vec<usize>>,
    by_complexity: HashMap<ComplexityLevel, Vec<usize>>,
    by_keyword: HashMap<String, Vec<usize>>,
}

impl CapabilityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an agent to the master list and every applicable posting list.
    pub fn insert(&mut self, agent: Arc<AgentDefinition>) {
        let id = self.agents.len();

        for language in &agent.language_compatibility {
            self.by_language
                .entry(normalize(language))
                .or_default()
                .push(id);
        }
        for framework in &agent.framework_compatibility {
            self.by_framework
                .entry(normalize(framework))
                .or_default()
                .push(id);
        }
        self.by_complexity
            .entry(agent.complexity)
            .or_default()
            .push(id);
        for keyword in &agent.trigger_keywords {
            self.by_keyword
                .entry(normalize(keyword))
                .or_default()
                .push(id);
        }

        // Capabilities feed the domain dimension through the fixed lookup
        // table; synthesized labels double as keywords.
        for capability in &agent.capabilities {
            for label in domain_labels_for(capability) {
                self.by_domain.entry(label.to_string()).or_default().push(id);
                self.by_keyword.entry(label.to_string()).or_default().push(id);
            }
        }

        self.agents.push(agent);
    }

    /// Search with AND semantics across all supplied filters.
    ///
    /// No filters returns the full master list. Each filter narrows the
    /// candidate set by intersection with its posting list; an empty
    /// intersection at any stage yields an empty result.
    pub fn search(&self, query: &SearchQuery) -> Vec<Arc<AgentDefinition>> {
        if query.is_empty() {
            return self.agents.clone();
        }

        let mut candidates: HashSet<usize> = (0..self.agents.len()).collect();

        if let Some(ref language) = query.language {
            intersect(&mut candidates, self.by_language.get(&normalize(language)));
        }
        if let Some(ref framework) = query.framework {
            intersect(
                &mut candidates,
                self.by_framework.get(&normalize(framework)),
            );
        }
        if let Some(ref domain) = query.domain {
            intersect(&mut candidates, self.by_domain.get(&normalize(domain)));
        }
        if let Some(complexity) = query.complexity {
            intersect(&mut candidates, self.by_complexity.get(&complexity));
        }
        if !query.keywords.is_empty() {
            // A keyword filter is satisfied by any of its keywords.
            let mut matched: HashSet<usize> = HashSet::new();
            for keyword in &query.keywords {
                if let Some(ids) = self.by_keyword.get(&normalize(keyword)) {
                    matched.extend(ids.iter().copied());
                }
            }
            candidates.retain(|id| matched.contains(id));
        }

        let mut ids: Vec<usize> = candidates.into_iter().collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| self.agents[id].clone()).collect()
    }

    /// The full master list in insertion order.
    pub fn all_agents(&self) -> Vec<Arc<AgentDefinition>> {
        self.agents.clone()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_agents: self.agents.len(),
            languages: self.by_language.len(),
            frameworks: self.by_framework.len(),
            domains: self.by_domain.len(),
            complexity_levels: self.by_complexity.len(),
            keywords: self.by_keyword.len(),
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn intersect(candidates: &mut HashSet<usize>, posting: Option<&Vec<usize>>) {
    match posting {
        Some(ids) => {
            let ids: HashSet<usize> = ids.iter().copied().collect();
            candidates.retain(|id| ids.contains(id));
        }
        None => candidates.clear(),
    }
}

/// Domain labels whose keyword set matches the capability text.
fn domain_labels_for(capability: &str) -> Vec<&'static str> {
    let text = capability.to_lowercase();
    DOMAIN_LABELS
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(_, label)| *label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComplexityLevel;

    fn agent(name: &str, languages: &[&str], frameworks: &[&str], caps: &[&str]) -> Arc<AgentDefinition> {
        Arc::new(
            AgentDefinition {
                name: name.to_string(),
                description: format!("{name} description"),
                capabilities: caps.iter().map(|s| s.to_string()).collect(),
                use_cases: Vec::new(),
                dependencies: Vec::new(),
                trigger_keywords: vec![name.to_lowercase()],
                framework_compatibility: frameworks.iter().map(|s| s.to_string()).collect(),
                language_compatibility: languages.iter().map(|s| s.to_string()).collect(),
                complexity: ComplexityLevel::Moderate,
                confidence_score: 0.8,
                source_url: format!("https://github.com/acme/agents/{name}.md"),
                repository_name: "acme/agents".to_string(),
            }
            .validated()
            .unwrap(),
        )
    }

    fn populated() -> CapabilityIndex {
        let mut index = CapabilityIndex::new();
        index.insert(agent("Django", &["Python"], &["django"], &["Backend API design"]));
        index.insert(agent("React", &["typescript", "javascript"], &["react"], &["Frontend work"]));
        index.insert(agent("Ops", &[], &[], &["Deployment pipelines"]));
        index
    }

    #[test]
    fn empty_query_returns_all() {
        let index = populated();
        assert_eq!(index.search(&SearchQuery::default()).len(), 3);
    }

    #[test]
    fn language_lookup_is_case_insensitive() {
        let index = populated();
        let query = SearchQuery {
            language: Some("PYTHON".to_string()),
            ..Default::default()
        };
        let hits = index.search(&query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Django");
    }

    #[test]
    fn unmatched_filter_yields_empty() {
        let index = populated();
        let query = SearchQuery {
            language: Some("nomatch".to_string()),
            ..Default::default()
        };
        assert!(index.search(&query).is_empty());
    }

    #[test]
    fn filters_intersect_not_union() {
        let index = populated();
        // Language matches Django, framework matches React: AND -> empty.
        let query = SearchQuery {
            language: Some("python".to_string()),
            framework: Some("react".to_string()),
            ..Default::default()
        };
        assert!(index.search(&query).is_empty());
    }

    #[test]
    fn capabilities_synthesize_domain_postings() {
        let index = populated();
        let query = SearchQuery {
            domain: Some("api development".to_string()),
            ..Default::default()
        };
        let hits = index.search(&query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Django");

        let query = SearchQuery {
            domain: Some("deployment".to_string()),
            ..Default::default()
        };
        assert_eq!(index.search(&query)[0].name, "Ops");
    }

    #[test]
    fn keyword_filter_matches_any_keyword() {
        let index = populated();
        let query = SearchQuery {
            keywords: vec!["django".to_string(), "react".to_string()],
            ..Default::default()
        };
        assert_eq!(index.search(&query).len(), 2);
    }

    #[test]
    fn stats_count_dimensions() {
        let index = populated();
        let stats = index.stats();
        assert_eq!(stats.total_agents, 3);
        assert_eq!(stats.languages, 3); // python, typescript, javascript
        assert_eq!(stats.frameworks, 2);
        assert_eq!(stats.complexity_levels, 1);
    }
}
