//! Agent-to-project compatibility scoring.
//!
//! Five independent sub-scores (language, framework, domain, complexity,
//! keyword), each in [0.0, 1.0], combined as a weighted sum and then
//! multiplied by the agent's parser-assigned confidence score, so a sparsely
//! documented agent can never outscore a well-documented one, even on a
//! perfect factor match. The weights and lookup tables are fixed heuristics
//! preserved for behavioral compatibility; scoring is fully deterministic.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use crate::models::{AgentDefinition, CompatibleAgent, ProjectProfile};

const LANGUAGE_WEIGHT: f64 = 0.30;
const FRAMEWORK_WEIGHT: f64 = 0.25;
const DOMAIN_WEIGHT: f64 = 0.20;
const COMPLEXITY_WEIGHT: f64 = 0.15;
const KEYWORD_WEIGHT: f64 = 0.10;

/// Threshold above which a sub-score counts as a matching criterion.
const MATCH_THRESHOLD: f64 = 0.5;

const NEUTRAL_SCORE: f64 = 0.5;
const HIGH_COMPATIBILITY_SCORE: f64 = 0.8;
const MODERATE_COMPATIBILITY_SCORE: f64 = 0.7;
const LOW_COMPATIBILITY_SCORE: f64 = 0.3;

/// Languages considered near-equivalent for compatibility purposes.
const COMPATIBLE_LANGUAGES: &[(&str, &[&str])] = &[
    ("typescript", &["javascript", "js", "ts"]),
    ("javascript", &["typescript", "js", "ts"]),
    ("python", &["py"]),
    ("c++", &["cpp", "cxx", "cc"]),
    ("c#", &["csharp", "cs"]),
];

/// Framework families: a framework and its close derivatives.
const FRAMEWORK_FAMILIES: &[(&str, &[&str])] = &[
    ("react", &["nextjs", "gatsby", "create-react-app"]),
    ("vue", &["nuxtjs", "vuetify"]),
    ("angular", &["angular-cli"]),
    ("django", &["django-rest-framework", "drf"]),
    ("fastapi", &["starlette"]),
    ("express", &["nestjs", "koa"]),
];

/// Per-domain keyword sets matched against capability and use-case text.
const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    ("web", &["web", "frontend", "backend", "http", "api", "browser"]),
    ("api", &["api", "rest", "graphql", "endpoint", "service"]),
    ("cli", &["cli", "command", "terminal", "console", "script"]),
    ("data", &["data", "analytics", "ml", "ai", "science", "pipeline"]),
    ("mobile", &["mobile", "ios", "android", "app"]),
    ("game", &["game", "gaming", "engine", "graphics"]),
];

/// Stateless compatibility scorer.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompatibilityScorer;

impl CompatibilityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score one agent against one project snapshot.
    pub fn score(
        &self,
        agent: &Arc<AgentDefinition>,
        project: &ProjectProfile,
    ) -> Result<CompatibleAgent> {
        let language = language_score(agent, project);
        let framework = framework_score(agent, project);
        let domain = domain_score(agent, project);
        let complexity = complexity_score(agent, project);
        let keywords = keyword_score(agent, project);

        // Matching criteria in fixed order: language, framework, domain,
        // complexity.
        let mut matching_criteria = Vec::new();
        if language > MATCH_THRESHOLD {
            if let Some(ref lang) = project.language {
                matching_criteria.push(format!("Language: {lang}"));
            }
        }
        if framework > MATCH_THRESHOLD {
            if let Some(ref fw) = project.framework {
                matching_criteria.push(format!("Framework: {fw}"));
            }
        }
        if domain > MATCH_THRESHOLD {
            if let Some(ref dom) = project.domain {
                matching_criteria.push(format!("Domain: {dom}"));
            }
        }
        if complexity > MATCH_THRESHOLD {
            matching_criteria.push(format!("Complexity: {}", project.complexity));
        }

        let weighted = language * LANGUAGE_WEIGHT
            + framework * FRAMEWORK_WEIGHT
            + domain * DOMAIN_WEIGHT
            + complexity * COMPLEXITY_WEIGHT
            + keywords * KEYWORD_WEIGHT;

        // Parser confidence acts as a global modifier.
        let final_score = (weighted * agent.confidence_score).min(1.0);

        let confidence_factors = HashMap::from([
            ("language".to_string(), language),
            ("framework".to_string(), framework),
            ("domain".to_string(), domain),
            ("complexity".to_string(), complexity),
            ("keywords".to_string(), keywords),
        ]);

        CompatibleAgent::new(agent.clone(), final_score, matching_criteria, confidence_factors)
    }
}

/// 1.0 exact, 0.8 via the synonym table, 0.5 neutral when either side has no
/// language signal, else 0.0.
fn language_score(agent: &AgentDefinition, project: &ProjectProfile) -> f64 {
    let Some(ref project_language) = project.language else {
        return NEUTRAL_SCORE;
    };
    if agent.language_compatibility.is_empty() {
        return NEUTRAL_SCORE;
    }

    let project_language = project_language.to_lowercase();

    for agent_language in &agent.language_compatibility {
        if agent_language.to_lowercase() == project_language {
            return 1.0;
        }
    }

    for agent_language in &agent.language_compatibility {
        let agent_language = agent_language.to_lowercase();
        if synonyms_for(&agent_language).contains(&project_language.as_str())
            || synonyms_for(&project_language).contains(&agent_language.as_str())
        {
            return HIGH_COMPATIBILITY_SCORE;
        }
    }

    0.0
}

/// Same pattern as [`language_score`] with the framework-family table and a
/// 0.7 family match.
fn framework_score(agent: &AgentDefinition, project: &ProjectProfile) -> f64 {
    let Some(ref project_framework) = project.framework else {
        return NEUTRAL_SCORE;
    };
    if agent.framework_compatibility.is_empty() {
        return NEUTRAL_SCORE;
    }

    let project_framework = project_framework.to_lowercase();

    for agent_framework in &agent.framework_compatibility {
        if agent_framework.to_lowercase() == project_framework {
            return 1.0;
        }
    }

    for agent_framework in &agent.framework_compatibility {
        let agent_framework = agent_framework.to_lowercase();
        if family_for(&agent_framework).contains(&project_framework.as_str())
            || family_for(&project_framework).contains(&agent_framework.as_str())
        {
            return MODERATE_COMPATIBILITY_SCORE;
        }
    }

    0.0
}

/// Fraction of the project domain's keyword set found as substrings of the
/// concatenated capability and use-case text; neutral without a detected
/// domain.
fn domain_score(agent: &AgentDefinition, project: &ProjectProfile) -> f64 {
    let Some(ref project_domain) = project.domain else {
        return NEUTRAL_SCORE;
    };
    let project_domain = project_domain.to_lowercase();

    let capability_text = agent
        .capabilities
        .iter()
        .chain(agent.use_cases.iter())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let Some((_, keywords)) = DOMAIN_KEYWORDS
        .iter()
        .find(|(domain, _)| *domain == project_domain)
    else {
        return 0.0;
    };

    let matches = keywords
        .iter()
        .filter(|kw| capability_text.contains(**kw))
        .count();
    (matches as f64 / keywords.len() as f64).min(1.0)
}

/// 1.0 on the same ordinal tier, 0.7 adjacent, 0.3 otherwise.
fn complexity_score(agent: &AgentDefinition, project: &ProjectProfile) -> f64 {
    let distance = agent
        .complexity
        .rank()
        .abs_diff(project.complexity.rank());
    match distance {
        0 => 1.0,
        1 => MODERATE_COMPATIBILITY_SCORE,
        _ => LOW_COMPATIBILITY_SCORE,
    }
}

/// Fraction of the agent's trigger keywords found as substrings of the
/// synthesized project context; neutral when the agent declares no keywords.
fn keyword_score(agent: &AgentDefinition, project: &ProjectProfile) -> f64 {
    if agent.trigger_keywords.is_empty() {
        return NEUTRAL_SCORE;
    }

    let mut context: Vec<String> = Vec::new();
    if let Some(ref framework) = project.framework {
        context.push(framework.to_lowercase());
    }
    if let Some(ref language) = project.language {
        context.push(language.to_lowercase());
    }
    if let Some(ref domain) = project.domain {
        context.push(domain.to_lowercase());
    }
    if let Some(ref project_type) = project.project_type {
        context.push(project_type.to_lowercase());
    }
    if let Some(ref architecture) = project.architecture {
        context.push(architecture.to_lowercase());
    }
    context.extend(project.databases.iter().map(|db| db.to_lowercase()));
    context.extend(project.test_frameworks.iter().map(|t| t.to_lowercase()));

    let matches = agent
        .trigger_keywords
        .iter()
        .map(|kw| kw.to_lowercase())
        .filter(|kw| context.iter().any(|ctx| ctx.contains(kw.as_str())))
        .count();

    matches as f64 / agent.trigger_keywords.len() as f64
}

fn synonyms_for(language: &str) -> &'static [&'static str] {
    COMPATIBLE_LANGUAGES
        .iter()
        .find(|(lang, _)| *lang == language)
        .map(|(_, synonyms)| *synonyms)
        .unwrap_or(&[])
}

fn family_for(framework: &str) -> &'static [&'static str] {
    FRAMEWORK_FAMILIES
        .iter()
        .find(|(fw, _)| *fw == framework)
        .map(|(_, family)| *family)
        .unwrap_or(&[])
}
