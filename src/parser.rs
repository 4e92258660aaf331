//! Agent definition parsing.
//!
//! Converts one raw markdown document into an [`AgentDefinition`], or
//! `None` when the document does not look like an agent definition at all
//! (no top-level title, no locatable description). Extraction is
//! section-based: each section label has its own pattern and is applied
//! independently, so a sparsely documented agent still parses; it just
//! earns a lower confidence score.

use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use url::Url;

use crate::models::{AgentDefinition, ComplexityLevel};

// Confidence weights for the completeness heuristic.
const DESCRIPTION_WEIGHT: f64 = 0.30;
const CAPABILITIES_WEIGHT: f64 = 0.20;
const USE_CASES_WEIGHT: f64 = 0.20;
const KEYWORDS_WEIGHT: f64 = 0.15;
const LANGUAGES_WEIGHT: f64 = 0.15;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+?)(?:\s*-.*)?$").unwrap());
static DESCRIPTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)(?:##?\s*)?(?:Description|About)[:\s]*(.+?)(?:\n\n|\n#|\z)").unwrap()
});
static CAPABILITIES_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:##?\s*)?(?:Capabilities|Features|Can do)[:\s]*\n((?:[-*]\s*.+\n?)+)")
        .unwrap()
});
static USE_CASES_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:##?\s*)?(?:Use cases|Usage|When to use)[:\s]*\n((?:[-*]\s*.+\n?)+)")
        .unwrap()
});
static KEYWORDS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)##?\s*(?:Keywords|Tags|Triggers)[:\s]*\n?(.+?)(?:\n\n|\n##|\z)").unwrap()
});
static LANGUAGES_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)##?\s*(?:Languages|Lang|Programming languages)[:\s]*\n?(.+?)(?:\n\n|\n##|\z)")
        .unwrap()
});
static FRAMEWORKS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)##?\s*(?:Frameworks|Framework|Stack)[:\s]*\n?(.+?)(?:\n\n|\n##|\z)").unwrap()
});
static COMPLEXITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:##?\s*)?(?:Complexity|Level|Difficulty)[:\s]*(\w+)").unwrap()
});
static KEYWORD_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,;|]+").unwrap());

/// Parse an agent definition from markdown content.
///
/// Returns `Ok(None)` when the document lacks a top-level title heading or a
/// description; these are "not an agent document", not malformed input.
pub fn parse_agent_file(content: &str, source_url: &str) -> Result<Option<AgentDefinition>> {
    let Some(name_match) = NAME_PATTERN.captures(content) else {
        return Ok(None);
    };
    let name = name_match[1].trim().to_string();

    let description = extract_description(content);
    if description.is_empty() {
        return Ok(None);
    }

    let capabilities = extract_list_items(content, &CAPABILITIES_PATTERN);
    let use_cases = extract_list_items(content, &USE_CASES_PATTERN);
    let trigger_keywords = extract_keywords(content, &KEYWORDS_PATTERN);
    let language_compatibility = extract_keywords(content, &LANGUAGES_PATTERN);
    let framework_compatibility = extract_keywords(content, &FRAMEWORKS_PATTERN);
    let complexity = extract_complexity(content);

    let confidence_score = confidence_score(
        !description.is_empty(),
        capabilities.len(),
        use_cases.len(),
        trigger_keywords.len(),
        language_compatibility.len(),
    );

    let repository_name = repository_name_from_url(source_url);

    let definition = AgentDefinition {
        name,
        description,
        capabilities,
        use_cases,
        dependencies: Vec::new(),
        trigger_keywords,
        framework_compatibility,
        language_compatibility,
        complexity,
        confidence_score,
        source_url: source_url.to_string(),
        repository_name,
    }
    .validated()?;

    Ok(Some(definition))
}

/// Extract the description: an explicit Description/About section, else the
/// first paragraph after the title up to a list item or a blank-then-content
/// boundary.
fn extract_description(content: &str) -> String {
    if let Some(captures) = DESCRIPTION_PATTERN.captures(content) {
        return captures[1].trim().to_string();
    }

    let mut in_description = false;
    let mut description_lines: Vec<&str> = Vec::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.starts_with('#') && !in_description {
            in_description = true;
            continue;
        }
        if line.starts_with('#') && in_description {
            break;
        }
        if in_description && !line.is_empty() {
            if line.starts_with('-') || line.starts_with('*') {
                break;
            }
            description_lines.push(line);
        } else if in_description && line.is_empty() && !description_lines.is_empty() {
            break;
        }
    }

    description_lines.join(" ")
}

fn extract_list_items(content: &str, pattern: &Regex) -> Vec<String> {
    let Some(captures) = pattern.captures(content) else {
        return Vec::new();
    };

    captures[1]
        .lines()
        .filter_map(|raw_line| {
            let line = raw_line.trim();
            let item = line.strip_prefix('-').or_else(|| line.strip_prefix('*'))?;
            let item = item.trim();
            (!item.is_empty()).then(|| item.to_string())
        })
        .collect()
}

fn extract_keywords(content: &str, pattern: &Regex) -> Vec<String> {
    let Some(captures) = pattern.captures(content) else {
        return Vec::new();
    };

    KEYWORD_SPLIT
        .split(captures[1].trim())
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .map(str::to_string)
        .collect()
}

fn extract_complexity(content: &str) -> ComplexityLevel {
    COMPLEXITY_PATTERN
        .captures(content)
        .and_then(|captures| ComplexityLevel::from_str(&captures[1]).ok())
        .unwrap_or_default()
}

/// Weighted present/absent completeness heuristic, clamped to 1.0. This is a
/// crude measure of how thoroughly the document was filled in, not a quality
/// judgment.
fn confidence_score(
    has_description: bool,
    capabilities_count: usize,
    use_cases_count: usize,
    keywords_count: usize,
    languages_count: usize,
) -> f64 {
    let mut score = 0.0;
    if has_description {
        score += DESCRIPTION_WEIGHT;
    }
    if capabilities_count > 0 {
        score += CAPABILITIES_WEIGHT;
    }
    if use_cases_count > 0 {
        score += USE_CASES_WEIGHT;
    }
    if keywords_count > 0 {
        score += KEYWORDS_WEIGHT;
    }
    if languages_count > 0 {
        score += LANGUAGES_WEIGHT;
    }
    score.min(1.0)
}

/// Derive the owning-repository name from the document's source URL:
/// `owner/repo` for a github.com host, else the bare host, `"unknown"` when
/// the URL does not parse.
fn repository_name_from_url(source_url: &str) -> String {
    let Ok(parsed) = Url::parse(source_url) else {
        return "unknown".to_string();
    };
    let Some(host) = parsed.host_str() else {
        return "unknown".to_string();
    };

    if host.contains("github.com") {
        let segments: Vec<&str> = parsed
            .path()
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        if segments.len() >= 2 {
            return format!("{}/{}", segments[0], segments[1]);
        }
    }

    host.to_string()
}
