//! Stateless marker detection over story text and categorical fields.
//!
//! Every function here treats a missing field as empty and never fails; the
//! categorical field wins over text inference whenever both are available.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{KeywordGroup, MarkerCatalogs, PolarityCatalog};
use crate::error::{NarrativeError, Result};
use crate::models::{Story, StoryType};

/// Markers from `markers` present in `text`, in catalog order.
/// Both sides are expected lowercased already: `text` via [`Story::text`],
/// markers via [`MarkerCatalogs::normalize`].
pub fn detect<'m>(text: &str, markers: &'m [String]) -> Vec<&'m str> {
    markers
        .iter()
        .filter(|m| !m.is_empty() && text.contains(m.as_str()))
        .map(String::as_str)
        .collect()
}

pub fn contains_any(text: &str, markers: &[String]) -> bool {
    markers
        .iter()
        .any(|m| !m.is_empty() && text.contains(m.as_str()))
}

/// Label of the first group (in priority order) with any keyword in `text`.
pub fn first_matching_group<'g>(text: &str, groups: &'g [KeywordGroup]) -> Option<&'g str> {
    groups
        .iter()
        .find(|g| contains_any(text, &g.keywords))
        .map(|g| g.label.as_str())
}

/// Labels of every group with a keyword in `text`.
pub fn matching_groups<'g>(text: &str, groups: &'g [KeywordGroup]) -> Vec<&'g str> {
    groups
        .iter()
        .filter(|g| contains_any(text, &g.keywords))
        .map(|g| g.label.as_str())
        .collect()
}

/// One story's contribution to a polarity count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvidence {
    pub story_id: String,
    pub group: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub markers: Vec<String>,
}

/// Marker hit totals for both sides of a polarity catalog.
#[derive(Debug, Clone, Default)]
pub struct PolarityScan {
    pub positive: usize,
    pub negative: usize,
    pub evidence: Vec<SignalEvidence>,
}

/// Count marker hits of both polarities across `stories`.
///
/// Each matched marker counts once per story. Evidence keeps the first
/// `evidence_limit` entries, tagged with `labels.0` / `labels.1`.
pub fn scan_polarity(
    stories: &[Story],
    catalog: &PolarityCatalog,
    labels: (&str, &str),
    evidence_limit: usize,
) -> PolarityScan {
    let mut scan = PolarityScan::default();
    for story in stories {
        let text = story.text();
        for (markers, kind, positive) in [
            (&catalog.positive, labels.0, true),
            (&catalog.negative, labels.1, false),
        ] {
            let hits = detect(&text, markers);
            if hits.is_empty() {
                continue;
            }
            if positive {
                scan.positive += hits.len();
            } else {
                scan.negative += hits.len();
            }
            if scan.evidence.len() < evidence_limit {
                scan.evidence.push(SignalEvidence {
                    story_id: story.id.clone(),
                    group: story.group_key().to_string(),
                    kind: kind.to_string(),
                    markers: hits.into_iter().map(str::to_string).collect(),
                });
            }
        }
    }
    scan
}

pub fn is_experimentation_story(story: &Story, markers: &MarkerCatalogs) -> bool {
    story.experimentation_indicator
        || story.story_type == StoryType::Learning
        || story.narrative_function_is("explanation")
        || contains_any(&story.text(), &markers.experimentation)
}

pub fn is_failure_story(story: &Story, markers: &MarkerCatalogs) -> bool {
    if story.story_type == StoryType::Failure {
        return true;
    }
    if story.ai_sentiment.is_some_and(|s| s < -0.3) {
        return true;
    }
    story
        .outcome
        .as_deref()
        .map(|o| {
            let o = o.to_lowercase();
            markers.failure_outcomes.iter().any(|f| f.eq_ignore_ascii_case(&o))
        })
        .unwrap_or(false)
}

/// Failure told as a learning opportunity.
pub fn frames_failure_as_learning(story: &Story, markers: &MarkerCatalogs) -> bool {
    story
        .failure_framing
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case("learning"))
        || !story.lessons.is_empty()
        || contains_any(&story.text(), &markers.learning_language)
}

/// Failure told as a warning to others.
pub fn frames_failure_as_warning(story: &Story, markers: &MarkerCatalogs) -> bool {
    story
        .failure_framing
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case("warning"))
        || story.why_told_is("warning")
        || story.narrative_function_is("warning")
        || contains_any(&story.text(), &markers.warning_language)
}

/// Word-boundary matcher for causal connectors ("because", "led to", ...).
#[derive(Debug, Clone)]
pub struct CausalMatcher {
    pattern: Option<Regex>,
}

impl CausalMatcher {
    pub fn new(connectors: &[String]) -> Result<Self> {
        let alternatives: Vec<String> = connectors
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| regex::escape(&c.trim().to_lowercase()))
            .collect();
        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }
        let pattern = Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|"))).map_err(|e| {
            NarrativeError::Config {
                message: format!("invalid causal connector pattern: {}", e),
            }
        })?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }
}
