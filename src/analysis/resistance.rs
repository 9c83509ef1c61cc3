//! Where adoption stalls, in which style, and why.
//!
//! Scores are per group: a group's AI stories are fetched once and every
//! pattern, root cause and intervention is derived from that snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{AnalysisSettings, ResistanceMarkers, RootCauseMarkers};
use crate::error::Result;
use crate::models::{ResistancePattern, RootCause, Sophistication, Story};
use crate::repository::{ReferenceEdge, StoryFilter, StoryRepository};
use crate::scoring::{self, NEUTRAL};
use crate::signals::{self, CausalMatcher};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryExcerpt {
    pub story_id: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern: ResistancePattern,
    pub severity: String,
    pub description: String,
    pub frequency: usize,
    pub percentage: f64,
    pub examples: Vec<StoryExcerpt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CauseEvidence {
    pub cause: RootCause,
    pub evidence_count: usize,
    pub evidence_stories: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalChain {
    pub story_id: String,
    pub chain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCauseAnalysis {
    pub primary_cause: RootCause,
    /// Causes with evidence, strongest first.
    pub all_causes: Vec<CauseEvidence>,
    pub causal_chains: Vec<CausalChain>,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistanceNarrative {
    pub story_id: String,
    pub summary: String,
    pub sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupResistance {
    pub story_count: usize,
    pub resistance_score: f64,
    pub patterns: Vec<PatternMatch>,
    pub narratives: Vec<ResistanceNarrative>,
    pub root_causes: RootCauseAnalysis,
    pub interventions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HotspotSeverity {
    High,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub group: String,
    pub resistance_score: f64,
    pub severity: HotspotSeverity,
    pub patterns: Vec<ResistancePattern>,
    pub primary_cause: RootCause,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonPattern {
    pub frequency: usize,
    pub groups: Vec<String>,
    pub prevalence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResistanceLevel {
    Critical,
    Significant,
    Moderate,
    Low,
    Unknown,
}

impl ResistanceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResistanceLevel::Critical => "CRITICAL",
            ResistanceLevel::Significant => "SIGNIFICANT",
            ResistanceLevel::Moderate => "MODERATE",
            ResistanceLevel::Low => "LOW",
            ResistanceLevel::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallSeverity {
    pub level: ResistanceLevel,
    pub score: f64,
    pub high_resistance_groups: usize,
    pub total_groups: usize,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContagionNode {
    pub cited_by: Vec<String>,
    pub cites: Vec<String>,
    pub influence: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluentialStory {
    pub story_id: String,
    pub reference_count: usize,
    pub influence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistanceSpread {
    pub is_spreading: bool,
    pub contagion_network: BTreeMap<String, ContagionNode>,
    pub influential_stories: Vec<InfluentialStory>,
    pub spread_velocity: f64,
    pub cross_group_references: usize,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistanceLandscape {
    pub by_group: BTreeMap<String, GroupResistance>,
    pub hotspots: Vec<Hotspot>,
    pub common_patterns: BTreeMap<ResistancePattern, CommonPattern>,
    pub network_effects: ResistanceSpread,
    pub overall_severity: OverallSeverity,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockingSeverity {
    None,
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingEffect {
    pub blocking_stories: usize,
    pub total_cautionary_tales: usize,
    pub blocking_percentage: f64,
    pub is_blocking: bool,
    pub severity: BlockingSeverity,
    pub examples: Vec<String>,
    pub interpretation: String,
}

fn pattern_markers(markers: &ResistanceMarkers, pattern: ResistancePattern) -> &[String] {
    match pattern {
        ResistancePattern::Passive => &markers.passive,
        ResistancePattern::Skeptical => &markers.skeptical,
        ResistancePattern::Active => &markers.active,
        ResistancePattern::Fearful => &markers.fearful,
    }
}

fn cause_markers(markers: &RootCauseMarkers, cause: RootCause) -> &[String] {
    match cause {
        RootCause::PastFailures => &markers.past_failures,
        RootCause::ThreatPerception => &markers.threat_perception,
        RootCause::ResourceIssues => &markers.resource_issues,
        RootCause::ValueMisalignment => &markers.value_misalignment,
        RootCause::KnowledgeGap => &markers.knowledge_gap,
        RootCause::Unknown => &[],
    }
}

/// Maps resistance across groups and traces how cautionary tales travel.
pub struct ResistanceMapper {
    repo: Arc<dyn StoryRepository>,
    settings: Arc<AnalysisSettings>,
    causal: CausalMatcher,
}

impl ResistanceMapper {
    pub fn new(repo: Arc<dyn StoryRepository>, settings: Arc<AnalysisSettings>) -> Result<Self> {
        let causal = CausalMatcher::new(&settings.markers.causal_connectors)?;
        Ok(Self {
            repo,
            settings,
            causal,
        })
    }

    pub async fn map_resistance_landscape(&self) -> Result<ResistanceLandscape> {
        let groups = self.repo.fetch_groups().await?;
        info!(groups = groups.len(), "mapping resistance landscape");
        if groups.is_empty() {
            warn!("no groups found for resistance mapping");
        }

        let mut by_group = BTreeMap::new();
        for group in groups {
            let stories = self.group_stories(&group).await?;
            by_group.insert(group, self.group_profile(&stories));
        }
        let network_effects = self.analyze_resistance_spread().await?;
        Ok(self.landscape(by_group, network_effects))
    }

    /// Assemble the landscape from already-computed group profiles.
    pub fn landscape(
        &self,
        by_group: BTreeMap<String, GroupResistance>,
        network_effects: ResistanceSpread,
    ) -> ResistanceLandscape {
        let hotspots = self.identify_hotspots(&by_group);
        let common_patterns = common_patterns(&by_group);
        let overall_severity = self.overall_severity(&by_group);
        debug!(
            hotspots = hotspots.len(),
            level = overall_severity.level.as_str(),
            "resistance landscape assembled"
        );
        ResistanceLandscape {
            recommendations: landscape_recommendations(&hotspots),
            by_group,
            hotspots,
            common_patterns,
            network_effects,
            overall_severity,
        }
    }

    pub async fn group_stories(&self, group: &str) -> Result<Vec<Story>> {
        let filter = StoryFilter::ai()
            .group(group)
            .limit(self.settings.tuning.caps.group_stories);
        self.repo.fetch_stories(&filter).await
    }

    /// Profile one group from its AI stories.
    pub fn group_profile(&self, stories: &[Story]) -> GroupResistance {
        let patterns = self.identify_resistance_patterns(stories);
        let root_causes = self.infer_root_causes(stories);
        let interventions = suggest_interventions(&patterns, root_causes.primary_cause);
        GroupResistance {
            story_count: stories.len(),
            resistance_score: self.resistance_score(stories),
            narratives: resistance_narratives(stories),
            patterns,
            root_causes,
            interventions,
        }
    }

    fn has_any_pattern(&self, text: &str) -> bool {
        ResistancePattern::ALL
            .iter()
            .any(|p| signals::contains_any(text, pattern_markers(&self.settings.markers.resistance, *p)))
    }

    /// Resistance signals over resistance plus support signals; higher means more resistant.
    pub fn resistance_score(&self, stories: &[Story]) -> f64 {
        let (resisting, supporting) = stories.iter().fold((0usize, 0usize), |(r, s), story| {
            let sentiment = story.sentiment_or_zero();
            let text = story.text();
            let r = r
                + usize::from(sentiment < -0.2)
                + usize::from(story.narrative_function_is("warning"))
                + usize::from(self.has_any_pattern(&text));
            let s = s + usize::from(sentiment > 0.2) + usize::from(story.experimentation_indicator);
            (r, s)
        });
        scoring::polarity_ratio(resisting, supporting)
    }

    /// One entry per pattern with at least one matching story, most frequent first.
    pub fn identify_resistance_patterns(&self, stories: &[Story]) -> Vec<PatternMatch> {
        let mut detected: Vec<PatternMatch> = ResistancePattern::ALL
            .iter()
            .filter_map(|&pattern| {
                let markers = pattern_markers(&self.settings.markers.resistance, pattern);
                let matches: Vec<&Story> = stories
                    .iter()
                    .filter(|s| signals::contains_any(&s.text(), markers))
                    .collect();
                if matches.is_empty() {
                    return None;
                }
                Some(PatternMatch {
                    pattern,
                    severity: pattern.severity().to_string(),
                    description: pattern.description().to_string(),
                    frequency: matches.len(),
                    percentage: matches.len() as f64 / stories.len() as f64,
                    examples: matches
                        .iter()
                        .take(3)
                        .map(|s| StoryExcerpt {
                            story_id: s.id.clone(),
                            summary: scoring::truncate(&s.summary, 100),
                        })
                        .collect(),
                })
            })
            .collect();
        detected.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        detected
    }

    fn cause_evidence(&self, stories: &[Story], cause: RootCause) -> CauseEvidence {
        let markers = cause_markers(&self.settings.markers.root_causes, cause);
        let evidence: Vec<&Story> = stories
            .iter()
            .filter(|s| {
                signals::contains_any(&s.text(), markers)
                    || match cause {
                        RootCause::ThreatPerception => s.ai_sentiment.is_some_and(|v| v < -0.3),
                        RootCause::KnowledgeGap => s.ai_sophistication == Some(Sophistication::Novice),
                        _ => false,
                    }
            })
            .collect();
        CauseEvidence {
            cause,
            evidence_count: evidence.len(),
            evidence_stories: evidence.iter().take(3).map(|s| s.id.clone()).collect(),
            description: cause.description().to_string(),
        }
    }

    pub fn infer_root_causes(&self, stories: &[Story]) -> RootCauseAnalysis {
        let mut ranked: Vec<CauseEvidence> = RootCause::DETECTABLE
            .iter()
            .map(|&cause| self.cause_evidence(stories, cause))
            .filter(|c| c.evidence_count > 0)
            .collect();
        // stable: equal counts keep declaration order
        ranked.sort_by(|a, b| b.evidence_count.cmp(&a.evidence_count));

        let causal_chains = stories
            .iter()
            .take(5)
            .filter(|s| self.causal.is_match(&s.summary.to_lowercase()))
            .map(|s| CausalChain {
                story_id: s.id.clone(),
                chain: s.summary.clone(),
            })
            .collect();

        RootCauseAnalysis {
            primary_cause: ranked.first().map(|c| c.cause).unwrap_or(RootCause::Unknown),
            interpretation: interpret_root_causes(&ranked),
            all_causes: ranked,
            causal_chains,
        }
    }

    pub fn identify_hotspots(&self, by_group: &BTreeMap<String, GroupResistance>) -> Vec<Hotspot> {
        let threshold = self.settings.tuning.hotspot_threshold;
        let mut hotspots: Vec<Hotspot> = by_group
            .iter()
            .filter(|(_, data)| data.resistance_score > threshold)
            .map(|(group, data)| Hotspot {
                group: group.clone(),
                resistance_score: data.resistance_score,
                severity: if data.resistance_score > 0.8 {
                    HotspotSeverity::High
                } else {
                    HotspotSeverity::Moderate
                },
                patterns: data.patterns.iter().map(|p| p.pattern).collect(),
                primary_cause: data.root_causes.primary_cause,
            })
            .collect();
        hotspots.sort_by(|a, b| b.resistance_score.total_cmp(&a.resistance_score));
        hotspots
    }

    pub fn overall_severity(&self, by_group: &BTreeMap<String, GroupResistance>) -> OverallSeverity {
        let scores: Vec<f64> = by_group.values().map(|g| g.resistance_score).collect();
        let Some(avg) = scoring::mean(&scores) else {
            return OverallSeverity {
                level: ResistanceLevel::Unknown,
                score: NEUTRAL,
                high_resistance_groups: 0,
                total_groups: 0,
                interpretation: "Resistance level: UNKNOWN".to_string(),
            };
        };
        let threshold = self.settings.tuning.hotspot_threshold;
        let high = scores.iter().filter(|&&s| s > threshold).count();
        let total = scores.len() as f64;

        let level = if avg > 0.7 || high as f64 > total * 0.5 {
            ResistanceLevel::Critical
        } else if avg > 0.5 || high as f64 > total * 0.3 {
            ResistanceLevel::Significant
        } else if avg > 0.3 {
            ResistanceLevel::Moderate
        } else {
            ResistanceLevel::Low
        };
        let interpretation = match level {
            ResistanceLevel::Critical => format!(
                "Critical resistance levels (score: {:.2}) - immediate intervention required across organization",
                avg
            ),
            ResistanceLevel::Significant => format!(
                "Significant resistance (score: {:.2}) - targeted interventions needed in multiple groups",
                avg
            ),
            ResistanceLevel::Moderate => format!(
                "Moderate resistance (score: {:.2}) - manageable with proper change management",
                avg
            ),
            _ => format!(
                "Low resistance (score: {:.2}) - favorable conditions for AI adoption",
                avg
            ),
        };
        OverallSeverity {
            level,
            score: avg,
            high_resistance_groups: high,
            total_groups: scores.len(),
            interpretation,
        }
    }

    /// Blocking language in warning-framed tales; fetched when `cautionary` is `None`.
    pub async fn measure_blocking_effect(&self, cautionary: Option<&[Story]>) -> Result<BlockingEffect> {
        match cautionary {
            Some(tales) => Ok(self.blocking_effect(tales)),
            None => {
                let fetched = self.repo.fetch_stories(&StoryFilter::ai().cautionary(true)).await?;
                let warnings: Vec<Story> = fetched
                    .into_iter()
                    .filter(|s| s.why_told_is("warning") || s.narrative_function_is("warning"))
                    .take(self.settings.tuning.caps.cautionary_stories)
                    .collect();
                Ok(self.blocking_effect(&warnings))
            }
        }
    }

    pub fn blocking_effect(&self, tales: &[Story]) -> BlockingEffect {
        if tales.is_empty() {
            return BlockingEffect {
                blocking_stories: 0,
                total_cautionary_tales: 0,
                blocking_percentage: 0.0,
                is_blocking: false,
                severity: BlockingSeverity::None,
                examples: Vec::new(),
                interpretation: "No cautionary tales found".to_string(),
            };
        }
        let blocking: Vec<&Story> = tales
            .iter()
            .filter(|s| signals::contains_any(&s.text(), &self.settings.markers.blocking))
            .collect();
        let count = blocking.len();
        let total = tales.len();
        let is_blocking = count as f64 > total as f64 * self.settings.tuning.blocking_ratio;
        let severity = if count > 5 {
            BlockingSeverity::High
        } else if count > 2 {
            BlockingSeverity::Moderate
        } else {
            BlockingSeverity::Low
        };
        let interpretation = if !is_blocking {
            format!(
                "Limited blocking effect - {} cautionary tales mention blocking but not widespread",
                count
            )
        } else {
            match severity {
                BlockingSeverity::High => format!(
                    "CRITICAL: {} stories describe blocked/cancelled initiatives - cautionary tales actively preventing adoption",
                    count
                ),
                BlockingSeverity::Moderate => {
                    format!("Moderate blocking effect - {} stories mention blocked initiatives", count)
                }
                _ => format!(
                    "Some blocking indicators present - {} stories mention resistance effects",
                    count
                ),
            }
        };
        BlockingEffect {
            blocking_stories: count,
            total_cautionary_tales: total,
            blocking_percentage: count as f64 / total as f64,
            is_blocking,
            severity,
            examples: blocking.iter().take(3).map(|s| s.id.clone()).collect(),
            interpretation,
        }
    }

    pub async fn analyze_resistance_spread(&self) -> Result<ResistanceSpread> {
        let edges = self.repo.fetch_story_reference_edges().await?;
        debug!(edges = edges.len(), "cautionary reference edges fetched");
        Ok(spread_from_edges(&edges))
    }
}

/// Contagion network, influential tales and velocity from citation edges.
pub fn spread_from_edges(edges: &[ReferenceEdge]) -> ResistanceSpread {
    if edges.is_empty() {
        return ResistanceSpread {
            is_spreading: false,
            contagion_network: BTreeMap::new(),
            influential_stories: Vec::new(),
            spread_velocity: 0.0,
            cross_group_references: 0,
            interpretation: "No evidence of narrative contagion".to_string(),
        };
    }

    let mut network: BTreeMap<String, ContagionNode> = BTreeMap::new();
    let mut story_influence: BTreeMap<String, usize> = BTreeMap::new();
    for edge in edges {
        let source = network.entry(edge.source_group.clone()).or_default();
        source.cited_by.push(edge.citing_group.clone());
        source.influence += edge.count;
        network
            .entry(edge.citing_group.clone())
            .or_default()
            .cites
            .push(edge.source_group.clone());
        *story_influence.entry(edge.source_story.clone()).or_insert(0) += edge.count;
    }

    let total: usize = story_influence.values().sum();
    let influential_stories: Vec<InfluentialStory> = scoring::ranked(&story_influence)
        .into_iter()
        .take(5)
        .map(|(story_id, count)| InfluentialStory {
            story_id,
            reference_count: count,
            influence_score: count as f64 / total.max(1) as f64,
        })
        .collect();

    let velocity = (edges.len() as f64 / 10.0).min(1.0);
    let is_spreading = edges.len() > 5 || velocity > 0.5;
    let interpretation = if !is_spreading {
        "Resistance appears isolated to specific groups - low contagion risk"
    } else if velocity > 0.7 {
        "ALERT: Resistance spreading rapidly across groups through influential cautionary tales"
    } else if velocity > 0.4 {
        "Moderate spread: Cautionary tales crossing group boundaries"
    } else {
        "Some narrative contagion detected - monitor for acceleration"
    };

    ResistanceSpread {
        is_spreading,
        contagion_network: network,
        influential_stories,
        spread_velocity: velocity,
        cross_group_references: edges.len(),
        interpretation: interpretation.to_string(),
    }
}

fn resistance_narratives(stories: &[Story]) -> Vec<ResistanceNarrative> {
    stories
        .iter()
        .filter(|s| s.sentiment_or_zero() < 0.0 || s.narrative_function_is("warning"))
        .take(5)
        .map(|s| ResistanceNarrative {
            story_id: s.id.clone(),
            summary: scoring::truncate(&s.summary, 150),
            sentiment: s.sentiment_or_zero(),
        })
        .collect()
}

fn interpret_root_causes(ranked: &[CauseEvidence]) -> String {
    let Some(primary) = ranked.first() else {
        return "No clear resistance patterns detected".to_string();
    };
    let base = match primary.cause {
        RootCause::PastFailures => {
            "Resistance rooted in past failed initiatives - trust needs rebuilding"
        }
        RootCause::ThreatPerception => {
            "Resistance driven by job security concerns - needs clear communication about role evolution"
        }
        RootCause::ResourceIssues => {
            "Resistance due to capacity constraints - needs resource allocation and support"
        }
        RootCause::ValueMisalignment => {
            "Resistance from perceived cultural misfit - needs values-based framing"
        }
        RootCause::KnowledgeGap => {
            "Resistance from lack of understanding - needs education and training"
        }
        RootCause::Unknown => "Resistance cause unclear",
    };
    match ranked.get(1) {
        Some(secondary) => format!("{}. Secondary factor: {}", base, secondary.cause),
        None => base.to_string(),
    }
}

pub fn suggest_interventions(patterns: &[PatternMatch], primary_cause: RootCause) -> Vec<String> {
    let has = |p: ResistancePattern| patterns.iter().any(|m| m.pattern == p);
    let mut interventions = Vec::new();
    if has(ResistancePattern::Fearful) {
        interventions
            .push("Address job security concerns explicitly - provide role evolution roadmap".to_string());
    }
    if has(ResistancePattern::Skeptical) {
        interventions.push(
            "Provide concrete evidence and success stories from similar organizations".to_string(),
        );
    }
    if has(ResistancePattern::Active) {
        interventions
            .push("Engage resisters as advisors - understand and address specific concerns".to_string());
    }
    if has(ResistancePattern::Passive) {
        interventions
            .push("Create urgency through competitive positioning or strategic importance".to_string());
    }
    match primary_cause {
        RootCause::PastFailures => interventions
            .push("Acknowledge past failures and explain what's different this time".to_string()),
        RootCause::KnowledgeGap => interventions
            .push("Implement comprehensive training program with hands-on practice".to_string()),
        RootCause::ResourceIssues => interventions
            .push("Allocate dedicated time and resources for AI adoption activities".to_string()),
        _ => {}
    }
    if interventions.is_empty() {
        interventions.push("Monitor and reassess - no immediate intervention needed".to_string());
    }
    interventions
}

fn common_patterns(
    by_group: &BTreeMap<String, GroupResistance>,
) -> BTreeMap<ResistancePattern, CommonPattern> {
    let mut groups_by_pattern: BTreeMap<ResistancePattern, Vec<String>> = BTreeMap::new();
    for (group, data) in by_group {
        for m in &data.patterns {
            groups_by_pattern.entry(m.pattern).or_default().push(group.clone());
        }
    }
    let total = by_group.len().max(1) as f64;
    groups_by_pattern
        .into_iter()
        .filter(|(_, groups)| groups.len() > 1)
        .map(|(pattern, groups)| {
            (
                pattern,
                CommonPattern {
                    frequency: groups.len(),
                    prevalence: groups.len() as f64 / total,
                    groups,
                },
            )
        })
        .collect()
}

fn landscape_recommendations(hotspots: &[Hotspot]) -> Vec<String> {
    let mut recs = Vec::new();
    if let Some(top) = hotspots.first() {
        recs.push(format!(
            "PRIORITY: Address resistance in {} (score: {:.2}) due to {}",
            top.group, top.resistance_score, top.primary_cause
        ));
    }
    if hotspots.len() > 3 {
        recs.push(
            "Widespread resistance detected - consider organization-wide change management program"
                .to_string(),
        );
    }
    recs.extend(
        [
            "Establish clear communication channels for concerns and feedback",
            "Create success stories to counter cautionary tales",
            "Provide psychological safety for experimentation and learning",
        ]
        .map(String::from),
    );
    recs.truncate(5);
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{repo, settings, story};
    use crate::models::StoryType;

    fn mapper(stories: Vec<Story>) -> ResistanceMapper {
        ResistanceMapper::new(repo(stories), settings()).unwrap()
    }

    #[test]
    fn single_fearful_pattern_in_group_of_ten() {
        let mut stories = Vec::new();
        for i in 0..7 {
            stories.push(story(
                &format!("f{i}"),
                "support",
                "We are worried about the new assistant",
                Some(-0.4),
            ));
        }
        for i in 0..3 {
            stories.push(story(&format!("n{i}"), "support", "Routine update", Some(0.1)));
        }
        let patterns = mapper(vec![]).identify_resistance_patterns(&stories);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern, ResistancePattern::Fearful);
        assert_eq!(patterns[0].frequency, 7);
        assert!((patterns[0].percentage - 0.7).abs() < 1e-9);
        assert_eq!(patterns[0].examples.len(), 3);
    }

    #[test]
    fn resistance_score_is_neutral_without_signals() {
        let m = mapper(vec![]);
        assert_eq!(m.resistance_score(&[]), 0.5);
        assert_eq!(m.resistance_score(&[story("a", "g", "plain", None)]), 0.5);
    }

    #[test]
    fn resistance_score_counts_each_signal() {
        let mut warn = story("w", "g", "this is a waste of time", Some(-0.5));
        warn.narrative_function = Some("warning".into());
        let mut happy = story("h", "g", "nice", Some(0.6));
        happy.experimentation_indicator = true;
        // resisting 3, supporting 2
        let score = mapper(vec![]).resistance_score(&[warn, happy]);
        assert!((score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn root_causes_rank_and_name_primary() {
        let stories = vec![
            story("a", "ops", "we tried that last time and it failed", None),
            story("b", "ops", "it didn't work before", None),
            story("c", "ops", "no budget for this", None),
        ];
        let causes = mapper(vec![]).infer_root_causes(&stories);
        assert_eq!(causes.primary_cause, RootCause::PastFailures);
        assert_eq!(causes.all_causes[0].evidence_count, 2);
        assert!(causes.interpretation.contains("Secondary factor: resource_issues"));
    }

    #[test]
    fn causal_chains_need_whole_word_connectors() {
        let stories = vec![
            story("a", "ops", "Budget was cut so the pilot stopped", None),
            story("b", "ops", "Also a personal note", None),
        ];
        let causes = mapper(vec![]).infer_root_causes(&stories);
        assert_eq!(causes.causal_chains.len(), 1);
        assert_eq!(causes.causal_chains[0].story_id, "a");
    }

    #[test]
    fn interventions_follow_patterns_then_cause() {
        let fearful = PatternMatch {
            pattern: ResistancePattern::Fearful,
            severity: "high".into(),
            description: String::new(),
            frequency: 1,
            percentage: 1.0,
            examples: vec![],
        };
        let out = suggest_interventions(&[fearful], RootCause::KnowledgeGap);
        assert_eq!(out.len(), 2);
        assert!(out[0].starts_with("Address job security"));
        assert!(out[1].starts_with("Implement comprehensive training"));
        assert_eq!(
            suggest_interventions(&[], RootCause::Unknown),
            vec!["Monitor and reassess - no immediate intervention needed"]
        );
    }

    #[tokio::test]
    async fn landscape_flags_hotspots_and_common_patterns() {
        let mut stories = Vec::new();
        for (group, n) in [("legal", 3), ("finance", 2)] {
            for i in 0..n {
                let mut s = story(&format!("{group}{i}"), group, "we are not convinced", Some(-0.6));
                s.narrative_function = Some("warning".into());
                stories.push(s);
            }
        }
        stories.push(story("e1", "eng", "shipped it fast", Some(0.8)));
        let landscape = mapper(stories).map_resistance_landscape().await.unwrap();

        assert_eq!(landscape.by_group.len(), 3);
        let hot: Vec<&str> = landscape.hotspots.iter().map(|h| h.group.as_str()).collect();
        assert_eq!(hot, vec!["finance", "legal"]);
        assert_eq!(landscape.hotspots[0].severity, HotspotSeverity::High);
        let common = &landscape.common_patterns[&ResistancePattern::Skeptical];
        assert_eq!(common.groups, vec!["finance", "legal"]);
        assert!((common.prevalence - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(landscape.overall_severity.level, ResistanceLevel::Critical);
        assert!(landscape.recommendations[0].starts_with("PRIORITY: Address resistance in finance"));
        assert!(landscape.recommendations.len() <= 5);
        assert!(!landscape.network_effects.is_spreading);
    }

    #[test]
    fn empty_landscape_is_unknown() {
        let m = mapper(vec![]);
        let severity = m.overall_severity(&BTreeMap::new());
        assert_eq!(severity.level, ResistanceLevel::Unknown);
        assert_eq!(severity.score, 0.5);
    }

    #[tokio::test]
    async fn blocking_effect_reads_warning_tales() {
        let mut a = story("a", "ops", "the project was shelved", Some(-0.5));
        a.why_told = Some("warning".into());
        let mut b = story("b", "ops", "careful with the bot", Some(-0.5));
        b.narrative_function = Some("warning".into());
        let mut c = story("c", "ops", "it was cancelled", None);
        c.story_type = StoryType::Failure;
        let effect = mapper(vec![a, b, c]).measure_blocking_effect(None).await.unwrap();
        assert_eq!(effect.total_cautionary_tales, 2);
        assert_eq!(effect.blocking_stories, 1);
        assert!(effect.is_blocking);
        assert_eq!(effect.severity, BlockingSeverity::Low);
        assert_eq!(effect.examples, vec!["a"]);

        let none = mapper(vec![]).blocking_effect(&[]);
        assert_eq!(none.severity, BlockingSeverity::None);
    }

    #[test]
    fn spread_builds_network_and_velocity() {
        let edge = |citing: &str, source: &str, story: &str, count| ReferenceEdge {
            citing_group: citing.into(),
            citing_story: format!("{citing}-s"),
            source_group: source.into(),
            source_story: story.into(),
            count,
        };
        let edges: Vec<ReferenceEdge> = (0..6)
            .map(|i| edge(&format!("g{i}"), "legal", if i < 4 { "s1" } else { "s2" }, 1))
            .collect();
        let spread = spread_from_edges(&edges);
        assert!(spread.is_spreading);
        assert!((spread.spread_velocity - 0.6).abs() < 1e-9);
        assert_eq!(spread.contagion_network["legal"].influence, 6);
        assert_eq!(spread.contagion_network["g0"].cites, vec!["legal"]);
        assert_eq!(spread.influential_stories[0].story_id, "s1");
        assert!((spread.influential_stories[0].influence_score - 4.0 / 6.0).abs() < 1e-9);
        assert!(spread.interpretation.starts_with("Moderate spread"));

        assert!(!spread_from_edges(&[]).is_spreading);
    }
}
