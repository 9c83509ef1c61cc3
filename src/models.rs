//! Story, initiative and vocabulary types consumed by the analyzers.
//!
//! Categorical fields come from an upstream extraction pipeline and are not
//! guaranteed to stay inside the known vocabulary, so every closed enum here
//! carries an `Unknown` fallback and deserializes from any string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Depth of AI understanding shown in a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Sophistication {
    Novice,
    Basic,
    Intermediate,
    Advanced,
    Expert,
    Unknown,
}

impl Sophistication {
    pub const ALL: [Sophistication; 6] = [
        Sophistication::Novice,
        Sophistication::Basic,
        Sophistication::Intermediate,
        Sophistication::Advanced,
        Sophistication::Expert,
        Sophistication::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sophistication::Novice => "novice",
            Sophistication::Basic => "basic",
            Sophistication::Intermediate => "intermediate",
            Sophistication::Advanced => "advanced",
            Sophistication::Expert => "expert",
            Sophistication::Unknown => "unknown",
        }
    }

    pub fn is_advanced(&self) -> bool {
        matches!(self, Sophistication::Advanced | Sophistication::Expert)
    }
}

impl From<String> for Sophistication {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "novice" => Sophistication::Novice,
            "basic" => Sophistication::Basic,
            "intermediate" => Sophistication::Intermediate,
            "advanced" => Sophistication::Advanced,
            "expert" => Sophistication::Expert,
            _ => Sophistication::Unknown,
        }
    }
}

/// Who holds control in the story's telling of AI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum AgencyFrame {
    HumanInControl,
    AiInControl,
    Partnership,
    Tool,
    Unknown,
}

impl AgencyFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgencyFrame::HumanInControl => "human_in_control",
            AgencyFrame::AiInControl => "ai_in_control",
            AgencyFrame::Partnership => "partnership",
            AgencyFrame::Tool => "tool",
            AgencyFrame::Unknown => "unknown",
        }
    }
}

impl From<String> for AgencyFrame {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "human_in_control" => AgencyFrame::HumanInControl,
            "ai_in_control" => AgencyFrame::AiInControl,
            "partnership" | "partner" => AgencyFrame::Partnership,
            "tool" => AgencyFrame::Tool,
            _ => AgencyFrame::Unknown,
        }
    }
}

impl fmt::Display for AgencyFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum InnovationSignal {
    RiskTaking,
    RiskAverse,
    Neutral,
    Unknown,
}

impl InnovationSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            InnovationSignal::RiskTaking => "risk_taking",
            InnovationSignal::RiskAverse => "risk_averse",
            InnovationSignal::Neutral => "neutral",
            InnovationSignal::Unknown => "unknown",
        }
    }
}

impl From<String> for InnovationSignal {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "risk_taking" => InnovationSignal::RiskTaking,
            "risk_averse" => InnovationSignal::RiskAverse,
            "neutral" => InnovationSignal::Neutral,
            _ => InnovationSignal::Unknown,
        }
    }
}

/// Story type as tagged by the extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum StoryType {
    Success,
    Failure,
    Conflict,
    Decision,
    Learning,
    Crisis,
    #[default]
    Unknown,
}

impl From<String> for StoryType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "success" => StoryType::Success,
            "failure" => StoryType::Failure,
            "conflict" => StoryType::Conflict,
            "decision" => StoryType::Decision,
            "learning" => StoryType::Learning,
            "crisis" => StoryType::Crisis,
            _ => StoryType::Unknown,
        }
    }
}

/// Narrative frame: the lens through which a story positions AI.
///
/// The seven named frames form the fixed vocabulary used by the opposition
/// tables; anything else inferred from free text lands in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Frame {
    Opportunity,
    Threat,
    Tool,
    Replacement,
    Partnership,
    Experiment,
    Mandate,
    Neutral,
    Unknown,
    Other(String),
}

impl Frame {
    pub fn parse(label: &str) -> Frame {
        match label.trim().to_lowercase().as_str() {
            "opportunity" => Frame::Opportunity,
            "threat" => Frame::Threat,
            "tool" => Frame::Tool,
            "replacement" => Frame::Replacement,
            "partner" | "partnership" => Frame::Partnership,
            "experiment" => Frame::Experiment,
            "mandate" => Frame::Mandate,
            "neutral" => Frame::Neutral,
            "" | "unknown" => Frame::Unknown,
            other => Frame::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Frame::Opportunity => "opportunity",
            Frame::Threat => "threat",
            Frame::Tool => "tool",
            Frame::Replacement => "replacement",
            Frame::Partnership => "partnership",
            Frame::Experiment => "experiment",
            Frame::Mandate => "mandate",
            Frame::Neutral => "neutral",
            Frame::Unknown => "unknown",
            Frame::Other(label) => label.as_str(),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Frame {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Frame::parse(&label))
    }
}

/// Opposing frame pairs used when comparing an official story to employee stories.
pub const CORE_OPPOSITIONS: [(Frame, Frame); 4] = [
    (Frame::Opportunity, Frame::Threat),
    (Frame::Tool, Frame::Replacement),
    (Frame::Partnership, Frame::Replacement),
    (Frame::Experiment, Frame::Mandate),
];

/// Frame competition also treats partnership and threat as opposed.
pub const COMPETITION_OPPOSITIONS: [(Frame, Frame); 5] = [
    (Frame::Opportunity, Frame::Threat),
    (Frame::Tool, Frame::Replacement),
    (Frame::Partnership, Frame::Replacement),
    (Frame::Experiment, Frame::Mandate),
    (Frame::Partnership, Frame::Threat),
];

/// True when `a` and `b` are distinct frames forming a pair in `table`, in either order.
pub fn opposes(a: &Frame, b: &Frame, table: &[(Frame, Frame)]) -> bool {
    a != b
        && table
            .iter()
            .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
}

/// The four resistance styles recognised in group narratives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResistancePattern {
    Passive,
    Skeptical,
    Active,
    Fearful,
}

impl ResistancePattern {
    pub const ALL: [ResistancePattern; 4] = [
        ResistancePattern::Passive,
        ResistancePattern::Skeptical,
        ResistancePattern::Active,
        ResistancePattern::Fearful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResistancePattern::Passive => "passive",
            ResistancePattern::Skeptical => "skeptical",
            ResistancePattern::Active => "active",
            ResistancePattern::Fearful => "fearful",
        }
    }

    pub fn severity(&self) -> &'static str {
        match self {
            ResistancePattern::Passive => "low",
            ResistancePattern::Skeptical => "medium",
            ResistancePattern::Active | ResistancePattern::Fearful => "high",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ResistancePattern::Passive => {
                "Passive resistance - delaying without active opposition"
            }
            ResistancePattern::Skeptical => {
                "Skeptical resistance - requires evidence before buy-in"
            }
            ResistancePattern::Active => "Active resistance - direct opposition",
            ResistancePattern::Fearful => "Fearful resistance - anxiety-driven opposition",
        }
    }
}

/// Root causes inferred behind a group's resistance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootCause {
    PastFailures,
    ThreatPerception,
    ResourceIssues,
    ValueMisalignment,
    KnowledgeGap,
    Unknown,
}

impl RootCause {
    pub const DETECTABLE: [RootCause; 5] = [
        RootCause::PastFailures,
        RootCause::ThreatPerception,
        RootCause::ResourceIssues,
        RootCause::ValueMisalignment,
        RootCause::KnowledgeGap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RootCause::PastFailures => "past_failures",
            RootCause::ThreatPerception => "threat_perception",
            RootCause::ResourceIssues => "resource_issues",
            RootCause::ValueMisalignment => "value_misalignment",
            RootCause::KnowledgeGap => "knowledge_gap",
            RootCause::Unknown => "unknown",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RootCause::PastFailures => "Past failed initiatives creating skepticism",
            RootCause::ThreatPerception => "Perception that AI threatens jobs or expertise",
            RootCause::ResourceIssues => "Concerns about lacking resources for AI adoption",
            RootCause::ValueMisalignment => "AI perceived as misaligned with organizational values",
            RootCause::KnowledgeGap => "Lack of understanding about AI and its applications",
            RootCause::Unknown => "No clear root cause detected",
        }
    }
}

impl fmt::Display for RootCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// One attributed narrative record. Immutable once loaded; analyzers only read it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Story {
    pub id: String,
    pub summary: String,
    pub full_text: String,
    pub outcome: Option<String>,
    #[serde(rename = "type")]
    pub story_type: StoryType,
    pub timestamp: Option<DateTime<Utc>>,
    pub department: Option<String>,
    pub teller_group: Option<String>,
    pub why_told: Option<String>,
    pub source: Option<String>,
    /// Explicit official/employee partition; wins over the source allowlist.
    pub is_official: Option<bool>,
    pub primary_themes: Vec<String>,
    pub values: Vec<String>,
    pub lessons: Vec<String>,
    #[serde(default = "default_true")]
    pub ai_related: bool,
    pub ai_sentiment: Option<f64>,
    pub ai_sophistication: Option<Sophistication>,
    pub innovation_signal: Option<InnovationSignal>,
    pub agency_frame: Option<AgencyFrame>,
    pub narrative_function: Option<String>,
    pub ai_concepts_mentioned: Vec<String>,
    pub experimentation_indicator: bool,
    pub failure_framing: Option<String>,
}

impl Story {
    pub fn new(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
            ai_related: true,
            ..Default::default()
        }
    }

    /// Lowercased `summary + " " + full_text`, the haystack for marker matching.
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.summary.len() + self.full_text.len() + 1);
        text.push_str(&self.summary);
        text.push(' ');
        text.push_str(&self.full_text);
        text.to_lowercase()
    }

    /// Grouping key: teller group, then department, then `"unknown"`.
    pub fn group_key(&self) -> &str {
        self.teller_group
            .as_deref()
            .filter(|g| !g.trim().is_empty())
            .or_else(|| self.department.as_deref().filter(|d| !d.trim().is_empty()))
            .unwrap_or("unknown")
    }

    pub fn sentiment_or_zero(&self) -> f64 {
        self.ai_sentiment.unwrap_or(0.0)
    }

    /// Official partition: explicit flag first, else source allowlist.
    pub fn is_official(&self, official_sources: &[String]) -> bool {
        self.is_official.unwrap_or_else(|| {
            self.source
                .as_deref()
                .map(|s| {
                    official_sources
                        .iter()
                        .any(|allowed| allowed.eq_ignore_ascii_case(s.trim()))
                })
                .unwrap_or(false)
        })
    }

    pub fn source_in(&self, sources: &[String]) -> bool {
        self.source
            .as_deref()
            .map(|s| sources.iter().any(|allowed| allowed.eq_ignore_ascii_case(s.trim())))
            .unwrap_or(false)
    }

    pub fn narrative_function_is(&self, label: &str) -> bool {
        self.narrative_function
            .as_deref()
            .map(|f| f.eq_ignore_ascii_case(label))
            .unwrap_or(false)
    }

    pub fn why_told_is(&self, label: &str) -> bool {
        self.why_told
            .as_deref()
            .map(|w| w.eq_ignore_ascii_case(label))
            .unwrap_or(false)
    }

    /// Clamp sentiment into [-1, 1] and drop non-finite values.
    pub fn sanitized(mut self) -> Self {
        self.ai_sentiment = match self.ai_sentiment {
            Some(s) if s.is_finite() => {
                if !(-1.0..=1.0).contains(&s) {
                    tracing::warn!(story = %self.id, sentiment = s, "clamping out-of-range sentiment");
                }
                Some(s.clamp(-1.0, 1.0))
            }
            Some(s) => {
                tracing::warn!(story = %self.id, sentiment = s, "dropping non-finite sentiment");
                None
            }
            None => None,
        };
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum InitiativeType {
    Tool,
    Process,
    Transformation,
    Pilot,
    #[default]
    Unknown,
}

impl From<String> for InitiativeType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tool" => InitiativeType::Tool,
            "process" => InitiativeType::Process,
            "transformation" => InitiativeType::Transformation,
            "pilot" => InitiativeType::Pilot,
            _ => InitiativeType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum InitiativeStatus {
    Planned,
    Active,
    Paused,
    Completed,
    Failed,
    #[default]
    Unknown,
}

impl From<String> for InitiativeStatus {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "planned" => InitiativeStatus::Planned,
            "active" => InitiativeStatus::Active,
            "paused" => InitiativeStatus::Paused,
            "completed" => InitiativeStatus::Completed,
            "failed" => InitiativeStatus::Failed,
            _ => InitiativeStatus::Unknown,
        }
    }
}

/// An organizational AI effort, linking official and actual tellings by story id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Initiative {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub initiative_type: InitiativeType,
    pub status: InitiativeStatus,
    pub official_description: String,
    pub stated_goals: Vec<String>,
    pub official_story_ids: Vec<String>,
    pub actual_story_ids: Vec<String>,
    pub awareness_score: Option<f64>,
    pub sentiment_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_categoricals_fall_back() {
        let story: Story = serde_json::from_str(
            r#"{"id":"s1","ai_sophistication":"wizard","agency_frame":"robots_rule","type":"saga"}"#,
        )
        .unwrap();
        assert_eq!(story.ai_sophistication, Some(Sophistication::Unknown));
        assert_eq!(story.agency_frame, Some(AgencyFrame::Unknown));
        assert_eq!(story.story_type, StoryType::Unknown);
        assert!(story.ai_related);
    }

    #[test]
    fn known_categoricals_round_trip_labels() {
        let story: Story = serde_json::from_str(
            r#"{"id":"s1","agency_frame":"human_in_control","ai_sophistication":"expert"}"#,
        )
        .unwrap();
        let value = serde_json::to_value(&story).unwrap();
        assert_eq!(value["agency_frame"], "human_in_control");
        assert_eq!(value["ai_sophistication"], "expert");
    }

    #[test]
    fn frame_parse_normalizes_partner() {
        assert_eq!(Frame::parse("partner"), Frame::Partnership);
        assert_eq!(Frame::parse("Partnership"), Frame::Partnership);
        assert_eq!(Frame::parse("warning"), Frame::Other("warning".into()));
        assert_eq!(Frame::parse(""), Frame::Unknown);
    }

    #[test]
    fn opposition_is_symmetric_and_irreflexive() {
        assert!(opposes(&Frame::Tool, &Frame::Replacement, &CORE_OPPOSITIONS));
        assert!(opposes(&Frame::Replacement, &Frame::Tool, &CORE_OPPOSITIONS));
        assert!(!opposes(&Frame::Tool, &Frame::Tool, &CORE_OPPOSITIONS));
        assert!(!opposes(&Frame::Partnership, &Frame::Threat, &CORE_OPPOSITIONS));
        assert!(opposes(&Frame::Threat, &Frame::Partnership, &COMPETITION_OPPOSITIONS));
    }

    #[test]
    fn group_key_prefers_teller_group() {
        let mut story = Story::new("s1", "x");
        assert_eq!(story.group_key(), "unknown");
        story.department = Some("Finance".into());
        assert_eq!(story.group_key(), "Finance");
        story.teller_group = Some("finance_ops".into());
        assert_eq!(story.group_key(), "finance_ops");
    }

    #[test]
    fn official_flag_beats_source() {
        let sources = vec!["official".to_string(), "leadership".to_string()];
        let mut story = Story::new("s1", "x");
        story.source = Some("Leadership".into());
        assert!(story.is_official(&sources));
        story.is_official = Some(false);
        assert!(!story.is_official(&sources));
    }

    #[test]
    fn sanitize_clamps_sentiment() {
        let mut story = Story::new("s1", "x");
        story.ai_sentiment = Some(1.7);
        assert_eq!(story.sanitized().ai_sentiment, Some(1.0));
        let mut story = Story::new("s2", "x");
        story.ai_sentiment = Some(f64::NAN);
        assert_eq!(story.sanitized().ai_sentiment, None);
    }
}
