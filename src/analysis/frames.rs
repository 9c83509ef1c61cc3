use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AnalysisSettings;
use crate::error::Result;
use crate::models::{AgencyFrame, COMPETITION_OPPOSITIONS, Frame, Story, opposes};
use crate::repository::{InitiativeScope, StoryFilter, StoryRepository};
use crate::scoring;
use crate::signals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    FundamentalOpposition,
    AgencyConflict,
    CommitmentConflict,
    PerspectiveDifference,
}

impl ConflictType {
    fn between(a: &Frame, b: &Frame) -> Self {
        let is = |x: &Frame, y: &Frame| (a == x && b == y) || (a == y && b == x);
        if is(&Frame::Opportunity, &Frame::Threat) {
            ConflictType::FundamentalOpposition
        } else if is(&Frame::Tool, &Frame::Replacement) {
            ConflictType::AgencyConflict
        } else if is(&Frame::Experiment, &Frame::Mandate) {
            ConflictType::CommitmentConflict
        } else {
            ConflictType::PerspectiveDifference
        }
    }
}

/// Everything observed under one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameData {
    pub groups: BTreeSet<String>,
    pub stories: Vec<String>,
    /// Missing sentiment counts as 0
    pub sentiments: Vec<f64>,
    pub outcomes: Vec<String>,
    pub story_count: usize,
}

impl FrameData {
    pub fn average_sentiment(&self) -> f64 {
        scoring::mean(&self.sentiments).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameConflict {
    pub frame_a: Frame,
    pub frame_b: Frame,
    pub groups_a: BTreeSet<String>,
    pub groups_b: BTreeSet<String>,
    pub conflict_type: ConflictType,
    pub impact: f64,
    pub story_count_a: usize,
    pub story_count_b: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDominantFrame {
    pub dominant_frame: Frame,
    pub frequency: usize,
    pub all_frames: BTreeMap<String, usize>,
    pub diversity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMap {
    pub frames: BTreeMap<String, FrameData>,
    /// Sorted by impact, highest first
    pub competitions: Vec<FrameConflict>,
    pub dominant_frame_by_group: BTreeMap<String, GroupDominantFrame>,
    pub synthesis: String,
}

impl FrameMap {
    /// Distinct dominant frames across groups.
    pub fn distinct_group_frames(&self) -> usize {
        self.dominant_frame_by_group
            .values()
            .map(|g| g.dominant_frame.label())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameFrequency {
    pub frame: Frame,
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFramePattern {
    pub primary_frames: Vec<FrameFrequency>,
    pub avg_sentiment: f64,
    pub frame_diversity: usize,
    pub total_stories: usize,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommonGround {
    pub shared_values: Vec<String>,
    pub shared_themes: Vec<String>,
    pub shared_concerns: Vec<String>,
    pub bridging_themes: Vec<String>,
    pub bridging_stories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedNarrative {
    pub core_message: String,
    pub acknowledgment_clauses: BTreeMap<String, String>,
    pub bridging_stories: Vec<String>,
    pub reframing_language: BTreeMap<String, String>,
    pub vision_narrative: String,
}

/// Maps the frames competing to describe AI and where they collide.
pub struct FrameCompetitionAnalyzer {
    repo: Arc<dyn StoryRepository>,
    settings: Arc<AnalysisSettings>,
}

impl FrameCompetitionAnalyzer {
    pub fn new(repo: Arc<dyn StoryRepository>, settings: Arc<AnalysisSettings>) -> Self {
        Self { repo, settings }
    }

    pub async fn map_competing_frames(&self, initiative_id: Option<&str>) -> Result<FrameMap> {
        let stories = self.load_stories(initiative_id).await?;
        info!(initiative = ?initiative_id, stories = stories.len(), "mapping competing frames");
        Ok(self.build_frame_map(&stories))
    }

    /// AI stories, or every story tied to the initiative.
    pub async fn load_stories(&self, initiative_id: Option<&str>) -> Result<Vec<Story>> {
        let caps = &self.settings.tuning.caps;
        let filter = match initiative_id {
            Some(id) => StoryFilter::default()
                .initiative(InitiativeScope::Any(id.to_string()))
                .limit(caps.initiative_stories),
            None => StoryFilter::ai().limit(caps.frame_stories),
        };
        self.repo.fetch_stories(&filter).await
    }

    /// Frame priority: narrative function, agency frame, text keywords, sentiment sign.
    pub fn classify_frame(&self, story: &Story) -> Frame {
        if let Some(function) = story.narrative_function.as_deref().filter(|f| !f.trim().is_empty()) {
            return Frame::parse(function);
        }
        match story.agency_frame {
            Some(AgencyFrame::Partnership) => return Frame::Partnership,
            Some(AgencyFrame::AiInControl) => return Frame::Replacement,
            Some(AgencyFrame::HumanInControl) => return Frame::Tool,
            _ => {}
        }
        let text = story.text();
        if let Some(label) =
            signals::first_matching_group(&text, &self.settings.markers.competition_frame_keywords)
        {
            return Frame::parse(label);
        }
        let sentiment = story.sentiment_or_zero();
        if sentiment > 0.5 {
            Frame::Opportunity
        } else if sentiment < -0.5 {
            Frame::Threat
        } else {
            Frame::Neutral
        }
    }

    pub fn build_frame_map(&self, stories: &[Story]) -> FrameMap {
        let mut frames: BTreeMap<String, FrameData> = BTreeMap::new();
        let mut by_group: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for story in stories {
            let frame = self.classify_frame(story).label().to_string();
            let group = story.group_key().to_string();
            let data = frames.entry(frame.clone()).or_default();
            data.groups.insert(group.clone());
            data.stories.push(story.id.clone());
            data.sentiments.push(story.sentiment_or_zero());
            data.outcomes.push(story.outcome.clone().unwrap_or_default());
            data.story_count += 1;
            by_group.entry(group).or_default().push(frame);
        }

        let competitions = identify_frame_conflicts(&frames);
        let dominant_frame_by_group = by_group
            .into_iter()
            .filter_map(|(group, labels)| {
                let counts = scoring::count_labels(labels);
                let (dominant, frequency) = scoring::dominant(&counts)?;
                let profile = GroupDominantFrame {
                    dominant_frame: Frame::parse(dominant),
                    frequency,
                    diversity: counts.len(),
                    all_frames: counts.clone(),
                };
                Some((group, profile))
            })
            .collect();
        debug!(frames = frames.len(), conflicts = competitions.len(), "frame map built");

        let synthesis = synthesize(frames.len(), competitions.len());
        FrameMap {
            frames,
            competitions,
            dominant_frame_by_group,
            synthesis,
        }
    }

    /// How each group systematically frames AI.
    pub async fn analyze_group_frame_patterns(&self) -> Result<BTreeMap<String, GroupFramePattern>> {
        let stories = self
            .repo
            .fetch_stories(&StoryFilter::ai().limit(self.settings.tuning.caps.readiness_stories))
            .await?;
        info!(stories = stories.len(), "analyzing group frame patterns");

        let mut grouped: BTreeMap<String, Vec<&Story>> = BTreeMap::new();
        for story in &stories {
            grouped.entry(story.group_key().to_string()).or_default().push(story);
        }

        Ok(grouped
            .into_iter()
            .map(|(group, members)| {
                let counts =
                    scoring::count_labels(members.iter().map(|s| self.classify_frame(s).label().to_string()));
                let primary_frames: Vec<FrameFrequency> = scoring::ranked(&counts)
                    .into_iter()
                    .map(|(label, frequency)| FrameFrequency {
                        frame: Frame::parse(&label),
                        frequency,
                    })
                    .collect();
                let sentiments: Vec<f64> = members.iter().filter_map(|s| s.ai_sentiment).collect();
                let avg_sentiment = scoring::mean(&sentiments).unwrap_or(0.0);
                let interpretation = interpret_group_pattern(&primary_frames, avg_sentiment);
                let pattern = GroupFramePattern {
                    frame_diversity: primary_frames.len(),
                    total_stories: members.len(),
                    primary_frames,
                    avg_sentiment,
                    interpretation,
                };
                (group, pattern)
            })
            .collect())
    }

    /// What the competing frames agree on.
    pub fn find_narrative_common_ground(&self, frame_map: &FrameMap, stories: &[Story]) -> CommonGround {
        if frame_map.frames.is_empty() {
            return CommonGround::default();
        }
        let by_id: BTreeMap<&str, &Story> = stories.iter().map(|s| (s.id.as_str(), s)).collect();

        // per element: the set of frames whose stories mention it
        let mut value_frames: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
        let mut theme_frames: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
        let mut concern_frames: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (frame, data) in &frame_map.frames {
            for story in data.stories.iter().filter_map(|id| by_id.get(id.as_str())) {
                for value in &story.values {
                    value_frames.entry(value.clone()).or_default().insert(frame.as_str());
                }
                for theme in &story.primary_themes {
                    theme_frames.entry(theme.clone()).or_default().insert(frame.as_str());
                }
                let text = story.text();
                for concern in signals::detect(&text, &self.settings.markers.concerns) {
                    concern_frames.entry(concern).or_default().insert(frame.as_str());
                }
            }
        }

        let threshold = frame_map.frames.len() as f64 * 0.5;
        let shared = |counts: &BTreeMap<String, BTreeSet<&str>>| -> Vec<String> {
            counts
                .iter()
                .filter(|(_, frames)| frames.len() as f64 >= threshold)
                .map(|(k, _)| k.clone())
                .collect()
        };
        let shared_values = shared(&value_frames);
        let shared_themes = shared(&theme_frames);
        let shared_concerns = concern_frames
            .into_iter()
            .filter(|(_, frames)| frames.len() >= 2)
            .map(|(c, _)| c.to_string())
            .collect();
        let bridging_themes = self
            .settings
            .markers
            .bridging_themes
            .iter()
            .filter(|b| shared_values.contains(b) || shared_themes.contains(b))
            .cloned()
            .collect();
        let bridging_stories = if shared_themes.is_empty() {
            Vec::new()
        } else {
            stories
                .iter()
                .filter(|s| s.ai_related)
                .filter(|s| {
                    s.primary_themes
                        .iter()
                        .filter(|t| shared_themes.contains(*t))
                        .count()
                        >= 2
                })
                .take(5)
                .map(|s| s.id.clone())
                .collect()
        };

        CommonGround {
            shared_values,
            shared_themes,
            shared_concerns,
            bridging_themes,
            bridging_stories,
        }
    }

    /// A narrative bridging the conflicting frames.
    pub fn design_unified_narrative(
        &self,
        conflicts: &[FrameConflict],
        common_ground: &CommonGround,
    ) -> UnifiedNarrative {
        let values = &common_ground.shared_values;
        let themes = &common_ground.shared_themes;
        let core_message = if !values.is_empty() && !themes.is_empty() {
            format!(
                "We're united in our commitment to {} while navigating {}",
                first_two(values),
                first_two(themes)
            )
        } else {
            "We're exploring AI together, learning as we go".to_string()
        };

        let mut acknowledgment_clauses = BTreeMap::new();
        let mut reframing_language = BTreeMap::new();
        for conflict in conflicts {
            for frame in [&conflict.frame_a, &conflict.frame_b] {
                acknowledgment_clauses.insert(frame.label().to_string(), acknowledgment(frame));
            }
            reframing_language.insert(
                format!("{}_vs_{}", conflict.frame_a, conflict.frame_b),
                reframe(&conflict.frame_a, &conflict.frame_b),
            );
        }

        let vision_narrative = match values.first() {
            Some(value) => format!(
                "Our vision: Leveraging AI to amplify {} while staying true to our core values",
                value
            ),
            None => "Our vision: Thoughtful AI adoption that enhances human capability".to_string(),
        };

        UnifiedNarrative {
            core_message,
            acknowledgment_clauses,
            bridging_stories: common_ground.bridging_stories.clone(),
            reframing_language,
            vision_narrative,
        }
    }
}

fn identify_frame_conflicts(frames: &BTreeMap<String, FrameData>) -> Vec<FrameConflict> {
    let entries: Vec<(Frame, &FrameData)> = frames
        .iter()
        .map(|(label, data)| (Frame::parse(label), data))
        .collect();
    let mut conflicts = Vec::new();
    for (i, (frame_a, data_a)) in entries.iter().enumerate() {
        for (frame_b, data_b) in &entries[i + 1..] {
            if !opposes(frame_a, frame_b, &COMPETITION_OPPOSITIONS) {
                continue;
            }
            conflicts.push(FrameConflict {
                frame_a: frame_a.clone(),
                frame_b: frame_b.clone(),
                groups_a: data_a.groups.clone(),
                groups_b: data_b.groups.clone(),
                conflict_type: ConflictType::between(frame_a, frame_b),
                impact: conflict_impact(data_a, data_b),
                story_count_a: data_a.story_count,
                story_count_b: data_b.story_count,
            });
        }
    }
    conflicts.sort_by(|a, b| b.impact.total_cmp(&a.impact));
    conflicts
}

/// 0.4 story volume + 0.3 group spread + 0.3 sentiment divergence, capped at 1.
pub fn conflict_impact(a: &FrameData, b: &FrameData) -> f64 {
    let story_factor = ((a.story_count + b.story_count) as f64 / 50.0).min(1.0);
    let groups = a.groups.union(&b.groups).count();
    let group_factor = (groups as f64 / 10.0).min(1.0);
    let divergence = (a.average_sentiment() - b.average_sentiment()).abs();
    (story_factor * 0.4 + group_factor * 0.3 + divergence * 0.3).min(1.0)
}

fn synthesize(total_frames: usize, total_conflicts: usize) -> String {
    if total_conflicts == 0 {
        format!("Unified narrative landscape with {total_frames} frames showing alignment")
    } else if total_conflicts > 3 {
        format!(
            "Highly fragmented narrative landscape with {total_conflicts} major conflicts across {total_frames} frames"
        )
    } else {
        format!("Moderate frame competition with {total_conflicts} conflicts. Some alignment possible.")
    }
}

fn interpret_group_pattern(primary: &[FrameFrequency], avg_sentiment: f64) -> String {
    let Some(first) = primary.first() else {
        return "Limited AI narrative activity".to_string();
    };
    let dominant = &first.frame;
    if avg_sentiment > 0.5 && *dominant == Frame::Opportunity {
        "Enthusiastically embracing AI as opportunity".to_string()
    } else if avg_sentiment < -0.5 && *dominant == Frame::Threat {
        "Highly skeptical, viewing AI as threat".to_string()
    } else if primary.len() > 3 {
        "Multiple perspectives, no dominant frame - indicates evolving understanding".to_string()
    } else if *dominant == Frame::Tool {
        "Pragmatic view - AI as tool to augment work".to_string()
    } else if *dominant == Frame::Replacement {
        "Concerned about automation replacing roles".to_string()
    } else {
        let tone = if avg_sentiment > 0.0 { "positive" } else { "negative" };
        format!("Primary frame: {dominant}, sentiment: {tone}")
    }
}

fn acknowledgment(frame: &Frame) -> String {
    match frame {
        Frame::Threat => "We understand concerns about how AI might change roles and responsibilities".to_string(),
        Frame::Opportunity => "We recognize the potential for AI to enhance our capabilities".to_string(),
        Frame::Tool => "We see AI as something we can learn to use effectively".to_string(),
        Frame::Replacement => "We acknowledge anxiety about automation".to_string(),
        Frame::Experiment => "We appreciate the importance of testing carefully".to_string(),
        Frame::Mandate => "We hear the need for clear direction and commitment".to_string(),
        other => format!("We acknowledge the {other} perspective"),
    }
}

fn reframe(a: &Frame, b: &Frame) -> String {
    match ConflictType::between(a, b) {
        ConflictType::FundamentalOpposition => {
            "AI as a transition we navigate together, with both opportunities and challenges".to_string()
        }
        ConflictType::AgencyConflict => {
            "AI augments human capabilities rather than replacing them".to_string()
        }
        ConflictType::CommitmentConflict => {
            "Committed exploration - we're serious about AI while remaining adaptive".to_string()
        }
        ConflictType::PerspectiveDifference => format!("Balance between {a} and {b} perspectives"),
    }
}

fn first_two(items: &[String]) -> String {
    items.iter().take(2).cloned().collect::<Vec<_>>().join(", ")
}
