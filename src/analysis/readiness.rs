use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::sentiments;
use crate::config::{AnalysisSettings, PolarityCatalog, ReadinessWeights};
use crate::error::Result;
use crate::models::Story;
use crate::repository::{InitiativeScope, StoryFilter, StoryRepository};
use crate::scoring::{
    self, Boundary, CoherenceEvidence, DimensionScore, Evidence, NEUTRAL, PairAlignment,
    STANDARD_BANDS,
};
use crate::signals;

/// The six weighted readiness dimensions, in weighting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessDimension {
    NarrativeAlignment,
    CulturalReceptivity,
    TrustLevels,
    LearningOrientation,
    LeadershipCoherence,
    CoordinationNarrative,
}

impl ReadinessDimension {
    pub const ALL: [ReadinessDimension; 6] = [
        ReadinessDimension::NarrativeAlignment,
        ReadinessDimension::CulturalReceptivity,
        ReadinessDimension::TrustLevels,
        ReadinessDimension::LearningOrientation,
        ReadinessDimension::LeadershipCoherence,
        ReadinessDimension::CoordinationNarrative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessDimension::NarrativeAlignment => "narrative_alignment",
            ReadinessDimension::CulturalReceptivity => "cultural_receptivity",
            ReadinessDimension::TrustLevels => "trust_levels",
            ReadinessDimension::LearningOrientation => "learning_orientation",
            ReadinessDimension::LeadershipCoherence => "leadership_coherence",
            ReadinessDimension::CoordinationNarrative => "coordination_narrative",
        }
    }

    pub fn weight(&self, weights: &ReadinessWeights) -> f64 {
        match self {
            ReadinessDimension::NarrativeAlignment => weights.narrative_alignment,
            ReadinessDimension::CulturalReceptivity => weights.cultural_receptivity,
            ReadinessDimension::TrustLevels => weights.trust_levels,
            ReadinessDimension::LearningOrientation => weights.learning_orientation,
            ReadinessDimension::LeadershipCoherence => weights.leadership_coherence,
            ReadinessDimension::CoordinationNarrative => weights.coordination_narrative,
        }
    }

    fn recommendation(&self, critical: bool) -> &'static str {
        match (self, critical) {
            (ReadinessDimension::NarrativeAlignment, true) => {
                "CRITICAL: Facilitate cross-group dialogue to align narratives. Create shared experiences and common language."
            }
            (ReadinessDimension::NarrativeAlignment, false) => {
                "Improve narrative alignment through shared storytelling sessions and cross-functional teams."
            }
            (ReadinessDimension::CulturalReceptivity, true) => {
                "CRITICAL: Address risk-averse culture through small wins, pilot projects, and celebration of learning."
            }
            (ReadinessDimension::CulturalReceptivity, false) => {
                "Enhance innovation culture by showcasing successful experiments and reducing fear of failure."
            }
            (ReadinessDimension::TrustLevels, true) => {
                "CRITICAL: Rebuild trust through transparency, consistent communication, and demonstrating follow-through on commitments."
            }
            (ReadinessDimension::TrustLevels, false) => {
                "Improve trust by increasing leadership visibility and creating feedback loops."
            }
            (ReadinessDimension::LearningOrientation, true) => {
                "CRITICAL: Shift to growth mindset through training, mentorship, and rewarding learning behaviors."
            }
            (ReadinessDimension::LearningOrientation, false) => {
                "Strengthen learning culture with skill development opportunities and knowledge sharing."
            }
            (ReadinessDimension::LeadershipCoherence, true) => {
                "CRITICAL: Align leadership messaging immediately. Create unified talking points and coordinated communication plan."
            }
            (ReadinessDimension::LeadershipCoherence, false) => {
                "Improve leadership alignment through regular coordination meetings and shared messaging framework."
            }
            (ReadinessDimension::CoordinationNarrative, true) => {
                "CRITICAL: Establish cross-functional coordination mechanisms and shared goals to break down silos."
            }
            (ReadinessDimension::CoordinationNarrative, false) => {
                "Enhance coordination through regular cross-team meetings and shared success metrics."
            }
        }
    }
}

impl std::fmt::Display for ReadinessDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessDimensions {
    pub narrative_alignment: DimensionScore,
    pub cultural_receptivity: DimensionScore,
    pub trust_levels: DimensionScore,
    pub learning_orientation: DimensionScore,
    pub leadership_coherence: DimensionScore,
    pub coordination_narrative: DimensionScore,
}

impl ReadinessDimensions {
    pub fn get(&self, dimension: ReadinessDimension) -> &DimensionScore {
        match dimension {
            ReadinessDimension::NarrativeAlignment => &self.narrative_alignment,
            ReadinessDimension::CulturalReceptivity => &self.cultural_receptivity,
            ReadinessDimension::TrustLevels => &self.trust_levels,
            ReadinessDimension::LearningOrientation => &self.learning_orientation,
            ReadinessDimension::LeadershipCoherence => &self.leadership_coherence,
            ReadinessDimension::CoordinationNarrative => &self.coordination_narrative,
        }
    }

    /// Scores in [`ReadinessDimension::ALL`] order.
    pub fn scores(&self) -> [f64; 6] {
        ReadinessDimension::ALL.map(|d| self.get(d).score)
    }

    fn filtered(&self, pred: impl Fn(f64) -> bool) -> Vec<ReadinessDimension> {
        ReadinessDimension::ALL
            .into_iter()
            .filter(|d| pred(self.get(*d).score))
            .collect()
    }

    pub fn strengths(&self) -> Vec<ReadinessDimension> {
        self.filtered(|s| s > 0.7)
    }

    pub fn weaknesses(&self) -> Vec<ReadinessDimension> {
        self.filtered(|s| s < 0.4)
    }
}

/// Weighted sum of dimension scores given in [`ReadinessDimension::ALL`] order.
pub fn weighted_overall(weights: &ReadinessWeights, scores: &[f64; 6]) -> f64 {
    ReadinessDimension::ALL
        .iter()
        .zip(scores)
        .map(|(d, s)| d.weight(weights) * s)
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessClass {
    HighlyReady,
    Ready,
    ModeratelyReady,
    LimitedReadiness,
    NotReady,
    InsufficientData,
}

impl ReadinessClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessClass::HighlyReady => "highly_ready",
            ReadinessClass::Ready => "ready",
            ReadinessClass::ModeratelyReady => "moderately_ready",
            ReadinessClass::LimitedReadiness => "limited_readiness",
            ReadinessClass::NotReady => "not_ready",
            ReadinessClass::InsufficientData => "insufficient_data",
        }
    }

    pub fn interpretation(&self) -> &'static str {
        match self {
            ReadinessClass::HighlyReady => {
                "Organization shows strong readiness across all dimensions. Conditions are favorable for successful AI adoption."
            }
            ReadinessClass::Ready => {
                "Organization is ready for AI adoption with some areas needing attention. Proceed with monitoring of weaker dimensions."
            }
            ReadinessClass::ModeratelyReady => {
                "Organization has mixed readiness. Address critical gaps before full-scale rollout to improve success probability."
            }
            ReadinessClass::LimitedReadiness => {
                "Organization faces significant readiness challenges. Targeted interventions required before proceeding."
            }
            ReadinessClass::NotReady => {
                "Organization is not ready for AI adoption. Fundamental cultural or structural issues must be addressed first."
            }
            ReadinessClass::InsufficientData => "Not enough stories to assess readiness",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    Increasing,
    Stable,
    Decreasing,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentTrend {
    Improving,
    Stable,
    Declining,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    Accelerating,
    Steady,
    Moderate,
    Slow,
    AtRisk,
    Stalled,
}

impl Trajectory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trajectory::Accelerating => "accelerating",
            Trajectory::Steady => "steady",
            Trajectory::Moderate => "moderate",
            Trajectory::Slow => "slow",
            Trajectory::AtRisk => "at_risk",
            Trajectory::Stalled => "stalled",
        }
    }

    pub fn timeline(&self) -> &'static str {
        match self {
            Trajectory::Accelerating => "3-6 months",
            Trajectory::Steady => "6-12 months",
            Trajectory::Moderate => "12-18 months",
            Trajectory::Slow => "18-24 months",
            Trajectory::AtRisk => "24+ months or may not succeed",
            Trajectory::Stalled => "Indefinite - intervention required",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastConfidence {
    High,
    Medium,
    Low,
    VeryLow,
}

impl ForecastConfidence {
    pub fn from_story_count(count: usize) -> Self {
        match count {
            n if n >= 100 => ForecastConfidence::High,
            n if n >= 50 => ForecastConfidence::Medium,
            n if n >= 20 => ForecastConfidence::Low,
            _ => ForecastConfidence::VeryLow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub trajectory: Trajectory,
    pub momentum_score: f64,
    pub volume_trend: VolumeTrend,
    pub sentiment_trend: SentimentTrend,
    pub critical_barriers: Vec<ReadinessDimension>,
    pub strengths: Vec<ReadinessDimension>,
    pub timeline_estimate: String,
    pub confidence: ForecastConfidence,
    pub key_factors: Vec<String>,
    pub risks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub initiative_id: Option<String>,
    pub story_count: usize,
    pub overall_score: f64,
    pub classification: ReadinessClass,
    pub interpretation: String,
    /// `None` when there were no stories to score.
    pub dimension_scores: Option<ReadinessDimensions>,
    pub strengths: Vec<ReadinessDimension>,
    pub weaknesses: Vec<ReadinessDimension>,
    pub recommendations: Vec<String>,
    pub forecast: Option<Forecast>,
}

impl ReadinessReport {
    pub fn dimension_score(&self, dimension: ReadinessDimension) -> f64 {
        self.dimension_scores
            .as_ref()
            .map(|d| d.get(dimension).score)
            .unwrap_or(NEUTRAL)
    }
}

/// Six-dimension readiness assessment plus an adoption trajectory forecast.
pub struct AdoptionReadinessScorer {
    repo: Arc<dyn StoryRepository>,
    settings: Arc<AnalysisSettings>,
}

impl AdoptionReadinessScorer {
    pub fn new(repo: Arc<dyn StoryRepository>, settings: Arc<AnalysisSettings>) -> Self {
        Self { repo, settings }
    }

    pub async fn assess_readiness(&self, initiative_id: Option<&str>) -> Result<ReadinessReport> {
        let caps = &self.settings.tuning.caps;
        let filter = match initiative_id {
            Some(id) => StoryFilter::default()
                .initiative(InitiativeScope::Actual(id.to_string()))
                .limit(caps.initiative_stories),
            None => StoryFilter::ai().limit(caps.readiness_stories),
        };
        let stories = self.repo.fetch_stories(&filter).await?;
        info!(initiative = ?initiative_id, stories = stories.len(), "assessing adoption readiness");
        Ok(self.readiness_report(initiative_id, &stories))
    }

    pub fn readiness_report(&self, initiative_id: Option<&str>, stories: &[Story]) -> ReadinessReport {
        if stories.is_empty() {
            warn!(initiative = ?initiative_id, "no stories available for readiness");
            let classification = ReadinessClass::InsufficientData;
            return ReadinessReport {
                initiative_id: initiative_id.map(str::to_string),
                story_count: 0,
                overall_score: 0.0,
                classification,
                interpretation: classification.interpretation().to_string(),
                dimension_scores: None,
                strengths: Vec::new(),
                weaknesses: Vec::new(),
                recommendations: Vec::new(),
                forecast: None,
            };
        }

        let dimensions = self.score_dimensions(stories);
        let overall = weighted_overall(&self.settings.tuning.readiness_weights, &dimensions.scores());
        let classification = self.classify_readiness(overall);
        let forecast = self.forecast_adoption_trajectory(stories, &dimensions);
        debug!(overall, classification = classification.as_str(), "readiness scored");

        ReadinessReport {
            initiative_id: initiative_id.map(str::to_string),
            story_count: stories.len(),
            overall_score: scoring::round3(overall),
            classification,
            interpretation: classification.interpretation().to_string(),
            strengths: dimensions.strengths(),
            weaknesses: dimensions.weaknesses(),
            recommendations: recommendations(&dimensions),
            forecast: Some(forecast),
            dimension_scores: Some(dimensions),
        }
    }

    pub fn score_dimensions(&self, stories: &[Story]) -> ReadinessDimensions {
        ReadinessDimensions {
            narrative_alignment: self.score_narrative_alignment(stories),
            cultural_receptivity: self.score_cultural_receptivity(stories),
            trust_levels: self.score_trust_levels(stories),
            learning_orientation: self.score_learning_orientation(stories),
            leadership_coherence: self.score_leadership_coherence(stories),
            coordination_narrative: self.score_coordination_narrative(stories),
        }
    }

    pub fn classify_readiness(&self, overall: f64) -> ReadinessClass {
        scoring::classify(
            overall,
            &self.settings.tuning.readiness_bands,
            &[
                ReadinessClass::HighlyReady,
                ReadinessClass::Ready,
                ReadinessClass::ModeratelyReady,
                ReadinessClass::LimitedReadiness,
                ReadinessClass::NotReady,
            ],
            Boundary::AtLeast,
        )
    }

    /// Mean pairwise alignment across every pair of teller groups.
    pub fn score_narrative_alignment(&self, stories: &[Story]) -> DimensionScore {
        let mut by_group: BTreeMap<&str, Vec<&Story>> = BTreeMap::new();
        for story in stories {
            by_group.entry(story.group_key()).or_default().push(story);
        }
        if by_group.len() < 2 {
            return DimensionScore::neutral("Not enough groups for alignment assessment");
        }

        let groups: Vec<(&str, Vec<&Story>)> = by_group.into_iter().collect();
        let mut pairs = Vec::new();
        for (i, (left, left_stories)) in groups.iter().enumerate() {
            for (right, right_stories) in &groups[i + 1..] {
                let frame_alignment = compare_group_frames(left_stories, right_stories);
                let sentiment_alignment = compare_group_sentiment(left_stories, right_stories);
                let theme_alignment = compare_group_themes(left_stories, right_stories);
                pairs.push(PairAlignment {
                    groups: [left.to_string(), right.to_string()],
                    alignment: (frame_alignment + sentiment_alignment + theme_alignment) / 3.0,
                    frame_alignment,
                    sentiment_alignment,
                    theme_alignment,
                });
            }
        }
        let alignments: Vec<f64> = pairs.iter().map(|p| p.alignment).collect();
        let score = scoring::mean(&alignments).unwrap_or(NEUTRAL);
        for pair in &mut pairs {
            pair.alignment = scoring::round3(pair.alignment);
            pair.frame_alignment = scoring::round3(pair.frame_alignment);
            pair.sentiment_alignment = scoring::round3(pair.sentiment_alignment);
            pair.theme_alignment = scoring::round3(pair.theme_alignment);
        }
        let interpretation = scoring::classify(
            score,
            &STANDARD_BANDS,
            &[
                "Strong narrative alignment across groups. Stories are compatible and mutually reinforcing.",
                "Moderate alignment with some inconsistencies. Groups generally agree but with different emphases.",
                "Weak alignment. Groups telling different stories about AI with potential conflicts.",
                "Poor alignment. Conflicting narratives across groups indicate fundamental disagreements.",
            ],
            Boundary::AtLeast,
        );
        DimensionScore {
            score: scoring::round3(score),
            positive_signals: None,
            negative_signals: None,
            evidence: Evidence::GroupPairs(pairs),
            interpretation: interpretation.to_string(),
        }
    }

    fn polarity_dimension(
        &self,
        stories: &[Story],
        catalog: &PolarityCatalog,
        labels: (&str, &str),
        interpret: impl Fn(f64, usize, usize) -> String,
    ) -> DimensionScore {
        let scan = signals::scan_polarity(stories, catalog, labels, self.settings.tuning.evidence_limit);
        let score = scoring::polarity_ratio(scan.positive, scan.negative);
        DimensionScore {
            score: scoring::round3(score),
            positive_signals: Some(scan.positive),
            negative_signals: Some(scan.negative),
            interpretation: interpret(score, scan.positive, scan.negative),
            evidence: Evidence::Signals(scan.evidence),
        }
    }

    pub fn score_cultural_receptivity(&self, stories: &[Story]) -> DimensionScore {
        self.polarity_dimension(
            stories,
            &self.settings.markers.receptivity,
            ("innovation", "risk_aversion"),
            |score, innovation, risk| {
                let band = scoring::classify(
                    score,
                    &STANDARD_BANDS,
                    &[0, 1, 2, 3],
                    Boundary::AtLeast,
                );
                match band {
                    0 => format!("Strong innovation culture ({innovation} innovation signals vs {risk} risk signals). Organization embraces change."),
                    1 => format!("Balanced culture ({innovation} innovation vs {risk} risk signals). Some openness with reasonable caution."),
                    2 => format!("Risk-averse tendency ({innovation} innovation vs {risk} risk signals). Caution outweighs experimentation."),
                    _ => format!("Highly risk-averse culture ({innovation} innovation vs {risk} risk signals). Significant barrier to AI adoption."),
                }
            },
        )
    }

    pub fn score_trust_levels(&self, stories: &[Story]) -> DimensionScore {
        self.polarity_dimension(
            stories,
            &self.settings.markers.trust,
            ("high_trust", "low_trust"),
            |score, high, low| {
                match scoring::classify(score, &STANDARD_BANDS, &[0, 1, 2, 3], Boundary::AtLeast) {
                    0 => format!("High trust in leadership ({high} positive vs {low} negative signals). Strong foundation for change."),
                    1 => format!("Moderate trust ({high} positive vs {low} negative signals). Leadership credibility is adequate but fragile."),
                    2 => format!("Low trust ({high} positive vs {low} negative signals). Skepticism toward leadership decisions."),
                    _ => format!("Very low trust ({high} positive vs {low} negative signals). Major credibility issues must be addressed."),
                }
            },
        )
    }

    pub fn score_learning_orientation(&self, stories: &[Story]) -> DimensionScore {
        self.polarity_dimension(
            stories,
            &self.settings.markers.learning,
            ("growth", "fixed"),
            |score, growth, fixed| {
                match scoring::classify(score, &STANDARD_BANDS, &[0, 1, 2, 3], Boundary::AtLeast) {
                    0 => format!("Strong growth mindset ({growth} growth vs {fixed} fixed signals). Organization ready to learn new skills."),
                    1 => format!("Mixed mindset ({growth} growth vs {fixed} fixed signals). Some learning resistance exists."),
                    2 => format!("Fixed mindset tendency ({growth} growth vs {fixed} fixed signals). Belief that capabilities are unchangeable."),
                    _ => format!("Strong fixed mindset ({growth} growth vs {fixed} fixed signals). Major barrier to skill development."),
                }
            },
        )
    }

    pub fn score_coordination_narrative(&self, stories: &[Story]) -> DimensionScore {
        self.polarity_dimension(
            stories,
            &self.settings.markers.coordination,
            ("strong_coordination", "weak_coordination"),
            |score, strong, weak| {
                match scoring::classify(score, &STANDARD_BANDS, &[0, 1, 2, 3], Boundary::AtLeast) {
                    0 => format!("Strong coordination signals ({strong} positive vs {weak} negative). Stories indicate effective collaboration."),
                    1 => format!("Moderate coordination ({strong} positive vs {weak} negative). Some collaboration with room for improvement."),
                    2 => format!("Weak coordination ({strong} positive vs {weak} negative). Stories suggest siloed work."),
                    _ => format!("Very weak coordination ({strong} positive vs {weak} negative). Fragmented effort across organization."),
                }
            },
        )
    }

    fn is_leadership_story(&self, story: &Story) -> bool {
        let group = story.group_key().to_lowercase();
        self.settings
            .markers
            .leadership_groups
            .iter()
            .any(|marker| group.contains(&marker.to_lowercase()))
    }

    /// Consistency of frame, sentiment and concepts across leadership stories.
    pub fn score_leadership_coherence(&self, stories: &[Story]) -> DimensionScore {
        let leadership: Vec<&Story> = stories.iter().filter(|s| self.is_leadership_story(s)).collect();
        if leadership.len() < 2 {
            return DimensionScore::neutral("Insufficient leadership stories for coherence assessment");
        }

        let frames = scoring::count_labels(leadership.iter().map(|s| agency_label(s)));
        let frame_consistency = scoring::dominant(&frames)
            .map(|(_, count)| count as f64 / leadership.len() as f64)
            .unwrap_or(NEUTRAL);

        let leader_sentiments: Vec<f64> = leadership.iter().filter_map(|s| s.ai_sentiment).collect();
        let sentiment_consistency = if leader_sentiments.len() < 2 {
            NEUTRAL
        } else {
            1.0 - scoring::std_dev(&leader_sentiments).unwrap_or(0.0).min(1.0)
        };

        let concepts: Vec<&String> = leadership
            .iter()
            .flat_map(|s| s.ai_concepts_mentioned.iter())
            .collect();
        let theme_consistency = if concepts.is_empty() {
            NEUTRAL
        } else {
            let unique: BTreeSet<&String> = concepts.iter().copied().collect();
            scoring::clamp_unit(1.0 - unique.len() as f64 / concepts.len() as f64)
        };

        let score = (frame_consistency + sentiment_consistency + theme_consistency) / 3.0;
        let count = leadership.len();
        let interpretation = match scoring::classify(score, &STANDARD_BANDS, &[0, 1, 2, 3], Boundary::AtLeast) {
            0 => format!("High leadership coherence ({count} stories analyzed). Leaders deliver consistent message."),
            1 => format!("Moderate coherence ({count} stories). Some inconsistency in leadership messaging."),
            2 => format!("Low coherence ({count} stories). Leaders sending mixed messages."),
            _ => format!("Poor coherence ({count} stories). Leadership narratives are contradictory."),
        };
        DimensionScore {
            score: scoring::round3(score),
            positive_signals: None,
            negative_signals: None,
            evidence: Evidence::Coherence(CoherenceEvidence {
                leadership_story_count: count,
                frame_consistency: scoring::round3(frame_consistency),
                sentiment_consistency: scoring::round3(sentiment_consistency),
                theme_consistency: scoring::round3(theme_consistency),
                sample_stories: leadership.iter().take(5).map(|s| s.id.clone()).collect(),
            }),
            interpretation,
        }
    }

    /// Momentum from volume and sentiment trends plus the current dimension scores.
    pub fn forecast_adoption_trajectory(&self, stories: &[Story], dimensions: &ReadinessDimensions) -> Forecast {
        let tuning = &self.settings.tuning.forecast;
        let volume_trend = volume_trend(stories);
        let sentiment_trend = sentiment_trend(stories, tuning.min_sentiment_stories, tuning.trend_delta);
        let critical_barriers = dimensions.weaknesses();
        let strengths = dimensions.strengths();

        let mut momentum = NEUTRAL;
        match volume_trend {
            VolumeTrend::Increasing => momentum += tuning.volume_adjustment,
            VolumeTrend::Decreasing => momentum -= tuning.volume_adjustment,
            _ => {}
        }
        match sentiment_trend {
            SentimentTrend::Improving => momentum += tuning.sentiment_adjustment,
            SentimentTrend::Declining => momentum -= tuning.sentiment_adjustment,
            _ => {}
        }
        let avg_dimension = scoring::mean(&dimensions.scores()).unwrap_or(NEUTRAL);
        momentum += (avg_dimension - NEUTRAL) * tuning.dimension_adjustment;
        let momentum = scoring::clamp_unit(momentum);

        let trajectory = if critical_barriers.len() >= 3 {
            Trajectory::Stalled
        } else if critical_barriers.len() >= 2 {
            Trajectory::Slow
        } else if momentum > 0.7 && strengths.len() >= 3 {
            Trajectory::Accelerating
        } else if momentum > 0.6 {
            Trajectory::Steady
        } else if momentum > 0.4 {
            Trajectory::Moderate
        } else {
            Trajectory::AtRisk
        };
        debug!(
            momentum,
            ?volume_trend,
            ?sentiment_trend,
            trajectory = trajectory.as_str(),
            "adoption trajectory forecast"
        );

        Forecast {
            trajectory,
            momentum_score: scoring::round3(momentum),
            volume_trend,
            sentiment_trend,
            timeline_estimate: trajectory.timeline().to_string(),
            confidence: ForecastConfidence::from_story_count(stories.len()),
            key_factors: key_factors(dimensions, &critical_barriers, &strengths),
            risks: forecast_risks(&critical_barriers, momentum),
            critical_barriers,
            strengths,
        }
    }
}

fn agency_label(story: &Story) -> &'static str {
    story.agency_frame.map(|f| f.as_str()).unwrap_or("unknown")
}

fn compare_group_frames(left: &[&Story], right: &[&Story]) -> f64 {
    let left_counts = scoring::count_labels(left.iter().map(|s| agency_label(s)));
    let right_counts = scoring::count_labels(right.iter().map(|s| agency_label(s)));
    if scoring::dominant(&left_counts).map(|(l, _)| l) == scoring::dominant(&right_counts).map(|(l, _)| l) {
        return 1.0;
    }
    let overlap: usize = left_counts
        .iter()
        .map(|(frame, &n)| n.min(right_counts.get(frame).copied().unwrap_or(0)))
        .sum();
    let total = left.len() + right.len();
    if total == 0 {
        NEUTRAL
    } else {
        2.0 * overlap as f64 / total as f64
    }
}

fn compare_group_sentiment(left: &[&Story], right: &[&Story]) -> f64 {
    let avg = |stories: &[&Story]| {
        let values: Vec<f64> = stories.iter().filter_map(|s| s.ai_sentiment).collect();
        scoring::mean(&values)
    };
    match (avg(left), avg(right)) {
        (Some(a), Some(b)) => scoring::clamp_unit(1.0 - (a - b).abs() / 2.0),
        _ => NEUTRAL,
    }
}

fn compare_group_themes(left: &[&Story], right: &[&Story]) -> f64 {
    let concepts = |stories: &[&Story]| -> BTreeSet<String> {
        stories
            .iter()
            .flat_map(|s| s.ai_concepts_mentioned.iter().cloned())
            .collect()
    };
    scoring::jaccard(&concepts(left), &concepts(right)).unwrap_or(NEUTRAL)
}

/// Compares dated story counts either side of the midpoint of the timestamp range.
pub fn volume_trend(stories: &[Story]) -> VolumeTrend {
    let stamps: Vec<DateTime<Utc>> = stories.iter().filter_map(|s| s.timestamp).collect();
    let (Some(first), Some(last)) = (stamps.iter().min(), stamps.iter().max()) else {
        return VolumeTrend::Unknown;
    };
    if first == last {
        return VolumeTrend::Unknown;
    }
    let midpoint = *first + (*last - *first) / 2;
    let early = stamps.iter().filter(|t| **t < midpoint).count() as f64;
    let late = stamps.iter().filter(|t| **t >= midpoint).count() as f64;
    if late > early * 1.2 {
        VolumeTrend::Increasing
    } else if late < early * 0.8 {
        VolumeTrend::Decreasing
    } else {
        VolumeTrend::Stable
    }
}

/// Early-half versus late-half mean sentiment in timestamp order.
pub fn sentiment_trend(stories: &[Story], min_stories: usize, delta: f64) -> SentimentTrend {
    let mut dated: Vec<(Option<DateTime<Utc>>, f64)> = stories
        .iter()
        .filter_map(|s| s.ai_sentiment.map(|v| (s.timestamp, v)))
        .collect();
    if dated.len() < min_stories.max(2) {
        return SentimentTrend::Unknown;
    }
    dated.sort_by_key(|(t, _)| *t);
    let values: Vec<f64> = dated.into_iter().map(|(_, v)| v).collect();
    let (early, late) = values.split_at(values.len() / 2);
    let (Some(early), Some(late)) = (scoring::mean(early), scoring::mean(late)) else {
        return SentimentTrend::Unknown;
    };
    if late > early + delta {
        SentimentTrend::Improving
    } else if late < early - delta {
        SentimentTrend::Declining
    } else {
        SentimentTrend::Stable
    }
}

fn join(dimensions: &[ReadinessDimension]) -> String {
    dimensions.iter().map(|d| d.as_str()).collect::<Vec<_>>().join(", ")
}

fn key_factors(
    dimensions: &ReadinessDimensions,
    barriers: &[ReadinessDimension],
    strengths: &[ReadinessDimension],
) -> Vec<String> {
    let mut factors = Vec::new();
    if !strengths.is_empty() {
        factors.push(format!("Strong {} provide foundation", join(strengths)));
    }
    if !barriers.is_empty() {
        factors.push(format!("Critical barriers in {} must be addressed", join(barriers)));
    }
    let tipping = dimensions.filtered(|s| (0.45..=0.55).contains(&s));
    if !tipping.is_empty() {
        factors.push(format!(
            "{} at tipping point - small changes can shift trajectory",
            join(&tipping)
        ));
    }
    factors
}

fn forecast_risks(barriers: &[ReadinessDimension], momentum: f64) -> Vec<String> {
    let mut risks = Vec::new();
    if barriers.contains(&ReadinessDimension::TrustLevels) {
        risks.push("Low trust could trigger active resistance if not addressed".to_string());
    }
    if barriers.contains(&ReadinessDimension::LeadershipCoherence) {
        risks.push("Inconsistent leadership messaging creates confusion and delays".to_string());
    }
    if barriers.contains(&ReadinessDimension::CoordinationNarrative) {
        risks.push(
            "Poor coordination may lead to fragmented implementation and wasted effort".to_string(),
        );
    }
    if momentum < 0.3 {
        risks.push("Very low momentum - initiative may lose visibility and support".to_string());
    }
    if risks.is_empty() {
        risks.push("No critical risks identified - maintain current trajectory".to_string());
    }
    risks
}

fn recommendations(dimensions: &ReadinessDimensions) -> Vec<String> {
    let mut recs: Vec<String> = ReadinessDimension::ALL
        .iter()
        .filter_map(|d| {
            let score = dimensions.get(*d).score;
            if score < 0.4 {
                Some(d.recommendation(true).to_string())
            } else if score < 0.6 {
                Some(d.recommendation(false).to_string())
            } else {
                None
            }
        })
        .collect();
    if recs.is_empty() {
        recs.push(
            "All dimensions show adequate readiness. Focus on maintaining momentum and addressing any emerging issues quickly."
                .to_string(),
        );
    }
    recs
}

/// Mean sentiment of `stories`, or 0.0 when none carry one.
pub fn average_sentiment(stories: &[Story]) -> f64 {
    scoring::mean(&sentiments(stories)).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::analysis::fixtures::{repo, settings, story};
    use crate::models::AgencyFrame;

    fn scorer(stories: Vec<Story>) -> AdoptionReadinessScorer {
        AdoptionReadinessScorer::new(repo(stories), settings())
    }

    fn dated(id: &str, day: u32, sentiment: f64) -> Story {
        let mut s = story(id, "eng", "update", Some(sentiment));
        s.timestamp = Some(Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap());
        s
    }

    #[tokio::test]
    async fn empty_corpus_is_insufficient_data() {
        let report = scorer(vec![]).assess_readiness(None).await.unwrap();
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.classification, ReadinessClass::InsufficientData);
        assert!(report.dimension_scores.is_none());
        assert!(report.forecast.is_none());
    }

    #[test]
    fn forecast_with_three_stories_has_unknown_sentiment_trend() {
        let s = scorer(vec![]);
        let stories = vec![dated("a", 1, 0.2), dated("b", 2, 0.4), dated("c", 3, 0.9)];
        let dims = s.score_dimensions(&stories);
        let forecast = s.forecast_adoption_trajectory(&stories, &dims);
        assert_eq!(forecast.sentiment_trend, SentimentTrend::Unknown);
        assert!(forecast.momentum_score.is_finite());
        assert!((0.0..=1.0).contains(&forecast.momentum_score));
        assert_eq!(forecast.confidence, ForecastConfidence::VeryLow);
    }

    #[test]
    fn sentiment_trend_compares_halves_in_time_order() {
        let stories = vec![
            dated("d", 4, 0.8),
            dated("a", 1, -0.2),
            dated("c", 3, 0.7),
            dated("b", 2, 0.0),
        ];
        assert_eq!(sentiment_trend(&stories, 4, 0.1), SentimentTrend::Improving);
        let flat: Vec<Story> = (1..=4).map(|d| dated(&d.to_string(), d, 0.3)).collect();
        assert_eq!(sentiment_trend(&flat, 4, 0.1), SentimentTrend::Stable);
    }

    #[test]
    fn volume_trend_splits_timestamp_range() {
        let mut stories = vec![dated("a", 1, 0.0)];
        stories.extend((8..=11).map(|d| dated(&format!("late{d}"), d, 0.0)));
        assert_eq!(volume_trend(&stories), VolumeTrend::Increasing);
        assert_eq!(volume_trend(&[dated("x", 2, 0.0)]), VolumeTrend::Unknown);
        assert_eq!(volume_trend(&[story("u", "g", "t", None)]), VolumeTrend::Unknown);
    }

    #[test]
    fn alignment_needs_two_groups() {
        let s = scorer(vec![]);
        let one = s.score_narrative_alignment(&[story("a", "eng", "x", Some(0.5))]);
        assert_eq!(one.score, 0.5);
        assert_eq!(one.interpretation, "Not enough groups for alignment assessment");
    }

    #[test]
    fn alignment_of_matching_groups_is_high() {
        let s = scorer(vec![]);
        let mut a = story("a", "eng", "x", Some(0.5));
        a.agency_frame = Some(AgencyFrame::Tool);
        a.ai_concepts_mentioned = vec!["llm".into()];
        let mut b = story("b", "ops", "y", Some(0.5));
        b.agency_frame = Some(AgencyFrame::Tool);
        b.ai_concepts_mentioned = vec!["llm".into()];
        let score = s.score_narrative_alignment(&[a, b]);
        assert_eq!(score.score, 1.0);
        match score.evidence {
            Evidence::GroupPairs(pairs) => {
                assert_eq!(pairs.len(), 1);
                assert_eq!(pairs[0].groups, ["eng".to_string(), "ops".to_string()]);
            }
            other => panic!("unexpected evidence {other:?}"),
        }
    }

    #[test]
    fn frame_overlap_when_dominants_differ() {
        let mut a1 = story("a1", "eng", "", None);
        a1.agency_frame = Some(AgencyFrame::Tool);
        let mut a2 = story("a2", "eng", "", None);
        a2.agency_frame = Some(AgencyFrame::Tool);
        let mut b1 = story("b1", "ops", "", None);
        b1.agency_frame = Some(AgencyFrame::Partnership);
        let mut b2 = story("b2", "ops", "", None);
        b2.agency_frame = Some(AgencyFrame::Partnership);
        let mut b3 = story("b3", "ops", "", None);
        b3.agency_frame = Some(AgencyFrame::Tool);
        let left = [&a1, &a2];
        let right = [&b1, &b2, &b3];
        // overlap 1 tool, 5 stories
        assert!((compare_group_frames(&left, &right) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn trust_counts_markers_and_keeps_evidence() {
        let s = scorer(vec![]);
        let stories = vec![
            story("a", "eng", "There is clear direction and leadership understands", None),
            story("b", "ops", "Just another initiative", None),
        ];
        let trust = s.score_trust_levels(&stories);
        assert_eq!(trust.positive_signals, Some(2));
        assert_eq!(trust.negative_signals, Some(1));
        assert!((trust.score - 0.667).abs() < 1e-9);
        assert!(trust.interpretation.starts_with("Moderate trust (2 positive vs 1 negative"));
    }

    #[test]
    fn leadership_coherence_uses_leadership_groups_only() {
        let s = scorer(vec![]);
        let mut a = story("a", "executive_team", "x", Some(0.5));
        a.agency_frame = Some(AgencyFrame::Partnership);
        let mut b = story("b", "Senior_Management", "y", Some(0.5));
        b.agency_frame = Some(AgencyFrame::Partnership);
        let c = story("c", "eng", "z", Some(-1.0));
        let coherence = s.score_leadership_coherence(&[a, b, c]);
        // frame 1.0, sentiment 1.0, themes neutral
        assert!((coherence.score - 0.833).abs() < 1e-9);
        match coherence.evidence {
            Evidence::Coherence(e) => assert_eq!(e.leadership_story_count, 2),
            other => panic!("unexpected evidence {other:?}"),
        }
    }

    #[test]
    fn readiness_bands_are_inclusive() {
        let s = scorer(vec![]);
        assert_eq!(s.classify_readiness(0.75), ReadinessClass::HighlyReady);
        assert_eq!(s.classify_readiness(0.6), ReadinessClass::Ready);
        assert_eq!(s.classify_readiness(0.45), ReadinessClass::ModeratelyReady);
        assert_eq!(s.classify_readiness(0.3), ReadinessClass::LimitedReadiness);
        assert_eq!(s.classify_readiness(0.29), ReadinessClass::NotReady);
    }

    #[test]
    fn weighted_overall_matches_declared_weights() {
        let weights = ReadinessWeights::default();
        let base = [0.5; 6];
        let mut bumped = base;
        bumped[2] += 0.2;
        let delta = weighted_overall(&weights, &bumped) - weighted_overall(&weights, &base);
        assert!((delta - 0.2 * weights.trust_levels).abs() < 1e-12);
    }

    #[tokio::test]
    async fn neutral_population_recommends_moderate_fixes() {
        let stories = vec![story("a", "eng", "plain", None), story("b", "ops", "plain", None)];
        let report = scorer(stories).assess_readiness(None).await.unwrap();
        assert_eq!(report.story_count, 2);
        assert_eq!(report.recommendations.len(), 5);
        assert!(report.strengths.is_empty());
        let forecast = report.forecast.unwrap();
        assert_eq!(forecast.volume_trend, VolumeTrend::Unknown);
        assert!(forecast.key_factors.iter().any(|f| f.contains("tipping point")));
    }
}
