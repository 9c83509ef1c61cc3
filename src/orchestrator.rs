//! Strategic-question workflows.
//!
//! Each `answer_question_N` composes a few sub-analyzer calls and adds a
//! threshold-driven synthesis layer (insights, implications, templated
//! recommendations). [`NarrativeIntelligence::run_comprehensive_analysis`]
//! runs all of them and folds the results into an executive summary and a
//! three-tier action plan. Nothing is cached between calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::culture::{CautionaryPatterns, CultureDimensions, CultureType};
use crate::analysis::frames::{CommonGround, FrameConflict, GroupDominantFrame, UnifiedNarrative};
use crate::analysis::gap::{EmphasisGap, FramingGap, SeverityAssessment, VocabularyGap};
use crate::analysis::readiness::{ReadinessDimension, average_sentiment};
use crate::analysis::resistance::{CauseEvidence, Hotspot};
use crate::analysis::{
    AdoptionReadinessScorer, CulturalSignalDetector, FrameCompetitionAnalyzer, NarrativeGapAnalyzer,
    ResistanceMapper,
};
use crate::config::AnalysisSettings;
use crate::error::Result;
use crate::models::{Frame, ResistancePattern, RootCause, Sophistication, Story};
use crate::repository::{InitiativeScope, StoryFilter, StoryRepository};
use crate::scoring::{self, DimensionScore};

pub const QUESTION_1: &str = "How do different teams talk about AI differently?";
pub const QUESTION_2: &str = "Do we have an entrepreneurial culture?";
pub const QUESTION_3: &str = "Can you design a unified story?";
pub const QUESTION_4: &str = "Are we risk-averse?";
pub const QUESTION_5: &str = "Why does language vary by context?";

// ---------------------------------------------------------------------------
// Q1
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSentiment {
    pub average_sentiment: f64,
    pub story_count: usize,
}

/// Stories per sophistication level; novice and unknown are not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SophisticationCounts {
    pub basic: usize,
    pub intermediate: usize,
    pub advanced: usize,
    pub expert: usize,
}

impl SophisticationCounts {
    pub fn total(&self) -> usize {
        self.basic + self.intermediate + self.advanced + self.expert
    }

    /// Share of advanced and expert stories, `None` when nothing was counted.
    pub fn advanced_share(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| (self.advanced + self.expert) as f64 / total as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDifferencesReport {
    pub question: String,
    pub vocabulary_gaps: VocabularyGap,
    pub frame_differences: BTreeMap<String, GroupDominantFrame>,
    pub sentiment_map: BTreeMap<String, GroupSentiment>,
    pub sophistication_gaps: BTreeMap<String, SophisticationCounts>,
    pub key_insights: Vec<String>,
    pub implications: Vec<String>,
    pub recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Q2
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CultureClass {
    Entrepreneurial,
    Balanced,
    Cautious,
    RiskAverse,
}

impl CultureClass {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            CultureClass::Entrepreneurial
        } else if score >= 0.5 {
            CultureClass::Balanced
        } else if score >= 0.3 {
            CultureClass::Cautious
        } else {
            CultureClass::RiskAverse
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CultureClass::Entrepreneurial => "entrepreneurial",
            CultureClass::Balanced => "balanced",
            CultureClass::Cautious => "cautious",
            CultureClass::RiskAverse => "risk_averse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultureEvidence {
    pub innovation_indicators: f64,
    pub failure_tolerance: f64,
    pub resistance_hotspots: usize,
    pub learning_orientation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrepreneurialCultureReport {
    pub question: String,
    pub overall_score: f64,
    pub culture_type: CultureType,
    pub dimension_scores: CultureDimensions,
    pub resistance_patterns: Vec<Hotspot>,
    pub learning_orientation: DimensionScore,
    pub classification: CultureClass,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub evidence: CultureEvidence,
    pub recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Q3
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

/// High-impact conflicts are those above 0.6.
pub fn conflict_severity(conflicts: &[FrameConflict]) -> ConflictSeverity {
    let high_impact = conflicts.iter().filter(|c| c.impact > 0.6).count();
    if high_impact >= 2 {
        ConflictSeverity::High
    } else if high_impact >= 1 || conflicts.len() >= 3 {
        ConflictSeverity::Medium
    } else {
        ConflictSeverity::Low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragmentation {
    pub conflict_count: usize,
    pub competing_frames: Vec<FrameConflict>,
    pub conflict_severity: ConflictSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagingStrategy {
    pub core_message: String,
    pub key_themes: Vec<String>,
    pub audience_adaptations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedStoryReport {
    pub question: String,
    pub initiative_id: String,
    pub current_fragmentation: Fragmentation,
    pub common_ground: CommonGround,
    pub unified_story: UnifiedNarrative,
    pub messaging_strategy: MessagingStrategy,
    pub rollout_plan: BTreeMap<String, String>,
    pub success_metrics: BTreeMap<String, String>,
    pub recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Q4
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCulture {
    HighlyRiskAverse,
    ModeratelyRiskAverse,
    Balanced,
    RiskTolerant,
}

impl RiskCulture {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            RiskCulture::HighlyRiskAverse
        } else if score >= 0.5 {
            RiskCulture::ModeratelyRiskAverse
        } else if score >= 0.3 {
            RiskCulture::Balanced
        } else {
            RiskCulture::RiskTolerant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCulture::HighlyRiskAverse => "highly_risk_averse",
            RiskCulture::ModeratelyRiskAverse => "moderately_risk_averse",
            RiskCulture::Balanced => "balanced",
            RiskCulture::RiskTolerant => "risk_tolerant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Critical,
    High,
    Moderate,
    Low,
}

impl ImpactLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            ImpactLevel::Critical
        } else if score >= 0.5 {
            ImpactLevel::High
        } else if score >= 0.3 {
            ImpactLevel::Moderate
        } else {
            ImpactLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotCauses {
    pub group: String,
    pub resistance_score: f64,
    pub patterns: Vec<ResistancePattern>,
    pub root_causes: Vec<CauseEvidence>,
    pub primary_cause: RootCause,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    pub impact_score: f64,
    pub adoption_probability: f64,
    pub classification: ImpactLevel,
    pub affected_groups: Vec<String>,
    pub implications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub target_group: String,
    pub primary_cause: RootCause,
    pub intervention: String,
    pub timeline: String,
    pub success_metric: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAversionAnswer {
    pub question: String,
    pub risk_aversion_score: f64,
    pub classification: RiskCulture,
    pub patterns: CautionaryPatterns,
    pub hotspots: Vec<HotspotCauses>,
    pub impact_assessment: ImpactAssessment,
    pub root_causes_summary: BTreeMap<RootCause, usize>,
    pub interventions: Vec<Intervention>,
    pub recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

pub fn intervention_for(cause: RootCause) -> &'static str {
    match cause {
        RootCause::PastFailures => {
            "Address past failures directly, show what was learned, demonstrate changes"
        }
        RootCause::ThreatPerception => {
            "Reframe AI from threat to tool, emphasize human augmentation not replacement"
        }
        RootCause::ResourceIssues => "Provide adequate time, training, and support resources",
        RootCause::ValueMisalignment => "Connect AI initiative to organizational values and mission",
        RootCause::KnowledgeGap => "Invest in education, skill development, and hands-on experience",
        RootCause::Unknown => "Design targeted intervention based on root cause analysis",
    }
}

// ---------------------------------------------------------------------------
// Q5
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadershipTeamComparison {
    pub leadership_frames: BTreeMap<String, Frame>,
    pub team_frames: BTreeMap<String, Frame>,
    pub alignment: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SophisticationPatterns {
    pub high_sophistication_groups: Vec<String>,
    pub low_sophistication_groups: Vec<String>,
    pub gap_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPatterns {
    pub official_vs_actual: SeverityAssessment,
    pub leadership_vs_team: LeadershipTeamComparison,
    pub formal_vs_informal: SophisticationPatterns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageVariations {
    pub vocabulary: VocabularyGap,
    pub framing: FramingGap,
    pub emphasis: EmphasisGap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationCause {
    AudienceAdaptation,
    LowTrust,
    KnowledgeGaps,
    StrategicVsTactical,
}

impl VariationCause {
    pub fn implication(&self) -> &'static str {
        match self {
            VariationCause::AudienceAdaptation => "Natural and acceptable if intentional and strategic",
            VariationCause::LowTrust => "Language gaps may indicate deeper trust and transparency issues",
            VariationCause::KnowledgeGaps => {
                "Training and education needed to bring groups to similar understanding"
            }
            VariationCause::StrategicVsTactical => {
                "Need to better connect strategic vision to tactical execution"
            }
        }
    }

    fn recommendation(&self) -> Option<&'static str> {
        match self {
            VariationCause::AudienceAdaptation => None,
            VariationCause::LowTrust => {
                Some("Build trust through transparency and consistent follow-through")
            }
            VariationCause::KnowledgeGaps => {
                Some("Provide training to elevate understanding across all groups")
            }
            VariationCause::StrategicVsTactical => {
                Some("Create explicit connections between strategic goals and tactical work")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationReason {
    pub reason: VariationCause,
    pub explanation: String,
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustFactor {
    pub score: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageContextReport {
    pub question: String,
    pub context_patterns: ContextPatterns,
    pub language_variations: LanguageVariations,
    pub underlying_reasons: Vec<VariationReason>,
    pub trust_factor: TrustFactor,
    pub implications: Vec<String>,
    pub recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Comprehensive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub key_findings: Vec<String>,
    pub critical_issues: Vec<String>,
    pub top_recommendations: Vec<String>,
    pub overall_assessment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTier {
    pub timeline: String,
    pub actions: Vec<String>,
}

impl ActionTier {
    fn new(timeline: &str, mut actions: Vec<String>, max: usize) -> Self {
        actions.truncate(max);
        Self {
            timeline: timeline.to_string(),
            actions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub immediate: ActionTier,
    pub short_term: ActionTier,
    pub long_term: ActionTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedAnalyses {
    pub team_differences: TeamDifferencesReport,
    pub entrepreneurial_culture: EntrepreneurialCultureReport,
    /// Only produced when an initiative was named.
    pub unified_story: Option<UnifiedStoryReport>,
    pub risk_aversion: RiskAversionAnswer,
    pub language_context: LanguageContextReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveReport {
    pub executive_summary: ExecutiveSummary,
    pub detailed_analyses: DetailedAnalyses,
    pub action_plan: ActionPlan,
    pub analyzed_at: DateTime<Utc>,
    pub initiative_id: Option<String>,
}

pub const NO_CRITICAL_ISSUES: &str = "No critical issues identified";

/// Runs the five strategic questions over one repository.
pub struct NarrativeIntelligence {
    repo: Arc<dyn StoryRepository>,
    settings: Arc<AnalysisSettings>,
    gap: NarrativeGapAnalyzer,
    frames: FrameCompetitionAnalyzer,
    culture: CulturalSignalDetector,
    resistance: ResistanceMapper,
    readiness: AdoptionReadinessScorer,
}

impl NarrativeIntelligence {
    pub fn new(repo: Arc<dyn StoryRepository>, settings: Arc<AnalysisSettings>) -> Result<Self> {
        Ok(Self {
            gap: NarrativeGapAnalyzer::new(repo.clone(), settings.clone()),
            frames: FrameCompetitionAnalyzer::new(repo.clone(), settings.clone()),
            culture: CulturalSignalDetector::new(repo.clone(), settings.clone()),
            resistance: ResistanceMapper::new(repo.clone(), settings.clone())?,
            readiness: AdoptionReadinessScorer::new(repo.clone(), settings.clone()),
            repo,
            settings,
        })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn gap_analyzer(&self) -> &NarrativeGapAnalyzer {
        &self.gap
    }

    pub fn frame_analyzer(&self) -> &FrameCompetitionAnalyzer {
        &self.frames
    }

    pub fn culture_detector(&self) -> &CulturalSignalDetector {
        &self.culture
    }

    pub fn resistance_mapper(&self) -> &ResistanceMapper {
        &self.resistance
    }

    pub fn readiness_scorer(&self) -> &AdoptionReadinessScorer {
        &self.readiness
    }

    pub fn repository(&self) -> &Arc<dyn StoryRepository> {
        &self.repo
    }

    async fn ai_stories(&self, initiative_id: Option<&str>) -> Result<Vec<Story>> {
        let mut filter = StoryFilter::ai();
        if let Some(id) = initiative_id {
            filter = filter.initiative(InitiativeScope::Any(id.to_string()));
        }
        self.repo.fetch_stories(&filter).await
    }

    /// Q1: vocabulary, frame, sentiment and sophistication differences by group.
    pub async fn answer_question_1(&self, initiative_id: Option<&str>) -> Result<TeamDifferencesReport> {
        info!(initiative = ?initiative_id, "answering team differences question");
        let (gap, frame_map, stories) = tokio::try_join!(
            self.gap.analyze_official_vs_actual(initiative_id),
            self.frames.map_competing_frames(initiative_id),
            self.ai_stories(initiative_id),
        )?;

        let sentiment_map = sentiment_by_group(&stories);
        let sophistication_gaps = sophistication_by_group(&stories);
        let distinct_frames = frame_map.distinct_group_frames();
        debug!(
            groups = sentiment_map.len(),
            distinct_frames, "team differences inputs collected"
        );

        let vocabulary = gap.gaps.language_gap;
        let key_insights = team_insights(&vocabulary, distinct_frames, &sentiment_map);
        let implications = team_implications(&key_insights);

        let mut recommendations = Vec::new();
        if vocabulary.alignment_score < 0.5 {
            recommendations.push(
                "Create shared vocabulary through storytelling sessions and cross-functional workshops"
                    .to_string(),
            );
        }
        if distinct_frames > 3 {
            recommendations
                .push("Facilitate dialogue between groups to develop unified narrative frame".to_string());
        }
        recommendations.push("Use employee language in official communications to increase resonance".to_string());

        Ok(TeamDifferencesReport {
            question: QUESTION_1.to_string(),
            vocabulary_gaps: vocabulary,
            frame_differences: frame_map.dominant_frame_by_group,
            sentiment_map,
            sophistication_gaps,
            key_insights,
            implications,
            recommendations,
            analyzed_at: Utc::now(),
        })
    }

    /// Q2: innovation culture profile, cross-checked against resistance and learning.
    pub async fn answer_question_2(&self) -> Result<EntrepreneurialCultureReport> {
        info!("answering entrepreneurial culture question");
        let (culture, landscape, readiness) = tokio::try_join!(
            self.culture.assess_innovation_culture(),
            self.resistance.map_resistance_landscape(),
            self.readiness.assess_readiness(None),
        )?;

        let learning = readiness
            .dimension_scores
            .as_ref()
            .map(|d| d.learning_orientation.clone())
            .unwrap_or_else(|| DimensionScore::neutral("No stories available to assess learning orientation"));

        let classification = CultureClass::from_score(culture.overall_score);
        let mut strengths = Vec::new();
        let mut weaknesses = Vec::new();
        for (name, score) in culture.dimension_scores.scores() {
            if score > 0.7 {
                strengths.push(name.to_string());
            } else if score < 0.4 {
                weaknesses.push(name.to_string());
            }
        }

        let evidence = CultureEvidence {
            innovation_indicators: culture.dimension_scores.experimentation.score,
            failure_tolerance: culture.dimension_scores.failure_tolerance.score,
            resistance_hotspots: landscape.hotspots.len(),
            learning_orientation: learning.score,
        };

        let mut recommendations = Vec::new();
        if matches!(classification, CultureClass::Cautious | CultureClass::RiskAverse) {
            recommendations.push("Launch small pilot projects to build confidence through quick wins".to_string());
            recommendations.push("Create psychological safety for experimentation and failure".to_string());
        }
        if learning.score < 0.5 {
            recommendations.push("Invest in skill development and training programs".to_string());
        }

        Ok(EntrepreneurialCultureReport {
            question: QUESTION_2.to_string(),
            overall_score: culture.overall_score,
            culture_type: culture.culture_type,
            dimension_scores: culture.dimension_scores,
            resistance_patterns: landscape.hotspots,
            learning_orientation: learning,
            classification,
            strengths,
            weaknesses,
            evidence,
            recommendations,
            analyzed_at: Utc::now(),
        })
    }

    /// Q3: a unified story for one initiative.
    pub async fn answer_question_3(&self, initiative_id: &str) -> Result<UnifiedStoryReport> {
        info!(initiative = initiative_id, "answering unified story question");
        let stories = self.frames.load_stories(Some(initiative_id)).await?;
        let frame_map = self.frames.build_frame_map(&stories);
        let common_ground = self.frames.find_narrative_common_ground(&frame_map, &stories);
        let conflicts = frame_map.competitions;
        let unified_story = self.frames.design_unified_narrative(&conflicts, &common_ground);
        debug!(
            stories = stories.len(),
            conflicts = conflicts.len(),
            "unified story inputs collected"
        );

        let messaging_strategy = MessagingStrategy {
            core_message: unified_story.core_message.clone(),
            key_themes: common_ground.shared_themes.clone(),
            audience_adaptations: string_map(&[
                ("technical_teams", "Emphasize practical applications and skill development"),
                ("leadership", "Highlight strategic benefits and competitive advantage"),
                ("customer_facing", "Focus on customer experience improvements"),
                ("operations", "Stress efficiency gains and process improvements"),
            ]),
        };
        let rollout_plan = string_map(&[
            ("phase_1", "Test unified story with pilot groups"),
            ("phase_2", "Gather feedback and refine messaging"),
            ("phase_3", "Launch organization-wide through multiple channels"),
            ("phase_4", "Monitor adoption and adjust as needed"),
        ]);
        let mut success_metrics = string_map(&[
            ("narrative_alignment", "Increase alignment score from current to >0.7"),
            ("employee_adoption", "Track usage of unified language in stories"),
        ]);
        success_metrics.insert(
            "frame_consistency".to_string(),
            format!("Reduce competing frames from {} to <2", conflicts.len()),
        );

        Ok(UnifiedStoryReport {
            question: QUESTION_3.to_string(),
            initiative_id: initiative_id.to_string(),
            current_fragmentation: Fragmentation {
                conflict_count: conflicts.len(),
                conflict_severity: conflict_severity(&conflicts),
                competing_frames: conflicts,
            },
            common_ground,
            unified_story,
            messaging_strategy,
            rollout_plan,
            success_metrics,
            recommendations: vec![
                "Use storytelling formats (not policy docs) to introduce unified narrative".to_string(),
                "Train leaders to consistently use unified frame in communications".to_string(),
                "Create templates and examples that embody unified story".to_string(),
            ],
            analyzed_at: Utc::now(),
        })
    }

    /// Q4: where risk aversion shows up and what to do about it.
    pub async fn answer_question_4(&self) -> Result<RiskAversionAnswer> {
        info!("answering risk aversion question");
        let (risk, landscape, readiness) = tokio::try_join!(
            self.culture.detect_risk_aversion_patterns(),
            self.resistance.map_resistance_landscape(),
            self.readiness.assess_readiness(None),
        )?;

        let hotspots: Vec<HotspotCauses> = landscape
            .hotspots
            .iter()
            .map(|hotspot| HotspotCauses {
                group: hotspot.group.clone(),
                resistance_score: hotspot.resistance_score,
                patterns: hotspot.patterns.clone(),
                root_causes: landscape
                    .by_group
                    .get(&hotspot.group)
                    .map(|g| g.root_causes.all_causes.clone())
                    .unwrap_or_default(),
                primary_cause: hotspot.primary_cause,
            })
            .collect();

        let risk_aversion_score = scoring::round3((risk.severity.score() + landscape.overall_severity.score) / 2.0);
        let adoption_probability = readiness.overall_score * (1.0 - risk_aversion_score);
        let impact_level = ImpactLevel::from_score(risk_aversion_score);

        let mut implications = Vec::new();
        if risk_aversion_score >= 0.7 {
            implications.push("Risk aversion is a critical barrier to adoption".to_string());
        }
        if adoption_probability < 0.5 {
            implications.push("Current adoption probability is below 50% - intervention required".to_string());
        }
        implications.push("Risk-averse culture will slow adoption and limit experimentation".to_string());

        let impact_assessment = ImpactAssessment {
            impact_score: risk_aversion_score,
            adoption_probability: scoring::round3(adoption_probability),
            classification: impact_level,
            affected_groups: landscape.hotspots.iter().map(|h| h.group.clone()).collect(),
            implications,
        };

        let interventions = hotspots
            .iter()
            .map(|h| Intervention {
                target_group: h.group.clone(),
                primary_cause: h.primary_cause,
                intervention: intervention_for(h.primary_cause).to_string(),
                timeline: "3-6 months".to_string(),
                success_metric: format!("Reduce resistance score in {} below 0.4", h.group),
            })
            .collect();

        let mut root_causes_summary: BTreeMap<RootCause, usize> = BTreeMap::new();
        for hotspot in &hotspots {
            *root_causes_summary.entry(hotspot.primary_cause).or_default() += 1;
        }

        let mut recommendations = Vec::new();
        if matches!(impact_level, ImpactLevel::Critical | ImpactLevel::High) {
            recommendations
                .push("URGENT: Risk aversion is blocking adoption - immediate intervention required".to_string());
        }
        if let Some((cause, count)) = most_common_cause(&root_causes_summary) {
            recommendations.push(format!("Focus on addressing {cause} which affects {count} groups"));
        }
        recommendations.push("Create safe spaces for experimentation with low stakes".to_string());
        recommendations.push("Celebrate learning from failures to shift culture".to_string());

        Ok(RiskAversionAnswer {
            question: QUESTION_4.to_string(),
            risk_aversion_score,
            classification: RiskCulture::from_score(risk_aversion_score),
            patterns: risk.patterns,
            hotspots,
            impact_assessment,
            root_causes_summary,
            interventions,
            recommendations,
            analyzed_at: Utc::now(),
        })
    }

    /// Q5: reasons language differs between official, leadership and team contexts.
    pub async fn answer_question_5(&self, initiative_id: Option<&str>) -> Result<LanguageContextReport> {
        info!(initiative = ?initiative_id, "answering language context question");
        let (gap, frame_map, readiness, stories) = tokio::try_join!(
            self.gap.analyze_official_vs_actual(initiative_id),
            self.frames.map_competing_frames(initiative_id),
            self.readiness.assess_readiness(None),
            self.ai_stories(initiative_id),
        )?;

        let trust = readiness.dimension_score(ReadinessDimension::TrustLevels);
        let trust_interpretation = readiness
            .dimension_scores
            .as_ref()
            .map(|d| d.trust_levels.interpretation.clone())
            .unwrap_or_else(|| "No stories available to assess trust".to_string());
        let sophistication = sophistication_patterns(&sophistication_by_group(&stories));
        let leadership_vs_team = self.compare_leadership_team_language(&frame_map.dominant_frame_by_group);

        let severity = gap.severity;
        let mut underlying_reasons = Vec::new();
        if severity.overall_severity.is_serious() {
            underlying_reasons.push(VariationReason {
                reason: VariationCause::AudienceAdaptation,
                explanation: "Leadership adapts language for different audiences".to_string(),
                evidence: "Vocabulary and framing differences between official and employee stories".to_string(),
            });
        }
        if trust < 0.5 {
            underlying_reasons.push(VariationReason {
                reason: VariationCause::LowTrust,
                explanation: "Low trust leads to guarded official communication".to_string(),
                evidence: format!("Trust score of {trust} indicates credibility issues"),
            });
        }
        if sophistication.gap_size > 0.5 {
            underlying_reasons.push(VariationReason {
                reason: VariationCause::KnowledgeGaps,
                explanation: "Different groups have different levels of AI understanding".to_string(),
                evidence: format!(
                    "Sophistication gaps between [{}] and [{}]",
                    sophistication.high_sophistication_groups.join(", "),
                    sophistication.low_sophistication_groups.join(", ")
                ),
            });
        }
        underlying_reasons.push(VariationReason {
            reason: VariationCause::StrategicVsTactical,
            explanation: "Leadership focuses on strategy while teams focus on tactical execution".to_string(),
            evidence: "Different emphasis patterns in official vs employee narratives".to_string(),
        });

        let implications = underlying_reasons
            .iter()
            .map(|r| r.reason.implication().to_string())
            .collect();
        let mut recommendations: Vec<String> = underlying_reasons
            .iter()
            .filter_map(|r| r.reason.recommendation())
            .map(str::to_string)
            .collect();
        recommendations
            .push("Acknowledge and explain intentional language adaptations to build understanding".to_string());

        Ok(LanguageContextReport {
            question: QUESTION_5.to_string(),
            context_patterns: ContextPatterns {
                official_vs_actual: severity,
                leadership_vs_team,
                formal_vs_informal: sophistication,
            },
            language_variations: LanguageVariations {
                vocabulary: gap.gaps.language_gap,
                framing: gap.gaps.framing_gap,
                emphasis: gap.gaps.emphasis_gap,
            },
            underlying_reasons,
            trust_factor: TrustFactor {
                score: trust,
                interpretation: trust_interpretation,
            },
            implications,
            recommendations,
            analyzed_at: Utc::now(),
        })
    }

    /// Splits dominant frames into leadership and team groups and measures how often they match.
    pub fn compare_leadership_team_language(
        &self,
        dominant: &BTreeMap<String, GroupDominantFrame>,
    ) -> LeadershipTeamComparison {
        let mut leadership_frames = BTreeMap::new();
        let mut team_frames = BTreeMap::new();
        for (group, frame) in dominant {
            let lowered = group.to_lowercase();
            let is_leadership = self
                .settings
                .markers
                .leadership_groups
                .iter()
                .any(|marker| lowered.contains(&marker.to_lowercase()));
            let target = if is_leadership { &mut leadership_frames } else { &mut team_frames };
            target.insert(group.clone(), frame.dominant_frame.clone());
        }
        let alignment = frame_alignment(&leadership_frames, &team_frames);
        LeadershipTeamComparison {
            leadership_frames,
            team_frames,
            alignment,
        }
    }

    /// All five questions plus an executive summary and action plan.
    ///
    /// Q3 only runs when an initiative is named.
    pub async fn run_comprehensive_analysis(&self, initiative_id: Option<&str>) -> Result<ComprehensiveReport> {
        info!(initiative = ?initiative_id, "running comprehensive analysis");
        let unified = async {
            match initiative_id {
                Some(id) => self.answer_question_3(id).await.map(Some),
                None => Ok(None),
            }
        };
        let (q1, q2, q3, q4, q5) = tokio::try_join!(
            self.answer_question_1(initiative_id),
            self.answer_question_2(),
            unified,
            self.answer_question_4(),
            self.answer_question_5(initiative_id),
        )?;

        let executive_summary = executive_summary(&q1, &q2, &q4);
        let action_plan = action_plan(&q1, &q2, q3.as_ref(), &q4, &q5);
        info!(
            critical_issues = executive_summary.critical_issues.len(),
            immediate_actions = action_plan.immediate.actions.len(),
            "comprehensive analysis complete"
        );

        Ok(ComprehensiveReport {
            executive_summary,
            detailed_analyses: DetailedAnalyses {
                team_differences: q1,
                entrepreneurial_culture: q2,
                unified_story: q3,
                risk_aversion: q4,
                language_context: q5,
            },
            action_plan,
            analyzed_at: Utc::now(),
            initiative_id: initiative_id.map(str::to_string),
        })
    }
}

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn sentiment_by_group(stories: &[Story]) -> BTreeMap<String, GroupSentiment> {
    let mut grouped: BTreeMap<String, Vec<Story>> = BTreeMap::new();
    for story in stories {
        grouped
            .entry(story.group_key().to_string())
            .or_default()
            .push(story.clone());
    }
    grouped
        .into_iter()
        .map(|(group, members)| {
            let entry = GroupSentiment {
                average_sentiment: scoring::round3(average_sentiment(&members)),
                story_count: members.len(),
            };
            (group, entry)
        })
        .collect()
}

pub fn sophistication_by_group(stories: &[Story]) -> BTreeMap<String, SophisticationCounts> {
    let mut by_group: BTreeMap<String, SophisticationCounts> = BTreeMap::new();
    for story in stories {
        let counts = by_group.entry(story.group_key().to_string()).or_default();
        match story.ai_sophistication {
            Some(Sophistication::Basic) => counts.basic += 1,
            Some(Sophistication::Intermediate) => counts.intermediate += 1,
            Some(Sophistication::Advanced) => counts.advanced += 1,
            Some(Sophistication::Expert) => counts.expert += 1,
            _ => {}
        }
    }
    by_group
}

/// High groups are over half advanced, low groups under a fifth; a gap exists when both appear.
pub fn sophistication_patterns(by_group: &BTreeMap<String, SophisticationCounts>) -> SophisticationPatterns {
    let mut patterns = SophisticationPatterns::default();
    for (group, counts) in by_group {
        let Some(share) = counts.advanced_share() else {
            continue;
        };
        if share > 0.5 {
            patterns.high_sophistication_groups.push(group.clone());
        } else if share < 0.2 {
            patterns.low_sophistication_groups.push(group.clone());
        }
    }
    if !patterns.high_sophistication_groups.is_empty() && !patterns.low_sophistication_groups.is_empty() {
        patterns.gap_size = 0.7;
    }
    patterns
}

/// Fraction of leadership/team pairs sharing a frame; 0.5 when either side is empty.
pub fn frame_alignment(a: &BTreeMap<String, Frame>, b: &BTreeMap<String, Frame>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return scoring::NEUTRAL;
    }
    let matches = a
        .values()
        .flat_map(|fa| b.values().filter(move |fb| *fb == fa))
        .count();
    matches as f64 / (a.len() * b.len()) as f64
}

fn team_insights(
    vocabulary: &VocabularyGap,
    distinct_frames: usize,
    sentiment_map: &BTreeMap<String, GroupSentiment>,
) -> Vec<String> {
    let mut insights = Vec::new();
    if vocabulary.sophistication_gap > 0.3 {
        let first_three = |terms: &std::collections::BTreeSet<String>| {
            terms.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
        };
        insights.push(format!(
            "Significant vocabulary gap: Official messaging uses terms like [{}] while employees use [{}]",
            first_three(&vocabulary.official_only),
            first_three(&vocabulary.employee_only)
        ));
    }
    if distinct_frames > 3 {
        insights.push(format!(
            "High frame diversity: {distinct_frames} different frames across groups indicates lack of unified narrative"
        ));
    }
    let averages = sentiment_map.values().map(|s| s.average_sentiment);
    let range = averages.clone().fold(f64::NEG_INFINITY, f64::max) - averages.fold(f64::INFINITY, f64::min);
    if range.is_finite() && range > 0.5 {
        insights.push(format!(
            "Large sentiment variation (range: {range:.2}) suggests different groups have very different experiences"
        ));
    }
    insights
}

fn team_implications(insights: &[String]) -> Vec<String> {
    insights
        .iter()
        .filter_map(|insight| {
            let lowered = insight.to_lowercase();
            if lowered.contains("vocabulary") {
                Some("Vocabulary gaps may indicate that official messaging is not resonating with employees")
            } else if lowered.contains("frame diversity") {
                Some("Lack of unified narrative creates confusion and reduces adoption momentum")
            } else if lowered.contains("sentiment") {
                Some("Different experiences across groups suggest inconsistent implementation or support")
            } else {
                None
            }
        })
        .map(str::to_string)
        .collect()
}

/// Most frequent cause; ties resolve to the earlier variant.
fn most_common_cause(summary: &BTreeMap<RootCause, usize>) -> Option<(RootCause, usize)> {
    let mut best: Option<(RootCause, usize)> = None;
    for (&cause, &count) in summary {
        if best.is_none_or(|(_, n)| count > n) {
            best = Some((cause, count));
        }
    }
    best
}

pub fn executive_summary(
    q1: &TeamDifferencesReport,
    q2: &EntrepreneurialCultureReport,
    q4: &RiskAversionAnswer,
) -> ExecutiveSummary {
    let alignment = q1.vocabulary_gaps.alignment_score;
    let readiness = q2.overall_score;
    let risk = q4.risk_aversion_score;

    let key_findings = vec![
        format!("Narrative alignment: {alignment:.2}"),
        format!("Culture type: {}", q2.culture_type.as_str()),
        format!("Risk aversion: {}", q4.classification.as_str()),
        format!("Overall readiness: {readiness:.2}"),
    ];

    let mut critical_issues = Vec::new();
    if readiness < 0.5 {
        critical_issues.push("Low overall readiness score requires intervention".to_string());
    }
    if risk > 0.7 {
        critical_issues.push("High risk aversion is blocking adoption".to_string());
    }
    if alignment < 0.4 {
        critical_issues.push("Severe narrative fragmentation across groups".to_string());
    }

    let top_recommendations: Vec<String> = if critical_issues.is_empty() {
        vec![
            "Proceed with rollout while monitoring weak dimensions",
            "Leverage strengths to build momentum",
            "Maintain alignment through ongoing narrative coordination",
        ]
    } else {
        vec![
            "Address critical barriers before full-scale rollout",
            "Focus interventions on groups with highest resistance",
            "Build trust and transparency through consistent communication",
        ]
    }
    .into_iter()
    .map(str::to_string)
    .collect();

    if critical_issues.is_empty() {
        critical_issues.push(NO_CRITICAL_ISSUES.to_string());
    }

    ExecutiveSummary {
        key_findings,
        critical_issues,
        top_recommendations,
        overall_assessment: overall_assessment(readiness, risk).to_string(),
    }
}

pub fn overall_assessment(readiness: f64, risk: f64) -> &'static str {
    if readiness >= 0.7 && risk < 0.4 {
        "Organization is well-positioned for successful AI adoption. Proceed with confidence."
    } else if readiness >= 0.5 && risk < 0.6 {
        "Organization shows moderate readiness. Address identified gaps before full rollout."
    } else {
        "Organization faces significant adoption challenges. Fundamental interventions required."
    }
}

pub fn action_plan(
    q1: &TeamDifferencesReport,
    q2: &EntrepreneurialCultureReport,
    q3: Option<&UnifiedStoryReport>,
    q4: &RiskAversionAnswer,
    q5: &LanguageContextReport,
) -> ActionPlan {
    let mut immediate = Vec::new();
    if q4.risk_aversion_score > 0.7 {
        immediate.extend(q4.recommendations.iter().take(2).cloned());
    }
    if q2.overall_score < 0.5 {
        immediate.extend(q2.recommendations.iter().take(2).cloned());
    }

    let mut short_term = Vec::new();
    if q1.vocabulary_gaps.alignment_score < 0.5 {
        short_term.extend(q1.recommendations.iter().cloned());
    }
    if q3.is_some() {
        short_term.push("Develop and launch unified narrative".to_string());
    }

    ActionPlan {
        immediate: ActionTier::new("0-30 days", immediate, 3),
        short_term: ActionTier::new("1-3 months", short_term, 5),
        long_term: ActionTier::new("3-6 months", q5.recommendations.clone(), 3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{repo, settings, story};
    use crate::models::Initiative;
    use crate::repository::{Corpus, InMemoryRepository};

    fn engine(stories: Vec<Story>) -> NarrativeIntelligence {
        NarrativeIntelligence::new(repo(stories), settings()).unwrap()
    }

    fn ai(mut s: Story) -> Story {
        s.ai_related = true;
        s
    }

    fn leveled(id: &str, group: &str, level: Sophistication) -> Story {
        let mut s = ai(story(id, group, "using ai", Some(0.1)));
        s.ai_sophistication = Some(level);
        s
    }

    fn conflict(impact: f64) -> FrameConflict {
        FrameConflict {
            frame_a: Frame::Opportunity,
            frame_b: Frame::Threat,
            groups_a: Default::default(),
            groups_b: Default::default(),
            conflict_type: crate::analysis::frames::ConflictType::FundamentalOpposition,
            impact,
            story_count_a: 1,
            story_count_b: 1,
        }
    }

    #[test]
    fn conflict_severity_bands() {
        assert_eq!(conflict_severity(&[]), ConflictSeverity::Low);
        assert_eq!(conflict_severity(&[conflict(0.2)]), ConflictSeverity::Low);
        assert_eq!(conflict_severity(&[conflict(0.7)]), ConflictSeverity::Medium);
        assert_eq!(
            conflict_severity(&[conflict(0.1), conflict(0.1), conflict(0.1)]),
            ConflictSeverity::Medium
        );
        assert_eq!(conflict_severity(&[conflict(0.7), conflict(0.9)]), ConflictSeverity::High);
    }

    #[test]
    fn classification_bands_are_inclusive_at_the_boundary() {
        assert_eq!(CultureClass::from_score(0.7), CultureClass::Entrepreneurial);
        assert_eq!(CultureClass::from_score(0.5), CultureClass::Balanced);
        assert_eq!(CultureClass::from_score(0.3), CultureClass::Cautious);
        assert_eq!(CultureClass::from_score(0.29), CultureClass::RiskAverse);
        assert_eq!(RiskCulture::from_score(0.7), RiskCulture::HighlyRiskAverse);
        assert_eq!(RiskCulture::from_score(0.1), RiskCulture::RiskTolerant);
        assert_eq!(ImpactLevel::from_score(0.5), ImpactLevel::High);
    }

    #[test]
    fn overall_assessment_gates() {
        assert!(overall_assessment(0.8, 0.3).starts_with("Organization is well-positioned"));
        assert!(overall_assessment(0.8, 0.5).starts_with("Organization shows moderate"));
        assert!(overall_assessment(0.55, 0.59).starts_with("Organization shows moderate"));
        assert!(overall_assessment(0.4, 0.1).starts_with("Organization faces significant"));
    }

    #[test]
    fn frame_alignment_counts_matching_pairs() {
        let mut lead = BTreeMap::new();
        lead.insert("leadership".to_string(), Frame::Opportunity);
        let mut teams = BTreeMap::new();
        teams.insert("eng".to_string(), Frame::Opportunity);
        teams.insert("ops".to_string(), Frame::Threat);
        assert_eq!(frame_alignment(&lead, &teams), 0.5);
        assert_eq!(frame_alignment(&BTreeMap::new(), &teams), 0.5);
        teams.remove("ops");
        assert_eq!(frame_alignment(&lead, &teams), 1.0);
    }

    #[test]
    fn sophistication_gap_needs_both_extremes() {
        let stories = vec![
            leveled("a", "research", Sophistication::Expert),
            leveled("b", "research", Sophistication::Advanced),
            leveled("c", "sales", Sophistication::Basic),
            leveled("d", "sales", Sophistication::Basic),
            leveled("e", "support", Sophistication::Novice),
        ];
        let by_group = sophistication_by_group(&stories);
        assert_eq!(by_group["support"].total(), 0);
        let patterns = sophistication_patterns(&by_group);
        assert_eq!(patterns.high_sophistication_groups, vec!["research"]);
        assert_eq!(patterns.low_sophistication_groups, vec!["sales"]);
        assert_eq!(patterns.gap_size, 0.7);

        let only_high = sophistication_patterns(&sophistication_by_group(&stories[..2]));
        assert_eq!(only_high.gap_size, 0.0);
    }

    #[test]
    fn most_common_cause_prefers_earlier_variant_on_ties() {
        let mut summary = BTreeMap::new();
        summary.insert(RootCause::KnowledgeGap, 2);
        summary.insert(RootCause::PastFailures, 2);
        summary.insert(RootCause::ResourceIssues, 1);
        assert_eq!(most_common_cause(&summary), Some((RootCause::PastFailures, 2)));
        assert_eq!(most_common_cause(&BTreeMap::new()), None);
    }

    #[tokio::test]
    async fn question_one_reports_sentiment_spread() {
        let stories = vec![
            ai(story("a", "engineering", "ai tool is great", Some(0.8))),
            ai(story("b", "engineering", "ai helps", Some(0.6))),
            ai(story("c", "support", "ai worries me", Some(-0.5))),
        ];
        let report = engine(stories).answer_question_1(None).await.unwrap();
        assert_eq!(report.question, QUESTION_1);
        assert_eq!(report.sentiment_map["engineering"].average_sentiment, 0.7);
        assert_eq!(report.sentiment_map["support"].story_count, 1);
        assert!(report.key_insights.iter().any(|i| i.starts_with("Large sentiment variation (range: 1.20)")));
        assert!(
            report
                .implications
                .iter()
                .any(|i| i.starts_with("Different experiences across groups"))
        );
        assert_eq!(
            report.recommendations.last().map(String::as_str),
            Some("Use employee language in official communications to increase resonance")
        );
    }

    #[tokio::test]
    async fn question_five_always_names_strategic_reason() {
        let stories = vec![ai(story("a", "engineering", "ai rollout", Some(0.2)))];
        let report = engine(stories).answer_question_5(None).await.unwrap();
        assert_eq!(
            report.underlying_reasons.last().map(|r| r.reason),
            Some(VariationCause::StrategicVsTactical)
        );
        assert_eq!(report.implications.len(), report.underlying_reasons.len());
        assert_eq!(
            report.recommendations.last().map(String::as_str),
            Some("Acknowledge and explain intentional language adaptations to build understanding")
        );
    }

    #[tokio::test]
    async fn comprehensive_without_initiative_skips_unified_story() {
        let stories = vec![
            ai(story("a", "engineering", "we experiment with ai and learn", Some(0.6))),
            ai(story("b", "support", "ai project failed and was cancelled", Some(-0.6))),
        ];
        let report = engine(stories).run_comprehensive_analysis(None).await.unwrap();
        assert!(report.detailed_analyses.unified_story.is_none());
        assert!(report.initiative_id.is_none());
        assert_eq!(report.executive_summary.key_findings.len(), 4);
        assert!(report.action_plan.immediate.actions.len() <= 3);
        assert!(report.action_plan.short_term.actions.len() <= 5);
        assert!(report.action_plan.long_term.actions.len() <= 3);
        assert!(
            !report
                .action_plan
                .short_term
                .actions
                .iter()
                .any(|a| a == "Develop and launch unified narrative")
        );
    }

    #[tokio::test]
    async fn comprehensive_with_initiative_runs_unified_story() {
        let corpus = Corpus {
            stories: vec![ai(story("a", "engineering", "the copilot pilot", Some(0.4)))],
            initiatives: vec![Initiative {
                id: "copilot".into(),
                actual_story_ids: vec!["a".into()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let repo = Arc::new(InMemoryRepository::new(
            corpus,
            AnalysisSettings::default().markers.official_sources,
            1000,
        ));
        let report = NarrativeIntelligence::new(repo, settings())
            .unwrap()
            .run_comprehensive_analysis(Some("copilot"))
            .await
            .unwrap();
        let unified = report.detailed_analyses.unified_story.expect("unified story");
        assert_eq!(unified.initiative_id, "copilot");
        assert_eq!(unified.rollout_plan.len(), 4);
        assert_eq!(unified.messaging_strategy.audience_adaptations.len(), 4);
        assert_eq!(report.initiative_id.as_deref(), Some("copilot"));
        assert!(
            report
                .action_plan
                .short_term
                .actions
                .iter()
                .any(|a| a == "Develop and launch unified narrative")
        );
    }
}
