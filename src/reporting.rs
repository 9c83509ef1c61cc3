//! Executive-facing projections over the orchestrator output.
//!
//! Nothing here computes new scores; the dashboard re-presents a
//! comprehensive analysis and the detailed reports stitch analyzer results
//! for one group or one initiative.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::frames::FrameMap;
use crate::analysis::gap::GapReport;
use crate::analysis::readiness::{ReadinessReport, average_sentiment};
use crate::analysis::resistance::{Hotspot, RootCauseAnalysis};
use crate::error::{NarrativeError, Result};
use crate::models::{AgencyFrame, RootCause, Story};
use crate::orchestrator::{
    ActionPlan, ComprehensiveReport, CultureClass, DetailedAnalyses, NarrativeIntelligence, RiskCulture,
    UnifiedStoryReport,
};
use crate::scoring;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Caution,
    AtRisk,
    Critical,
}

impl HealthStatus {
    pub fn from_score(score: u32) -> Self {
        if score >= 75 {
            HealthStatus::Healthy
        } else if score >= 60 {
            HealthStatus::Caution
        } else if score >= 45 {
            HealthStatus::AtRisk
        } else {
            HealthStatus::Critical
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "green",
            HealthStatus::Caution => "yellow",
            HealthStatus::AtRisk => "orange",
            HealthStatus::Critical => "red",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "strong and ready",
            HealthStatus::Caution => "moderately ready with gaps",
            HealthStatus::AtRisk => "at risk, intervention needed",
            HealthStatus::Critical => "critical, major intervention required",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallHealth {
    pub score: u32,
    pub status: HealthStatus,
    pub color: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultureMetric {
    #[serde(rename = "type")]
    pub culture_type: CultureClass,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStatus {
    Strong,
    Moderate,
    Weak,
}

impl AlignmentStatus {
    pub fn from_percent(percent: u32) -> Self {
        if percent >= 70 {
            AlignmentStatus::Strong
        } else if percent < 50 {
            AlignmentStatus::Weak
        } else {
            AlignmentStatus::Moderate
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            AlignmentStatus::Strong => "strong",
            AlignmentStatus::Moderate => "moderate",
            AlignmentStatus::Weak => "weak",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentMetric {
    pub score: u32,
    pub status: AlignmentStatus,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPosture {
    pub level: RiskCulture,
    pub score: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub overall_health: OverallHealth,
    pub culture: CultureMetric,
    pub alignment: AlignmentMetric,
    pub risk_posture: RiskPosture,
}

/// Ordered most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSignal {
    pub severity: RiskSeverity,
    pub category: String,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub recommended_action: String,
    /// Key into `detailed_analyses` holding the supporting evidence.
    pub evidence_link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Immediate,
    ShortTerm,
    LongTerm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityAction {
    pub priority: Priority,
    pub timeline: String,
    pub action: String,
    pub why_now: String,
    pub suggested_owner: String,
    pub success_metric: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickWin {
    pub title: String,
    pub description: String,
    pub effort: String,
    pub impact: String,
    pub timeline: String,
    pub how: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub initiative_id: Option<String>,
    pub executive_summary: String,
    pub health_metrics: HealthMetrics,
    pub risk_signals: Vec<RiskSignal>,
    pub priority_actions: Vec<PriorityAction>,
    pub quick_wins: Vec<QuickWin>,
    pub detailed_analyses: DetailedAnalyses,
    pub action_plan: ActionPlan,
}

pub struct ExecutiveDashboard {
    engine: Arc<NarrativeIntelligence>,
}

impl ExecutiveDashboard {
    pub fn new(engine: Arc<NarrativeIntelligence>) -> Self {
        Self { engine }
    }

    pub async fn generate_dashboard(&self, initiative_id: Option<&str>) -> Result<DashboardReport> {
        info!(initiative = ?initiative_id, "generating executive dashboard");
        let analysis = self.engine.run_comprehensive_analysis(initiative_id).await?;
        Ok(dashboard_from(analysis))
    }
}

/// Projects a comprehensive analysis into the dashboard layout.
pub fn dashboard_from(analysis: ComprehensiveReport) -> DashboardReport {
    let health_metrics = health_metrics(&analysis.detailed_analyses);
    let risk_signals = risk_signals(&analysis.detailed_analyses);
    let priority_actions = priority_actions(&analysis.action_plan);
    let executive_summary = executive_narrative(&health_metrics, &risk_signals, &priority_actions);
    let quick_wins = quick_wins(&analysis.detailed_analyses);

    DashboardReport {
        generated_at: Utc::now(),
        initiative_id: analysis.initiative_id,
        executive_summary,
        health_metrics,
        risk_signals,
        priority_actions,
        quick_wins,
        detailed_analyses: analysis.detailed_analyses,
        action_plan: analysis.action_plan,
    }
}

fn percent(score: f64) -> u32 {
    (scoring::clamp_unit(score) * 100.0) as u32
}

pub fn health_metrics(analyses: &DetailedAnalyses) -> HealthMetrics {
    let culture = &analyses.entrepreneurial_culture;
    let health_score = percent(culture.overall_score);
    let status = HealthStatus::from_score(health_score);

    let alignment_pct = percent(analyses.team_differences.vocabulary_gaps.alignment_score);
    let risk = &analyses.risk_aversion;

    HealthMetrics {
        overall_health: OverallHealth {
            score: health_score,
            status,
            color: status.color().to_string(),
            label: status.label().to_string(),
        },
        culture: CultureMetric {
            culture_type: culture.classification,
            description: culture_description(culture.classification).to_string(),
        },
        alignment: AlignmentMetric {
            score: alignment_pct,
            status: AlignmentStatus::from_percent(alignment_pct),
            description: format!("{alignment_pct}% narrative alignment across teams"),
        },
        risk_posture: RiskPosture {
            level: risk.classification,
            score: percent(risk.risk_aversion_score),
            description: risk_description(risk.classification).to_string(),
        },
    }
}

fn culture_description(class: CultureClass) -> &'static str {
    match class {
        CultureClass::Entrepreneurial => "innovation-embracing",
        CultureClass::Balanced => "balanced risk/innovation",
        CultureClass::Cautious => "cautiously innovative",
        CultureClass::RiskAverse => "risk-averse",
    }
}

fn risk_description(level: RiskCulture) -> &'static str {
    match level {
        RiskCulture::HighlyRiskAverse => "Very high resistance to change",
        RiskCulture::ModeratelyRiskAverse => "Moderate caution around new initiatives",
        RiskCulture::Balanced => "Balanced approach to risk",
        RiskCulture::RiskTolerant => "Comfortable with innovation risk",
    }
}

/// Risks sorted by severity, at most five.
pub fn risk_signals(analyses: &DetailedAnalyses) -> Vec<RiskSignal> {
    let mut risks = Vec::new();

    let culture = &analyses.entrepreneurial_culture;
    if culture.overall_score < 0.5 {
        risks.push(RiskSignal {
            severity: RiskSeverity::High,
            category: "culture".to_string(),
            title: "Low Innovation Readiness".to_string(),
            description: format!(
                "Culture type: {}. Organization shows limited readiness for AI adoption.",
                culture.culture_type.as_str()
            ),
            impact: "Slow adoption, resistance patterns, initiative failures".to_string(),
            recommended_action: "Launch pilot programs to build confidence through small wins".to_string(),
            evidence_link: "entrepreneurial_culture".to_string(),
        });
    }

    if analyses.team_differences.vocabulary_gaps.alignment_score < 0.4 {
        risks.push(RiskSignal {
            severity: RiskSeverity::High,
            category: "alignment".to_string(),
            title: "Severe Narrative Fragmentation".to_string(),
            description: "Teams are telling fundamentally different stories about AI initiatives.".to_string(),
            impact: "Confused priorities, wasted effort, initiative conflicts".to_string(),
            recommended_action: "Facilitate cross-team storytelling sessions to develop shared language"
                .to_string(),
            evidence_link: "team_differences".to_string(),
        });
    }

    let risk = &analyses.risk_aversion;
    if risk.risk_aversion_score > 0.7 {
        risks.push(RiskSignal {
            severity: RiskSeverity::Critical,
            category: "resistance".to_string(),
            title: "High Risk Aversion Blocking Adoption".to_string(),
            description: format!("{} resistance hotspots identified.", risk.hotspots.len()),
            impact: "Initiatives stall, innovation slows, competitive disadvantage".to_string(),
            recommended_action: "Address root causes in resistant groups before expanding initiatives"
                .to_string(),
            evidence_link: "risk_aversion".to_string(),
        });
    }

    let trust = &analyses.language_context.trust_factor;
    if trust.score < 0.4 {
        risks.push(RiskSignal {
            severity: RiskSeverity::Medium,
            category: "trust".to_string(),
            title: "Low Trust Signals".to_string(),
            description: format!("Trust score of {:.2}. {}", trust.score, trust.interpretation),
            impact: "Guarded communication, skepticism toward official messaging".to_string(),
            recommended_action: "Build trust through transparency and consistent follow-through".to_string(),
            evidence_link: "language_context".to_string(),
        });
    }

    risks.sort_by_key(|r| r.severity);
    risks.truncate(5);
    risks
}

/// Two immediate, two short-term and one long-term action.
pub fn priority_actions(plan: &ActionPlan) -> Vec<PriorityAction> {
    let tiers = [
        (Priority::Immediate, &plan.immediate, 2, "Critical blocker or high-impact opportunity"),
        (Priority::ShortTerm, &plan.short_term, 2, "Addresses structural issues"),
        (Priority::LongTerm, &plan.long_term, 1, "Strategic foundation building"),
    ];
    tiers
        .into_iter()
        .flat_map(|(priority, tier, take, why_now)| {
            tier.actions.iter().take(take).map(move |action| PriorityAction {
                priority,
                timeline: tier.timeline.clone(),
                action: action.clone(),
                why_now: why_now.to_string(),
                suggested_owner: suggest_owner(action).to_string(),
                success_metric: suggest_metric(action).to_string(),
            })
        })
        .collect()
}

pub fn suggest_owner(action: &str) -> &'static str {
    let lowered = action.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lowered.contains(w));
    if has(&["trust", "leadership"]) {
        "Executive Team"
    } else if has(&["training", "skill"]) {
        "Learning & Development"
    } else if has(&["communication", "storytelling"]) {
        "Internal Communications"
    } else if has(&["technical", "implementation"]) {
        "Engineering Leadership"
    } else if has(&["pilot", "experiment"]) {
        "Innovation Team"
    } else {
        "Cross-Functional Team"
    }
}

pub fn suggest_metric(action: &str) -> &'static str {
    let lowered = action.to_lowercase();
    if lowered.contains("alignment") || lowered.contains("narrative") {
        "Narrative alignment score increases to >0.7"
    } else if lowered.contains("trust") {
        "Trust signals in stories increase by 30%"
    } else if lowered.contains("resistance") {
        "Resistance hotspots reduce by 50%"
    } else if lowered.contains("pilot") {
        "Pilot shows positive outcomes in 80% of cases"
    } else if lowered.contains("training") {
        "90% of target audience completes training"
    } else {
        "Stakeholder satisfaction survey shows improvement"
    }
}

/// Situation, challenges and path forward as three paragraphs.
pub fn executive_narrative(
    health: &HealthMetrics,
    risks: &[RiskSignal],
    actions: &[PriorityAction],
) -> String {
    let situation = format!(
        "Our AI adoption readiness is currently {} ({}/100), with a {} organizational culture. \
         Narrative alignment across teams is {} at {}%.",
        health.overall_health.label,
        health.overall_health.score,
        health.culture.description,
        health.alignment.status.as_str(),
        health.alignment.score
    );

    let challenges = match risks.split_first() {
        Some((top, rest)) => {
            let mut text = format!(
                "The primary challenge is {}: {} This creates {}. ",
                top.title.to_lowercase(),
                top.description,
                top.impact.to_lowercase()
            );
            if !rest.is_empty() {
                let additional: Vec<&str> = rest.iter().take(2).map(|r| r.title.as_str()).collect();
                text.push_str(&format!("Additional concerns include {}.", additional.join(", ")));
            }
            text
        }
        None => "No critical challenges identified. Focus on maintaining momentum.".to_string(),
    };

    let path_forward = match actions.first() {
        None => "Continue current trajectory with regular monitoring.".to_string(),
        Some(first) => match actions.iter().find(|a| a.priority == Priority::Immediate) {
            Some(immediate) => format!(
                "Immediate priority: {} This addresses the most critical blocker and can show results \
                 within 30 days. Following this, focus on {}.",
                immediate.action,
                actions
                    .get(1)
                    .map(|a| a.action.to_lowercase())
                    .unwrap_or_else(|| "sustaining momentum".to_string())
            ),
            None => format!(
                "Recommended path: {} over the next {}.",
                first.action, first.timeline
            ),
        },
    };

    format!("{situation}\n\n{challenges}\n\n{path_forward}")
}

/// Up to three low-effort actions.
pub fn quick_wins(analyses: &DetailedAnalyses) -> Vec<QuickWin> {
    let mut wins = Vec::new();

    if !analyses.team_differences.vocabulary_gaps.shared.is_empty() {
        wins.push(QuickWin {
            title: "Amplify Shared Language".to_string(),
            description: "Teams already share common AI terminology. Reinforce this in communications."
                .to_string(),
            effort: "low".to_string(),
            impact: "medium".to_string(),
            timeline: "1-2 weeks".to_string(),
            how: "Create talking points using shared terms. Distribute to managers.".to_string(),
        });
    }

    if let Some(strength) = analyses.entrepreneurial_culture.strengths.first() {
        wins.push(QuickWin {
            title: format!("Leverage {} Strength", title_case(strength)),
            description: format!("Your organization excels at {strength}. Showcase success stories."),
            effort: "low".to_string(),
            impact: "high".to_string(),
            timeline: "2-3 weeks".to_string(),
            how: "Collect and share 3-5 success stories highlighting this strength.".to_string(),
        });
    }

    wins.push(QuickWin {
        title: "Cross-Team Storytelling Session".to_string(),
        description: "Bring teams together to share AI experiences and build common understanding."
            .to_string(),
        effort: "low".to_string(),
        impact: "high".to_string(),
        timeline: "1 week".to_string(),
        how: "Schedule 90-min session. Each team shares 1-2 stories. Facilitate finding common themes."
            .to_string(),
    });

    wins.truncate(3);
    wins
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Detailed reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamOverview {
    pub story_count: usize,
    pub average_sentiment: f64,
    pub dominant_frame: String,
    pub resistance_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamIntervention {
    pub target_group: String,
    pub root_cause: RootCause,
    pub approach: String,
    pub actions: Vec<String>,
    pub timeline: String,
    pub success_indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleStory {
    pub content: String,
    pub sentiment: Option<f64>,
    pub frame: Option<AgencyFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamReport {
    pub group: String,
    pub overview: TeamOverview,
    pub resistance_analysis: Option<Hotspot>,
    pub root_causes: RootCauseAnalysis,
    pub recommended_interventions: Vec<TeamIntervention>,
    pub example_stories: Vec<ExampleStory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiativeReport {
    pub initiative_id: String,
    pub initiative_name: String,
    pub executive_summary: String,
    pub narrative_gaps: GapReport,
    pub competing_frames: FrameMap,
    pub adoption_readiness: ReadinessReport,
    pub unified_story_design: UnifiedStoryReport,
    pub recommendations: Vec<String>,
}

const EXAMPLE_STORIES: usize = 3;
const EXAMPLE_LENGTH: usize = 200;

/// Deep dives for one group or one initiative.
pub struct DetailedReport {
    engine: Arc<NarrativeIntelligence>,
}

impl DetailedReport {
    pub fn new(engine: Arc<NarrativeIntelligence>) -> Self {
        Self { engine }
    }

    pub async fn generate_team_report(&self, group: &str) -> Result<TeamReport> {
        info!(group, "generating team report");
        let groups = self.engine.repository().fetch_groups().await?;
        if !groups.iter().any(|g| g == group) {
            return Err(NarrativeError::not_found(format!("group '{group}'")));
        }

        let mapper = self.engine.resistance_mapper();
        let (landscape, stories) =
            tokio::try_join!(mapper.map_resistance_landscape(), mapper.group_stories(group))?;
        let hotspot = landscape.hotspots.into_iter().find(|h| h.group == group);
        let root_causes = mapper.infer_root_causes(&stories);

        let recommended_interventions = match &hotspot {
            Some(_) => vec![team_intervention(group, root_causes.primary_cause)],
            None => Vec::new(),
        };

        Ok(TeamReport {
            group: group.to_string(),
            overview: team_overview(&stories, hotspot.as_ref()),
            resistance_analysis: hotspot,
            root_causes,
            recommended_interventions,
            example_stories: stories.iter().take(EXAMPLE_STORIES).map(example_story).collect(),
        })
    }

    pub async fn generate_initiative_report(&self, initiative_id: &str) -> Result<InitiativeReport> {
        info!(initiative = initiative_id, "generating initiative report");
        let initiative = self
            .engine
            .repository()
            .fetch_initiative(initiative_id)
            .await?
            .ok_or_else(|| NarrativeError::not_found(format!("initiative '{initiative_id}'")))?;

        let id = Some(initiative_id);
        let (gaps, frames, readiness, unified) = tokio::try_join!(
            self.engine.gap_analyzer().analyze_official_vs_actual(id),
            self.engine.frame_analyzer().map_competing_frames(id),
            self.engine.readiness_scorer().assess_readiness(id),
            self.engine.answer_question_3(initiative_id),
        )?;

        let executive_summary = format!(
            "Initiative shows {} narrative gaps between official and actual stories, with {} competing \
             frames in use. Overall adoption readiness is {}/100, classified as {}.",
            gaps.severity.overall_severity.as_str().to_lowercase(),
            frames.frames.len(),
            percent(readiness.overall_score),
            readiness.classification.as_str()
        );

        let mut recommendations = Vec::new();
        if gaps.severity.overall_severity.is_serious() {
            recommendations.push("URGENT: Address narrative gaps through cross-team alignment sessions".to_string());
        }
        if frames.frames.len() > 3 {
            recommendations.push("High frame diversity indicates need for unified messaging strategy".to_string());
        }
        if readiness.overall_score < 0.5 {
            recommendations.push("Low readiness score suggests slowing rollout to build foundation".to_string());
        }

        Ok(InitiativeReport {
            initiative_id: initiative_id.to_string(),
            initiative_name: initiative.name,
            executive_summary,
            narrative_gaps: gaps,
            competing_frames: frames,
            adoption_readiness: readiness,
            unified_story_design: unified,
            recommendations,
        })
    }
}

pub fn team_overview(stories: &[Story], hotspot: Option<&Hotspot>) -> TeamOverview {
    let frames = scoring::count_labels(
        stories
            .iter()
            .map(|s| s.agency_frame.map(|f| f.as_str()).unwrap_or("unknown")),
    );
    TeamOverview {
        story_count: stories.len(),
        average_sentiment: scoring::round_to(average_sentiment(stories), 2),
        dominant_frame: scoring::dominant(&frames)
            .map(|(label, _)| label.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        resistance_level: hotspot.map(|h| h.resistance_score).unwrap_or(0.0),
    }
}

fn example_story(story: &Story) -> ExampleStory {
    let body = if story.summary.trim().is_empty() {
        &story.full_text
    } else {
        &story.summary
    };
    ExampleStory {
        content: format!("{}...", scoring::truncate(body, EXAMPLE_LENGTH)),
        sentiment: story.ai_sentiment,
        frame: story.agency_frame,
    }
}

pub fn team_intervention(group: &str, cause: RootCause) -> TeamIntervention {
    let (approach, actions, timeline): (&str, &[&str], &str) = match cause {
        RootCause::PastFailures => (
            "Acknowledge & Learn",
            &[
                "Host retrospective on past AI initiative",
                "Document lessons learned publicly",
                "Show how current approach addresses past issues",
            ],
            "4-6 weeks",
        ),
        RootCause::ThreatPerception => (
            "Reframe & Reassure",
            &[
                "Share success stories from similar roles",
                "Provide clear career development paths with AI",
                "Pilot program showing augmentation not replacement",
            ],
            "2-3 months",
        ),
        RootCause::ResourceIssues => (
            "Resource & Support",
            &[
                "Allocate dedicated time for AI learning",
                "Provide training and mentorship",
                "Reduce other responsibilities during transition",
            ],
            "1-2 months",
        ),
        RootCause::ValueMisalignment => (
            "Connect & Align",
            &[
                "Facilitate dialogue on values and AI",
                "Show how AI supports team's core values",
                "Co-design ethical guidelines for AI use",
            ],
            "6-8 weeks",
        ),
        RootCause::KnowledgeGap => (
            "Educate & Build Skills",
            &[
                "Tailored training program for group",
                "Hands-on workshops with real examples",
                "Peer learning groups and office hours",
            ],
            "2-3 months",
        ),
        RootCause::Unknown => (
            "Custom Approach Needed",
            &["Conduct deeper investigation", "Design tailored intervention"],
            "TBD",
        ),
    };
    TeamIntervention {
        target_group: group.to_string(),
        root_cause: cause,
        approach: approach.to_string(),
        actions: actions.iter().map(|a| a.to_string()).collect(),
        timeline: timeline.to_string(),
        success_indicators: vec![
            format!("Resistance score for {group} drops below 0.4"),
            "Positive sentiment in stories increases by 30%".to_string(),
            "Group references AI initiatives constructively".to_string(),
        ],
    }
}
