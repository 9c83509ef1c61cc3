use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AnalysisSettings;
use crate::error::Result;
use crate::models::{AgencyFrame, CORE_OPPOSITIONS, Frame, Story, opposes};
use crate::repository::{InitiativeScope, StoryFilter, StoryRepository};
use crate::scoring::{self, NEUTRAL};
use crate::signals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapSeverity {
    Critical,
    Significant,
    Minor,
    InsufficientData,
}

impl GapSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapSeverity::Critical => "CRITICAL",
            GapSeverity::Significant => "SIGNIFICANT",
            GapSeverity::Minor => "MINOR",
            GapSeverity::InsufficientData => "INSUFFICIENT_DATA",
        }
    }

    pub fn is_serious(&self) -> bool {
        matches!(self, GapSeverity::Critical | GapSeverity::Significant)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyGap {
    pub official_only: BTreeSet<String>,
    pub employee_only: BTreeSet<String>,
    pub shared: BTreeSet<String>,
    pub sophistication_gap: f64,
    pub alignment_score: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameCount {
    pub frame: Frame,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramingGap {
    pub official_frame: Frame,
    pub dominant_employee_frame: Frame,
    /// Top three employee frames by count
    pub dominant_employee_frames: Vec<FrameCount>,
    pub alignment_score: f64,
    pub conflicting: bool,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmphasisGap {
    pub official_priorities: BTreeSet<String>,
    pub employee_priorities: BTreeSet<String>,
    pub what_execs_ignore: BTreeSet<String>,
    pub what_employees_ignore: BTreeSet<String>,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentGap {
    pub official_sentiment: f64,
    pub employee_sentiment: f64,
    pub sentiment_gap: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefGap {
    pub official_agency_belief: Option<AgencyFrame>,
    pub employee_agency_beliefs: BTreeMap<String, usize>,
    pub official_innovation_belief: Option<String>,
    pub employee_innovation_beliefs: BTreeMap<String, usize>,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gaps {
    pub language_gap: VocabularyGap,
    pub framing_gap: FramingGap,
    pub emphasis_gap: EmphasisGap,
    pub emotion_gap: SentimentGap,
    pub belief_gap: BeliefGap,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeverityIndicators {
    pub critical: Vec<String>,
    pub significant: Vec<String>,
    pub minor: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityAssessment {
    pub overall_severity: GapSeverity,
    pub severity_score: f64,
    pub indicators: SeverityIndicators,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    pub initiative_id: Option<String>,
    pub official_story: Option<Story>,
    pub employee_story_count: usize,
    pub gaps: Gaps,
    pub severity: SeverityAssessment,
    pub interpretation: String,
}

/// Measures the divergence between official messaging and employee stories.
pub struct NarrativeGapAnalyzer {
    repo: Arc<dyn StoryRepository>,
    settings: Arc<AnalysisSettings>,
}

impl NarrativeGapAnalyzer {
    pub fn new(repo: Arc<dyn StoryRepository>, settings: Arc<AnalysisSettings>) -> Self {
        Self { repo, settings }
    }

    pub async fn analyze_official_vs_actual(&self, initiative_id: Option<&str>) -> Result<GapReport> {
        let official = self.get_official_narrative(initiative_id).await?;
        let employees = self.get_employee_narratives(initiative_id).await?;
        info!(
            initiative = ?initiative_id,
            has_official = official.is_some(),
            employee_stories = employees.len(),
            "analyzing official vs actual narratives"
        );

        let gaps = Gaps {
            language_gap: self.compare_vocabulary(official.as_ref(), &employees),
            framing_gap: self.compare_frames(official.as_ref(), &employees),
            emphasis_gap: self.compare_emphasis(official.as_ref(), &employees),
            emotion_gap: self.compare_sentiment(official.as_ref(), &employees),
            belief_gap: self.compare_beliefs(official.as_ref(), &employees),
        };

        if official.is_none() && employees.is_empty() {
            warn!(initiative = ?initiative_id, "no stories found for gap analysis");
            return Ok(GapReport {
                initiative_id: initiative_id.map(str::to_string),
                official_story: None,
                employee_story_count: 0,
                gaps,
                severity: SeverityAssessment {
                    overall_severity: GapSeverity::InsufficientData,
                    severity_score: 0.0,
                    indicators: SeverityIndicators::default(),
                    recommendation: "Collect official and employee stories before assessing gaps."
                        .to_string(),
                },
                interpretation: "No stories found for analysis".to_string(),
            });
        }

        let severity = self.detect_gap_severity(&gaps);
        let interpretation = overall_interpretation(&gaps, &severity);
        Ok(GapReport {
            initiative_id: initiative_id.map(str::to_string),
            official_story: official,
            employee_story_count: employees.len(),
            gaps,
            severity,
            interpretation,
        })
    }

    /// The initiative's official story, or the newest official AI story.
    pub async fn get_official_narrative(&self, initiative_id: Option<&str>) -> Result<Option<Story>> {
        let filter = match initiative_id {
            Some(id) => StoryFilter::default().initiative(InitiativeScope::Official(id.to_string())),
            None => StoryFilter::ai().official(true),
        };
        Ok(self.repo.fetch_stories(&filter.limit(1)).await?.into_iter().next())
    }

    pub async fn get_employee_narratives(&self, initiative_id: Option<&str>) -> Result<Vec<Story>> {
        let filter = match initiative_id {
            Some(id) => StoryFilter::default().initiative(InitiativeScope::Actual(id.to_string())),
            None => StoryFilter::ai().official(false),
        };
        self.repo
            .fetch_stories(&filter.limit(self.settings.tuning.caps.employee_stories))
            .await
    }

    fn ai_terms(&self, story: &Story) -> BTreeSet<String> {
        let mut terms: BTreeSet<String> = story
            .ai_concepts_mentioned
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        let text = story.text();
        terms.extend(
            signals::detect(&text, &self.settings.markers.ai_terms)
                .into_iter()
                .map(str::to_string),
        );
        terms
    }

    fn technical_share(&self, terms: &BTreeSet<String>) -> f64 {
        let technical = terms
            .iter()
            .filter(|t| {
                self.settings
                    .markers
                    .technical_terms
                    .iter()
                    .any(|m| m.eq_ignore_ascii_case(t))
            })
            .count();
        technical as f64 / terms.len().max(1) as f64
    }

    pub fn compare_vocabulary(&self, official: Option<&Story>, employees: &[Story]) -> VocabularyGap {
        let official_terms = official.map(|s| self.ai_terms(s)).unwrap_or_default();
        let employee_terms: BTreeSet<String> =
            employees.iter().flat_map(|s| self.ai_terms(s)).collect();

        let official_only: BTreeSet<String> =
            official_terms.difference(&employee_terms).cloned().collect();
        let employee_only: BTreeSet<String> =
            employee_terms.difference(&official_terms).cloned().collect();
        let shared: BTreeSet<String> =
            official_terms.intersection(&employee_terms).cloned().collect();

        let sophistication_gap =
            (self.technical_share(&official_terms) - self.technical_share(&employee_terms)).abs();
        let alignment_score = scoring::jaccard(&official_terms, &employee_terms).unwrap_or(NEUTRAL);
        debug!(
            official_terms = official_terms.len(),
            employee_terms = employee_terms.len(),
            shared = shared.len(),
            "vocabulary compared"
        );

        let interpretation = if sophistication_gap > 0.5 {
            "Large sophistication gap - leadership uses technical terms, employees use colloquial language"
        } else if official_only.len() > 5 && employee_only.len() > 5 {
            "Completely different vocabularies - suggests lack of shared understanding"
        } else if official_only.len() > employee_only.len() * 2 {
            "Leadership vocabulary not adopted by employees"
        } else if employee_only.len() > official_only.len() * 2 {
            "Employees have developed their own terminology"
        } else {
            "Moderate vocabulary alignment with some divergence"
        };

        VocabularyGap {
            official_only,
            employee_only,
            shared,
            sophistication_gap,
            alignment_score,
            interpretation: interpretation.to_string(),
        }
    }

    /// Frame of one story: explicit narrative function, then summary keywords,
    /// then sentiment sign.
    pub fn extract_frame(&self, story: &Story) -> Frame {
        if let Some(function) = story.narrative_function.as_deref().filter(|f| !f.trim().is_empty()) {
            return Frame::parse(function);
        }
        let summary = story.summary.to_lowercase();
        if let Some(label) = signals::first_matching_group(&summary, &self.settings.markers.gap_frame_keywords) {
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

    pub fn compare_frames(&self, official: Option<&Story>, employees: &[Story]) -> FramingGap {
        let official_frame = official.map(|s| self.extract_frame(s)).unwrap_or(Frame::Unknown);
        let counts = scoring::count_labels(employees.iter().map(|s| self.extract_frame(s).label().to_string()));
        let dominant_employee_frame = scoring::dominant(&counts)
            .map(|(label, _)| Frame::parse(label))
            .unwrap_or(Frame::Unknown);
        let alignment_score = counts.get(official_frame.label()).copied().unwrap_or(0) as f64
            / employees.len().max(1) as f64;
        let conflicting = opposes(&official_frame, &dominant_employee_frame, &CORE_OPPOSITIONS);

        let interpretation = if alignment_score > 0.7 {
            "Strong frame alignment - employees echo official framing".to_string()
        } else if conflicting {
            format!(
                "Conflicting frames - leadership frames as '{}', employees see '{}'",
                official_frame, dominant_employee_frame
            )
        } else if alignment_score < 0.3 {
            "Low frame alignment - different narratives competing".to_string()
        } else {
            "Moderate frame alignment with some divergence".to_string()
        };

        FramingGap {
            official_frame,
            dominant_employee_frame,
            dominant_employee_frames: scoring::ranked(&counts)
                .into_iter()
                .take(3)
                .map(|(label, count)| FrameCount {
                    frame: Frame::parse(&label),
                    count,
                })
                .collect(),
            alignment_score,
            conflicting,
            interpretation,
        }
    }

    fn emphasis_points(&self, story: &Story) -> BTreeSet<String> {
        let mut points: BTreeSet<String> = story.primary_themes.iter().cloned().collect();
        let summary = story.summary.to_lowercase();
        points.extend(
            signals::matching_groups(&summary, &self.settings.markers.emphasis_buckets)
                .into_iter()
                .map(str::to_string),
        );
        points
    }

    pub fn compare_emphasis(&self, official: Option<&Story>, employees: &[Story]) -> EmphasisGap {
        let official_priorities = official.map(|s| self.emphasis_points(s)).unwrap_or_default();
        let employee_priorities: BTreeSet<String> =
            employees.iter().flat_map(|s| self.emphasis_points(s)).collect();
        let what_employees_ignore: BTreeSet<String> = official_priorities
            .difference(&employee_priorities)
            .cloned()
            .collect();
        let what_execs_ignore: BTreeSet<String> = employee_priorities
            .difference(&official_priorities)
            .cloned()
            .collect();

        let interpretation = if what_execs_ignore.contains("workload impact")
            && what_employees_ignore.contains("efficiency")
        {
            "Execs emphasize efficiency gains, employees worry about increased workload"
        } else if what_execs_ignore.contains("job impact") {
            "Employees concerned about job impact - leadership not addressing this"
        } else if what_execs_ignore.len() > what_employees_ignore.len() {
            "Employees prioritizing concerns not mentioned in official messaging"
        } else {
            "Different emphasis patterns - some disconnect in priorities"
        };

        EmphasisGap {
            official_priorities,
            employee_priorities,
            what_execs_ignore,
            what_employees_ignore,
            interpretation: interpretation.to_string(),
        }
    }

    pub fn compare_sentiment(&self, official: Option<&Story>, employees: &[Story]) -> SentimentGap {
        let official_sentiment = official.map(Story::sentiment_or_zero).unwrap_or(0.0);
        let employee_sentiment = scoring::mean(&super::sentiments(employees)).unwrap_or(0.0);
        let gap = (official_sentiment - employee_sentiment).abs();

        let interpretation = if gap < 0.2 {
            "Sentiment alignment - similar emotional response"
        } else if official_sentiment > 0.5 && employee_sentiment < -0.2 {
            "Major disconnect - leadership enthusiastic, employees negative"
        } else if official_sentiment > 0.0 && employee_sentiment < official_sentiment - 0.4 {
            "Executive optimism not shared by employees"
        } else if employee_sentiment < 0.0 && official_sentiment > 0.0 {
            "Employee concerns not reflected in official messaging"
        } else {
            "Moderate sentiment divergence"
        };

        SentimentGap {
            official_sentiment,
            employee_sentiment,
            sentiment_gap: gap,
            interpretation: interpretation.to_string(),
        }
    }

    pub fn compare_beliefs(&self, official: Option<&Story>, employees: &[Story]) -> BeliefGap {
        let official_agency = official.and_then(|s| s.agency_frame);
        let agency_counts =
            scoring::count_labels(employees.iter().filter_map(|s| s.agency_frame).map(|a| a.as_str()));
        let employee_agency = scoring::dominant(&agency_counts)
            .map(|(label, _)| AgencyFrame::from(label.to_string()));
        let innovation_counts = scoring::count_labels(
            employees
                .iter()
                .filter_map(|s| s.innovation_signal)
                .map(|i| i.as_str()),
        );

        let interpretation = match (official_agency, employee_agency) {
            (Some(AgencyFrame::HumanInControl), Some(AgencyFrame::AiInControl)) => format!(
                "Belief mismatch - leadership sees human control ({}), employees feel AI is taking over ({})",
                AgencyFrame::HumanInControl,
                AgencyFrame::AiInControl
            ),
            (Some(AgencyFrame::Partnership), Some(AgencyFrame::AiInControl)) => {
                "Leadership frames as partnership, employees feel disempowered".to_string()
            }
            (Some(official), Some(employee)) if official != employee => format!(
                "Different belief systems - leadership: {}, employees: {}",
                official, employee
            ),
            _ => "Belief systems not clearly divergent".to_string(),
        };

        BeliefGap {
            official_agency_belief: official_agency,
            employee_agency_beliefs: agency_counts,
            official_innovation_belief: official
                .and_then(|s| s.innovation_signal)
                .map(|i| i.as_str().to_string()),
            employee_innovation_beliefs: innovation_counts,
            interpretation,
        }
    }

    pub fn detect_gap_severity(&self, gaps: &Gaps) -> SeverityAssessment {
        let mut indicators = SeverityIndicators::default();

        let vocab = gaps.language_gap.alignment_score;
        if vocab < 0.3 {
            indicators.critical.push("Completely different vocabulary".to_string());
        } else if vocab < 0.6 {
            indicators.significant.push("Limited vocabulary overlap".to_string());
        }

        if gaps.framing_gap.conflicting {
            indicators.critical.push("Opposing narrative frames".to_string());
        } else if gaps.framing_gap.alignment_score < 0.4 {
            indicators.significant.push("Low frame alignment".to_string());
        }

        let sentiment = gaps.emotion_gap.sentiment_gap;
        if sentiment > 0.8 {
            indicators.critical.push("Extreme sentiment divergence".to_string());
        } else if sentiment > 0.5 {
            indicators.significant.push("Significant sentiment gap".to_string());
        }

        let severity_score =
            (indicators.critical.len() as f64 + 0.5 * indicators.significant.len() as f64) / 3.0;
        let overall_severity = scoring::classify(
            severity_score,
            &[0.7, 0.4],
            &[GapSeverity::Critical, GapSeverity::Significant, GapSeverity::Minor],
            scoring::Boundary::Above,
        );
        let recommendation = match overall_severity {
            GapSeverity::Critical => {
                "IMMEDIATE ACTION REQUIRED: Major gaps threaten AI adoption. Recommend leadership workshop to align messaging."
            }
            GapSeverity::Significant => {
                "ACTION RECOMMENDED: Notable gaps exist. Consider targeted communication to address employee concerns."
            }
            _ => "MONITORING SUGGESTED: Minor gaps are manageable but worth tracking.",
        };

        SeverityAssessment {
            overall_severity,
            severity_score,
            indicators,
            recommendation: recommendation.to_string(),
        }
    }
}

fn overall_interpretation(gaps: &Gaps, severity: &SeverityAssessment) -> String {
    let parts = [
        ("language_gap", &gaps.language_gap.interpretation),
        ("framing_gap", &gaps.framing_gap.interpretation),
        ("emphasis_gap", &gaps.emphasis_gap.interpretation),
        ("emotion_gap", &gaps.emotion_gap.interpretation),
        ("belief_gap", &gaps.belief_gap.interpretation),
    ]
    .iter()
    .map(|(kind, text)| format!("{kind}: {text}"))
    .collect::<Vec<_>>()
    .join(" | ");
    format!(
        "Overall severity: {}. {}",
        severity.overall_severity.as_str(),
        parts
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{repo, settings, story};

    fn analyzer(stories: Vec<Story>) -> NarrativeGapAnalyzer {
        NarrativeGapAnalyzer::new(repo(stories), settings())
    }

    #[test]
    fn belief_mismatch_names_both_frames() {
        let a = analyzer(vec![]);
        let mut official = story("o", "leadership", "AI rollout", Some(0.8));
        official.agency_frame = Some(AgencyFrame::HumanInControl);
        let mut employee = story("e", "ops", "AI rollout", Some(-0.6));
        employee.agency_frame = Some(AgencyFrame::AiInControl);

        let beliefs = a.compare_beliefs(Some(&official), std::slice::from_ref(&employee));
        assert!(beliefs.interpretation.contains("human_in_control"));
        assert!(beliefs.interpretation.contains("ai_in_control"));

        let sentiment = a.compare_sentiment(Some(&official), &[employee]);
        assert!((sentiment.sentiment_gap - 1.4).abs() < 1e-9);
        assert_eq!(
            sentiment.interpretation,
            "Major disconnect - leadership enthusiastic, employees negative"
        );
    }

    #[test]
    fn identical_vocabularies_align_fully() {
        let a = analyzer(vec![]);
        let official = story("o", "leadership", "our copilot assistant", None);
        let employee = story("e", "ops", "the copilot assistant", None);
        let vocab = a.compare_vocabulary(Some(&official), &[employee]);
        assert_eq!(vocab.alignment_score, 1.0);
        assert!(vocab.official_only.is_empty());
    }

    #[test]
    fn disjoint_vocabularies_align_to_zero() {
        let a = analyzer(vec![]);
        let mut official = Story::new("o", "");
        official.ai_concepts_mentioned = vec!["deep learning".into()];
        let mut employee = Story::new("e", "");
        employee.ai_concepts_mentioned = vec!["chatbot".into()];
        let vocab = a.compare_vocabulary(Some(&official), &[employee]);
        assert_eq!(vocab.alignment_score, 0.0);
        assert_eq!(vocab.sophistication_gap, 1.0);
    }

    #[test]
    fn empty_vocabularies_are_neutral() {
        let a = analyzer(vec![]);
        let vocab = a.compare_vocabulary(None, &[]);
        assert_eq!(vocab.alignment_score, 0.5);
    }

    #[test]
    fn frame_conflict_is_reported() {
        let a = analyzer(vec![]);
        let official = story("o", "leadership", "A huge opportunity for growth", None);
        let employees = vec![
            story("e1", "ops", "This is a threat to us", None),
            story("e2", "ops", "Worried it will replace people", None),
        ];
        let framing = a.compare_frames(Some(&official), &employees);
        assert_eq!(framing.official_frame, Frame::Opportunity);
        assert_eq!(framing.dominant_employee_frame, Frame::Threat);
        assert!(framing.conflicting);
        assert!(framing.interpretation.starts_with("Conflicting frames"));
    }

    #[test]
    fn emphasis_detects_workload_worry() {
        let a = analyzer(vec![]);
        let official = story("o", "leadership", "Efficiency and productivity gains", None);
        let employee = story("e", "ops", "More work and a heavier workload", None);
        let emphasis = a.compare_emphasis(Some(&official), &[employee]);
        assert_eq!(
            emphasis.interpretation,
            "Execs emphasize efficiency gains, employees worry about increased workload"
        );
    }

    #[tokio::test]
    async fn empty_corpus_reports_insufficient_data() {
        let report = analyzer(vec![]).analyze_official_vs_actual(None).await.unwrap();
        assert_eq!(report.severity.overall_severity, GapSeverity::InsufficientData);
        assert_eq!(report.employee_story_count, 0);
    }

    #[tokio::test]
    async fn severe_gap_is_critical() {
        let mut official = story("o", "leadership", "A real opportunity with machine learning", Some(0.9));
        official.source = Some("official".into());
        let employees = (0..4)
            .map(|i| story(&format!("e{i}"), "ops", "this bot is a threat", Some(-0.5)))
            .collect::<Vec<_>>();
        let mut stories = vec![official];
        stories.extend(employees);
        let report = analyzer(stories).analyze_official_vs_actual(None).await.unwrap();
        assert_eq!(report.employee_story_count, 4);
        assert_eq!(report.severity.overall_severity, GapSeverity::Critical);
        assert!(report.interpretation.starts_with("Overall severity: CRITICAL. language_gap: "));
    }
}
