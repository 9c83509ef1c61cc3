use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{AnalysisSettings, MarkerCatalogs, PolarityCatalog};
use crate::error::Result;
use crate::models::{Story, StoryType};
use crate::repository::{StoryFilter, StoryRepository};
use crate::scoring::{self, Boundary, NEUTRAL};
use crate::signals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CultureType {
    HighlyInnovative,
    ModeratelyInnovative,
    CautiouslyConservative,
    RiskAverse,
}

impl CultureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CultureType::HighlyInnovative => "Highly Innovative",
            CultureType::ModeratelyInnovative => "Moderately Innovative",
            CultureType::CautiouslyConservative => "Cautiously Conservative",
            CultureType::RiskAverse => "Risk Averse",
        }
    }
}

impl std::fmt::Display for CultureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExperimentPatterns {
    pub grassroots_experiments: usize,
    pub executive_experiments: usize,
    pub cross_functional: usize,
    pub outcomes_shared: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentationScore {
    pub score: f64,
    pub patterns: ExperimentPatterns,
    pub total_experiment_stories: usize,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureToleranceScore {
    pub score: f64,
    pub total_failures: usize,
    pub learning_framed: usize,
    pub warning_framed: usize,
    pub interpretation: String,
}

/// Story counts on either side of a two-sided marker catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarityStoryScore {
    pub score: f64,
    pub positive_stories: usize,
    pub negative_stories: usize,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversityScore {
    pub score: f64,
    pub unique_groups: usize,
    pub unique_frames: usize,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultureDimensions {
    pub experimentation: ExperimentationScore,
    pub failure_tolerance: FailureToleranceScore,
    pub agency: PolarityStoryScore,
    pub iteration_speed: PolarityStoryScore,
    pub diversity: DiversityScore,
}

impl CultureDimensions {
    /// `(name, score)` pairs in weighting order.
    pub fn scores(&self) -> [(&'static str, f64); 5] {
        [
            ("experimentation", self.experimentation.score),
            ("failure_tolerance", self.failure_tolerance.score),
            ("agency", self.agency.score),
            ("iteration_speed", self.iteration_speed.score),
            ("diversity", self.diversity.score),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeyEvidence {
    pub experimentation: Vec<String>,
    pub failure_tolerance: Vec<String>,
    pub agency: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultureReport {
    pub story_count: usize,
    pub overall_score: f64,
    pub dimension_scores: CultureDimensions,
    pub key_evidence: KeyEvidence,
    pub culture_type: CultureType,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskAversionSeverity {
    Critical,
    Significant,
    Moderate,
}

impl RiskAversionSeverity {
    pub fn score(&self) -> f64 {
        match self {
            RiskAversionSeverity::Critical => 0.9,
            RiskAversionSeverity::Significant => 0.6,
            RiskAversionSeverity::Moderate => 0.3,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskAversionSeverity::Critical => "CRITICAL - High risk aversion blocking adoption",
            RiskAversionSeverity::Significant => "SIGNIFICANT - Notable risk aversion present",
            RiskAversionSeverity::Moderate => "MODERATE - Some caution, manageable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CautionaryPatterns {
    pub frequency: usize,
    pub distribution: BTreeMap<String, usize>,
    pub themes: Vec<String>,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CautionaryBlocking {
    pub blocking_stories: usize,
    pub is_blocking: bool,
    pub severity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAversionReport {
    pub patterns: CautionaryPatterns,
    pub blocking_effect: CautionaryBlocking,
    pub severity: RiskAversionSeverity,
    pub severity_description: String,
}

/// Reads innovation-versus-caution signals out of the AI story population.
pub struct CulturalSignalDetector {
    repo: Arc<dyn StoryRepository>,
    settings: Arc<AnalysisSettings>,
}

impl CulturalSignalDetector {
    pub fn new(repo: Arc<dyn StoryRepository>, settings: Arc<AnalysisSettings>) -> Self {
        Self { repo, settings }
    }

    pub async fn assess_innovation_culture(&self) -> Result<CultureReport> {
        let filter = StoryFilter::ai().limit(self.settings.tuning.caps.culture_stories);
        let stories = self.repo.fetch_stories(&filter).await?;
        info!(stories = stories.len(), "assessing innovation culture");
        if stories.is_empty() {
            warn!("no AI stories found for culture assessment");
        }
        Ok(self.culture_report(&stories))
    }

    /// Pure scoring half of [`Self::assess_innovation_culture`].
    pub fn culture_report(&self, stories: &[Story]) -> CultureReport {
        let markers = &self.settings.markers;
        let dimension_scores = CultureDimensions {
            experimentation: score_experimentation(stories, markers),
            failure_tolerance: score_failure_framing(stories, markers),
            agency: score_employee_agency(stories, &markers.agency),
            iteration_speed: score_iteration_speed(stories, &markers.iteration_speed),
            diversity: score_narrative_diversity(stories),
        };
        let overall_score = self.aggregate(&dimension_scores);
        debug!(overall = overall_score, "culture dimensions scored");

        CultureReport {
            story_count: stories.len(),
            overall_score,
            key_evidence: key_evidence(stories, &dimension_scores, markers),
            culture_type: self.classify_culture(overall_score),
            recommendations: recommendations(&dimension_scores),
            dimension_scores,
        }
    }

    fn aggregate(&self, scores: &CultureDimensions) -> f64 {
        let w = &self.settings.tuning.culture_weights;
        let overall = scores.experimentation.score * w.experimentation
            + scores.failure_tolerance.score * w.failure_tolerance
            + scores.agency.score * w.agency
            + scores.iteration_speed.score * w.iteration_speed
            + scores.diversity.score * w.diversity;
        scoring::clamp_unit(overall)
    }

    pub fn classify_culture(&self, overall: f64) -> CultureType {
        scoring::classify(
            overall,
            &self.settings.tuning.culture_bands,
            &[
                CultureType::HighlyInnovative,
                CultureType::ModeratelyInnovative,
                CultureType::CautiouslyConservative,
                CultureType::RiskAverse,
            ],
            Boundary::Above,
        )
    }

    pub async fn detect_risk_aversion_patterns(&self) -> Result<RiskAversionReport> {
        let filter = StoryFilter::ai()
            .cautionary(true)
            .limit(self.settings.tuning.caps.cautionary_stories);
        let cautionary = self.repo.fetch_stories(&filter).await?;
        info!(cautionary = cautionary.len(), "detecting risk aversion patterns");
        Ok(self.risk_aversion_report(&cautionary))
    }

    pub fn risk_aversion_report(&self, cautionary: &[Story]) -> RiskAversionReport {
        let frequency = cautionary.len();
        let distribution = scoring::count_labels(cautionary.iter().map(|s| s.group_key()));
        let themes = scoring::ranked(&scoring::count_labels(
            cautionary.iter().flat_map(|s| s.primary_themes.iter().map(String::as_str)),
        ))
        .into_iter()
        .take(5)
        .map(|(theme, _)| theme)
        .collect();
        let impact = if frequency > 20 {
            "High - many cautionary tales circulating"
        } else if frequency > 10 {
            "Moderate - some caution in narratives"
        } else {
            "Low - few cautionary tales"
        };

        let blocking_stories = cautionary
            .iter()
            .filter(|s| signals::contains_any(&s.text(), &self.settings.markers.blocking))
            .count();
        let is_blocking =
            blocking_stories as f64 > frequency as f64 * self.settings.tuning.blocking_ratio;
        let blocking_effect = CautionaryBlocking {
            blocking_stories,
            is_blocking,
            severity: if blocking_stories > 5 {
                "High"
            } else if blocking_stories > 2 {
                "Moderate"
            } else {
                "Low"
            }
            .to_string(),
        };

        let severity = if frequency > 20 && is_blocking {
            RiskAversionSeverity::Critical
        } else if frequency > 10 || is_blocking {
            RiskAversionSeverity::Significant
        } else {
            RiskAversionSeverity::Moderate
        };
        debug!(frequency, blocking_stories, ?severity, "risk aversion assessed");

        RiskAversionReport {
            patterns: CautionaryPatterns {
                frequency,
                distribution,
                themes,
                impact: impact.to_string(),
            },
            blocking_effect,
            severity,
            severity_description: severity.description().to_string(),
        }
    }
}

pub fn score_experimentation(stories: &[Story], markers: &MarkerCatalogs) -> ExperimentationScore {
    if stories.is_empty() {
        return ExperimentationScore {
            score: NEUTRAL,
            patterns: ExperimentPatterns::default(),
            total_experiment_stories: 0,
            interpretation: "No stories available to assess experimentation".to_string(),
        };
    }
    let experiments: Vec<&Story> = stories
        .iter()
        .filter(|s| signals::is_experimentation_story(s, markers))
        .collect();

    let patterns = ExperimentPatterns {
        grassroots_experiments: experiments
            .iter()
            .filter(|s| s.source_in(&markers.grassroots_sources))
            .count(),
        executive_experiments: experiments
            .iter()
            .filter(|s| s.source_in(&markers.executive_sources))
            .count(),
        cross_functional: experiments.iter().filter(|s| s.primary_themes.len() > 2).count(),
        outcomes_shared: experiments
            .iter()
            .filter(|s| {
                markers
                    .outcome_sharing_reasons
                    .iter()
                    .any(|r| s.why_told_is(r))
            })
            .count(),
    };

    let mut score = (patterns.grassroots_experiments as f64 / 10.0).min(0.3)
        + (patterns.cross_functional as f64 / 5.0).min(0.2)
        + (patterns.outcomes_shared as f64 / 10.0).min(0.3);
    if patterns.grassroots_experiments > patterns.executive_experiments {
        score += 0.2;
    }
    let score = score.min(1.0);

    let interpretation = if score > 0.7 {
        "Strong experimentation culture - grassroots innovation with shared learnings"
    } else if score > 0.4 {
        "Moderate experimentation - some bottom-up activity"
    } else if patterns.executive_experiments > patterns.grassroots_experiments {
        "Top-down experimentation - limited grassroots innovation"
    } else {
        "Low experimentation - risk-averse culture"
    };

    ExperimentationScore {
        score,
        patterns,
        total_experiment_stories: experiments.len(),
        interpretation: interpretation.to_string(),
    }
}

/// Share of failure stories told as learning rather than as warnings.
pub fn score_failure_framing(stories: &[Story], markers: &MarkerCatalogs) -> FailureToleranceScore {
    let failures: Vec<&Story> = stories
        .iter()
        .filter(|s| signals::is_failure_story(s, markers))
        .collect();
    if failures.is_empty() {
        return FailureToleranceScore {
            score: NEUTRAL,
            total_failures: 0,
            learning_framed: 0,
            warning_framed: 0,
            interpretation: "No failure stories found - could indicate lack of experimentation or lack of psychological safety".to_string(),
        };
    }

    let learning_framed = failures
        .iter()
        .filter(|s| signals::frames_failure_as_learning(s, markers))
        .count();
    let warning_framed = failures
        .iter()
        .filter(|s| signals::frames_failure_as_warning(s, markers))
        .count();
    let total = failures.len();
    let ratio = learning_framed as f64 / total as f64;

    let interpretation = if ratio > 0.6 {
        format!("High innovation: {} failures discussed as learning opportunities", total)
    } else if ratio < 0.4 {
        format!("Risk averse: {} failures used as warnings", total)
    } else {
        format!("Mixed: {} failures with some learning, some caution", total)
    };

    FailureToleranceScore {
        score: ratio,
        total_failures: total,
        learning_framed,
        warning_framed,
        interpretation,
    }
}

fn count_polarity_stories(stories: &[Story], catalog: &PolarityCatalog) -> (usize, usize) {
    stories.iter().fold((0, 0), |(pos, neg), story| {
        let text = story.text();
        (
            pos + usize::from(signals::contains_any(&text, &catalog.positive)),
            neg + usize::from(signals::contains_any(&text, &catalog.negative)),
        )
    })
}

/// "We built" versus "we were told".
pub fn score_employee_agency(stories: &[Story], catalog: &PolarityCatalog) -> PolarityStoryScore {
    let (high, low) = count_polarity_stories(stories, catalog);
    let score = scoring::polarity_ratio(high, low);
    let interpretation = if score > 0.6 {
        "High employee agency - innovation indicator"
    } else if score < 0.4 {
        "Low employee agency - top-down culture"
    } else {
        "Mixed agency signals"
    };
    PolarityStoryScore {
        score,
        positive_stories: high,
        negative_stories: low,
        interpretation: interpretation.to_string(),
    }
}

pub fn score_iteration_speed(stories: &[Story], catalog: &PolarityCatalog) -> PolarityStoryScore {
    let (rapid, slow) = count_polarity_stories(stories, catalog);
    let score = scoring::polarity_ratio(rapid, slow);
    let interpretation = if score > 0.6 {
        "Fast iteration culture"
    } else if score < 0.4 {
        "Slow iteration culture"
    } else {
        "Moderate iteration speed"
    };
    PolarityStoryScore {
        score,
        positive_stories: rapid,
        negative_stories: slow,
        interpretation: interpretation.to_string(),
    }
}

/// Breadth of groups and narrative functions, normalized to 8 groups and 4 functions.
pub fn score_narrative_diversity(stories: &[Story]) -> DiversityScore {
    if stories.is_empty() {
        return DiversityScore {
            score: NEUTRAL,
            unique_groups: 0,
            unique_frames: 0,
            interpretation: "No stories available to assess narrative diversity".to_string(),
        };
    }
    let groups: BTreeSet<&str> = stories
        .iter()
        .map(Story::group_key)
        .filter(|g| *g != "unknown")
        .collect();
    let frames: BTreeSet<String> = stories
        .iter()
        .filter_map(|s| s.narrative_function.as_deref())
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect();

    let score = ((groups.len() as f64 / 8.0).min(1.0) + (frames.len() as f64 / 4.0).min(1.0)) / 2.0;
    let interpretation = if score > 0.6 {
        "High narrative diversity - multiple perspectives"
    } else {
        "Low diversity - limited perspectives"
    };
    DiversityScore {
        score,
        unique_groups: groups.len(),
        unique_frames: frames.len(),
        interpretation: interpretation.to_string(),
    }
}

fn key_evidence(stories: &[Story], scores: &CultureDimensions, markers: &MarkerCatalogs) -> KeyEvidence {
    let first_three = |pred: &dyn Fn(&Story) -> bool| -> Vec<String> {
        stories.iter().filter(|&s| pred(s)).take(3).map(|s| s.id.clone()).collect()
    };
    KeyEvidence {
        experimentation: first_three(&|s| signals::is_experimentation_story(s, markers)),
        failure_tolerance: first_three(&|s| s.story_type == StoryType::Failure),
        agency: if scores.agency.score > 0.6 {
            first_three(&|s| signals::contains_any(&s.text(), &markers.agency.positive))
        } else {
            Vec::new()
        },
    }
}

fn recommendations(scores: &CultureDimensions) -> Vec<String> {
    let mut recs: Vec<String> = scores
        .scores()
        .into_iter()
        .filter(|(_, score)| *score < 0.5)
        .map(|(dimension, _)| {
            match dimension {
                "experimentation" => {
                    "Encourage bottom-up experimentation with AI - create safe spaces for trials"
                }
                "failure_tolerance" => {
                    "Reframe failures as learning opportunities - celebrate productive failures"
                }
                "agency" => {
                    "Empower employees with more agency in AI adoption - reduce top-down mandates"
                }
                "iteration_speed" => "Streamline approval processes to enable faster iteration",
                _ => "Encourage diverse perspectives - ensure all groups have voice in AI discussions",
            }
            .to_string()
        })
        .collect();
    if recs.is_empty() {
        recs.push("Culture shows good innovation indicators - maintain momentum".to_string());
    }
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{repo, settings, story};

    fn detector(stories: Vec<Story>) -> CulturalSignalDetector {
        CulturalSignalDetector::new(repo(stories), settings())
    }

    #[tokio::test]
    async fn empty_corpus_scores_neutral_everywhere() {
        let report = detector(vec![]).assess_innovation_culture().await.unwrap();
        assert_eq!(report.story_count, 0);
        for (_, score) in report.dimension_scores.scores() {
            assert_eq!(score, 0.5);
        }
        assert!((report.overall_score - 0.5).abs() < 1e-9);
        assert_eq!(report.culture_type, CultureType::CautiouslyConservative);
    }

    #[test]
    fn experimentation_rewards_grassroots_over_executive() {
        let markers = MarkerCatalogs::default();
        let mut stories = Vec::new();
        for i in 0..3 {
            let mut s = story(&format!("g{i}"), "eng", "we tried a pilot", Some(0.4));
            s.source = Some("team".into());
            s.why_told = Some("teaching".into());
            stories.push(s);
        }
        let score = score_experimentation(&stories, &markers);
        assert_eq!(score.patterns.grassroots_experiments, 3);
        assert_eq!(score.patterns.outcomes_shared, 3);
        // 0.3 grassroots cap, 0.3 outcomes, 0.2 bonus
        assert!((score.score - 0.8).abs() < 1e-9);
        assert!(score.interpretation.starts_with("Strong"));
    }

    #[test]
    fn failures_told_as_lessons_raise_tolerance() {
        let markers = MarkerCatalogs::default();
        let mut a = story("a", "ops", "the rollout failed but we learned a lot", Some(-0.5));
        a.story_type = StoryType::Failure;
        let mut b = story("b", "ops", "the bot broke, avoid it", Some(-0.6));
        b.story_type = StoryType::Failure;
        let score = score_failure_framing(&[a, b], &markers);
        assert_eq!(score.total_failures, 2);
        assert_eq!(score.learning_framed, 1);
        assert_eq!(score.warning_framed, 1);
        assert!((score.score - 0.5).abs() < 1e-9);
        assert!(score.interpretation.starts_with("Mixed: 2"));
    }

    #[test]
    fn diversity_ignores_unknown_group() {
        let mut a = Story::new("a", "x");
        a.narrative_function = Some("warning".into());
        let mut b = story("b", "sales", "y", None);
        b.narrative_function = Some("celebration".into());
        let score = score_narrative_diversity(&[a, b]);
        assert_eq!(score.unique_groups, 1);
        assert_eq!(score.unique_frames, 2);
        assert!((score.score - (1.0 / 8.0 + 0.5) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn culture_bands_are_exclusive() {
        let d = detector(vec![]);
        assert_eq!(d.classify_culture(0.71), CultureType::HighlyInnovative);
        assert_eq!(d.classify_culture(0.7), CultureType::ModeratelyInnovative);
        assert_eq!(d.classify_culture(0.3), CultureType::RiskAverse);
    }

    #[test]
    fn recommendations_fall_back_to_momentum() {
        let d = detector(vec![]);
        let report = d.culture_report(&[]);
        assert_eq!(
            report.recommendations,
            vec!["Culture shows good innovation indicators - maintain momentum"]
        );
    }

    #[test]
    fn blocking_cautionary_tales_are_significant() {
        let d = detector(vec![]);
        let mut tales = Vec::new();
        for i in 0..4 {
            let mut s = story(&format!("c{i}"), "finance", "project was cancelled", Some(-0.7));
            s.story_type = StoryType::Failure;
            s.primary_themes = vec!["compliance".into()];
            tales.push(s);
        }
        let report = d.risk_aversion_report(&tales);
        assert_eq!(report.patterns.frequency, 4);
        assert_eq!(report.patterns.distribution.get("finance"), Some(&4));
        assert_eq!(report.patterns.themes, vec!["compliance"]);
        assert!(report.blocking_effect.is_blocking);
        assert_eq!(report.severity, RiskAversionSeverity::Significant);
        assert_eq!(report.severity.score(), 0.6);
    }

    #[tokio::test]
    async fn risk_aversion_fetches_only_cautionary_stories() {
        let mut warning = story("w", "ops", "never again", Some(-0.2));
        warning.why_told = Some("warning".into());
        let happy = story("h", "ops", "great results", Some(0.9));
        let report = detector(vec![warning, happy])
            .detect_risk_aversion_patterns()
            .await
            .unwrap();
        assert_eq!(report.patterns.frequency, 1);
        assert_eq!(report.severity, RiskAversionSeverity::Moderate);
    }
}
