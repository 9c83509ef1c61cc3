use serde::{Deserialize, Serialize};

/// Main configuration structure loaded from narrative_intel.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub system: SystemConfig,
    pub http: HttpConfig,
    pub analysis: AnalysisSettings,
}

/// System-level configuration for the corpus and logging
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub corpus_path: String,
    pub log_filter: String,
    /// Hard ceiling applied to any repository query without an explicit limit
    pub story_limit: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            corpus_path: "corpus.json".to_string(),
            log_filter: "narrative_intel=info".to_string(),
            story_limit: 1000,
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

/// Everything the analyzers read: keyword catalogs plus numeric tuning.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub markers: MarkerCatalogs,
    pub tuning: Tuning,
}

/// Ordered list of marker phrases under one label.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KeywordGroup {
    pub label: String,
    pub keywords: Vec<String>,
}

/// Two opposing marker sets scored as positive / (positive + negative).
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PolarityCatalog {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResistanceMarkers {
    pub passive: Vec<String>,
    pub skeptical: Vec<String>,
    pub active: Vec<String>,
    pub fearful: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RootCauseMarkers {
    pub past_failures: Vec<String>,
    pub threat_perception: Vec<String>,
    pub resource_issues: Vec<String>,
    pub value_misalignment: Vec<String>,
    pub knowledge_gap: Vec<String>,
}

/// Keyword catalogs. Pure data: extend these without touching scoring code.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MarkerCatalogs {
    pub official_sources: Vec<String>,
    pub leadership_groups: Vec<String>,
    pub ai_terms: Vec<String>,
    pub technical_terms: Vec<String>,
    /// Summary keywords used to infer a frame on the gap side, in priority order
    pub gap_frame_keywords: Vec<KeywordGroup>,
    /// Text keywords used by frame competition, in priority order
    pub competition_frame_keywords: Vec<KeywordGroup>,
    pub emphasis_buckets: Vec<KeywordGroup>,
    pub experimentation: Vec<String>,
    pub grassroots_sources: Vec<String>,
    pub executive_sources: Vec<String>,
    pub outcome_sharing_reasons: Vec<String>,
    pub failure_outcomes: Vec<String>,
    pub learning_language: Vec<String>,
    pub warning_language: Vec<String>,
    pub agency: PolarityCatalog,
    pub iteration_speed: PolarityCatalog,
    pub blocking: Vec<String>,
    pub trust: PolarityCatalog,
    pub learning: PolarityCatalog,
    pub coordination: PolarityCatalog,
    /// Innovation markers (positive) vs risk-aversion markers (negative)
    pub receptivity: PolarityCatalog,
    pub resistance: ResistanceMarkers,
    pub root_causes: RootCauseMarkers,
    pub causal_connectors: Vec<String>,
    pub concerns: Vec<String>,
    pub bridging_themes: Vec<String>,
}

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn group(label: &str, keywords: &[&str]) -> KeywordGroup {
    KeywordGroup {
        label: label.to_string(),
        keywords: list(keywords),
    }
}

impl Default for ResistanceMarkers {
    fn default() -> Self {
        Self {
            passive: list(&[
                "waiting to see",
                "not prioritized",
                "when we have time",
                "eventually",
                "someday",
            ]),
            skeptical: list(&[
                "not convinced",
                "needs proof",
                "where's the evidence",
                "show me",
                "prove it",
            ]),
            active: list(&[
                "won't work here",
                "tried before",
                "fundamentally flawed",
                "waste of time",
                "wrong approach",
            ]),
            fearful: list(&[
                "worried about",
                "concerned that",
                "might lose",
                "afraid",
                "anxious",
                "threatened",
            ]),
        }
    }
}

impl Default for RootCauseMarkers {
    fn default() -> Self {
        Self {
            past_failures: list(&[
                "last time",
                "before",
                "tried that",
                "failed",
                "didn't work",
                "previous",
            ]),
            threat_perception: list(&[
                "job",
                "role",
                "replace",
                "eliminate",
                "redundant",
                "obsolete",
                "threatened",
            ]),
            resource_issues: list(&[
                "time",
                "budget",
                "resources",
                "capacity",
                "bandwidth",
                "overloaded",
            ]),
            value_misalignment: list(&[
                "values",
                "culture",
                "not us",
                "doesn't fit",
                "wrong for",
                "against",
            ]),
            knowledge_gap: list(&[
                "don't understand",
                "unclear",
                "confusing",
                "no idea",
                "what is",
            ]),
        }
    }
}

impl Default for MarkerCatalogs {
    fn default() -> Self {
        Self {
            official_sources: list(&["official", "leadership", "announcement"]),
            leadership_groups: list(&["leadership", "executive", "senior_management", "c_suite"]),
            ai_terms: list(&[
                "ai",
                "artificial intelligence",
                "machine learning",
                "ml",
                "automation",
                "bot",
                "copilot",
                "assistant",
                "algorithm",
                "neural network",
                "deep learning",
                "llm",
                "gpt",
                "automated",
                "intelligent",
                "smart",
                "cognitive",
            ]),
            technical_terms: list(&[
                "machine learning",
                "neural network",
                "deep learning",
                "algorithm",
                "model",
                "training",
                "inference",
                "natural language processing",
                "computer vision",
            ]),
            gap_frame_keywords: vec![
                group("opportunity", &["opportunity", "advantage", "growth", "innovation"]),
                group("threat", &["threat", "risk", "replace", "worried", "concerned"]),
                group("tool", &["tool", "assistant", "copilot", "help"]),
            ],
            competition_frame_keywords: vec![
                group("experiment", &["experiment", "trial", "pilot", "test"]),
                group("mandate", &["must", "mandate", "requirement", "required"]),
                group("replacement", &["replace", "eliminate", "instead of"]),
                group("partnership", &["partner", "collaboration", "together"]),
                group("tool", &["tool", "assistant", "help", "support"]),
                group("threat", &["threat", "risk", "danger", "worried"]),
                group("opportunity", &["opportunity", "advantage", "benefit", "potential"]),
            ],
            emphasis_buckets: vec![
                group("efficiency", &["efficiency", "productivity", "faster"]),
                group("quality", &["quality", "better", "improved"]),
                group("cost savings", &["cost", "saving", "budget"]),
                group("workload impact", &["workload", "burden", "more work"]),
                group("job impact", &["job", "role", "position"]),
            ],
            experimentation: list(&[
                "tried",
                "experiment",
                "test",
                "pilot",
                "prototype",
                "explore",
                "trial",
                "attempt",
            ]),
            grassroots_sources: list(&["individual", "team", "slack", "interview"]),
            executive_sources: list(&["executive", "leadership", "official"]),
            outcome_sharing_reasons: list(&["teaching", "celebrating", "explaining"]),
            failure_outcomes: list(&["failure", "negative", "disappointing"]),
            learning_language: list(&[
                "learn",
                "lesson",
                "insight",
                "next time",
                "improve",
                "adjust",
            ]),
            warning_language: list(&["avoid", "never", "don't", "mistake", "careful", "danger"]),
            agency: PolarityCatalog {
                positive: list(&[
                    "we built",
                    "we created",
                    "we experimented",
                    "we tried",
                    "we implemented",
                    "we decided",
                ]),
                negative: list(&[
                    "was introduced",
                    "were told",
                    "management decided",
                    "given to us",
                    "deployed on us",
                    "had to",
                ]),
            },
            iteration_speed: PolarityCatalog {
                positive: list(&["quick", "rapid", "fast", "immediate", "sprint"]),
                negative: list(&["slow", "delayed", "waiting", "approval", "process"]),
            },
            blocking: list(&[
                "cancelled",
                "blocked",
                "stopped",
                "prevented",
                "abandoned",
                "shelved",
            ]),
            trust: PolarityCatalog {
                positive: list(&[
                    "leadership understands",
                    "clear direction",
                    "transparent about",
                    "listening to us",
                    "following through",
                    "trust the process",
                    "confidence in leadership",
                ]),
                negative: list(&[
                    "not sure why",
                    "no clear plan",
                    "not hearing us",
                    "another initiative",
                    "flavor of the month",
                    "hiding information",
                    "don't trust",
                ]),
            },
            learning: PolarityCatalog {
                positive: list(&[
                    "learning as we go",
                    "experimenting with",
                    "trying different approaches",
                    "feedback welcome",
                    "getting better at",
                    "still figuring out",
                    "improving over time",
                ]),
                negative: list(&[
                    "not my area",
                    "not trained for this",
                    "beyond my expertise",
                    "someone else should",
                    "can't learn",
                    "too old for this",
                    "not capable",
                ]),
            },
            coordination: PolarityCatalog {
                positive: list(&[
                    "working together",
                    "aligned with",
                    "coordinating across",
                    "shared understanding",
                    "consistent approach",
                    "integrated effort",
                    "cross-team collaboration",
                ]),
                negative: list(&[
                    "working in silos",
                    "conflicting approaches",
                    "different directions",
                    "not coordinated",
                    "fragmented effort",
                    "lack of alignment",
                    "isolated teams",
                ]),
            },
            receptivity: PolarityCatalog {
                positive: list(&[
                    "experiment",
                    "try new",
                    "innovative",
                    "creative",
                    "learning",
                    "iterate",
                    "improve",
                    "opportunity",
                ]),
                negative: list(&[
                    "risky",
                    "dangerous",
                    "careful",
                    "cautious",
                    "proven",
                    "traditional",
                    "safe",
                    "avoid",
                ]),
            },
            resistance: ResistanceMarkers::default(),
            root_causes: RootCauseMarkers::default(),
            causal_connectors: list(&["because", "so", "therefore", "led to", "caused"]),
            concerns: list(&[
                "job security",
                "training needs",
                "ethical implications",
                "data privacy",
                "reliability",
                "transparency",
            ]),
            bridging_themes: list(&["innovation", "quality", "efficiency", "collaboration"]),
        }
    }
}

/// Weights of the five culture dimensions
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CultureWeights {
    pub experimentation: f64,
    pub failure_tolerance: f64,
    pub agency: f64,
    pub iteration_speed: f64,
    pub diversity: f64,
}

impl Default for CultureWeights {
    fn default() -> Self {
        Self {
            experimentation: 0.30,
            failure_tolerance: 0.25,
            agency: 0.20,
            iteration_speed: 0.15,
            diversity: 0.10,
        }
    }
}

impl CultureWeights {
    pub fn sum(&self) -> f64 {
        self.experimentation
            + self.failure_tolerance
            + self.agency
            + self.iteration_speed
            + self.diversity
    }
}

/// Weights of the six readiness dimensions
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessWeights {
    pub narrative_alignment: f64,
    pub cultural_receptivity: f64,
    pub trust_levels: f64,
    pub learning_orientation: f64,
    pub leadership_coherence: f64,
    pub coordination_narrative: f64,
}

impl Default for ReadinessWeights {
    fn default() -> Self {
        Self {
            narrative_alignment: 0.20,
            cultural_receptivity: 0.20,
            trust_levels: 0.20,
            learning_orientation: 0.15,
            leadership_coherence: 0.15,
            coordination_narrative: 0.10,
        }
    }
}

impl ReadinessWeights {
    pub fn sum(&self) -> f64 {
        self.narrative_alignment
            + self.cultural_receptivity
            + self.trust_levels
            + self.learning_orientation
            + self.leadership_coherence
            + self.coordination_narrative
    }
}

/// Story caps applied per repository query
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoryCaps {
    pub employee_stories: usize,
    pub frame_stories: usize,
    pub culture_stories: usize,
    pub cautionary_stories: usize,
    pub group_stories: usize,
    pub readiness_stories: usize,
    pub initiative_stories: usize,
}

impl Default for StoryCaps {
    fn default() -> Self {
        Self {
            employee_stories: 50,
            frame_stories: 100,
            culture_stories: 100,
            cautionary_stories: 50,
            group_stories: 50,
            readiness_stories: 1000,
            initiative_stories: 500,
        }
    }
}

impl StoryCaps {
    fn all(&self) -> [(&'static str, usize); 7] {
        [
            ("employee_stories", self.employee_stories),
            ("frame_stories", self.frame_stories),
            ("culture_stories", self.culture_stories),
            ("cautionary_stories", self.cautionary_stories),
            ("group_stories", self.group_stories),
            ("readiness_stories", self.readiness_stories),
            ("initiative_stories", self.initiative_stories),
        ]
    }
}

/// Momentum adjustments used by the adoption forecast
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForecastTuning {
    pub min_sentiment_stories: usize,
    pub trend_delta: f64,
    pub volume_adjustment: f64,
    pub sentiment_adjustment: f64,
    pub dimension_adjustment: f64,
}

impl Default for ForecastTuning {
    fn default() -> Self {
        Self {
            min_sentiment_stories: 4,
            trend_delta: 0.1,
            volume_adjustment: 0.15,
            sentiment_adjustment: 0.20,
            dimension_adjustment: 0.3,
        }
    }
}

/// Calibration constants. Tunable heuristics, not validated statistics.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Tuning {
    pub culture_weights: CultureWeights,
    pub readiness_weights: ReadinessWeights,
    /// Descending lower bounds for highly_ready / ready / moderately_ready / limited_readiness
    pub readiness_bands: Vec<f64>,
    /// Descending lower bounds for Highly Innovative / Moderately Innovative / Cautiously Conservative
    pub culture_bands: Vec<f64>,
    pub hotspot_threshold: f64,
    pub blocking_ratio: f64,
    pub evidence_limit: usize,
    pub caps: StoryCaps,
    pub forecast: ForecastTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            culture_weights: CultureWeights::default(),
            readiness_weights: ReadinessWeights::default(),
            readiness_bands: vec![0.75, 0.60, 0.45, 0.30],
            culture_bands: vec![0.7, 0.5, 0.3],
            hotspot_threshold: 0.6,
            blocking_ratio: 0.3,
            evidence_limit: 10,
            caps: StoryCaps::default(),
            forecast: ForecastTuning::default(),
        }
    }
}

fn lowercase_all(markers: &mut [String]) {
    for marker in markers {
        *marker = marker.trim().to_lowercase();
    }
}

impl PolarityCatalog {
    fn normalize(&mut self) {
        lowercase_all(&mut self.positive);
        lowercase_all(&mut self.negative);
    }
}

impl MarkerCatalogs {
    /// Trim and lowercase every marker phrase so matching can compare
    /// against lowercased story text directly.
    pub fn normalize(&mut self) {
        for markers in [
            &mut self.official_sources,
            &mut self.leadership_groups,
            &mut self.ai_terms,
            &mut self.technical_terms,
            &mut self.experimentation,
            &mut self.grassroots_sources,
            &mut self.executive_sources,
            &mut self.outcome_sharing_reasons,
            &mut self.failure_outcomes,
            &mut self.learning_language,
            &mut self.warning_language,
            &mut self.blocking,
            &mut self.causal_connectors,
            &mut self.concerns,
            &mut self.bridging_themes,
            &mut self.resistance.passive,
            &mut self.resistance.skeptical,
            &mut self.resistance.active,
            &mut self.resistance.fearful,
            &mut self.root_causes.past_failures,
            &mut self.root_causes.threat_perception,
            &mut self.root_causes.resource_issues,
            &mut self.root_causes.value_misalignment,
            &mut self.root_causes.knowledge_gap,
        ] {
            lowercase_all(markers);
        }
        for group in self
            .gap_frame_keywords
            .iter_mut()
            .chain(self.competition_frame_keywords.iter_mut())
            .chain(self.emphasis_buckets.iter_mut())
        {
            lowercase_all(&mut group.keywords);
        }
        for catalog in [
            &mut self.agency,
            &mut self.iteration_speed,
            &mut self.trust,
            &mut self.learning,
            &mut self.coordination,
            &mut self.receptivity,
        ] {
            catalog.normalize();
        }
    }
}

const WEIGHT_TOLERANCE: f64 = 1e-6;

impl AnalysisSettings {
    /// Validate weights, thresholds, caps and polarity catalogs
    pub fn validate(&self) -> anyhow::Result<()> {
        let tuning = &self.tuning;
        let culture_sum = tuning.culture_weights.sum();
        if (culture_sum - 1.0).abs() > WEIGHT_TOLERANCE {
            anyhow::bail!("culture weights must sum to 1.0, got {culture_sum}");
        }
        let readiness_sum = tuning.readiness_weights.sum();
        if (readiness_sum - 1.0).abs() > WEIGHT_TOLERANCE {
            anyhow::bail!("readiness weights must sum to 1.0, got {readiness_sum}");
        }

        if tuning.readiness_bands.len() != 4 {
            anyhow::bail!("readiness_bands needs exactly 4 thresholds");
        }
        if tuning.culture_bands.len() != 3 {
            anyhow::bail!("culture_bands needs exactly 3 thresholds");
        }
        let mut thresholds: Vec<f64> = tuning.readiness_bands.clone();
        thresholds.extend(tuning.culture_bands.iter().copied());
        thresholds.extend([tuning.hotspot_threshold, tuning.blocking_ratio]);
        for t in &thresholds {
            if !(0.0..=1.0).contains(t) {
                anyhow::bail!("threshold {t} must be between 0.0 and 1.0");
            }
        }
        for bands in [&tuning.readiness_bands, &tuning.culture_bands] {
            if bands.windows(2).any(|w| w[0] < w[1]) {
                anyhow::bail!("band thresholds must be listed in descending order");
            }
        }

        for (name, cap) in tuning.caps.all() {
            if cap == 0 {
                anyhow::bail!("story cap {name} must be > 0");
            }
        }
        if tuning.evidence_limit == 0 {
            anyhow::bail!("evidence_limit must be > 0");
        }
        if tuning.forecast.min_sentiment_stories < 2 {
            anyhow::bail!("forecast.min_sentiment_stories must be at least 2");
        }

        let m = &self.markers;
        for (name, catalog) in [
            ("trust", &m.trust),
            ("learning", &m.learning),
            ("coordination", &m.coordination),
            ("receptivity", &m.receptivity),
            ("agency", &m.agency),
            ("iteration_speed", &m.iteration_speed),
        ] {
            if catalog.positive.is_empty() || catalog.negative.is_empty() {
                anyhow::bail!("marker catalog {name} needs both positive and negative markers");
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses NARRATIVE_INTEL_CONFIG environment variable or defaults to "narrative_intel.toml"
    pub fn load() -> anyhow::Result<Self> {
        // Load environment variables with fallbacks:
        // 1) NARRATIVE_ENV_FILE if set
        // 2) ./.env
        // 3) ../.env (repo root when running from crate dir)
        if let Ok(env_path) = std::env::var("NARRATIVE_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else if dotenvy::from_path(".env").is_err() {
            let _ = dotenvy::from_path("../.env");
        }

        let config_path = std::env::var("NARRATIVE_INTEL_CONFIG")
            .unwrap_or_else(|_| "narrative_intel.toml".to_string());

        let mut config = Self::from_path(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file, falling back to defaults when it does not exist
    pub fn from_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let mut config: Self = toml::from_str(&content)?;
                config.analysis.markers.normalize();
                Ok(config)
            }
            Err(_) => {
                tracing::warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
        }
    }

    /// Apply env overrides (env-first)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("NI_CORPUS_PATH") {
            tracing::debug!("NI_CORPUS_PATH env override applied");
            self.system.corpus_path = path;
        }
        if let Ok(bind) = std::env::var("NI_HTTP_BIND") {
            tracing::debug!("NI_HTTP_BIND env override applied");
            self.http.bind = bind;
        }
        if let Ok(origins) = std::env::var("NI_CORS_ORIGINS") {
            self.http.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(filter) = std::env::var("NI_LOG_FILTER") {
            self.system.log_filter = filter;
        }
        if let Some(limit) = std::env::var("NI_STORY_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            self.system.story_limit = limit;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.system.story_limit == 0 {
            anyhow::bail!("system.story_limit must be > 0");
        }
        if self.http.bind.parse::<std::net::SocketAddr>().is_err() {
            anyhow::bail!("http.bind '{}' is not a valid socket address", self.http.bind);
        }
        self.analysis.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [system]
            corpus_path = "stories.json"

            [analysis.tuning]
            hotspot_threshold = 0.65
            "#,
        )
        .unwrap();
        assert_eq!(config.system.corpus_path, "stories.json");
        assert_eq!(config.system.log_filter, "narrative_intel=info");
        assert_eq!(config.analysis.tuning.hotspot_threshold, 0.65);
        assert_eq!(config.analysis.tuning.culture_weights.experimentation, 0.30);
        assert_eq!(config.analysis.markers.official_sources.len(), 3);
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let mut settings = AnalysisSettings::default();
        settings.tuning.readiness_weights.trust_levels = 0.5;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("readiness weights"));
    }

    #[test]
    fn rejects_empty_polarity_catalog() {
        let mut settings = AnalysisSettings::default();
        settings.markers.trust.negative.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_zero_cap_and_bad_threshold() {
        let mut settings = AnalysisSettings::default();
        settings.tuning.caps.group_stories = 0;
        assert!(settings.validate().is_err());

        let mut settings = AnalysisSettings::default();
        settings.tuning.hotspot_threshold = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn marker_catalog_can_be_extended_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [analysis.markers.trust]
            positive = ["we believe in this"]
            negative = ["smoke and mirrors"]
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.markers.trust.positive, vec!["we believe in this"]);
        assert!(!config.analysis.markers.learning.positive.is_empty());
    }
}
