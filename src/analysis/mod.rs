//! The five sub-analyzers. Each owns a repository handle and the shared
//! settings, fetches a fresh snapshot per call and scores it synchronously.

pub mod culture;
pub mod frames;
pub mod gap;
pub mod readiness;
pub mod resistance;

pub use culture::CulturalSignalDetector;
pub use frames::FrameCompetitionAnalyzer;
pub use gap::NarrativeGapAnalyzer;
pub use readiness::AdoptionReadinessScorer;
pub use resistance::ResistanceMapper;

use crate::models::Story;

/// Sentiment values of the stories that carry one.
pub(crate) fn sentiments(stories: &[Story]) -> Vec<f64> {
    stories.iter().filter_map(|s| s.ai_sentiment).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use crate::config::AnalysisSettings;
    use crate::models::Story;
    use crate::repository::{Corpus, InMemoryRepository, StoryRepository};

    pub fn settings() -> Arc<AnalysisSettings> {
        Arc::new(AnalysisSettings::default())
    }

    pub fn repo(stories: Vec<Story>) -> Arc<dyn StoryRepository> {
        Arc::new(InMemoryRepository::new(
            Corpus {
                stories,
                ..Default::default()
            },
            AnalysisSettings::default().markers.official_sources,
            1000,
        ))
    }

    pub fn story(id: &str, group: &str, text: &str, sentiment: Option<f64>) -> Story {
        let mut s = Story::new(id, text);
        s.teller_group = Some(group.to_string());
        s.ai_sentiment = sentiment;
        s
    }
}
