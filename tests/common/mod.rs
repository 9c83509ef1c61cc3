//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use narrative_intel::config::AnalysisSettings;
use narrative_intel::models::{Initiative, Story};
use narrative_intel::repository::{Corpus, InMemoryRepository, ReferenceEdge, StoryFilter};
use narrative_intel::{NarrativeError, NarrativeIntelligence, Result, StoryRepository};

pub const DEMO_CORPUS: &str = include_str!("../../demos/corpus.json");

pub fn settings() -> Arc<AnalysisSettings> {
    Arc::new(AnalysisSettings::default())
}

pub fn story(id: &str, group: &str, text: &str, sentiment: Option<f64>) -> Story {
    let mut s = Story::new(id, text);
    s.teller_group = Some(group.to_string());
    s.ai_sentiment = sentiment;
    s
}

pub fn repo(corpus: Corpus) -> Arc<dyn StoryRepository> {
    Arc::new(InMemoryRepository::new(
        corpus,
        AnalysisSettings::default().markers.official_sources,
        1000,
    ))
}

pub fn engine_with(corpus: Corpus) -> anyhow::Result<Arc<NarrativeIntelligence>> {
    Ok(Arc::new(NarrativeIntelligence::new(repo(corpus), settings())?))
}

pub fn engine(stories: Vec<Story>) -> anyhow::Result<Arc<NarrativeIntelligence>> {
    engine_with(Corpus {
        stories,
        ..Default::default()
    })
}

pub fn demo_corpus() -> anyhow::Result<Corpus> {
    Ok(serde_json::from_str(DEMO_CORPUS)?)
}

pub fn demo_engine() -> anyhow::Result<Arc<NarrativeIntelligence>> {
    engine_with(demo_corpus()?)
}

/// Repository whose every query fails, for error propagation checks.
pub struct UnavailableRepository;

#[async_trait]
impl StoryRepository for UnavailableRepository {
    async fn fetch_stories(&self, _filter: &StoryFilter) -> Result<Vec<Story>> {
        Err(NarrativeError::repository("story store unavailable"))
    }

    async fn fetch_groups(&self) -> Result<Vec<String>> {
        Err(NarrativeError::repository("story store unavailable"))
    }

    async fn fetch_initiative(&self, _id: &str) -> Result<Option<Initiative>> {
        Err(NarrativeError::repository("story store unavailable"))
    }

    async fn fetch_story_reference_edges(&self) -> Result<Vec<ReferenceEdge>> {
        Err(NarrativeError::repository("story store unavailable"))
    }
}

/// Drop every `analyzed_at` / `generated_at` key so two runs can be compared.
pub fn strip_timestamps(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.remove("analyzed_at");
            map.remove("generated_at");
            map.values_mut().for_each(strip_timestamps);
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(strip_timestamps),
        _ => {}
    }
}
