//! Narrative intelligence for AI adoption.
//!
//! Reads attributed organizational stories and scores how ready a
//! population is to adopt AI: narrative gaps, competing frames, cultural
//! signals, resistance and readiness, composed into five strategic
//! questions and an executive dashboard.

pub mod analysis;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod orchestrator;
pub mod reporting;
pub mod repository;
pub mod scoring;
pub mod signals;

use std::sync::Arc;

pub use error::{NarrativeError, Result};
pub use orchestrator::NarrativeIntelligence;
pub use repository::{InMemoryRepository, StoryRepository};

/// Load the configured corpus and wire up the analysis engine.
pub async fn build_engine(config: &config::Config) -> Result<Arc<NarrativeIntelligence>> {
    let repo = InMemoryRepository::from_path(
        &config.system.corpus_path,
        config.analysis.markers.official_sources.clone(),
        config.system.story_limit,
    )
    .await?;
    let engine = NarrativeIntelligence::new(Arc::new(repo), Arc::new(config.analysis.clone()))?;
    Ok(Arc::new(engine))
}
