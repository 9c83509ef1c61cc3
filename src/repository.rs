//! Read-only story query contract and the in-memory corpus backing it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{NarrativeError, Result};
use crate::models::{AgencyFrame, Initiative, Sophistication, Story, StoryType};

/// Which side of an initiative a story query targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitiativeScope {
    Official(String),
    Actual(String),
    Any(String),
}

/// Story query. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct StoryFilter {
    pub ai_related: Option<bool>,
    pub initiative: Option<InitiativeScope>,
    /// Matches `teller_group`, else `department`
    pub group: Option<String>,
    pub official: Option<bool>,
    pub min_sentiment: Option<f64>,
    pub agency_frame: Option<AgencyFrame>,
    pub sophistication: Option<Sophistication>,
    /// Warning-framed or failure-typed stories
    pub cautionary: Option<bool>,
    pub limit: Option<usize>,
}

impl StoryFilter {
    /// AI-related stories, the starting point of nearly every analyzer query.
    pub fn ai() -> Self {
        Self {
            ai_related: Some(true),
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn official(mut self, official: bool) -> Self {
        self.official = Some(official);
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn initiative(mut self, scope: InitiativeScope) -> Self {
        self.initiative = Some(scope);
        self
    }

    pub fn cautionary(mut self, cautionary: bool) -> Self {
        self.cautionary = Some(cautionary);
        self
    }
}

/// Aggregated citation between two cautionary stories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub citing_group: String,
    pub citing_story: String,
    pub source_group: String,
    pub source_story: String,
    pub count: usize,
}

#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Stories matching `filter`, newest first. Empty when nothing matches.
    async fn fetch_stories(&self, filter: &StoryFilter) -> Result<Vec<Story>>;

    async fn fetch_groups(&self) -> Result<Vec<String>>;

    async fn fetch_initiative(&self, id: &str) -> Result<Option<Initiative>>;

    /// Cautionary citation edges, highest count first.
    async fn fetch_story_reference_edges(&self) -> Result<Vec<ReferenceEdge>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryReference {
    pub from: String,
    pub to: String,
}

/// On-disk corpus layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Corpus {
    pub stories: Vec<Story>,
    pub initiatives: Vec<Initiative>,
    pub groups: Vec<String>,
    pub references: Vec<StoryReference>,
}

pub fn is_cautionary(story: &Story) -> bool {
    story.why_told_is("warning")
        || story.narrative_function_is("warning")
        || story.story_type == StoryType::Failure
}

/// Serves the whole query contract from a corpus held in memory.
pub struct InMemoryRepository {
    stories: Vec<Story>,
    index: HashMap<String, usize>,
    initiatives: Vec<Initiative>,
    groups: Vec<String>,
    references: Vec<StoryReference>,
    official_sources: Vec<String>,
    story_limit: usize,
}

impl InMemoryRepository {
    pub fn new(corpus: Corpus, official_sources: Vec<String>, story_limit: usize) -> Self {
        let stories: Vec<Story> = corpus.stories.into_iter().map(Story::sanitized).collect();
        let index = stories
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        tracing::debug!(
            stories = stories.len(),
            initiatives = corpus.initiatives.len(),
            references = corpus.references.len(),
            "corpus loaded"
        );
        Self {
            stories,
            index,
            initiatives: corpus.initiatives,
            groups: corpus.groups,
            references: corpus.references,
            official_sources,
            story_limit,
        }
    }

    /// Load a JSON corpus file.
    pub async fn from_path(
        path: impl AsRef<Path>,
        official_sources: Vec<String>,
        story_limit: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            NarrativeError::repository(format!("cannot read corpus {}: {}", path.display(), e))
        })?;
        let corpus: Corpus = serde_json::from_str(&raw)?;
        if corpus.stories.is_empty() {
            tracing::warn!("corpus {} contains no stories", path.display());
        }
        Ok(Self::new(corpus, official_sources, story_limit))
    }

    fn story(&self, id: &str) -> Option<&Story> {
        self.index.get(id).map(|&i| &self.stories[i])
    }

    fn initiative_ids(&self, scope: &InitiativeScope) -> BTreeSet<&str> {
        let (id, official, actual) = match scope {
            InitiativeScope::Official(id) => (id, true, false),
            InitiativeScope::Actual(id) => (id, false, true),
            InitiativeScope::Any(id) => (id, true, true),
        };
        let mut ids = BTreeSet::new();
        if let Some(initiative) = self.initiatives.iter().find(|i| &i.id == id) {
            if official {
                ids.extend(initiative.official_story_ids.iter().map(String::as_str));
            }
            if actual {
                ids.extend(initiative.actual_story_ids.iter().map(String::as_str));
            }
        }
        ids
    }

    fn matches(&self, story: &Story, filter: &StoryFilter, scoped: Option<&BTreeSet<&str>>) -> bool {
        if let Some(ai) = filter.ai_related
            && story.ai_related != ai
        {
            return false;
        }
        if let Some(ids) = scoped
            && !ids.contains(story.id.as_str())
        {
            return false;
        }
        if let Some(group) = &filter.group
            && story.group_key() != group.as_str()
        {
            return false;
        }
        if let Some(official) = filter.official
            && story.is_official(&self.official_sources) != official
        {
            return false;
        }
        if let Some(min) = filter.min_sentiment
            && !story.ai_sentiment.is_some_and(|s| s >= min)
        {
            return false;
        }
        if let Some(frame) = filter.agency_frame
            && story.agency_frame != Some(frame)
        {
            return false;
        }
        if let Some(level) = filter.sophistication
            && story.ai_sophistication != Some(level)
        {
            return false;
        }
        if let Some(cautionary) = filter.cautionary
            && is_cautionary(story) != cautionary
        {
            return false;
        }
        true
    }
}

#[async_trait]
impl StoryRepository for InMemoryRepository {
    async fn fetch_stories(&self, filter: &StoryFilter) -> Result<Vec<Story>> {
        let scoped = filter.initiative.as_ref().map(|s| self.initiative_ids(s));
        let mut matched: Vec<&Story> = self
            .stories
            .iter()
            .filter(|s| self.matches(s, filter, scoped.as_ref()))
            .collect();
        // newest first, undated last, corpus order on ties
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let limit = filter.limit.unwrap_or(self.story_limit).min(self.story_limit);
        Ok(matched.into_iter().take(limit).cloned().collect())
    }

    async fn fetch_groups(&self) -> Result<Vec<String>> {
        let mut groups: BTreeSet<String> = self.groups.iter().cloned().collect();
        for story in &self.stories {
            if story.teller_group.is_some() || story.department.is_some() {
                groups.insert(story.group_key().to_string());
            }
        }
        Ok(groups.into_iter().collect())
    }

    async fn fetch_initiative(&self, id: &str) -> Result<Option<Initiative>> {
        Ok(self.initiatives.iter().find(|i| i.id == id).cloned())
    }

    async fn fetch_story_reference_edges(&self) -> Result<Vec<ReferenceEdge>> {
        let mut counts: BTreeMap<(String, String, String, String), usize> = BTreeMap::new();
        for reference in &self.references {
            let (Some(citing), Some(source)) = (self.story(&reference.from), self.story(&reference.to))
            else {
                continue;
            };
            if !citing.ai_related || !source.ai_related {
                continue;
            }
            let cautionary = citing.ai_sentiment.is_some_and(|s| s < -0.3)
                || citing.narrative_function_is("warning");
            if !cautionary {
                continue;
            }
            let key = (
                citing.group_key().to_string(),
                source.group_key().to_string(),
                citing.id.clone(),
                source.id.clone(),
            );
            *counts.entry(key).or_insert(0) += 1;
        }
        let mut edges: Vec<ReferenceEdge> = counts
            .into_iter()
            .map(
                |((citing_group, source_group, citing_story, source_story), count)| ReferenceEdge {
                    citing_group,
                    citing_story,
                    source_group,
                    source_story,
                    count,
                },
            )
            .collect();
        edges.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn story(id: &str, day: Option<u32>) -> Story {
        let mut s = Story::new(id, format!("story {id}"));
        s.timestamp = day.map(|d| Utc.with_ymd_and_hms(2024, 3, d, 9, 0, 0).unwrap());
        s
    }

    fn repo(corpus: Corpus) -> InMemoryRepository {
        InMemoryRepository::new(
            corpus,
            vec!["official".into(), "leadership".into(), "announcement".into()],
            1000,
        )
    }

    #[tokio::test]
    async fn newest_first_with_undated_last() {
        let corpus = Corpus {
            stories: vec![story("a", Some(1)), story("b", None), story("c", Some(5))],
            ..Default::default()
        };
        let ids: Vec<String> = repo(corpus)
            .fetch_stories(&StoryFilter::ai())
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn filters_by_initiative_scope_and_official() {
        let mut official = story("o1", Some(2));
        official.source = Some("announcement".into());
        let corpus = Corpus {
            stories: vec![official, story("e1", Some(3)), story("e2", Some(4))],
            initiatives: vec![Initiative {
                id: "init-1".into(),
                official_story_ids: vec!["o1".into()],
                actual_story_ids: vec!["e1".into()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let repo = repo(corpus);
        let actual = repo
            .fetch_stories(&StoryFilter::ai().initiative(InitiativeScope::Actual("init-1".into())))
            .await
            .unwrap();
        assert_eq!(actual.len(), 1);
        assert_eq!(actual[0].id, "e1");

        let officials = repo
            .fetch_stories(&StoryFilter::ai().official(true))
            .await
            .unwrap();
        assert_eq!(officials.len(), 1);
        assert_eq!(officials[0].id, "o1");

        let missing = repo
            .fetch_stories(&StoryFilter::ai().initiative(InitiativeScope::Any("nope".into())))
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn limit_and_group_filtering() {
        let mut a = story("a", Some(1));
        a.department = Some("Sales".into());
        let mut b = story("b", Some(2));
        b.teller_group = Some("Sales".into());
        let mut c = story("c", Some(3));
        c.department = Some("Ops".into());
        let repo = repo(Corpus {
            stories: vec![a, b, c],
            groups: vec!["Legal".into()],
            ..Default::default()
        });
        let sales = repo
            .fetch_stories(&StoryFilter::ai().group("Sales"))
            .await
            .unwrap();
        assert_eq!(sales.len(), 2);
        let one = repo.fetch_stories(&StoryFilter::ai().limit(1)).await.unwrap();
        assert_eq!(one[0].id, "c");
        assert_eq!(
            repo.fetch_groups().await.unwrap(),
            vec!["Legal", "Ops", "Sales"]
        );
    }

    #[tokio::test]
    async fn blank_teller_group_falls_back_to_department() {
        let mut blank = story("blank", Some(1));
        blank.teller_group = Some(String::new());
        blank.department = Some("ops".into());
        let mut spaces = story("spaces", Some(2));
        spaces.teller_group = Some("   ".into());
        spaces.department = Some("ops".into());
        let mut orphan = story("orphan", Some(3));
        orphan.teller_group = Some(" ".into());
        let repo = repo(Corpus {
            stories: vec![blank, spaces, orphan],
            ..Default::default()
        });

        let groups = repo.fetch_groups().await.unwrap();
        assert_eq!(groups, vec!["ops", "unknown"]);

        let ops: Vec<String> = repo
            .fetch_stories(&StoryFilter::ai().group("ops"))
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ops, vec!["spaces", "blank"]);

        let unknown = repo
            .fetch_stories(&StoryFilter::ai().group("unknown"))
            .await
            .unwrap();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].id, "orphan");

        for group in &groups {
            let listed = repo
                .fetch_stories(&StoryFilter::ai().group(group.clone()))
                .await
                .unwrap();
            assert!(!listed.is_empty(), "group {group} lists no stories");
        }
    }

    #[tokio::test]
    async fn reference_edges_keep_only_cautionary_citations() {
        let mut warn = story("w", Some(1));
        warn.teller_group = Some("ops".into());
        warn.narrative_function = Some("warning".into());
        let mut happy = story("h", Some(2));
        happy.teller_group = Some("eng".into());
        happy.ai_sentiment = Some(0.7);
        let mut src = story("s", Some(3));
        src.teller_group = Some("finance".into());
        let repo = repo(Corpus {
            stories: vec![warn, happy, src],
            references: vec![
                StoryReference { from: "w".into(), to: "s".into() },
                StoryReference { from: "w".into(), to: "s".into() },
                StoryReference { from: "h".into(), to: "s".into() },
                StoryReference { from: "w".into(), to: "missing".into() },
            ],
            ..Default::default()
        });
        let edges = repo.fetch_story_reference_edges().await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].citing_group, "ops");
        assert_eq!(edges[0].source_group, "finance");
        assert_eq!(edges[0].count, 2);
    }

    #[tokio::test]
    async fn missing_corpus_file_is_a_repository_error() {
        let err = InMemoryRepository::from_path("/nonexistent/corpus.json", vec![], 10)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, NarrativeError::Repository { .. }));
    }
}
