//! End-to-end analysis scenarios over in-memory corpora.

mod common;

use std::sync::Arc;

use anyhow::Result;
use narrative_intel::analysis::readiness::SentimentTrend;
use narrative_intel::models::{AgencyFrame, ResistancePattern};
use narrative_intel::reporting::{DetailedReport, ExecutiveDashboard};
use narrative_intel::{NarrativeError, NarrativeIntelligence, StoryRepository};

use common::{
    UnavailableRepository, demo_corpus, demo_engine, engine, engine_with, repo, settings, story,
    strip_timestamps,
};

/// Leadership claims human control while employees feel AI has taken over
#[tokio::test]
async fn belief_and_sentiment_gap_between_leadership_and_employees() -> Result<()> {
    let mut official = story("o1", "leadership", "We lead, AI assists", Some(0.8));
    official.source = Some("official".to_string());
    official.agency_frame = Some(AgencyFrame::HumanInControl);
    let employees: Vec<_> = (0..3)
        .map(|i| {
            let mut s = story(&format!("e{i}"), "operations", "The system decides for us now", Some(-0.6));
            s.agency_frame = Some(AgencyFrame::AiInControl);
            s
        })
        .collect();

    let engine = engine(Vec::new())?;
    let gap = engine.gap_analyzer();

    let beliefs = gap.compare_beliefs(Some(&official), &employees);
    assert!(
        beliefs.interpretation.contains("human_in_control") && beliefs.interpretation.contains("ai_in_control"),
        "belief mismatch should name both agency frames: {}",
        beliefs.interpretation
    );

    let sentiment = gap.compare_sentiment(Some(&official), &employees);
    assert!((sentiment.sentiment_gap - 1.4).abs() < 1e-9, "gap was {}", sentiment.sentiment_gap);
    assert!(
        sentiment.interpretation.starts_with("Major disconnect"),
        "unexpected interpretation: {}",
        sentiment.interpretation
    );
    Ok(())
}

/// Seven of ten stories voice worry; fearful resistance should dominate
#[tokio::test]
async fn fearful_resistance_counts_matching_stories() -> Result<()> {
    let stories: Vec<_> = (0..10)
        .map(|i| {
            let text = if i < 7 {
                "People are worried about the new assistant"
            } else {
                "The assistant drafted our release notes"
            };
            story(&format!("s{i}"), "support", text, Some(-0.2))
        })
        .collect();

    let engine = engine(Vec::new())?;
    let patterns = engine.resistance_mapper().identify_resistance_patterns(&stories);

    assert_eq!(patterns.len(), 1, "only the fearful pattern should fire");
    let fearful = &patterns[0];
    assert_eq!(fearful.pattern, ResistancePattern::Fearful);
    assert_eq!(fearful.frequency, 7);
    assert!((fearful.percentage - 0.7).abs() < 1e-9);
    assert_eq!(fearful.examples.len(), 3, "examples are capped at three");
    Ok(())
}

/// Three stories are too few to call a sentiment trend
#[tokio::test]
async fn forecast_on_tiny_population_reports_unknown_trend() -> Result<()> {
    let stories = vec![
        story("a", "ops", "first", Some(0.1)),
        story("b", "ops", "second", Some(0.5)),
        story("c", "ops", "third", Some(0.9)),
    ];
    let engine = engine(Vec::new())?;
    let scorer = engine.readiness_scorer();
    let dimensions = scorer.score_dimensions(&stories);
    let forecast = scorer.forecast_adoption_trajectory(&stories, &dimensions);

    assert_eq!(forecast.sentiment_trend, SentimentTrend::Unknown);
    assert!((0.0..=1.0).contains(&forecast.momentum_score));
    Ok(())
}

/// Without an initiative the unified story section is omitted, not failed
#[tokio::test]
async fn comprehensive_without_initiative_skips_unified_story() -> Result<()> {
    let engine = demo_engine()?;
    let report = engine.run_comprehensive_analysis(None).await?;

    assert!(report.detailed_analyses.unified_story.is_none());
    assert!(report.initiative_id.is_none());
    assert!(!report.executive_summary.overall_assessment.is_empty());
    assert!(report.action_plan.immediate.actions.len() <= 3);
    Ok(())
}

/// Naming an initiative scopes the unified story to it
#[tokio::test]
async fn comprehensive_with_initiative_builds_unified_story() -> Result<()> {
    let engine = demo_engine()?;
    let report = engine.run_comprehensive_analysis(Some("copilot-rollout")).await?;

    let unified = report
        .detailed_analyses
        .unified_story
        .expect("unified story for named initiative");
    assert_eq!(unified.initiative_id, "copilot-rollout");
    assert!(!unified.unified_story.core_message.is_empty());
    Ok(())
}

/// Same corpus, same answers: only timestamps may differ between runs
#[tokio::test]
async fn repeated_analysis_is_deterministic() -> Result<()> {
    let engine = demo_engine()?;
    let mut first = serde_json::to_value(engine.run_comprehensive_analysis(Some("copilot-rollout")).await?)?;
    let mut second = serde_json::to_value(engine.run_comprehensive_analysis(Some("copilot-rollout")).await?)?;
    strip_timestamps(&mut first);
    strip_timestamps(&mut second);
    assert_eq!(first, second);

    let dashboard = ExecutiveDashboard::new(engine.clone());
    let mut a = serde_json::to_value(dashboard.generate_dashboard(None).await?)?;
    let mut b = serde_json::to_value(dashboard.generate_dashboard(None).await?)?;
    strip_timestamps(&mut a);
    strip_timestamps(&mut b);
    assert_eq!(a, b);
    Ok(())
}

/// Cautionary citations in the demo corpus converge on the cancelled routing pilot
#[tokio::test]
async fn cautionary_citations_build_contagion_network() -> Result<()> {
    let engine = demo_engine()?;
    let spread = engine.resistance_mapper().analyze_resistance_spread().await?;

    assert_eq!(spread.cross_group_references, 3);
    assert!(!spread.is_spreading, "three edges stay below the spread threshold");
    let top = &spread.influential_stories[0];
    assert_eq!(top.story_id, "s07");
    assert_eq!(top.reference_count, 2);
    Ok(())
}

/// Every listed group profiles all of its stories, blank teller groups included
#[tokio::test]
async fn resistance_profiles_cover_every_listed_group() -> Result<()> {
    let mut corpus = demo_corpus()?;
    let mut blank = story("x1", "", "Worried the assistant will replace us", Some(-0.5));
    blank.department = Some("field_ops".into());
    let mut spaces = story("x2", "   ", "Tried the pilot, it helped a bit", Some(0.3));
    spaces.department = Some("field_ops".into());
    let orphan = story("x3", " ", "Nobody asked us about the rollout", Some(-0.4));
    corpus.stories.extend([blank, spaces, orphan]);

    let expected: Vec<(String, usize)> = {
        let groups = repo(corpus.clone()).fetch_groups().await?;
        groups
            .into_iter()
            .map(|group| {
                let count = corpus
                    .stories
                    .iter()
                    .filter(|s| s.ai_related && s.group_key() == group)
                    .count();
                (group, count)
            })
            .collect()
    };
    assert!(expected.iter().any(|(g, n)| g == "field_ops" && *n == 2));
    assert!(expected.iter().any(|(g, n)| g == "unknown" && *n == 1));

    let landscape = engine_with(corpus)?
        .resistance_mapper()
        .map_resistance_landscape()
        .await?;
    for (group, count) in &expected {
        let profile = landscape
            .by_group
            .get(group)
            .unwrap_or_else(|| panic!("group {group} missing from landscape"));
        assert_eq!(profile.story_count, *count, "story count for {group}");
    }
    Ok(())
}

/// A failing store surfaces as a repository error from every entry point
#[tokio::test]
async fn repository_failure_propagates() -> Result<()> {
    let engine = Arc::new(NarrativeIntelligence::new(Arc::new(UnavailableRepository), settings())?);

    let err = engine.answer_question_2().await.expect_err("question 2 should fail");
    assert!(matches!(err, NarrativeError::Repository { .. }), "got {err:?}");

    let err = engine
        .run_comprehensive_analysis(Some("copilot-rollout"))
        .await
        .expect_err("comprehensive run should fail");
    assert!(matches!(err, NarrativeError::Repository { .. }), "got {err:?}");

    let err = DetailedReport::new(engine.clone())
        .generate_team_report("engineering")
        .await
        .expect_err("team report should fail");
    assert!(matches!(err, NarrativeError::Repository { .. }), "got {err:?}");
    Ok(())
}

/// Unknown groups and initiatives are reported as missing
#[tokio::test]
async fn detailed_reports_reject_unknown_targets() -> Result<()> {
    let reports = DetailedReport::new(demo_engine()?);

    let err = reports.generate_team_report("marketing").await.expect_err("unknown group");
    assert!(matches!(err, NarrativeError::NotFound { .. }), "got {err:?}");

    let err = reports.generate_initiative_report("nope").await.expect_err("unknown initiative");
    assert!(matches!(err, NarrativeError::NotFound { .. }), "got {err:?}");

    let team = reports.generate_team_report("customer_support").await?;
    assert_eq!(team.group, "customer_support");
    assert!(team.example_stories.len() <= 3);

    let initiative = reports.generate_initiative_report("ticket-triage").await?;
    assert_eq!(initiative.initiative_name, "Support Ticket Triage Bot");
    Ok(())
}
