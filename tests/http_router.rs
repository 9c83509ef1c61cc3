//! Router smoke tests driven through `tower::ServiceExt::oneshot`.

mod common;

use anyhow::Result;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use narrative_intel::config::HttpConfig;
use narrative_intel::http::{HttpState, router};
use tower::ServiceExt;

fn app() -> Result<axum::Router> {
    Ok(router(HttpState::new(common::demo_engine()?), &HttpConfig::default()))
}

async fn get(uri: &str) -> Result<(StatusCode, serde_json::Value)> {
    let response = app()?
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    Ok((status, body))
}

/// Health endpoint answers without touching the corpus
#[tokio::test]
async fn health_is_ok() -> Result<()> {
    let response = app()?
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"ok");
    Ok(())
}

/// Question 2 serializes the culture answer
#[tokio::test]
async fn question_two_returns_culture_answer() -> Result<()> {
    let (status, body) = get("/analysis/question2").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["question"].as_str().is_some_and(|q| q.contains("entrepreneurial")), "body: {body}");
    let score = body["overall_score"].as_f64().expect("overall_score");
    assert!((0.0..=1.0).contains(&score));
    Ok(())
}

/// Question 3 is addressed by initiative path segment
#[tokio::test]
async fn question_three_uses_path_initiative() -> Result<()> {
    let (status, body) = get("/analysis/question3/copilot-rollout").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["initiative_id"], "copilot-rollout");
    Ok(())
}

/// Missing initiatives map to 404 with the error envelope
#[tokio::test]
async fn unknown_initiative_report_is_not_found() -> Result<()> {
    let (status, body) = get("/reports/initiative/nope").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 404, "error envelope: {body}");
    Ok(())
}

/// Dashboard honours the initiative query parameter
#[tokio::test]
async fn dashboard_with_initiative_query() -> Result<()> {
    let (status, body) = get("/dashboard?initiative_id=copilot-rollout").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["initiative_id"], "copilot-rollout");
    assert!(body["risk_signals"].as_array().is_some_and(|s| s.len() <= 5));
    Ok(())
}
