//! HTTP transport for the analysis engine
//!
//! Thin axum router over [`NarrativeIntelligence`] and the reporting layer.
//! Every route is a read-only GET returning JSON; errors render through
//! [`NarrativeError`]'s `IntoResponse`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::culture::CultureReport;
use crate::analysis::frames::FrameMap;
use crate::analysis::gap::GapReport;
use crate::analysis::readiness::ReadinessReport;
use crate::analysis::resistance::ResistanceLandscape;
use crate::config::HttpConfig;
use crate::error::Result;
use crate::orchestrator::{
    ComprehensiveReport, EntrepreneurialCultureReport, LanguageContextReport, NarrativeIntelligence,
    RiskAversionAnswer, TeamDifferencesReport, UnifiedStoryReport,
};
use crate::reporting::{DashboardReport, DetailedReport, ExecutiveDashboard, InitiativeReport, TeamReport};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub engine: Arc<NarrativeIntelligence>,
    pub dashboard: Arc<ExecutiveDashboard>,
    pub reports: Arc<DetailedReport>,
}

impl HttpState {
    pub fn new(engine: Arc<NarrativeIntelligence>) -> Self {
        Self {
            dashboard: Arc::new(ExecutiveDashboard::new(engine.clone())),
            reports: Arc::new(DetailedReport::new(engine.clone())),
            engine,
        }
    }
}

/// `?initiative_id=...`
#[derive(Debug, Default, Deserialize)]
pub struct InitiativeQuery {
    pub initiative_id: Option<String>,
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

async fn question1(
    State(state): State<HttpState>,
    Query(query): Query<InitiativeQuery>,
) -> Result<Json<TeamDifferencesReport>> {
    Ok(Json(state.engine.answer_question_1(query.initiative_id.as_deref()).await?))
}

async fn question2(State(state): State<HttpState>) -> Result<Json<EntrepreneurialCultureReport>> {
    Ok(Json(state.engine.answer_question_2().await?))
}

async fn question3(
    State(state): State<HttpState>,
    Path(initiative_id): Path<String>,
) -> Result<Json<UnifiedStoryReport>> {
    Ok(Json(state.engine.answer_question_3(&initiative_id).await?))
}

async fn question4(State(state): State<HttpState>) -> Result<Json<RiskAversionAnswer>> {
    Ok(Json(state.engine.answer_question_4().await?))
}

async fn question5(
    State(state): State<HttpState>,
    Query(query): Query<InitiativeQuery>,
) -> Result<Json<LanguageContextReport>> {
    Ok(Json(state.engine.answer_question_5(query.initiative_id.as_deref()).await?))
}

async fn gaps(
    State(state): State<HttpState>,
    Query(query): Query<InitiativeQuery>,
) -> Result<Json<GapReport>> {
    let report = state
        .engine
        .gap_analyzer()
        .analyze_official_vs_actual(query.initiative_id.as_deref())
        .await?;
    Ok(Json(report))
}

async fn frames(
    State(state): State<HttpState>,
    Query(query): Query<InitiativeQuery>,
) -> Result<Json<FrameMap>> {
    let map = state
        .engine
        .frame_analyzer()
        .map_competing_frames(query.initiative_id.as_deref())
        .await?;
    Ok(Json(map))
}

async fn culture(State(state): State<HttpState>) -> Result<Json<CultureReport>> {
    Ok(Json(state.engine.culture_detector().assess_innovation_culture().await?))
}

async fn resistance(State(state): State<HttpState>) -> Result<Json<ResistanceLandscape>> {
    Ok(Json(state.engine.resistance_mapper().map_resistance_landscape().await?))
}

async fn readiness(
    State(state): State<HttpState>,
    Query(query): Query<InitiativeQuery>,
) -> Result<Json<ReadinessReport>> {
    let report = state
        .engine
        .readiness_scorer()
        .assess_readiness(query.initiative_id.as_deref())
        .await?;
    Ok(Json(report))
}

async fn comprehensive(
    State(state): State<HttpState>,
    Query(query): Query<InitiativeQuery>,
) -> Result<Json<ComprehensiveReport>> {
    let report = state
        .engine
        .run_comprehensive_analysis(query.initiative_id.as_deref())
        .await?;
    Ok(Json(report))
}

async fn dashboard(
    State(state): State<HttpState>,
    Query(query): Query<InitiativeQuery>,
) -> Result<Json<DashboardReport>> {
    let report = state
        .dashboard
        .generate_dashboard(query.initiative_id.as_deref())
        .await?;
    Ok(Json(report))
}

async fn team_report(
    State(state): State<HttpState>,
    Path(group): Path<String>,
) -> Result<Json<TeamReport>> {
    Ok(Json(state.reports.generate_team_report(&group).await?))
}

async fn initiative_report(
    State(state): State<HttpState>,
    Path(initiative_id): Path<String>,
) -> Result<Json<InitiativeReport>> {
    Ok(Json(state.reports.generate_initiative_report(&initiative_id).await?))
}

/// An empty origin list allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods([Method::GET, Method::OPTIONS]);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(parsed))
}

pub fn router(state: HttpState, http: &HttpConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/analysis/question1", get(question1))
        .route("/analysis/question2", get(question2))
        .route("/analysis/question3/:initiative_id", get(question3))
        .route("/analysis/question4", get(question4))
        .route("/analysis/question5", get(question5))
        .route("/analysis/gaps", get(gaps))
        .route("/analysis/frames", get(frames))
        .route("/analysis/culture", get(culture))
        .route("/analysis/resistance", get(resistance))
        .route("/analysis/readiness", get(readiness))
        .route("/analysis/comprehensive", get(comprehensive))
        .route("/dashboard", get(dashboard))
        .route("/reports/team/:group", get(team_report))
        .route("/reports/initiative/:initiative_id", get(initiative_report))
        .layer(cors_layer(&http.cors_origins))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_http_server(engine: Arc<NarrativeIntelligence>, http: &HttpConfig) -> anyhow::Result<()> {
    let app = router(HttpState::new(engine), http);
    let listener = tokio::net::TcpListener::bind(&http.bind)
        .await
        .map_err(|e| anyhow::anyhow!("cannot bind {}: {}", http.bind, e))?;
    info!(bind = %http.bind, "starting HTTP server");
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;
    Ok(())
}
