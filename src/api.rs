//! HTTP API Server for Recommendations
//!
//! Provides REST endpoints the portal frontend calls for event recommendations,
//! trending events and dashboard statistics. Query-string parsing lives here; the
//! recommendation module only ever sees typed inputs.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::{Catalog, SnapshotStats};
use crate::config::{ApiConfig, Config};
use crate::error::{Error, Result};
use crate::recommendation::{
    metrics::{self, PerformanceTimer},
    registration_stats, AthleteProfile, RecommendationEngine, RecommendationResult,
    RegistrationStats, TrendingRanker,
};

/// Recommendation calls slower than this are logged as warnings
const SLOW_REQUEST_MS: u64 = 250;

/// Shared application state
pub struct AppState {
    pub catalog: Catalog,
    pub engine: RecommendationEngine,
    pub trending: TrendingRanker,
    /// Trending results per snapshot version
    pub trending_cache: moka::sync::Cache<Uuid, Arc<Vec<RecommendationResult>>>,
    pub cache_control: String,
}

impl AppState {
    pub fn new(catalog: Catalog, config: &Config) -> Result<Self> {
        let ttl = config.trending.cache_ttl;
        Ok(Self {
            catalog,
            engine: RecommendationEngine::with_weights(config.recommendation.scoring_weights()),
            trending: TrendingRanker::new(config.trending.decay_policy()?),
            trending_cache: moka::sync::Cache::builder()
                .max_capacity(16)
                .time_to_live(ttl.max(Duration::from_secs(1)))
                .build(),
            cache_control: config.trending.cache_control(),
        })
    }
}

/// Query params for the event recommendations endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsQuery {
    pub athlete_id: Option<String>,
    pub sport: Option<String>,
    /// Comma-separated
    pub sports: Option<String>,
    pub category: Option<String>,
    /// Comma-separated ids of events the athlete is already registered for
    pub registered: Option<String>,
    pub limit: Option<usize>,
}

/// Query params for trending
#[derive(Debug, Default, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<usize>,
}

/// Query params for dashboard statistics
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub window_days: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    pub athlete_id: String,
    pub recommendations: Vec<RecommendationResult>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingResponse {
    pub trending: Vec<RecommendationResult>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
    pub cache_control: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub snapshot: SnapshotStats,
}

/// Build the router with all routes and middleware
pub fn router(state: Arc<AppState>, config: &ApiConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/recommendations/events", get(get_event_recommendations))
        .route("/recommendations/trending", get(get_trending))
        .route("/stats/registrations", get(get_registration_stats))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.request_timeout));

    if config.cors_enabled {
        app = app.layer(cors_layer(&config.cors_origins));
    }

    app.with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server; returns once `shutdown` resolves
pub async fn start_server(
    state: Arc<AppState>,
    config: &ApiConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(state, config);

    let addr = format!("{}:{}", config.host, config.port);
    info!("🚀 Starting recommendation API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        snapshot: state.catalog.stats(),
    })
}

/// Personalized event recommendations for one athlete
async fn get_event_recommendations(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<RecommendationsQuery>, QueryRejection>,
) -> Result<Json<RecommendationsResponse>> {
    let Query(query) = query.map_err(|e| Error::bad_request(e.body_text()))?;

    let athlete_id = query
        .athlete_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::bad_request("athleteId is required"))?
        .to_string();

    let athlete = AthleteProfile {
        id: Some(athlete_id.clone()),
        sport: query.sport,
        sports: query.sports.as_deref().map(|s| split_list(s).collect()),
        category: query.category,
    };
    let excluded = parse_id_set(query.registered.as_deref());

    let snapshot = state.catalog.snapshot();
    let timer = PerformanceTimer::new("recommend_events");
    let mut recommendations =
        state
            .engine
            .recommend_events(&athlete, &snapshot.events, &excluded)?;
    timer.log_if_slow(SLOW_REQUEST_MS);

    metrics::record_recommendations(&recommendations, state.engine.weights().baseline);
    if let Some(limit) = query.limit {
        recommendations.truncate(limit);
    }

    debug!(
        "Generated {} recommendations for athlete {}",
        recommendations.len(),
        athlete_id
    );

    Ok(Json(RecommendationsResponse {
        athlete_id,
        count: recommendations.len(),
        recommendations,
        timestamp: Utc::now(),
    }))
}

/// Trending events, cached per catalog snapshot
async fn get_trending(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<TrendingQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query.map_err(|e| Error::bad_request(e.body_text()))?;

    let snapshot = state.catalog.snapshot();
    let cached = state.trending_cache.get(&snapshot.version);
    let cache_hit = cached.is_some();
    let ranked = match cached {
        Some(ranked) => ranked,
        None => {
            let _timer = PerformanceTimer::new("trending_events");
            let ranked = Arc::new(state.trending.rank(
                &snapshot.events,
                &snapshot.registrations,
                Utc::now(),
            ));
            state
                .trending_cache
                .insert(snapshot.version, Arc::clone(&ranked));
            ranked
        }
    };
    metrics::record_trending(ranked.len(), cache_hit);

    let limit = query.limit.unwrap_or(ranked.len());
    let trending: Vec<RecommendationResult> = ranked.iter().take(limit).cloned().collect();

    let body = TrendingResponse {
        count: trending.len(),
        trending,
        timestamp: Utc::now(),
        cache_control: state.cache_control.clone(),
    };

    Ok((
        [(header::CACHE_CONTROL, state.cache_control.clone())],
        Json(body),
    ))
}

/// Registration aggregates for the admin dashboard
async fn get_registration_stats(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<RegistrationStats>> {
    let Query(query) = query.map_err(|e| Error::bad_request(e.body_text()))?;

    let window = match query.window_days {
        Some(days) => ChronoDuration::days(i64::from(days)),
        None => state.trending.policy().window(),
    };

    let snapshot = state.catalog.snapshot();
    Ok(Json(registration_stats(
        &snapshot.events,
        &snapshot.registrations,
        Utc::now(),
        window,
    )))
}

/// Trimmed, non-empty entries of a comma-separated list
fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse the `registered` query value into a set of event ids
pub fn parse_id_set(raw: Option<&str>) -> HashSet<String> {
    raw.map(|s| split_list(s).collect()).unwrap_or_default()
}
