use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

use regportal::api::{router, AppState};
use regportal::config::{ApiConfig, DataConfig, RecommendationConfig, TrendingConfig};
use regportal::{Catalog, Config, Event, EventStatus, RegistrationRecord, Snapshot, Sport};

fn config() -> Config {
    Config {
        api: ApiConfig::default(),
        data: DataConfig::in_dir("./data"),
        recommendation: RecommendationConfig::default(),
        trending: TrendingConfig::default(),
        metrics_port: 9000,
    }
}

fn event(id: &str, status: EventStatus, day: u32, sport: &str) -> Event {
    let start = NaiveDate::from_ymd_opt(2030, 5, day).unwrap();
    Event {
        id: id.to_string(),
        name: format!("Event {}", id),
        start_date: start,
        end_date: start,
        status,
        location: Some("Civic Arena".to_string()),
        sports: vec![Sport {
            id: format!("sp-{}", sport),
            name: sport.to_string(),
            categories: vec!["U18".to_string()],
            status: Some("open".to_string()),
        }],
    }
}

fn state() -> Arc<AppState> {
    let now = Utc::now();
    let events = vec![
        event("evt-1", EventStatus::Upcoming, 10, "athletics"),
        event("evt-2", EventStatus::Upcoming, 12, "football"),
        event("evt-3", EventStatus::Completed, 1, "athletics"),
        event("evt-4", EventStatus::Ongoing, 2, "athletics"),
    ];
    let mut registrations: Vec<RegistrationRecord> = (0..4)
        .map(|i| RegistrationRecord::new(format!("r-{}", i), "evt-2", now - Duration::days(1)))
        .collect();
    registrations.push(RegistrationRecord::new("r-old", "evt-1", now - Duration::days(90)));
    registrations.push(RegistrationRecord::new("r-x", "evt-missing", now));
    registrations.push(RegistrationRecord::new("r-done", "evt-3", now));

    let catalog = Catalog::from_snapshot(Snapshot::new(events, registrations));
    Arc::new(AppState::new(catalog, &config()).unwrap())
}

fn app() -> Router {
    router(state(), &config().api)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let cache_control = response
        .headers()
        .get(header::CACHE_CONTROL)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, cache_control, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn recommendations_rank_matching_sport_first() {
    let (status, _, body) = get(
        app(),
        "/recommendations/events?athleteId=a1&sport=athletics&registered=evt-4",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["athleteId"], "a1");
    assert_eq!(body["count"], 2);
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs[0]["event"]["id"], "evt-1");
    assert_eq!(recs[0]["event"]["startDate"], "2030-05-10");
    assert!(recs[0]["reason"].as_str().unwrap().contains("athletics"));
    assert_eq!(recs[1]["event"]["id"], "evt-2");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn recommendations_accept_sport_list_and_limit() {
    let (status, _, body) = get(
        app(),
        "/recommendations/events?athleteId=a1&sports=football,%20athletics&limit=1",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    // evt-4 is ongoing and earliest, but upcoming matches rank above it
    assert_eq!(body["recommendations"][0]["event"]["id"], "evt-1");
}

#[tokio::test]
async fn recommendations_require_athlete_id() {
    let (status, _, body) = get(app(), "/recommendations/events?sport=athletics").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _, _) = get(app(), "/recommendations/events?athleteId=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_limit_is_bad_request() {
    let (status, _, body) = get(app(), "/recommendations/events?athleteId=a1&limit=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn trending_lists_active_events_with_cache_hint() {
    let (status, cache_control, body) = get(app(), "/recommendations/trending").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control.as_deref(), Some("max-age=3600"));
    assert_eq!(body["cacheControl"], "max-age=3600");
    assert_eq!(body["count"], 1);
    assert_eq!(body["trending"][0]["event"]["id"], "evt-2");
    assert_eq!(body["trending"][0]["score"], 4.0);
}

#[tokio::test]
async fn trending_is_served_from_cache_for_the_same_snapshot() {
    let state = state();
    let app = router(state.clone(), &config().api);
    let version = state.catalog.snapshot().version;

    let (_, _, first) = get(app.clone(), "/recommendations/trending").await;
    assert_eq!(first["count"], 1);
    assert!(state.trending_cache.get(&version).is_some());

    // A cached entry is returned as is, without re-ranking the snapshot
    state.trending_cache.insert(version, Arc::new(Vec::new()));
    let (_, _, second) = get(app, "/recommendations/trending").await;
    assert_eq!(second["count"], 0);
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) {
    std::fs::write(path, serde_json::to_vec(value).unwrap()).unwrap();
}

#[tokio::test]
async fn catalog_reload_invalidates_trending_cache() {
    let dir = tempfile::tempdir().unwrap();
    let data = DataConfig::in_dir(dir.path());
    let now = Utc::now();
    let events = vec![
        event("evt-1", EventStatus::Upcoming, 10, "athletics"),
        event("evt-2", EventStatus::Upcoming, 12, "football"),
    ];
    write_json(&data.events_path(), &events);
    write_json(
        &data.registrations_path(),
        &vec![RegistrationRecord::new("r-1", "evt-1", now - Duration::days(1))],
    );

    let catalog = Catalog::load(&data).await.unwrap();
    let config = config();
    let state = Arc::new(AppState::new(catalog.clone(), &config).unwrap());
    let app = router(state.clone(), &config.api);

    let first_version = catalog.snapshot().version;
    let (_, _, first) = get(app.clone(), "/recommendations/trending").await;
    assert_eq!(first["trending"][0]["event"]["id"], "evt-1");
    assert!(state.trending_cache.get(&first_version).is_some());

    let fresh: Vec<RegistrationRecord> = (0..3)
        .map(|i| RegistrationRecord::new(format!("r-{}", i + 2), "evt-2", now))
        .collect();
    write_json(&data.registrations_path(), &fresh);
    catalog.reload().await.unwrap();

    let second_version = catalog.snapshot().version;
    assert_ne!(first_version, second_version);

    let (_, _, second) = get(app, "/recommendations/trending").await;
    assert_eq!(second["count"], 1);
    assert_eq!(second["trending"][0]["event"]["id"], "evt-2");
    assert_eq!(second["trending"][0]["score"], 3.0);
    assert!(state.trending_cache.get(&second_version).is_some());
}

#[tokio::test]
async fn registration_stats_report_dangling_records() {
    let (status, _, body) = get(app(), "/stats/registrations").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalEvents"], 4);
    assert_eq!(body["totalRegistrations"], 7);
    assert_eq!(body["danglingRegistrations"], 1);
    assert_eq!(body["perEvent"][0]["eventId"], "evt-2");
}

#[tokio::test]
async fn health_reports_snapshot() {
    let (status, _, body) = get(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["snapshot"]["events"], 4);
}
