//! Collaborator HTTP surface: health, scheduler status/trigger, and a few
//! cached reads. The read handlers go through the cache layer; a miss or a
//! stale entry just falls back to the store.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::{ttl, Cache};
use crate::db;
use crate::models::ApiResponse;
use crate::services::scheduler::{season_info, SchedulerHandle, SchedulerStatus};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub cache: Cache,
    pub scheduler: SchedulerHandle,
}

pub async fn serve(
    port: u16,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let app = create_router().with_state(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Gridfeed API listening on port {}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await?;
    Ok(())
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/scheduler/status", get(scheduler_status_handler))
        .route("/scheduler/trigger", post(scheduler_trigger_handler))
        .route("/teams", get(teams_handler))
        .route("/games", get(games_handler))
        .route("/standings", get(standings_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("gridfeed is running"))
}

async fn scheduler_status_handler(
    State(state): State<AppState>,
) -> Json<ApiResponse<SchedulerStatus>> {
    Json(ApiResponse::success(state.scheduler.status().await))
}

async fn scheduler_trigger_handler(
    State(state): State<AppState>,
) -> Json<ApiResponse<&'static str>> {
    state.scheduler.trigger();
    Json(ApiResponse::success("sync queued"))
}

/// Season/week query with the scheduler's current view as the default.
#[derive(Deserialize)]
struct SeasonWeekQuery {
    season: Option<i64>,
    week: Option<i64>,
}

impl SeasonWeekQuery {
    fn resolve(&self) -> (i64, i64) {
        let info = season_info(Local::now());
        (
            self.season.unwrap_or(info.season),
            self.week.unwrap_or(info.week),
        )
    }
}

async fn teams_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    cached(&state.cache, "teams:all", ttl::TEAMS, || async {
        db::get_all_teams(&state.pool).await
    })
    .await
}

async fn games_handler(
    State(state): State<AppState>,
    Query(params): Query<SeasonWeekQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let (season, week) = params.resolve();
    let key = format!("games:{}:{}", season, week);
    cached(&state.cache, &key, ttl::GAMES, || async {
        db::get_games_for_week(&state.pool, season, week).await
    })
    .await
}

async fn standings_handler(
    State(state): State<AppState>,
    Query(params): Query<SeasonWeekQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let (season, week) = params.resolve();
    let key = format!("standings:{}:{}", season, week);
    cached(&state.cache, &key, ttl::STATS, || async {
        db::get_standings(&state.pool, season, week).await
    })
    .await
}

/// Cache-through read: serve the cached envelope when present, otherwise
/// load, serialize once, and store the serialized form.
async fn cached<T, F, Fut>(
    cache: &Cache,
    key: &str,
    ttl: std::time::Duration,
    load: F,
) -> Result<Json<serde_json::Value>, StatusCode>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<T>>,
{
    if let Some(hit) = cache.get(key).await {
        if let Ok(value) = serde_json::from_str(&hit) {
            return Ok(Json(value));
        }
    }

    match load().await {
        Ok(data) => {
            let envelope = serde_json::to_value(ApiResponse::success(data))
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
            cache.set(key, envelope.to_string(), ttl).await;
            Ok(Json(envelope))
        }
        Err(e) => {
            tracing::error!("Read for {} failed: {}", key, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
