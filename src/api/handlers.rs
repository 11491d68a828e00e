//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream, StreamExt};
use tracing::{error, info, warn};

use crate::{models::CategoryFilter, state::AppState};
use super::responses::{ApiResponse, FilterOption, HealthResponse, RacesResponse, StatusResponse};

/// Handle GET /races - Return the displayed races
pub async fn races_handler(State(state): State<Arc<AppState>>) -> Result<Json<RacesResponse>, StatusCode> {
    let feed = match state.get_feed_state() {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to get feed state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok(Json(RacesResponse::new(
        state.watcher.filter(),
        &feed,
        state.watcher.views(),
    )))
}

/// Handle GET /races/stream - Push the race list every time it changes
pub async fn races_stream_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let mut views_rx = state.watcher.subscribe_views();
    let initial = views_rx.borrow_and_update().clone();

    let updates = stream::unfold(views_rx, |mut views_rx| async move {
        views_rx.changed().await.ok()?;
        let views = views_rx.borrow_and_update().clone();
        Some((Event::default().json_data(views), views_rx))
    });

    let events = stream::once(async move { Event::default().json_data(initial) }).chain(updates);
    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /filters - List the available category filters
pub async fn filters_handler(State(state): State<Arc<AppState>>) -> Json<Vec<FilterOption>> {
    Json(FilterOption::all(state.watcher.filter()))
}

/// Handle POST /filter/:filter - Change the category filter
pub async fn filter_handler(
    State(state): State<Arc<AppState>>,
    Path(filter): Path<String>,
) -> Result<Json<RacesResponse>, (StatusCode, Json<ApiResponse>)> {
    let filter: CategoryFilter = match filter.parse() {
        Ok(f) => f,
        Err(e) => {
            warn!("Rejected filter change: {}", e);
            return Err((StatusCode::BAD_REQUEST, Json(ApiResponse::error(e))));
        }
    };

    let views = state.set_filter(filter);
    info!("Filter endpoint called - now showing {} {} races", views.len(), filter);

    match state.get_feed_state() {
        Ok(feed) => Ok(Json(RacesResponse::new(filter, &feed, views))),
        Err(e) => {
            error!("Failed to get feed state: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to read feed state".to_string())),
            ))
        }
    }
}

/// Handle POST /refresh - Refresh the races now
pub async fn refresh_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    match state.request_refresh() {
        Ok(_) => {
            info!("Refresh endpoint called - refresh scheduled");
            Ok(Json(ApiResponse::ok("Refresh scheduled".to_string())))
        }
        Err(e) => {
            error!("Failed to schedule refresh: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return current service status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let feed = match state.get_feed_state() {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to get feed state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        filter: state.watcher.filter(),
        active_timers: state.timers.len(),
        watched_races: state.watcher.views().len(),
        feed,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
