//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::{CategoryFilter, ALL_FILTERS},
    racing::RaceView,
    state::{FeedError, FeedState},
};

/// One selectable category filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOption {
    pub filter: CategoryFilter,
    pub label: String,
    pub icon: String,
    pub selected: bool,
}

impl FilterOption {
    /// Every filter, marking the selected one
    pub fn all(selected: CategoryFilter) -> Vec<Self> {
        ALL_FILTERS
            .into_iter()
            .map(|filter| Self {
                filter,
                label: filter.label().to_string(),
                icon: filter.icon_key().to_string(),
                selected: filter == selected,
            })
            .collect()
    }
}

/// The next-to-go list with everything needed to render it
#[derive(Debug, Clone, Serialize)]
pub struct RacesResponse {
    pub filter: CategoryFilter,
    pub filters: Vec<FilterOption>,
    pub loading: bool,
    /// The last refresh failed, so the races may be out of date
    pub stale: bool,
    pub error: Option<FeedError>,
    pub message: Option<String>,
    pub races: Vec<RaceView>,
    pub timestamp: DateTime<Utc>,
}

impl RacesResponse {
    pub fn new(filter: CategoryFilter, feed: &FeedState, races: Vec<RaceView>) -> Self {
        Self {
            filter,
            filters: FilterOption::all(filter),
            loading: feed.loading,
            stale: feed.is_stale(),
            error: feed.last_error.as_ref().map(FeedError::from),
            message: feed.message.clone(),
            races,
            timestamp: Utc::now(),
        }
    }
}

/// API response structure for action endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
        }
    }

    /// Create a success response
    pub fn ok(message: String) -> Self {
        Self::new("ok".to_string(), message)
    }

    /// Create an error response
    pub fn error(message: String) -> Self {
        Self::new("error".to_string(), message)
    }
}

/// Service status with timer and feed information
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub filter: CategoryFilter,
    pub active_timers: usize,
    pub watched_races: usize,
    pub feed: FeedState,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
