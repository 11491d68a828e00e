//! Racing feed refresh state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::DataSourceError;

/// Outcome of the most recent refreshes, shown next to the race list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedState {
    /// A refresh is in flight
    pub loading: bool,
    /// Error of the last attempt, cleared by the next success
    pub last_error: Option<DataSourceError>,
    pub consecutive_failures: u32,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    /// Status and message carried by the last good snapshot
    pub status: Option<i64>,
    pub message: Option<String>,
    pub races_known: usize,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a refresh as started
    pub fn begin(&mut self, at: DateTime<Utc>) {
        self.loading = true;
        self.last_attempt = Some(at);
    }

    /// Record a successful refresh
    pub fn succeed(&mut self, at: DateTime<Utc>, status: Option<i64>, message: Option<String>, races: usize) {
        self.loading = false;
        self.last_error = None;
        self.consecutive_failures = 0;
        self.last_success = Some(at);
        self.status = status;
        self.message = message;
        self.races_known = races;
    }

    /// Record a failed refresh. Whatever the last good snapshot provided stays.
    pub fn fail(&mut self, error: DataSourceError) {
        self.loading = false;
        self.consecutive_failures += 1;
        self.last_error = Some(error);
    }

    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }
}

/// Error summary for clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedError {
    pub kind: String,
    pub message: String,
}

impl From<&DataSourceError> for FeedError {
    fn from(error: &DataSourceError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}
