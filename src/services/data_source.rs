//! Racing data source abstraction

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;

use crate::models::RaceSnapshot;

/// Ways fetching the next races can fail
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DataSourceError {
    #[error("invalid racing API url: {0}")]
    InvalidUrl(String),
    #[error("invalid response from racing API: {0}")]
    InvalidResponse(String),
    #[error("failed to decode racing API response: {0}")]
    DecodeFailure(String),
    #[error("racing API returned server error {0}")]
    ServerError(u16),
    #[error("unknown racing API error")]
    Unknown,
}

impl DataSourceError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            DataSourceError::InvalidUrl(_) => "invalid_url",
            DataSourceError::InvalidResponse(_) => "invalid_response",
            DataSourceError::DecodeFailure(_) => "decode_failure",
            DataSourceError::ServerError(_) => "server_error",
            DataSourceError::Unknown => "unknown",
        }
    }
}

/// Anything able to produce the next races to go
pub trait DataSource: Send + Sync {
    /// Fetch up to `count` upcoming races as one complete snapshot
    fn fetch_next_races(&self, count: usize) -> BoxFuture<'_, Result<RaceSnapshot, DataSourceError>>;
}
