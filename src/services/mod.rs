//! External service module
//! 
//! This module contains the racing data source the refresh scheduler polls
//! and the HTTP client implementing it.

pub mod data_source;
pub mod racing_api;

// Re-export main types
pub use data_source::{DataSource, DataSourceError};
pub use racing_api::{decode_snapshot, RacingApiClient, DEFAULT_BASE_URL};
