//! State management module
//! 
//! This module contains the shared application state handed to the HTTP
//! handlers and background tasks.

pub mod app_state;
pub mod feed_state;

// Re-export main types
pub use app_state::AppState;
pub use feed_state::{FeedError, FeedState};
