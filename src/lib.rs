//! Next To Go - A live countdown to the next races starting
//! 
//! This library polls a racing API for upcoming races, selects the ones to
//! show for a category filter, and keeps one countdown timer per selected
//! race in a single process-wide timer registry.

pub mod api;
pub mod config;
pub mod models;
pub mod racing;
pub mod services;
pub mod state;
pub mod tasks;
pub mod timers;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use models::{CategoryFilter, RaceRecord, RaceSnapshot};
pub use racing::{RaceSelector, RaceView, RaceWatchCoordinator};
pub use state::AppState;
pub use timers::{TimerHandle, TimerRegistry};
pub use utils::signals::shutdown_signal;
