//! Next-to-go race watching
//!
//! Selection of the races to show, the coordinator that keeps one countdown
//! timer per selected race, and the display entries handed to clients.

pub mod coordinator;
pub mod countdown;
pub mod selector;
pub mod view;

// Re-export main types
pub use coordinator::RaceWatchCoordinator;
pub use countdown::{display_seconds, format_countdown};
pub use selector::{RaceSelector, MIN_DISPLAYED_RACES};
pub use view::RaceView;
