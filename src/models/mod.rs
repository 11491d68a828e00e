//! Race data model
//!
//! Immutable race records as received from the racing API and the category
//! filter used to select which of them are watched.

pub mod category;
pub mod race;

// Re-export main types
pub use category::{CategoryFilter, ALL_FILTERS};
pub use race::{RaceRecord, RaceSnapshot};
