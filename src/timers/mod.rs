//! Countdown timer management
//!
//! A single registry owns every countdown timer in the process. Timers are
//! referenced only through opaque handles and observed through full-set
//! snapshots published once per tick.

pub mod registry;

// Re-export main types
pub use registry::{
    SubscriptionId, TimerEntry, TimerHandle, TimerRegistry, TimerSnapshot, TICK_INTERVAL,
};
