//! Background tasks module
//! 
//! This module contains background tasks that run alongside the HTTP server.

pub mod refresh_scheduler;
pub mod timer_tick;

// Re-export main functions
pub use refresh_scheduler::{
    refresh_scheduler_task, RefreshScheduler, DEFAULT_RACE_COUNT, DEFAULT_REFRESH_PERIOD,
};
pub use timer_tick::timer_tick_task;
