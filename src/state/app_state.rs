//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tracing::{info, warn};

use super::FeedState;
use crate::{
    models::{CategoryFilter, RaceSnapshot},
    racing::{RaceView, RaceWatchCoordinator},
    services::DataSourceError,
    timers::TimerRegistry,
};

/// Main application state shared by the HTTP handlers and background tasks
#[derive(Debug)]
pub struct AppState {
    /// Process-wide countdown timers
    pub timers: Arc<TimerRegistry>,
    /// Selected races and their timers
    pub watcher: Arc<RaceWatchCoordinator>,
    /// Refresh outcome and loading flag
    pub feed_state: Arc<Mutex<FeedState>>,
    /// Wakes the refresh scheduler for an immediate refresh
    pub refresh_notify: Arc<Notify>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Create a new AppState around an existing registry and coordinator
    pub fn new(
        port: u16,
        host: String,
        timers: Arc<TimerRegistry>,
        watcher: Arc<RaceWatchCoordinator>,
    ) -> Self {
        Self {
            timers,
            watcher,
            feed_state: Arc::new(Mutex::new(FeedState::new())),
            refresh_notify: Arc::new(Notify::new()),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Apply an update to the feed state and return the new state
    pub fn update_feed<F>(&self, updater: F) -> Result<FeedState, String>
    where
        F: FnOnce(&mut FeedState),
    {
        let mut feed = self.feed_state.lock()
            .map_err(|e| format!("Failed to lock feed state: {}", e))?;

        updater(&mut *feed);
        Ok(feed.clone())
    }

    /// Record the last client action
    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Change the category filter and return the new race list
    pub fn set_filter(&self, filter: CategoryFilter) -> Vec<RaceView> {
        self.record_action(&format!("filter:{}", filter));
        self.watcher.set_filter(filter)
    }

    /// Ask the refresh scheduler to fetch immediately
    pub fn request_refresh(&self) -> Result<FeedState, String> {
        info!("Immediate refresh requested");
        self.record_action("refresh");
        let feed = self.update_feed(|feed| feed.loading = true)?;
        self.refresh_notify.notify_one();
        Ok(feed)
    }

    /// Mark a refresh attempt as in flight
    pub fn begin_refresh(&self) -> Result<(), String> {
        self.update_feed(|feed| feed.begin(Utc::now()))?;
        Ok(())
    }

    /// Apply the outcome of a refresh attempt.
    ///
    /// A good snapshot replaces the watched races; a failure only records the
    /// error so the races already on display stay there.
    pub fn complete_refresh(
        &self,
        result: Result<RaceSnapshot, DataSourceError>,
    ) -> Result<usize, DataSourceError> {
        match result {
            Ok(snapshot) => {
                let races = snapshot.len();
                let status = snapshot.status;
                let message = snapshot.message.clone();
                let views = self.watcher.apply_snapshot(snapshot);

                if let Err(e) = self.update_feed(|feed| feed.succeed(Utc::now(), status, message, races)) {
                    warn!("Failed to record refresh success: {}", e);
                }
                info!("Refreshed {} races, displaying {}", races, views.len());
                Ok(views.len())
            }
            Err(error) => {
                let recorded = error.clone();
                if let Err(e) = self.update_feed(|feed| feed.fail(recorded)) {
                    warn!("Failed to record refresh failure: {}", e);
                }
                Err(error)
            }
        }
    }

    /// Get current feed state
    pub fn get_feed_state(&self) -> Result<FeedState, String> {
        self.feed_state.lock()
            .map(|feed| feed.clone())
            .map_err(|e| format!("Failed to lock feed state: {}", e))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Release every watched race and timer before exit
    pub fn shutdown(&self) {
        self.watcher.shutdown();
        self.timers.clear();
        info!("Released all race timers");
    }
}
