//! Periodic race refresh background task

use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::{
    services::{DataSource, DataSourceError},
    state::AppState,
};

/// Time between refreshes when nothing asks for one sooner
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(60);

/// Number of races requested per refresh
pub const DEFAULT_RACE_COUNT: usize = 20;

/// Polls the data source and hands each snapshot to the race watcher.
///
/// One scheduler owns all fetching, so at most one request is in flight and
/// every finished attempt, good or bad, schedules exactly one more.
pub struct RefreshScheduler {
    state: Arc<AppState>,
    source: Arc<dyn DataSource>,
    period: Duration,
    race_count: usize,
}

impl RefreshScheduler {
    pub fn new(state: Arc<AppState>, source: Arc<dyn DataSource>) -> Self {
        Self {
            state,
            source,
            period: DEFAULT_REFRESH_PERIOD,
            race_count: DEFAULT_RACE_COUNT,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_race_count(mut self, race_count: usize) -> Self {
        self.race_count = race_count;
        self
    }

    /// Fetch once and apply the result. Returns the number of races displayed.
    pub async fn refresh_once(&self) -> Result<usize, DataSourceError> {
        if let Err(e) = self.state.begin_refresh() {
            error!("Failed to mark refresh as started: {}", e);
        }

        debug!("Requesting next {} races", self.race_count);
        let result = self.source.fetch_next_races(self.race_count).await;
        self.state.complete_refresh(result)
    }

    /// Refresh forever: once now, then after every period or manual request
    pub async fn run(self) {
        info!(
            "Starting refresh scheduler: every {}s, {} races per request",
            self.period.as_secs(),
            self.race_count
        );
        let notify = Arc::clone(&self.state.refresh_notify);

        loop {
            match self.refresh_once().await {
                Ok(displayed) => debug!("Refresh complete, {} races displayed", displayed),
                Err(e) => {
                    let failures = self
                        .state
                        .get_feed_state()
                        .map(|feed| feed.consecutive_failures)
                        .unwrap_or_default();
                    warn!(
                        "Refresh failed ({} in a row), retrying in {}s: {}",
                        failures,
                        self.period.as_secs(),
                        e
                    );
                }
            }

            tokio::select! {
                _ = sleep(self.period) => {
                    debug!("Refresh period elapsed");
                }
                _ = notify.notified() => {
                    info!("Refreshing on request");
                }
            }
        }
    }
}

/// Background task running a [`RefreshScheduler`]
pub async fn refresh_scheduler_task(scheduler: RefreshScheduler) {
    scheduler.run().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{RaceRecord, RaceSnapshot},
        racing::RaceWatchCoordinator,
        timers::TimerRegistry,
    };
    use chrono::Utc;
    use futures::future::{BoxFuture, FutureExt};
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    /// Replays scripted results and records how many fetches overlap
    #[derive(Default)]
    struct ScriptedSource {
        results: Mutex<VecDeque<Result<RaceSnapshot, DataSourceError>>>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(results: Vec<Result<RaceSnapshot, DataSourceError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                ..Default::default()
            }
        }
    }

    impl DataSource for ScriptedSource {
        fn fetch_next_races(&self, _count: usize) -> BoxFuture<'_, Result<RaceSnapshot, DataSourceError>> {
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_millis(100)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);

                self.results
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or(Err(DataSourceError::Unknown))
            }
            .boxed()
        }
    }

    fn snapshot(ids: &[&str]) -> RaceSnapshot {
        let races = ids
            .iter()
            .enumerate()
            .map(|(i, id)| RaceRecord {
                id: id.to_string(),
                name: id.to_string(),
                number: i as u32 + 1,
                meeting_id: "m".to_string(),
                meeting_name: "Sandown".to_string(),
                category_id: "4a2788f8-e825-4d36-9894-efd4baf1cfae".to_string(),
                venue_id: "v".to_string(),
                venue_name: "Sandown".to_string(),
                venue_state: "VIC".to_string(),
                venue_country: "AUS".to_string(),
                advertised_start: Utc::now() + chrono::Duration::minutes(10 + i as i64),
            })
            .collect();
        RaceSnapshot::new(races)
    }

    fn app_state() -> Arc<AppState> {
        let timers = Arc::new(TimerRegistry::new());
        let watcher = Arc::new(RaceWatchCoordinator::new(Arc::clone(&timers)));
        Arc::new(AppState::new(0, "127.0.0.1".to_string(), timers, watcher))
    }

    #[tokio::test]
    async fn refresh_once_applies_snapshot() {
        let state = app_state();
        let source = Arc::new(ScriptedSource::new(vec![Ok(snapshot(&["a", "b"]))]));
        let scheduler = RefreshScheduler::new(Arc::clone(&state), source);

        assert_eq!(scheduler.refresh_once().await, Ok(2));
        assert_eq!(state.watcher.views().len(), 2);
        assert!(!state.get_feed_state().unwrap().loading);
    }

    #[tokio::test]
    async fn refresh_once_surfaces_typed_error() {
        let state = app_state();
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(snapshot(&["a"])),
            Err(DataSourceError::ServerError(502)),
        ]));
        let scheduler = RefreshScheduler::new(Arc::clone(&state), source);

        scheduler.refresh_once().await.unwrap();
        let result = scheduler.refresh_once().await;

        assert_eq!(result, Err(DataSourceError::ServerError(502)));
        assert_eq!(state.watcher.views().len(), 1);
        assert_eq!(
            state.get_feed_state().unwrap().last_error,
            Some(DataSourceError::ServerError(502))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reschedules_after_success_and_failure() {
        let state = app_state();
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(snapshot(&["a"])),
            Err(DataSourceError::DecodeFailure("bad".to_string())),
            Ok(snapshot(&["a", "b", "c"])),
        ]));
        let scheduler = RefreshScheduler::new(Arc::clone(&state), source.clone())
            .with_period(Duration::from_secs(30));

        let task = tokio::spawn(refresh_scheduler_task(scheduler));
        sleep(Duration::from_secs(65)).await;
        task.abort();

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(state.watcher.views().len(), 3);
        assert_eq!(state.get_feed_state().unwrap().last_error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_never_overlaps_a_fetch() {
        let state = app_state();
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(snapshot(&["a"])),
            Ok(snapshot(&["a", "b"])),
        ]));
        let scheduler = RefreshScheduler::new(Arc::clone(&state), source.clone());

        let task = tokio::spawn(refresh_scheduler_task(scheduler));
        // Lands while the first fetch is still in flight
        sleep(Duration::from_millis(50)).await;
        state.request_refresh().unwrap();
        state.request_refresh().unwrap();
        sleep(Duration::from_secs(1)).await;
        task.abort();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(state.watcher.views().len(), 2);
    }
}
