//! Timer tick background task

use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::{state::AppState, timers::TICK_INTERVAL};

/// Background task driving the timer registry once per [`TICK_INTERVAL`].
///
/// After each tick, if a watched race's timer ran out, the selection is
/// recomputed so the list is topped back up.
pub async fn timer_tick_task(state: Arc<AppState>) {
    info!("Starting timer tick task");

    let mut ticker = interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let snapshot = state.timers.tick();
        trace!("Tick {} published {} timers", snapshot.tick, snapshot.len());

        if state.watcher.has_expired() {
            debug!("A watched race has started, reselecting races");
            let views = state.watcher.recompute();
            debug!("Now displaying {} races", views.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{RaceRecord, RaceSnapshot},
        racing::RaceWatchCoordinator,
        timers::TimerRegistry,
        utils::Clock,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::time::Duration as StdDuration;
    use tokio::time::Instant;

    /// Wall clock that follows tokio's (possibly paused) time
    struct TokioClock {
        base: DateTime<Utc>,
        started: Instant,
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            let elapsed = Duration::from_std(self.started.elapsed()).unwrap_or_else(|_| Duration::zero());
            self.base + elapsed
        }
    }

    fn race(id: &str, offset_secs: i64) -> RaceRecord {
        RaceRecord {
            id: id.to_string(),
            name: id.to_string(),
            number: 1,
            meeting_id: "m".to_string(),
            meeting_name: "Bendigo".to_string(),
            category_id: "9daef0d7-bf3c-4f50-921d-8e818c60fe61".to_string(),
            venue_id: "v".to_string(),
            venue_name: "Bendigo".to_string(),
            venue_state: "VIC".to_string(),
            venue_country: "AUS".to_string(),
            advertised_start: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_count_down_watched_races() {
        let timers = Arc::new(TimerRegistry::new());
        let watcher = Arc::new(RaceWatchCoordinator::new(Arc::clone(&timers)));
        let state = Arc::new(AppState::new(0, "127.0.0.1".to_string(), timers, watcher));
        state
            .watcher
            .apply_snapshot(RaceSnapshot::new(vec![race("later", 3600)]));
        let handle = state.watcher.watched_handles()[0];
        let start = state.timers.remaining(handle).unwrap();

        let task = tokio::spawn(timer_tick_task(Arc::clone(&state)));
        tokio::time::sleep(StdDuration::from_millis(3500)).await;
        task.abort();

        assert_eq!(state.timers.remaining(handle), Some(start - 3.0));
        assert_eq!(state.watcher.views()[0].remaining_seconds, (start - 3.0) as u64);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_race_is_backfilled() {
        let base = Utc.with_ymd_and_hms(2024, 11, 6, 14, 0, 0).unwrap();
        let races: Vec<RaceRecord> = [("soon", 2), ("r2", 100), ("r3", 200), ("r4", 300), ("r5", 400), ("r6", 500)]
            .into_iter()
            .map(|(id, secs)| RaceRecord {
                advertised_start: base + Duration::seconds(secs),
                ..race(id, 0)
            })
            .collect();

        let timers = Arc::new(TimerRegistry::new());
        let clock = Arc::new(TokioClock {
            base,
            started: Instant::now(),
        });
        let watcher = Arc::new(RaceWatchCoordinator::with_clock(Arc::clone(&timers), clock));
        let state = Arc::new(AppState::new(0, "127.0.0.1".to_string(), timers, watcher));
        state.watcher.apply_snapshot(RaceSnapshot::new(races));
        let soon = state.watcher.watched_handles()[0];

        let task = tokio::spawn(timer_tick_task(Arc::clone(&state)));
        tokio::time::sleep(StdDuration::from_millis(3500)).await;
        task.abort();

        let ids: Vec<String> = state.watcher.views().into_iter().map(|view| view.race_id).collect();
        assert_eq!(ids, vec!["r2", "r3", "r4", "r5", "r6"]);
        assert!(!state.timers.contains(soon));
        assert!(!state.watcher.watched_handles().contains(&soon));
        assert_eq!(state.timers.len(), 5);
        assert!(!state.watcher.has_expired());
    }
}
