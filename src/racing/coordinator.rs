//! Binds selected races to countdown timers

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info};

use super::{selector::RaceSelector, view::RaceView};
use crate::{
    models::{CategoryFilter, RaceRecord, RaceSnapshot},
    timers::{SubscriptionId, TimerHandle, TimerRegistry, TimerSnapshot},
    utils::clock::{Clock, SystemClock},
};

/// A selected race and the timer counting down to its start
#[derive(Debug)]
struct WatchedRace {
    race: RaceRecord,
    handle: TimerHandle,
    subscription: Option<SubscriptionId>,
    remaining_seconds: f64,
    /// Registry tick whose value `remaining_seconds` holds
    applied_tick: u64,
    live: bool,
}

#[derive(Debug, Default)]
struct WatchState {
    snapshot: RaceSnapshot,
    filter: CategoryFilter,
    watched: Vec<WatchedRace>,
    /// Set when a watched timer was evicted since the last recompute
    expired: bool,
}

impl WatchState {
    fn views(&self) -> Vec<RaceView> {
        self.watched
            .iter()
            .filter(|watched| watched.live)
            .map(|watched| RaceView::new(&watched.race, watched.handle, watched.remaining_seconds))
            .collect()
    }
}

fn lock_state(state: &Mutex<WatchState>) -> MutexGuard<'_, WatchState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps exactly one live timer per selected race.
///
/// Every snapshot or filter change tears down all timers and tick
/// subscriptions of the previous selection before the new selection gets its
/// own. Recomputes are serialized, so overlapping callers always leave one
/// consistent selection behind.
pub struct RaceWatchCoordinator {
    registry: Arc<TimerRegistry>,
    selector: RaceSelector,
    clock: Arc<dyn Clock>,
    recompute_lock: Mutex<()>,
    state: Arc<Mutex<WatchState>>,
    views_tx: Arc<watch::Sender<Vec<RaceView>>>,
}

impl RaceWatchCoordinator {
    pub fn new(registry: Arc<TimerRegistry>) -> Self {
        Self::with_clock(registry, Arc::new(SystemClock))
    }

    pub fn with_clock(registry: Arc<TimerRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self::with_selector(registry, RaceSelector::default(), clock)
    }

    pub fn with_selector(
        registry: Arc<TimerRegistry>,
        selector: RaceSelector,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (views_tx, _) = watch::channel(Vec::new());

        Self {
            registry,
            selector,
            clock,
            recompute_lock: Mutex::new(()),
            state: Arc::new(Mutex::new(WatchState::default())),
            views_tx: Arc::new(views_tx),
        }
    }

    fn lock_recompute(&self) -> MutexGuard<'_, ()> {
        self.recompute_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the known races and reselect
    pub fn apply_snapshot(&self, snapshot: RaceSnapshot) -> Vec<RaceView> {
        let _guard = self.lock_recompute();
        info!("Applying race snapshot with {} races", snapshot.len());
        lock_state(&self.state).snapshot = snapshot;
        self.rebuild()
    }

    /// Change the category filter and reselect
    pub fn set_filter(&self, filter: CategoryFilter) -> Vec<RaceView> {
        let _guard = self.lock_recompute();
        info!("Setting race filter to: {}", filter);
        lock_state(&self.state).filter = filter;
        self.rebuild()
    }

    /// Reselect from the current snapshot and filter
    pub fn recompute(&self) -> Vec<RaceView> {
        let _guard = self.lock_recompute();
        self.rebuild()
    }

    /// Drop every timer and subscription owned by this coordinator
    pub fn shutdown(&self) {
        let _guard = self.lock_recompute();
        self.teardown();
        self.views_tx.send_replace(Vec::new());
        info!("Race watcher shut down");
    }

    /// Currently displayed races in start order, as last published
    pub fn views(&self) -> Vec<RaceView> {
        self.views_tx.borrow().clone()
    }

    /// Receive the race list every time it is republished
    pub fn subscribe_views(&self) -> watch::Receiver<Vec<RaceView>> {
        self.views_tx.subscribe()
    }

    pub fn filter(&self) -> CategoryFilter {
        lock_state(&self.state).filter
    }

    /// Timer handles of every race in the current selection, live or not
    pub fn watched_handles(&self) -> Vec<TimerHandle> {
        lock_state(&self.state)
            .watched
            .iter()
            .map(|watched| watched.handle)
            .collect()
    }

    /// Whether a watched timer ran out since the last recompute
    pub fn has_expired(&self) -> bool {
        lock_state(&self.state).expired
    }

    // Callers must hold the recompute lock.
    fn rebuild(&self) -> Vec<RaceView> {
        self.teardown();

        let now = self.clock.now();
        let (races, filter) = {
            let state = lock_state(&self.state);
            (state.snapshot.races.clone(), state.filter)
        };

        let watched: Vec<WatchedRace> = self
            .selector
            .select(&races, filter, now)
            .into_iter()
            .map(|race| {
                let duration = race.seconds_until(now);
                let handle = self.registry.add_timer(duration);
                WatchedRace {
                    race,
                    handle,
                    subscription: None,
                    remaining_seconds: duration,
                    applied_tick: 0,
                    live: true,
                }
            })
            .collect();
        let handles: Vec<TimerHandle> = watched.iter().map(|watched| watched.handle).collect();

        {
            let mut state = lock_state(&self.state);
            state.watched = watched;
            state.expired = false;
        }

        let subscriptions: Vec<(TimerHandle, SubscriptionId)> = handles
            .iter()
            .map(|&handle| (handle, self.registry.subscribe(self.tick_callback(handle))))
            .collect();

        let views = {
            let mut state = lock_state(&self.state);
            for (handle, id) in subscriptions {
                if let Some(watched) = state.watched.iter_mut().find(|w| w.handle == handle) {
                    watched.subscription = Some(id);
                }
            }
            state.views()
        };

        debug!(
            "Watching {} races for filter {} out of {} known",
            views.len(),
            filter,
            races.len()
        );
        self.views_tx.send_replace(views.clone());
        views
    }

    fn teardown(&self) {
        let previous = std::mem::take(&mut lock_state(&self.state).watched);
        if previous.is_empty() {
            return;
        }

        for watched in &previous {
            if let Some(id) = watched.subscription {
                self.registry.unsubscribe(id);
            }
            self.registry.stop_timer(watched.handle);
            self.registry.remove_timer(watched.handle);
        }
        debug!("Released {} race timers", previous.len());
    }

    /// Each watched race gets its own callback projecting its handle out of
    /// the snapshot. The list is republished only by the callback that brings
    /// the last live row up to the snapshot's tick, so a published list never
    /// mixes values from two ticks.
    fn tick_callback(&self, handle: TimerHandle) -> impl Fn(&TimerSnapshot) + Send + Sync + 'static {
        let state = Arc::clone(&self.state);
        let views_tx = Arc::clone(&self.views_tx);

        move |snapshot: &TimerSnapshot| {
            let tick = snapshot.tick;

            let views = {
                let mut state = lock_state(&state);
                let Some(watched) = state.watched.iter_mut().find(|w| w.handle == handle) else {
                    return;
                };
                if !watched.live {
                    return;
                }

                watched.applied_tick = tick;
                // Minted after this snapshot was taken: nothing to apply yet
                let evicted = snapshot.covers(handle)
                    && match snapshot.remaining(handle) {
                        Some(remaining) => {
                            watched.remaining_seconds = remaining;
                            false
                        }
                        None => {
                            watched.live = false;
                            debug!("Race {} started, {} evicted", watched.race.id, handle);
                            true
                        }
                    };
                if evicted {
                    state.expired = true;
                }

                if state
                    .watched
                    .iter()
                    .any(|watched| watched.live && watched.applied_tick < tick)
                {
                    return;
                }
                state.views()
            };

            views_tx.send_replace(views);
        }
    }
}

impl std::fmt::Debug for RaceWatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock_state(&self.state);
        f.debug_struct("RaceWatchCoordinator")
            .field("filter", &state.filter)
            .field("known_races", &state.snapshot.len())
            .field("watched", &state.watched.len())
            .field("selector", &self.selector)
            .finish()
    }
}

impl Drop for RaceWatchCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}
