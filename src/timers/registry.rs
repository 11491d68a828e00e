//! Central countdown timer registry

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard,
    },
    time::Duration,
};
use serde::Serialize;
use tracing::{debug, trace};

/// How often the registry is ticked. Whole seconds keep every observed
/// remaining time integral for timers created with integral durations.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Opaque identifier for a timer, minted by [`TimerRegistry::add_timer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Identifier for a tick subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// State of one countdown timer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerEntry {
    pub handle: TimerHandle,
    pub remaining_seconds: f64,
    /// Stopped timers keep their remaining time but are skipped by ticks
    pub running: bool,
}

/// A consistent copy of the whole timer set at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerSnapshot {
    /// Number of ticks performed before this snapshot was taken
    pub tick: u64,
    minted: u64,
    entries: HashMap<TimerHandle, TimerEntry>,
}

impl TimerSnapshot {
    pub fn get(&self, handle: TimerHandle) -> Option<&TimerEntry> {
        self.entries.get(&handle)
    }

    pub fn remaining(&self, handle: TimerHandle) -> Option<f64> {
        self.entries.get(&handle).map(|entry| entry.remaining_seconds)
    }

    pub fn contains(&self, handle: TimerHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Whether `handle` had been minted when this snapshot was taken. A handle
    /// that is covered but absent has been evicted or removed.
    pub fn covers(&self, handle: TimerHandle) -> bool {
        handle.0 < self.minted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type TickCallback = Box<dyn Fn(&TimerSnapshot) + Send + Sync>;

#[derive(Debug, Default)]
struct TimerTable {
    entries: HashMap<TimerHandle, TimerEntry>,
    next_handle: u64,
    ticks: u64,
}

impl TimerTable {
    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            tick: self.ticks,
            minted: self.next_handle,
            entries: self.entries.clone(),
        }
    }
}

/// Owns every countdown timer in the process.
///
/// Built once by the composition root and shared behind an `Arc`. The timer
/// table is only mutated by the methods below; everyone else sees snapshots.
/// Subscribers are called synchronously from [`TimerRegistry::tick`] and must
/// not call back into the registry.
pub struct TimerRegistry {
    step_seconds: f64,
    table: Mutex<TimerTable>,
    subscribers: Mutex<BTreeMap<SubscriptionId, TickCallback>>,
    next_subscription: AtomicU64,
}

impl TimerRegistry {
    /// Create a registry ticking every [`TICK_INTERVAL`]
    pub fn new() -> Self {
        Self::with_interval(TICK_INTERVAL)
    }

    /// Create a registry whose ticks subtract `interval` from every running timer
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            step_seconds: interval.as_secs_f64(),
            table: Mutex::new(TimerTable::default()),
            subscribers: Mutex::new(BTreeMap::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    fn lock_table(&self) -> MutexGuard<'_, TimerTable> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, BTreeMap<SubscriptionId, TickCallback>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a new running timer. Zero or negative durations are accepted and
    /// evicted on the next tick.
    pub fn add_timer(&self, duration_seconds: f64) -> TimerHandle {
        let mut table = self.lock_table();
        let handle = TimerHandle(table.next_handle);
        table.next_handle += 1;
        table.entries.insert(
            handle,
            TimerEntry {
                handle,
                remaining_seconds: duration_seconds,
                running: true,
            },
        );
        debug!("Added {} with {:.1}s remaining", handle, duration_seconds);
        handle
    }

    /// Pause a timer without removing it. Unknown handles are ignored.
    pub fn stop_timer(&self, handle: TimerHandle) {
        if let Some(entry) = self.lock_table().entries.get_mut(&handle) {
            entry.running = false;
            debug!("Stopped {}", handle);
        }
    }

    /// Stop and delete a timer. Unknown handles are ignored.
    pub fn remove_timer(&self, handle: TimerHandle) {
        if self.lock_table().entries.remove(&handle).is_some() {
            debug!("Removed {}", handle);
        }
    }

    /// Overwrite the remaining time of a registered timer. A handle that is no
    /// longer registered stays gone.
    pub fn reset_timer(&self, handle: TimerHandle, duration_seconds: f64) {
        match self.lock_table().entries.get_mut(&handle) {
            Some(entry) => {
                entry.remaining_seconds = duration_seconds;
                debug!("Reset {} to {:.1}s", handle, duration_seconds);
            }
            None => trace!("Ignoring reset of unknown {}", handle),
        }
    }

    /// Remove every timer
    pub fn clear(&self) {
        let mut table = self.lock_table();
        let count = table.entries.len();
        table.entries.clear();
        debug!("Cleared {} timers", count);
    }

    /// Advance every running timer by one interval, evict the ones that reached
    /// zero, and publish the resulting snapshot to every subscriber.
    pub fn tick(&self) -> TimerSnapshot {
        let snapshot = {
            let mut table = self.lock_table();
            table.ticks += 1;

            let step = self.step_seconds;
            let mut expired = Vec::new();
            for entry in table.entries.values_mut().filter(|entry| entry.running) {
                entry.remaining_seconds -= step;
                if entry.remaining_seconds <= 0.0 {
                    expired.push(entry.handle);
                }
            }
            for handle in &expired {
                table.entries.remove(handle);
                debug!("{} expired", handle);
            }

            table.snapshot()
        };

        trace!("Tick {}: {} timers live", snapshot.tick, snapshot.len());
        self.publish(&snapshot);
        snapshot
    }

    fn publish(&self, snapshot: &TimerSnapshot) {
        let subscribers = self.lock_subscribers();
        for callback in subscribers.values() {
            callback(snapshot);
        }
    }

    /// Register a callback invoked with the full snapshot on every tick
    #[must_use = "the subscription must be cancelled with `unsubscribe`"]
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&TimerSnapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.lock_subscribers().insert(id, Box::new(callback));
        id
    }

    /// Cancel a subscription. Once this returns the callback is never invoked
    /// again, even if a tick is being published concurrently.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock_subscribers().remove(&id);
    }

    /// Copy of the current timer set
    pub fn snapshot(&self) -> TimerSnapshot {
        self.lock_table().snapshot()
    }

    pub fn contains(&self, handle: TimerHandle) -> bool {
        self.lock_table().entries.contains_key(&handle)
    }

    pub fn remaining(&self, handle: TimerHandle) -> Option<f64> {
        self.lock_table()
            .entries
            .get(&handle)
            .map(|entry| entry.remaining_seconds)
    }

    pub fn len(&self) -> usize {
        self.lock_table().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_table().entries.is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerRegistry")
            .field("step_seconds", &self.step_seconds)
            .field("timers", &self.len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
