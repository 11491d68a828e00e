//! Race records and snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One race as received from the racing API. Never mutated after decoding;
/// whether it is upcoming depends only on the clock it is compared against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub id: String,
    pub name: String,
    pub number: u32,
    pub meeting_id: String,
    pub meeting_name: String,
    pub category_id: String,
    pub venue_id: String,
    pub venue_name: String,
    pub venue_state: String,
    pub venue_country: String,
    pub advertised_start: DateTime<Utc>,
}

impl RaceRecord {
    /// A race is upcoming while its advertised start is strictly after `now`
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.advertised_start > now
    }

    /// Signed seconds from `now` until the advertised start
    pub fn seconds_until(&self, now: DateTime<Utc>) -> f64 {
        (self.advertised_start - now).num_milliseconds() as f64 / 1000.0
    }
}

/// The complete set of races known after one refresh. Each snapshot replaces
/// the previous one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub races: Vec<RaceRecord>,
    pub status: Option<i64>,
    pub message: Option<String>,
}

impl RaceSnapshot {
    pub fn new(races: Vec<RaceRecord>) -> Self {
        Self {
            races,
            status: None,
            message: None,
        }
    }

    pub fn len(&self) -> usize {
        self.races.len()
    }

    pub fn is_empty(&self) -> bool {
        self.races.is_empty()
    }
}
