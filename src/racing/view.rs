//! Display-ready race entries

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::countdown::{display_seconds, format_countdown};
use crate::{
    models::{CategoryFilter, RaceRecord},
    timers::TimerHandle,
};

/// One row of the next-to-go list as handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceView {
    pub race_id: String,
    pub race_name: String,
    pub race_number: u32,
    pub meeting_name: String,
    pub category_icon: String,
    pub venue_name: String,
    pub venue_state: String,
    pub venue_country: String,
    pub advertised_start: DateTime<Utc>,
    pub remaining_seconds: u64,
    pub countdown: String,
    pub timer: TimerHandle,
}

impl RaceView {
    pub fn new(race: &RaceRecord, timer: TimerHandle, remaining_seconds: f64) -> Self {
        let remaining = display_seconds(remaining_seconds);
        let category_icon = CategoryFilter::from_category_id(&race.category_id)
            .map(|category| category.icon_key())
            .unwrap_or("unknown");

        Self {
            race_id: race.id.clone(),
            race_name: race.name.clone(),
            race_number: race.number,
            meeting_name: race.meeting_name.clone(),
            category_icon: category_icon.to_string(),
            venue_name: race.venue_name.clone(),
            venue_state: race.venue_state.clone(),
            venue_country: race.venue_country.clone(),
            advertised_start: race.advertised_start,
            remaining_seconds: remaining,
            countdown: format_countdown(remaining),
            timer,
        }
    }
}
