//! Selection of the races to watch

use chrono::{DateTime, Utc};

use crate::models::{CategoryFilter, RaceRecord};

/// Number of races the list tries to show, and never exceeds
pub const MIN_DISPLAYED_RACES: usize = 5;

/// Picks the races to display from a snapshot. Pure: no timers, no clock.
#[derive(Debug, Clone, Copy)]
pub struct RaceSelector {
    display_count: usize,
}

impl RaceSelector {
    pub fn new(display_count: usize) -> Self {
        Self { display_count }
    }

    /// Select up to `display_count` upcoming races ordered by start time.
    ///
    /// Races matching `filter` come first; when there are too few of them the
    /// list is topped up with the soonest upcoming races of other categories.
    /// Sorting is stable, so races starting at the same instant keep their
    /// snapshot order.
    pub fn select(
        &self,
        races: &[RaceRecord],
        filter: CategoryFilter,
        now: DateTime<Utc>,
    ) -> Vec<RaceRecord> {
        let (mut matching, mut others): (Vec<&RaceRecord>, Vec<&RaceRecord>) = races
            .iter()
            .filter(|race| race.is_upcoming(now))
            .partition(|race| filter.matches(&race.category_id));

        matching.sort_by_key(|race| race.advertised_start);
        matching.truncate(self.display_count);

        if matching.len() < self.display_count {
            let needed = self.display_count - matching.len();
            others.sort_by_key(|race| race.advertised_start);

            let backfill: Vec<&RaceRecord> = others
                .into_iter()
                .filter(|race| !matching.iter().any(|selected| selected.id == race.id))
                .take(needed)
                .collect();
            matching.extend(backfill);
            matching.sort_by_key(|race| race.advertised_start);
        }

        matching.into_iter().cloned().collect()
    }
}

impl Default for RaceSelector {
    fn default() -> Self {
        Self::new(MIN_DISPLAYED_RACES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const HORSE: &str = "161d9be2-e909-4326-8c2c-35ed71fb460b";
    const HARNESS: &str = "4a2788f8-e825-4d36-9894-efd4baf1cfae";
    const GREYHOUND: &str = "9daef0d7-bf3c-4f50-921d-8e818c60fe61";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 6, 12, 0, 0).unwrap()
    }

    fn race(id: &str, category_id: &str, offset_secs: i64) -> RaceRecord {
        RaceRecord {
            id: id.to_string(),
            name: format!("Race {}", id),
            number: 1,
            meeting_id: format!("meeting-{}", id),
            meeting_name: "Meeting".to_string(),
            category_id: category_id.to_string(),
            venue_id: "venue".to_string(),
            venue_name: "Venue".to_string(),
            venue_state: "NSW".to_string(),
            venue_country: "AUS".to_string(),
            advertised_start: now() + Duration::seconds(offset_secs),
        }
    }

    fn ids(races: &[RaceRecord]) -> Vec<&str> {
        races.iter().map(|race| race.id.as_str()).collect()
    }

    fn is_sorted(races: &[RaceRecord]) -> bool {
        races
            .windows(2)
            .all(|pair| pair[0].advertised_start <= pair[1].advertised_start)
    }

    #[test]
    fn backfills_matching_races_with_soonest_others() {
        let races = vec![
            race("x1", HARNESS, 100),
            race("x2", HARNESS, 200),
            race("x3", HARNESS, 9000),
            race("o1", HORSE, 400),
            race("o2", HORSE, 300),
            race("o3", GREYHOUND, 5000),
            race("o4", GREYHOUND, 6000),
            race("o5", HORSE, 7000),
            race("o6", GREYHOUND, 8000),
            race("o7", HORSE, 9500),
        ];

        let selected = RaceSelector::default().select(&races, CategoryFilter::Harness, now());

        assert_eq!(ids(&selected), vec!["x1", "x2", "o2", "o1", "x3"]);
        assert!(is_sorted(&selected));
    }

    #[test]
    fn backfill_precedes_matching_races_when_sooner() {
        let races = vec![
            race("x1", HARNESS, 600),
            race("o1", HORSE, 30),
            race("o2", HORSE, 60),
            race("o3", HORSE, 90),
            race("o4", HORSE, 120),
            race("o5", HORSE, 150),
        ];

        let selected = RaceSelector::default().select(&races, CategoryFilter::Harness, now());
        assert_eq!(ids(&selected), vec!["o1", "o2", "o3", "o4", "x1"]);
    }

    #[test]
    fn never_returns_more_than_five() {
        let races: Vec<RaceRecord> = (0..12)
            .map(|i| race(&format!("r{}", i), HORSE, 60 * (12 - i)))
            .collect();

        for filter in crate::models::ALL_FILTERS {
            let selected = RaceSelector::default().select(&races, filter, now());
            assert_eq!(selected.len(), MIN_DISPLAYED_RACES);
            assert!(is_sorted(&selected));
        }
    }

    #[test]
    fn all_filter_takes_soonest_five() {
        let races: Vec<RaceRecord> = (0..8)
            .map(|i| race(&format!("r{}", i), HORSE, 1000 - 100 * i))
            .collect();

        let selected = RaceSelector::default().select(&races, CategoryFilter::All, now());
        assert_eq!(ids(&selected), vec!["r7", "r6", "r5", "r4", "r3"]);
    }

    #[test]
    fn matching_races_win_over_sooner_others() {
        let mut races: Vec<RaceRecord> = (0..6)
            .map(|i| race(&format!("h{}", i), HORSE, 1000 + i))
            .collect();
        races.push(race("g0", GREYHOUND, 10));

        let selected = RaceSelector::default().select(&races, CategoryFilter::Horse, now());
        assert_eq!(ids(&selected), vec!["h0", "h1", "h2", "h3", "h4"]);
    }

    #[test]
    fn past_races_are_never_selected() {
        let races = vec![
            race("past", HORSE, -10),
            race("starting", HORSE, 0),
            race("a", GREYHOUND, 60),
            race("b", HARNESS, 120),
        ];

        for filter in crate::models::ALL_FILTERS {
            let selected = RaceSelector::default().select(&races, filter, now());
            assert!(selected.iter().all(|race| race.advertised_start > now()));
            assert!(!ids(&selected).contains(&"past"));
            assert!(!ids(&selected).contains(&"starting"));
        }
    }

    #[test]
    fn returns_everything_when_fewer_than_five_upcoming() {
        let races = vec![
            race("a", HORSE, 300),
            race("b", GREYHOUND, 60),
            race("c", HARNESS, -5),
        ];

        let selected = RaceSelector::default().select(&races, CategoryFilter::Horse, now());
        assert_eq!(ids(&selected), vec!["b", "a"]);
    }

    #[test]
    fn empty_snapshot_selects_nothing() {
        let selected = RaceSelector::default().select(&[], CategoryFilter::All, now());
        assert!(selected.is_empty());
    }

    #[test]
    fn equal_start_times_keep_snapshot_order() {
        let races = vec![
            race("first", HORSE, 120),
            race("second", HORSE, 120),
            race("third", HORSE, 60),
        ];

        let selected = RaceSelector::default().select(&races, CategoryFilter::All, now());
        assert_eq!(ids(&selected), vec!["third", "first", "second"]);
    }

    #[test]
    fn custom_display_count() {
        let races: Vec<RaceRecord> = (0..4)
            .map(|i| race(&format!("r{}", i), HORSE, 60 * (i + 1)))
            .collect();

        let selected = RaceSelector::new(2).select(&races, CategoryFilter::Harness, now());
        assert_eq!(ids(&selected), vec!["r0", "r1"]);
    }
}
