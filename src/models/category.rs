//! Race category filter

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

const GREYHOUND_CATEGORY_ID: &str = "9daef0d7-bf3c-4f50-921d-8e818c60fe61";
const HORSE_CATEGORY_ID: &str = "161d9be2-e909-4326-8c2c-35ed71fb460b";
const HARNESS_CATEGORY_ID: &str = "4a2788f8-e825-4d36-9894-efd4baf1cfae";

/// Every filter a client can pick from, in display order
pub const ALL_FILTERS: [CategoryFilter; 4] = [
    CategoryFilter::All,
    CategoryFilter::Greyhound,
    CategoryFilter::Horse,
    CategoryFilter::Harness,
];

/// Selects which races are eligible for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    #[default]
    All,
    Greyhound,
    Horse,
    Harness,
}

impl CategoryFilter {
    /// Category identifier used by the racing API, `None` for `All`
    pub fn category_id(&self) -> Option<&'static str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Greyhound => Some(GREYHOUND_CATEGORY_ID),
            CategoryFilter::Horse => Some(HORSE_CATEGORY_ID),
            CategoryFilter::Harness => Some(HARNESS_CATEGORY_ID),
        }
    }

    /// Map a racing API category identifier back to its filter
    pub fn from_category_id(category_id: &str) -> Option<Self> {
        ALL_FILTERS
            .into_iter()
            .find(|filter| filter.category_id() == Some(category_id))
    }

    /// Whether a race with this category identifier passes the filter
    pub fn matches(&self, category_id: &str) -> bool {
        match self.category_id() {
            None => true,
            Some(id) => id == category_id,
        }
    }

    /// Key the presentation layer uses to pick an icon
    pub fn icon_key(&self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Greyhound => "greyhound",
            CategoryFilter::Horse => "horse",
            CategoryFilter::Harness => "harness",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Greyhound => "Greyhound Racing",
            CategoryFilter::Horse => "Horse Racing",
            CategoryFilter::Harness => "Harness Racing",
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.icon_key())
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(CategoryFilter::All),
            "greyhound" | "greyhound-racing" => Ok(CategoryFilter::Greyhound),
            "horse" | "horse-racing" => Ok(CategoryFilter::Horse),
            "harness" | "harness-racing" => Ok(CategoryFilter::Harness),
            other => Err(format!("Unknown race category: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_filter_names() {
        assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert_eq!("Horse".parse::<CategoryFilter>(), Ok(CategoryFilter::Horse));
        assert_eq!(
            "harness-racing".parse::<CategoryFilter>(),
            Ok(CategoryFilter::Harness)
        );
        assert!("camel".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn all_matches_every_category() {
        assert!(CategoryFilter::All.matches(HORSE_CATEGORY_ID));
        assert!(CategoryFilter::All.matches("anything"));
        assert!(CategoryFilter::Horse.matches(HORSE_CATEGORY_ID));
        assert!(!CategoryFilter::Horse.matches(HARNESS_CATEGORY_ID));
    }

    #[test]
    fn category_ids_round_trip() {
        for filter in ALL_FILTERS.into_iter().skip(1) {
            let id = filter.category_id().unwrap();
            assert_eq!(CategoryFilter::from_category_id(id), Some(filter));
        }
        assert_eq!(CategoryFilter::from_category_id("unknown"), None);
    }
}
