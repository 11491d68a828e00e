//! Racing API client

use std::collections::HashMap;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use super::data_source::{DataSource, DataSourceError};
use crate::models::{RaceRecord, RaceSnapshot};

/// Host of the public racing API
pub const DEFAULT_BASE_URL: &str = "api.neds.com.au";

const RACING_PATH: &str = "rest/v1/racing/";

/// Top-level response of `?method=nextraces`. Every field is optional so a
/// partially broken payload still yields whatever races it carries.
#[derive(Debug, Default, Deserialize)]
struct NextRacesResponse {
    #[serde(default)]
    status: Option<i64>,
    #[serde(default)]
    data: Option<NextRacesData>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NextRacesData {
    #[serde(default)]
    next_to_go_ids: Option<Vec<String>>,
    #[serde(default)]
    race_summaries: Option<HashMap<String, RaceSummary>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RaceSummary {
    race_id: String,
    race_name: String,
    race_number: u32,
    meeting_id: String,
    meeting_name: String,
    category_id: String,
    advertised_start: AdvertisedStart,
    venue_id: String,
    venue_name: String,
    venue_state: String,
    venue_country: String,
}

#[derive(Debug, Default, Deserialize)]
struct AdvertisedStart {
    #[serde(default)]
    seconds: f64,
}

impl RaceSummary {
    fn into_record(self, key: &str) -> RaceRecord {
        let advertised_start =
            DateTime::<Utc>::from_timestamp_millis((self.advertised_start.seconds * 1000.0) as i64)
                .unwrap_or_default();
        let id = if self.race_id.is_empty() {
            key.to_string()
        } else {
            self.race_id
        };

        RaceRecord {
            id,
            name: self.race_name,
            number: self.race_number,
            meeting_id: self.meeting_id,
            meeting_name: self.meeting_name,
            category_id: self.category_id,
            venue_id: self.venue_id,
            venue_name: self.venue_name,
            venue_state: self.venue_state,
            venue_country: self.venue_country,
            advertised_start,
        }
    }
}

/// Decode a `nextraces` response body into a snapshot.
///
/// Races listed in `next_to_go_ids` come first in that order; summaries not
/// listed there follow, ordered by start time then id.
pub fn decode_snapshot(body: &[u8]) -> Result<RaceSnapshot, DataSourceError> {
    let response: NextRacesResponse = serde_json::from_slice(body)
        .map_err(|e| DataSourceError::DecodeFailure(e.to_string()))?;

    let data = response.data.unwrap_or_default();
    let mut summaries = data.race_summaries.unwrap_or_default();
    let mut races = Vec::with_capacity(summaries.len());

    for id in data.next_to_go_ids.unwrap_or_default() {
        if let Some(summary) = summaries.remove(&id) {
            races.push(summary.into_record(&id));
        }
    }

    let mut unlisted: Vec<RaceRecord> = summaries
        .into_iter()
        .map(|(key, summary)| summary.into_record(&key))
        .collect();
    unlisted.sort_by(|a, b| {
        a.advertised_start
            .cmp(&b.advertised_start)
            .then_with(|| a.id.cmp(&b.id))
    });
    races.extend(unlisted);

    Ok(RaceSnapshot {
        races,
        status: response.status,
        message: response.message,
    })
}

/// HTTP client for the racing API's next-to-go endpoint
#[derive(Debug, Clone)]
pub struct RacingApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl RacingApiClient {
    /// `base_url` may be a bare host (`https` is assumed) or a full URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Full URL of the next-races request for `count` races
    pub fn endpoint(&self, count: usize) -> Result<Url, DataSourceError> {
        let base = if self.base_url.contains("://") {
            self.base_url.clone()
        } else {
            format!("https://{}", self.base_url)
        };
        let base = if base.ends_with('/') { base } else { format!("{}/", base) };

        let mut url = Url::parse(&base)
            .and_then(|url| url.join(RACING_PATH))
            .map_err(|e| DataSourceError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(DataSourceError::InvalidUrl(self.base_url.clone()));
        }

        url.query_pairs_mut()
            .append_pair("method", "nextraces")
            .append_pair("count", &count.to_string());
        Ok(url)
    }

    /// Request the next `count` races
    pub async fn fetch(&self, count: usize) -> Result<RaceSnapshot, DataSourceError> {
        let url = self.endpoint(count)?;
        debug!("Fetching next races from {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!("Racing API request failed: {}", e);
                // Connection failures and timeouts carry no HTTP classification
                if e.is_builder() {
                    DataSourceError::InvalidUrl(e.to_string())
                } else {
                    DataSourceError::Unknown
                }
            })?;

        let status = response.status().as_u16();
        match status {
            200..=299 => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| DataSourceError::InvalidResponse(e.to_string()))?;
                let snapshot = decode_snapshot(&body)?;
                debug!("Racing API returned {} races", snapshot.len());
                Ok(snapshot)
            }
            400..=599 => Err(DataSourceError::ServerError(status)),
            _ => Err(DataSourceError::Unknown),
        }
    }
}

impl DataSource for RacingApiClient {
    fn fetch_next_races(&self, count: usize) -> BoxFuture<'_, Result<RaceSnapshot, DataSourceError>> {
        self.fetch(count).boxed()
    }
}
