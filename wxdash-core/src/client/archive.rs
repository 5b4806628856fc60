//! Historical-weather client against the Open-Meteo archive service.
//!
//! The archive responds with columnar series: per series a base time, an
//! end time, a step interval, and one value array per requested variable in
//! the exact order the request listed them. Positional binding is a strict
//! contract, so every response goes through an explicit schema check (array
//! count against request arity, array lengths against the generated time
//! axis) before any table is built.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::cache::HttpCache;
use crate::model::{DailyRow, HistoryData, HistoryOutcome, HourlyRow, Location};
use crate::retry::{RetryPolicy, with_retry};
use crate::wmo;

use super::{Geocoder, truncate_body};

const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Hourly variables, in request order. The response binds positionally to
/// this list.
pub const HOURLY_VARIABLES: [&str; 10] = [
    "temperature_2m",
    "relative_humidity_2m",
    "rain",
    "snowfall",
    "snow_depth",
    "weather_code",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
    "is_day",
];

/// Daily variables, in request order.
pub const DAILY_VARIABLES: [&str; 13] = [
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "temperature_2m_mean",
    "sunrise",
    "sunset",
    "precipitation_sum",
    "rain_sum",
    "snowfall_sum",
    "precipitation_hours",
    "wind_speed_10m_max",
    "wind_gusts_10m_max",
    "wind_direction_10m_dominant",
];

/// Contract violations in the archive response. All fatal: a mismatched
/// response must never become a silently misaligned table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("archive returned {got} value arrays where {expected} variables were requested")]
    SchemaMismatch { expected: usize, got: usize },

    #[error("value array {index} holds {got} samples but the time axis has {expected}")]
    LengthMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },

    #[error("invalid time axis: start {start}, end {end}, interval {interval}")]
    InvalidTimeAxis { start: i64, end: i64, interval: i64 },
}

/// One columnar series block as delivered by the archive.
#[derive(Debug, Clone, Deserialize)]
struct SeriesBlock {
    time: i64,
    time_end: i64,
    interval: i64,
    variables: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    hourly: SeriesBlock,
    daily: SeriesBlock,
}

impl SeriesBlock {
    /// Timestamps of the half-open interval `[time, time_end)` at `interval`
    /// steps, left-inclusive.
    fn time_axis(&self) -> Result<Vec<DateTime<Utc>>, ArchiveError> {
        if self.interval <= 0 || self.time_end < self.time {
            return Err(ArchiveError::InvalidTimeAxis {
                start: self.time,
                end: self.time_end,
                interval: self.interval,
            });
        }

        let mut axis = Vec::new();
        let mut ts = self.time;
        while ts < self.time_end {
            let stamp = Utc
                .timestamp_opt(ts, 0)
                .single()
                .ok_or(ArchiveError::InvalidTimeAxis {
                    start: self.time,
                    end: self.time_end,
                    interval: self.interval,
                })?;
            axis.push(stamp);
            ts += self.interval;
        }

        Ok(axis)
    }

    /// Validate arity and per-array lengths, then hand back the time axis.
    fn validate(&self, requested: &[&str]) -> Result<Vec<DateTime<Utc>>, ArchiveError> {
        if self.variables.len() != requested.len() {
            return Err(ArchiveError::SchemaMismatch {
                expected: requested.len(),
                got: self.variables.len(),
            });
        }

        let axis = self.time_axis()?;
        for (index, values) in self.variables.iter().enumerate() {
            if values.len() != axis.len() {
                return Err(ArchiveError::LengthMismatch {
                    index,
                    expected: axis.len(),
                    got: values.len(),
                });
            }
        }

        Ok(axis)
    }
}

/// Zip the hourly block onto its time axis, positionally.
fn hourly_rows(block: &SeriesBlock) -> Result<Vec<HourlyRow>, ArchiveError> {
    let axis = block.validate(&HOURLY_VARIABLES)?;
    let v = &block.variables;

    Ok(axis
        .into_iter()
        .enumerate()
        .map(|(i, timestamp)| HourlyRow {
            timestamp,
            temperature_2m: v[0][i],
            relative_humidity_2m: v[1][i],
            rain: v[2][i],
            snowfall: v[3][i],
            snow_depth: v[4][i],
            weather_code: v[5][i],
            wind_speed_10m: v[6][i],
            wind_direction_10m: v[7][i],
            wind_gusts_10m: v[8][i],
            is_day: v[9][i],
        })
        .collect())
}

/// Zip the daily block onto its time axis, positionally. Sunrise and sunset
/// travel as Unix seconds inside the value arrays.
fn daily_rows(block: &SeriesBlock) -> Result<Vec<DailyRow>, ArchiveError> {
    let axis = block.validate(&DAILY_VARIABLES)?;
    let v = &block.variables;

    Ok(axis
        .into_iter()
        .enumerate()
        .map(|(i, timestamp)| DailyRow {
            timestamp,
            weather_code: v[0][i],
            temperature_2m_max: v[1][i],
            temperature_2m_min: v[2][i],
            temperature_2m_mean: v[3][i],
            sunrise: v[4][i] as i64,
            sunset: v[5][i] as i64,
            precipitation_sum: v[6][i],
            rain_sum: v[7][i],
            snowfall_sum: v[8][i],
            precipitation_hours: v[9][i],
            wind_speed_10m_max: v[10][i],
            wind_gusts_10m_max: v[11][i],
            wind_direction_10m_dominant: v[12][i],
            weather_desc: None,
        })
        .collect())
}

/// Archived hourly/daily weather for a geocoded place and date range.
///
/// Requests go through the injected response cache (keyed by the full
/// request URL) and a bounded retry policy; the geocoding step is the
/// injected [`Geocoder`] so an unresolvable place short-circuits to
/// [`HistoryOutcome::LocationNotFound`] without touching the archive.
#[derive(Debug)]
pub struct HistoryClient {
    geocoder: Box<dyn Geocoder>,
    http: Client,
    cache: HttpCache,
    retry: RetryPolicy,
    base_url: String,
    timezone: String,
}

impl HistoryClient {
    pub fn new(geocoder: Box<dyn Geocoder>, cache: HttpCache) -> Self {
        Self {
            geocoder,
            http: Client::new(),
            cache,
            retry: RetryPolicy::default(),
            base_url: ARCHIVE_URL.to_string(),
            timezone: "America/New_York".to_string(),
        }
    }

    /// Point the client at a different archive endpoint; used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Timezone name sent to the archive for its daily aggregation.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch archived weather for a city/state between `start` and `end`
    /// (both inclusive in the request; the returned series are half-open at
    /// the service's step size).
    pub async fn fetch_history(
        &self,
        city: &str,
        state: &str,
        start: NaiveDate,
        end: NaiveDate,
        country: &str,
    ) -> Result<HistoryOutcome> {
        let locations = self.geocoder.geocode(city, state, country, 1).await?;
        let Some(location) = locations.first() else {
            return Ok(HistoryOutcome::LocationNotFound);
        };

        let body = self.fetch_archive_body(*location, start, end).await?;

        let parsed: ArchiveResponse =
            serde_json::from_str(&body).context("Failed to parse archive JSON")?;

        let hourly = hourly_rows(&parsed.hourly)?;
        let mut daily = daily_rows(&parsed.daily)?;
        wmo::annotate_daily(&mut daily);

        Ok(HistoryOutcome::Data(HistoryData { hourly, daily }))
    }

    /// Raw archive response for a coordinate, via cache then network.
    async fn fetch_archive_body(
        &self,
        location: Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<String> {
        let url = self.request_url(location, start, end)?;
        let signature = url.as_str().to_string();

        if let Some(body) = self.cache.read(&signature) {
            return Ok(body);
        }

        let res = with_retry(self.retry, || self.http.get(url.clone()).send())
            .await
            .context("Failed to reach the archive endpoint")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read archive response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Archive request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        if let Err(e) = self.cache.write(&signature, &body) {
            // A broken cache shouldn't fail the fetch.
            tracing::warn!(error = %e, "failed to write archive response to cache");
        }

        Ok(body)
    }

    /// Full request URL; also serves as the cache signature.
    fn request_url(&self, location: Location, start: NaiveDate, end: NaiveDate) -> Result<Url> {
        let params = [
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
            ("hourly", HOURLY_VARIABLES.join(",")),
            ("daily", DAILY_VARIABLES.join(",")),
            ("temperature_unit", "fahrenheit".to_string()),
            ("wind_speed_unit", "mph".to_string()),
            ("precipitation_unit", "inch".to_string()),
            ("timezone", self.timezone.clone()),
        ];

        Url::parse_with_params(&self.base_url, params)
            .with_context(|| format!("Invalid archive URL: {}", self.base_url))
    }
}
