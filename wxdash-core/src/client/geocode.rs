use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::model::Location;

use super::{Geocoder, truncate_body};

const GEOCODE_URL: &str = "http://api.openweathermap.org/geo/1.0/direct";

/// Direct geocoding against the OpenWeatherMap geocoding endpoint.
///
/// One synchronous GET per call; no retry, no cache. Callers must treat an
/// empty result as the not-found condition.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http: Client::new(),
            base_url: GEOCODE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint; used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve `"{city},{state},{country}"` to at most `limit` coordinates.
    pub async fn resolve(
        &self,
        city: &str,
        state: &str,
        country: &str,
        limit: u32,
    ) -> Result<Vec<Location>> {
        let query = format!("{city},{state},{country}");
        let limit = limit.to_string();

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", query.as_str()),
                ("limit", limit.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request to the geocoding endpoint")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read geocoding response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Geocoding request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: Vec<GeoEntry> =
            serde_json::from_str(&body).context("Failed to parse geocoding JSON")?;

        Ok(parsed.into_iter().map(Location::from).collect())
    }
}

#[async_trait]
impl Geocoder for GeocodeClient {
    async fn geocode(
        &self,
        city: &str,
        state: &str,
        country: &str,
        limit: u32,
    ) -> Result<Vec<Location>> {
        self.resolve(city, state, country, limit).await
    }
}

#[derive(Debug, Deserialize)]
struct GeoEntry {
    lat: f64,
    lon: f64,
}

impl From<GeoEntry> for Location {
    fn from(entry: GeoEntry) -> Self {
        debug_assert!(
            (-90.0..=90.0).contains(&entry.lat),
            "geocoding service returned latitude {} outside [-90, 90]",
            entry.lat,
        );
        debug_assert!(
            (-180.0..=180.0).contains(&entry.lon),
            "geocoding service returned longitude {} outside [-180, 180]",
            entry.lon,
        );
        Location {
            latitude: entry.lat,
            longitude: entry.lon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_entries_map_to_locations() {
        let body = r#"[{"name":"Boston","lat":42.3554,"lon":-71.0605,"country":"US","state":"Massachusetts"}]"#;
        let parsed: Vec<GeoEntry> = serde_json::from_str(body).unwrap();
        let locations: Vec<Location> = parsed.into_iter().map(Location::from).collect();

        assert_eq!(locations.len(), 1);
        assert!((locations[0].latitude - 42.3554).abs() < 1e-9);
        assert!((locations[0].longitude + 71.0605).abs() < 1e-9);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "outside [-90, 90]")]
    fn out_of_range_latitude_is_caught_in_debug_builds() {
        let _ = Location::from(GeoEntry { lat: 91.0, lon: 0.0 });
    }

    #[test]
    fn empty_array_means_not_found() {
        let parsed: Vec<GeoEntry> = serde_json::from_str("[]").unwrap();
        assert!(parsed.is_empty());
    }
}
