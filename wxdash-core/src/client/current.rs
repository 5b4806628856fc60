use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;

use crate::model::{CurrentConditions, CurrentOutcome};

use super::{Geocoder, truncate_body};

const CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Present-moment conditions from the OpenWeatherMap weather endpoint.
///
/// The service reports temperature in Kelvin and sunrise/sunset as Unix
/// UTC; both are passed through untouched. No retry: a network or parse
/// failure is fatal for the request.
#[derive(Debug, Clone)]
pub struct CurrentClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl CurrentClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http: Client::new(),
            base_url: CURRENT_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint; used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn fetch_current(&self, lat: f64, lon: f64) -> Result<CurrentConditions> {
        let lat = lat.to_string();
        let lon = lon.to_string();

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request to the current-weather endpoint")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read current-weather response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Current-weather request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OwCurrentResponse =
            serde_json::from_str(&body).context("Failed to parse current-weather JSON")?;

        parsed.try_into()
    }

    /// Geocode a place, then fetch its current conditions. An unresolvable
    /// place yields [`CurrentOutcome::LocationNotFound`] without contacting
    /// the weather endpoint.
    pub async fn fetch_for_place(
        &self,
        geocoder: &dyn Geocoder,
        city: &str,
        state: &str,
        country: &str,
    ) -> Result<CurrentOutcome> {
        let locations = geocoder.geocode(city, state, country, 1).await?;
        let Some(location) = locations.first() else {
            return Ok(CurrentOutcome::LocationNotFound);
        };

        let conditions = self
            .fetch_current(location.latitude, location.longitude)
            .await?;
        Ok(CurrentOutcome::Data(conditions))
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: i64,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    weather: Vec<OwWeather>,
    main: OwMain,
    sys: OwSys,
}

impl TryFrom<OwCurrentResponse> for CurrentConditions {
    type Error = anyhow::Error;

    fn try_from(parsed: OwCurrentResponse) -> Result<Self> {
        let condition = parsed
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Current-weather response contained no condition entry"))?;

        Ok(CurrentConditions {
            temperature_kelvin: parsed.main.temp,
            humidity_percent: parsed.main.humidity,
            condition_code: condition.id,
            condition_main: condition.main,
            condition_desc: condition.description,
            condition_icon: condition.icon,
            sunrise_unix: parsed.sys.sunrise,
            sunset_unix: parsed.sys.sunset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
        "main": {"temp": 284.9, "feels_like": 284.1, "humidity": 81},
        "sys": {"sunrise": 1711795000, "sunset": 1711840500},
        "name": "Boston"
    }"#;

    #[test]
    fn response_maps_to_conditions() {
        let parsed: OwCurrentResponse = serde_json::from_str(SAMPLE).unwrap();
        let conditions: CurrentConditions = parsed.try_into().unwrap();

        assert_eq!(conditions.temperature_kelvin, 284.9);
        assert_eq!(conditions.humidity_percent, 81.0);
        assert_eq!(conditions.condition_code, 803);
        assert_eq!(conditions.condition_main, "Clouds");
        assert_eq!(conditions.condition_icon, "04d");
        assert_eq!(conditions.sunrise_unix, 1711795000);
        assert_eq!(conditions.sunset_unix, 1711840500);
    }

    #[test]
    fn icon_url_points_at_the_weather_service() {
        let parsed: OwCurrentResponse = serde_json::from_str(SAMPLE).unwrap();
        let conditions: CurrentConditions = parsed.try_into().unwrap();
        assert_eq!(
            conditions.icon_url(),
            "http://openweathermap.org/img/wn/04d@2x.png"
        );
    }

    #[test]
    fn missing_condition_entry_is_fatal() {
        let body = r#"{
            "weather": [],
            "main": {"temp": 284.9, "humidity": 81},
            "sys": {"sunrise": 1711795000, "sunset": 1711840500}
        }"#;
        let parsed: OwCurrentResponse = serde_json::from_str(body).unwrap();
        let err = CurrentConditions::try_from(parsed).unwrap_err();
        assert!(err.to_string().contains("no condition entry"));
    }
}
