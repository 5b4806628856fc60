use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved coordinate, the sole successful output of geocoding.
///
/// Latitude is in [-90, 90], longitude in [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Present-moment conditions as returned by the current-weather service.
///
/// The temperature is deliberately kept in Kelvin and sunrise/sunset as Unix
/// UTC timestamps; conversion for display is the caller's concern (see
/// [`crate::convert`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_kelvin: f64,
    pub humidity_percent: f64,
    pub condition_code: i64,
    pub condition_main: String,
    pub condition_desc: String,
    pub condition_icon: String,
    pub sunrise_unix: i64,
    pub sunset_unix: i64,
}

impl CurrentConditions {
    /// URL of the condition icon rendered by the weather service.
    pub fn icon_url(&self) -> String {
        format!(
            "http://openweathermap.org/img/wn/{}@2x.png",
            self.condition_icon
        )
    }
}

/// One hour of archived weather. Units are whatever the archive request
/// asked for (Fahrenheit, mph, inches in the default pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRow {
    pub timestamp: DateTime<Utc>,
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub rain: f64,
    pub snowfall: f64,
    pub snow_depth: f64,
    pub weather_code: f64,
    pub wind_speed_10m: f64,
    pub wind_direction_10m: f64,
    pub wind_gusts_10m: f64,
    pub is_day: f64,
}

/// One day of archived weather. `sunrise`/`sunset` are Unix UTC seconds as
/// delivered by the archive; `weather_desc` is filled in from the WMO
/// lexicon and stays `None` for codes the lexicon does not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    pub timestamp: DateTime<Utc>,
    pub weather_code: f64,
    pub temperature_2m_max: f64,
    pub temperature_2m_min: f64,
    pub temperature_2m_mean: f64,
    pub sunrise: i64,
    pub sunset: i64,
    pub precipitation_sum: f64,
    pub rain_sum: f64,
    pub snowfall_sum: f64,
    pub precipitation_hours: f64,
    pub wind_speed_10m_max: f64,
    pub wind_gusts_10m_max: f64,
    pub wind_direction_10m_dominant: f64,
    pub weather_desc: Option<String>,
}

/// Hourly and daily tables produced by one historical fetch. Owned by the
/// caller; nothing in the core holds on to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryData {
    pub hourly: Vec<HourlyRow>,
    pub daily: Vec<DailyRow>,
}

/// Outcome of a historical fetch: either data, or a domain-level "the place
/// you typed doesn't geocode". Not-found is data, never an error.
#[derive(Debug, Clone)]
pub enum HistoryOutcome {
    Data(HistoryData),
    LocationNotFound,
}

impl HistoryOutcome {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HistoryOutcome::LocationNotFound)
    }
}

/// Outcome of a place-based current-conditions fetch, with the same
/// not-found-is-data contract as [`HistoryOutcome`].
#[derive(Debug, Clone)]
pub enum CurrentOutcome {
    Data(CurrentConditions),
    LocationNotFound,
}

impl CurrentOutcome {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CurrentOutcome::LocationNotFound)
    }
}
