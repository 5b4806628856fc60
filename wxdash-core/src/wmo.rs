//! WMO weather-code lexicon.
//!
//! Fixed mapping from the numeric condition codes used by the archive
//! service to human-readable phrases. Unknown codes are simply absent;
//! they are never an error.

use crate::model::DailyRow;

/// Known code/phrase pairs, in ascending code order.
const WMO_WEATHER_CODES: [(i64, &str); 28] = [
    (0, "Clear sky"),
    (1, "Mainly clear"),
    (2, "Partly cloudy"),
    (3, "Overcast"),
    (45, "Fog and depositing rime fog"),
    (48, "Fog and depositing rime fog"),
    (51, "Drizzle: Light intensity"),
    (53, "Drizzle: Moderate intensity"),
    (55, "Drizzle: Dense intensity"),
    (56, "Freezing Drizzle: Light intensity"),
    (57, "Freezing Drizzle: Dense intensity"),
    (61, "Rain: Slight intensity"),
    (63, "Rain: Moderate intensity"),
    (65, "Rain: Heavy intensity"),
    (66, "Freezing Rain: Light intensity"),
    (67, "Freezing Rain: Heavy intensity"),
    (71, "Snow fall: Slight intensity"),
    (73, "Snow fall: Moderate intensity"),
    (75, "Snow fall: Heavy intensity"),
    (77, "Snow grains"),
    (80, "Rain showers: Slight intensity"),
    (81, "Rain showers: Moderate intensity"),
    (82, "Rain showers: Violent intensity"),
    (85, "Snow showers slight intensity"),
    (86, "Snow showers heavy intensity"),
    (95, "Thunderstorm: Slight or moderate"),
    (96, "Thunderstorm with slight hail"),
    (99, "Thunderstorm with heavy hail"),
];

/// Look up the phrase for a WMO weather code.
pub fn describe(code: i64) -> Option<&'static str> {
    WMO_WEATHER_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, desc)| *desc)
}

/// Fill the `weather_desc` column of a daily table from each row's
/// `weather_code`. Codes outside the lexicon leave the column `None`.
pub fn annotate_daily(rows: &mut [DailyRow]) {
    for row in rows {
        row.weather_desc = describe(row.weather_code as i64).map(str::to_owned);
    }
}
