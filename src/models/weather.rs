//! Weather shapes: the service's own record and the provider payloads it is built from.

use serde::{Deserialize, Serialize};

/// Weather record returned by `GET /api/weather/{location}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location: String,
    pub temperature: f64,
    pub humidity: i64,
    /// km/h
    pub wind_speed: i64,
    /// km
    pub visibility: i64,
    pub condition: String,
    pub alerts: Vec<String>,
    pub forecast: Vec<ForecastDay>,
}

/// One calendar day of the 3-day outlook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastDay {
    pub date: String,
    pub high: i64,
    pub low: i64,
    pub condition: String,
    /// Probability of precipitation, percent
    pub precipitation: i64,
}

/// Provider response for the current-weather endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderCurrent {
    pub main: ProviderMain,
    #[serde(default)]
    pub wind: ProviderWind,
    /// Metres
    #[serde(default)]
    pub visibility: Option<f64>,
    #[serde(default)]
    pub weather: Vec<ProviderCondition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMain {
    pub temp: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub temp_min: Option<f64>,
    #[serde(default)]
    pub temp_max: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderWind {
    /// Metres per second
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderCondition {
    pub main: String,
}

/// Provider response for the 5-day / 3-hour forecast endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderForecast {
    #[serde(default)]
    pub list: Vec<ProviderForecastEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderForecastEntry {
    /// `YYYY-MM-DD HH:MM:SS`, UTC
    pub dt_txt: String,
    pub main: ProviderMain,
    #[serde(default)]
    pub weather: Vec<ProviderCondition>,
    /// Probability of precipitation, 0.0 to 1.0
    #[serde(default)]
    pub pop: Option<f64>,
}

impl ProviderCondition {
    /// Main condition of the first reported weather entry.
    pub fn first_main(conditions: &[ProviderCondition]) -> String {
        conditions
            .first()
            .map(|c| c.main.clone())
            .unwrap_or_default()
    }
}
