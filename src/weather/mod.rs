//! External weather provider adapter.
//!
//! Fetches current conditions and the 5-day / 3-hour forecast from an
//! OpenWeatherMap-compatible API and reshapes them into [`WeatherReport`].

use chrono::NaiveDate;
use reqwest::Client;

use crate::errors::AppError;
use crate::models::{
    ForecastDay, ProviderCondition, ProviderCurrent, ProviderForecast, ProviderForecastEntry,
    WeatherReport,
};

/// Provider entries scanned for the outlook (3-hour granularity, three days).
const FORECAST_SCAN_LIMIT: usize = 24;

/// Maximum number of distinct calendar days in the outlook.
const FORECAST_DAYS: usize = 3;

const HEAT_WAVE_THRESHOLD: f64 = 35.0;
const COLD_WAVE_THRESHOLD: f64 = 5.0;

/// Client for the external weather provider.
#[derive(Clone)]
pub struct WeatherClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Fetch current conditions and the outlook for `location`.
    pub async fn report(&self, location: &str) -> Result<WeatherReport, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("Weather API key is not configured".to_string()))?;

        let current = self
            .http
            .get(format!("{}/weather", self.base_url))
            .query(&[("q", location), ("appid", api_key), ("units", "metric")])
            .send()
            .await?;

        if !current.status().is_success() {
            tracing::info!(location, status = %current.status(), "Provider has no current weather");
            return Err(AppError::NotFound(format!(
                "Weather data not found for {}",
                location
            )));
        }
        let current: ProviderCurrent = current.json().await?;

        let forecast = self
            .http
            .get(format!("{}/forecast", self.base_url))
            .query(&[("q", location), ("appid", api_key), ("units", "metric")])
            .send()
            .await?;

        let status = forecast.status();
        if !status.is_success() {
            tracing::error!(location, %status, "Provider forecast request failed");
            return Err(AppError::Upstream(format!(
                "Weather forecast request failed with status {}",
                status
            )));
        }
        let forecast: ProviderForecast = forecast.json().await?;

        Ok(build_report(location, &current, &forecast))
    }
}

/// Reshape provider payloads into the service's weather record.
pub fn build_report(
    location: &str,
    current: &ProviderCurrent,
    forecast: &ProviderForecast,
) -> WeatherReport {
    let condition = ProviderCondition::first_main(&current.weather);
    let temperature = current.main.temp;

    WeatherReport {
        location: location.to_string(),
        temperature,
        humidity: current.main.humidity as i64,
        wind_speed: (current.wind.speed * 3.6) as i64,
        visibility: (current.visibility.unwrap_or(0.0) / 1000.0) as i64,
        alerts: synthesize_alerts(temperature, &condition),
        condition,
        forecast: reduce_forecast(&forecast.list),
    }
}

/// Keep the first entry of each calendar date among the leading provider
/// entries, in encounter order, up to three dates. Entries without a valid
/// `YYYY-MM-DD` date are skipped.
pub fn reduce_forecast(entries: &[ProviderForecastEntry]) -> Vec<ForecastDay> {
    let mut days: Vec<ForecastDay> = Vec::with_capacity(FORECAST_DAYS);

    for entry in entries.iter().take(FORECAST_SCAN_LIMIT) {
        if days.len() == FORECAST_DAYS {
            break;
        }

        let Some(date) = entry.dt_txt.split_whitespace().next() else {
            continue;
        };
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            tracing::debug!(dt_txt = %entry.dt_txt, "Skipping forecast entry with bad date");
            continue;
        }
        let date = date.to_string();

        if days.iter().any(|day| day.date == date) {
            continue;
        }

        days.push(ForecastDay {
            date,
            high: entry.main.temp_max.unwrap_or(entry.main.temp) as i64,
            low: entry.main.temp_min.unwrap_or(entry.main.temp) as i64,
            condition: ProviderCondition::first_main(&entry.weather),
            precipitation: (entry.pop.unwrap_or(0.0) * 100.0) as i64,
        });
    }

    days
}

/// Derive alert strings from temperature and condition thresholds.
pub fn synthesize_alerts(temperature: f64, condition: &str) -> Vec<String> {
    let mut alerts = Vec::new();

    if temperature > HEAT_WAVE_THRESHOLD {
        alerts.push("Heat Wave Warning".to_string());
    }
    if temperature < COLD_WAVE_THRESHOLD {
        alerts.push("Cold Wave Warning".to_string());
    }
    if condition == "Rain" {
        alerts.push("Heavy Rainfall Expected".to_string());
    }

    alerts
}
