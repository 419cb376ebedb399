//! Configuration module for the disaster management backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

/// Default base URL of the OpenWeatherMap-compatible provider.
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
    /// API key for the external weather provider
    pub weather_api_key: Option<String>,
    /// Base URL of the external weather provider
    pub weather_base_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AddrParseError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("DMS_DB_PATH")
            .unwrap_or_else(|_| "./data/disaster.sqlite".to_string())
            .into();

        let bind_addr = env::var("DMS_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5000".to_string())
            .parse()?;

        let log_level = env::var("DMS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("DMS_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let weather_api_key = env::var("OPENWEATHER_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let weather_base_url = env::var("DMS_WEATHER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_WEATHER_BASE_URL.to_string());

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            log_json,
            weather_api_key,
            weather_base_url,
        })
    }
}
