use std::time::Duration;

use tracing::warn;

use crate::error::{AppError, Result};

/// Data sources tried in priority order when MARKET_DATA_SOURCES is unset.
pub const DEFAULT_DATA_SOURCES: &[&str] = &[
    "data/markets_detailed_enhanced.json",
    "markets_detailed_enhanced.json",
    "data/markets_detailed.json",
];

/// The loader never looks past this many sources.
pub const MAX_DATA_SOURCES: usize = 3;

/// Season the scraped dataset covers. januari/februari roll over to the next year.
pub const DEFAULT_SEASON_YEAR: i32 = 2025;

/// Two markers share a location when both |Δlat| and |Δlng| are below this (~50 m).
pub const PROXIMITY_THRESHOLD_DEG: f64 = 0.0005;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Timeout for a single data-source fetch.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Quiet period before a burst of keystrokes triggers a re-filter.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    /// URLs or file paths, highest priority first (MARKET_DATA_SOURCES, comma-separated)
    pub data_sources: Vec<String>,
    /// SEASON_YEAR
    pub season_year: i32,
    pub log_level: String,
    pub api_port: u16,
    /// DEBOUNCE_MS
    pub debounce: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let data_sources = match std::env::var("MARKET_DATA_SOURCES") {
            Ok(raw) => parse_sources(&raw),
            Err(_) => DEFAULT_DATA_SOURCES.iter().map(|s| s.to_string()).collect(),
        };
        if data_sources.is_empty() {
            return Err(AppError::Config(
                "MARKET_DATA_SOURCES must name at least one source".to_string(),
            ));
        }

        Ok(Self {
            data_sources,
            season_year: std::env::var("SEASON_YEAR")
                .unwrap_or_else(|_| DEFAULT_SEASON_YEAR.to_string())
                .parse::<i32>()
                .map_err(|_| AppError::Config("SEASON_YEAR must be a year, e.g. 2025".to_string()))?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            debounce: parse_debounce(std::env::var("DEBOUNCE_MS").ok().as_deref()),
        })
    }
}

fn parse_sources(raw: &str) -> Vec<String> {
    let mut sources: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if sources.len() > MAX_DATA_SOURCES {
        warn!(
            "MARKET_DATA_SOURCES lists {} sources; only the first {MAX_DATA_SOURCES} are used",
            sources.len()
        );
        sources.truncate(MAX_DATA_SOURCES);
    }
    sources
}

fn parse_debounce(raw: Option<&str>) -> Duration {
    let ms = match raw.map(str::trim) {
        None | Some("") => DEFAULT_DEBOUNCE_MS,
        Some(value) => value.parse::<u64>().unwrap_or_else(|_| {
            warn!("DEBOUNCE_MS={value:?} is not a number of milliseconds; using {DEFAULT_DEBOUNCE_MS}");
            DEFAULT_DEBOUNCE_MS
        }),
    };
    Duration::from_millis(ms)
}
