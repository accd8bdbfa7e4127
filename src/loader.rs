use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{Config, HTTP_TIMEOUT_SECS, MAX_DATA_SOURCES};
use crate::error::{AppError, Result};
use crate::types::{Market, RawMarket};

#[derive(Debug, Default, Clone)]
pub struct LoadStats {
    /// The source that served the dataset.
    pub source: String,
    pub raw_total: usize,
    pub rejected_no_coords: usize,
    pub rejected_duplicate_id: usize,
    pub loaded: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DataSource {
    Http(String),
    File(String),
}

impl DataSource {
    fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            DataSource::Http(s.to_string())
        } else {
            DataSource::File(s.strip_prefix("file://").unwrap_or(s).to_string())
        }
    }
}

/// Load the dataset from the configured sources, first success wins.
pub async fn load_markets(cfg: &Config) -> Result<(Vec<Market>, LoadStats)> {
    load_from_sources(&cfg.data_sources, cfg.season_year).await
}

pub async fn load_from_sources(sources: &[String], season_year: i32) -> Result<(Vec<Market>, LoadStats)> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()?;

    let mut failures = Vec::new();
    for source in sources.iter().take(MAX_DATA_SOURCES) {
        match fetch_raw(&client, &DataSource::parse(source)).await {
            Ok(raw) => {
                let (markets, mut stats) = normalize(raw, season_year);
                stats.source = source.clone();
                info!(
                    "Loaded {} markets from {} ({} raw, {} without coordinates, {} duplicate ids)",
                    stats.loaded,
                    source,
                    stats.raw_total,
                    stats.rejected_no_coords,
                    stats.rejected_duplicate_id,
                );
                return Ok((markets, stats));
            }
            Err(e) => {
                warn!("Data source {source} failed: {e}");
                failures.push(format!("{source}: {e}"));
            }
        }
    }

    if failures.is_empty() {
        failures.push("no data sources configured".to_string());
    }
    Err(AppError::LoadFailure(failures.join("; ")))
}

async fn fetch_raw(client: &reqwest::Client, source: &DataSource) -> Result<Vec<RawMarket>> {
    let body = match source {
        DataSource::Http(url) => {
            let resp = client.get(url).send().await?.error_for_status()?;
            resp.text().await?
        }
        DataSource::File(path) => tokio::fs::read_to_string(path).await?,
    };
    Ok(serde_json::from_str::<Vec<RawMarket>>(&body)?)
}

/// Keep records with coordinates, derive their fields once, drop repeated ids.
pub fn normalize(raw: Vec<RawMarket>, season_year: i32) -> (Vec<Market>, LoadStats) {
    let mut stats = LoadStats {
        raw_total: raw.len(),
        ..Default::default()
    };
    let mut seen = HashSet::new();
    let mut markets = Vec::with_capacity(raw.len());

    for record in raw {
        if record.coords().is_none() {
            debug!(title = %record.title, "skipping market without coordinates");
            stats.rejected_no_coords += 1;
            continue;
        }
        let market = Market::from_raw(record, season_year);
        if !seen.insert(market.id.clone()) {
            debug!(market_id = %market.id, title = %market.title, "skipping duplicate market");
            stats.rejected_duplicate_id += 1;
            continue;
        }
        markets.push(market);
    }

    stats.loaded = markets.len();
    (markets, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"title":"Vlooienmarkt Ahoy","city":"Rotterdam","venue":"Ahoy","location_address":"Ahoyweg 10",
         "postal_code":"3084 BA","date":"zondag 5 oktober 2025","opening_time":"09:00 - 16:00",
         "entry_fee":"€ 4,50","link":"https://example.nl/ahoy","lat":51.884,"lng":4.488},
        {"title":"Zonder locatie","city":"Ergens","date":"6 oktober","link":"https://example.nl/x",
         "lat":null,"lng":null},
        {"title":"Vlooienmarkt Ahoy","link":"https://example.nl/ahoy","lat":51.884,"lng":4.488},
        {"title":"Winter","city":"Assen","date":"3 januari","entry_fee":"gratis",
         "link":"https://example.nl/winter","lat":52.99,"lng":6.56,"scraped_at":"2025-08-01T10:00:00"}
    ]"#;

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn normalize_drops_unlocated_and_duplicates() {
        let raw: Vec<RawMarket> = serde_json::from_str(SAMPLE).unwrap();
        let (markets, stats) = normalize(raw, 2025);
        assert_eq!(stats.raw_total, 4);
        assert_eq!(stats.rejected_no_coords, 1);
        assert_eq!(stats.rejected_duplicate_id, 1);
        assert_eq!(markets.len(), 2);
        assert_eq!(markets[1].date_value, chrono::NaiveDate::from_ymd_opt(2026, 1, 3));
        assert!(!markets[1].is_paid);
    }

    #[tokio::test]
    async fn falls_back_to_next_source() {
        let broken = write_file("<html>not json</html>");
        let good = write_file(SAMPLE);
        let sources = vec![
            "/definitely/missing/markets.json".to_string(),
            broken.path().display().to_string(),
            good.path().display().to_string(),
        ];
        let (markets, stats) = load_from_sources(&sources, 2025).await.unwrap();
        assert_eq!(markets.len(), 2);
        assert_eq!(stats.source, sources[2]);
    }

    #[tokio::test]
    async fn total_failure_is_a_load_failure() {
        let sources = vec!["/missing/a.json".to_string(), "file:///missing/b.json".to_string()];
        let err = load_from_sources(&sources, 2025).await.unwrap_err();
        match err {
            AppError::LoadFailure(msg) => {
                assert!(msg.contains("/missing/a.json"));
                assert!(msg.contains("/missing/b.json"));
            }
            other => panic!("expected LoadFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sources_past_the_third_are_ignored() {
        let good = write_file(SAMPLE);
        let sources = vec![
            "/missing/1.json".to_string(),
            "/missing/2.json".to_string(),
            "/missing/3.json".to_string(),
            good.path().display().to_string(),
        ];
        assert!(matches!(
            load_from_sources(&sources, 2025).await,
            Err(AppError::LoadFailure(_))
        ));
    }

    #[test]
    fn source_kinds() {
        assert_eq!(
            DataSource::parse("https://x.nl/m.json"),
            DataSource::Http("https://x.nl/m.json".to_string())
        );
        assert_eq!(
            DataSource::parse("file:///tmp/m.json"),
            DataSource::File("/tmp/m.json".to_string())
        );
    }
}
