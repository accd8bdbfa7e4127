use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

use crate::dates;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable per-record key joining the filtered view, the map and the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(pub String);

impl MarketId {
    /// First 16 hex chars of SHA-256 over `title \n link`.
    pub fn from_content(title: &str, link: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(b"\n");
        hasher.update(link.as_bytes());
        let hex = format!("{:x}", hasher.finalize());
        MarketId(hex[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MarketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Month vocabulary
// ---------------------------------------------------------------------------

/// Months the flea-market season spans, in season order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    Augustus,
    September,
    Oktober,
    November,
    December,
    Januari,
    Februari,
}

impl Month {
    pub const ALL: [Month; 7] = [
        Month::Augustus,
        Month::September,
        Month::Oktober,
        Month::November,
        Month::December,
        Month::Januari,
        Month::Februari,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Month::Augustus => "augustus",
            Month::September => "september",
            Month::Oktober => "oktober",
            Month::November => "november",
            Month::December => "december",
            Month::Januari => "januari",
            Month::Februari => "februari",
        }
    }

    /// Calendar month number, 1-based.
    pub fn number(self) -> u32 {
        match self {
            Month::Augustus => 8,
            Month::September => 9,
            Month::Oktober => 10,
            Month::November => 11,
            Month::December => 12,
            Month::Januari => 1,
            Month::Februari => 2,
        }
    }

    /// januari and februari belong to the calendar year after the season started.
    pub fn rolls_over(self) -> bool {
        matches!(self, Month::Januari | Month::Februari)
    }

    /// Exact, case-insensitive name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Month::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// First vocabulary month occurring anywhere in the (already lowercased) text.
    pub fn find_in(lower_text: &str) -> Option<Self> {
        Month::ALL
            .into_iter()
            .filter_map(|m| lower_text.find(m.as_str()).map(|pos| (pos, m)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, m)| m)
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One object of the scraped JSON array, as published.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMarket {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub venue: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location_address: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub postal_code: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub opening_time: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub entry_fee: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub link: String,
    #[serde(default)]
    pub lat: Option<serde_json::Value>,
    #[serde(default)]
    pub lng: Option<serde_json::Value>,
}

impl RawMarket {
    /// Both coordinates present and numeric, or nothing.
    pub fn coords(&self) -> Option<LatLng> {
        let lat = self.lat.as_ref()?.as_f64()?;
        let lng = self.lng.as_ref()?.as_f64()?;
        if lat.is_finite() && lng.is_finite() {
            Some(LatLng::new(lat, lng))
        } else {
            None
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A normalized market record. Derived fields are computed once, from the raw
/// fields and the season year only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Market {
    pub id: MarketId,
    pub title: String,
    pub venue: String,
    pub location_address: String,
    pub postal_code: String,
    pub city: String,
    pub date: String,
    pub opening_time: String,
    pub entry_fee: String,
    pub link: String,
    pub coords: Option<LatLng>,
    #[serde(skip)]
    pub search_text: String,
    pub is_paid: bool,
    pub month: Option<Month>,
    pub date_value: Option<NaiveDate>,
}

impl Market {
    pub fn from_raw(raw: RawMarket, season_year: i32) -> Self {
        let coords = raw.coords();
        let id = if raw.id.trim().is_empty() {
            MarketId::from_content(&raw.title, &raw.link)
        } else {
            MarketId(raw.id.trim().to_string())
        };
        let search_text = format!(
            "{} {} {} {}",
            raw.title, raw.city, raw.venue, raw.location_address
        )
        .to_lowercase();
        let is_paid = fee_is_paid(&raw.entry_fee);
        let month = Month::find_in(&raw.date.to_lowercase());
        let date_value = dates::parse(&raw.date, season_year);

        Self {
            id,
            title: raw.title,
            venue: raw.venue,
            location_address: raw.location_address,
            postal_code: raw.postal_code,
            city: raw.city,
            date: raw.date,
            opening_time: raw.opening_time,
            entry_fee: raw.entry_fee,
            link: raw.link,
            coords,
            search_text,
            is_paid,
            month,
            date_value,
        }
    }

    /// City key used for city grouping.
    pub fn city_key(&self) -> String {
        self.city.trim().to_lowercase()
    }
}

/// A fee is paid when any fee text is present and it does not say "gratis".
pub fn fee_is_paid(entry_fee: &str) -> bool {
    let fee = entry_fee.trim();
    !fee.is_empty() && !fee.to_lowercase().contains("gratis")
}
