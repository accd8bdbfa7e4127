use serde::Deserialize;
use tracing::debug;

use crate::geo::{distance_km, resolve};
use crate::types::{LatLng, Market, Month};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFilter {
    Free,
    Paid,
}

impl PriceFilter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "free" | "gratis" => Some(PriceFilter::Free),
            "paid" | "betaald" => Some(PriceFilter::Paid),
            _ => None,
        }
    }
}

impl std::fmt::Display for PriceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceFilter::Free => write!(f, "gratis"),
            PriceFilter::Paid => write!(f, "betaald"),
        }
    }
}

/// Loose filter input as typed in the UI or passed as query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CriteriaInput {
    pub search: Option<String>,
    pub month: Option<String>,
    pub location: Option<String>,
    /// Radius in km around `location`.
    pub distance: Option<String>,
    pub price: Option<String>,
}

/// Active filter criteria. `None` fields are always satisfied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    /// Lowercased.
    pub search: Option<String>,
    pub month: Option<Month>,
    /// Lowercased, trimmed.
    pub location: Option<String>,
    pub radius_km: Option<f64>,
    pub price: Option<PriceFilter>,
}

impl Criteria {
    pub fn from_input(input: &CriteriaInput) -> Self {
        Self {
            search: non_blank(input.search.as_deref()),
            month: input.month.as_deref().and_then(Month::from_name),
            location: non_blank(input.location.as_deref()),
            radius_km: input
                .distance
                .as_deref()
                .and_then(|d| d.trim().replace(',', ".").parse::<f64>().ok())
                .filter(|r| r.is_finite() && *r >= 0.0),
            price: input.price.as_deref().and_then(PriceFilter::from_name),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Criteria::default()
    }

    /// The distance predicate applies only with both a location term and a radius.
    pub fn distance_term(&self) -> Option<(&str, f64)> {
        match (&self.location, self.radius_km) {
            (Some(term), Some(radius)) => Some((term.as_str(), radius)),
            _ => None,
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty())
}

/// Every market satisfying all active criteria, in dataset order.
pub fn filter<'a>(all: &'a [Market], criteria: &Criteria) -> Vec<&'a Market> {
    matching_indices(all, criteria)
        .into_iter()
        .map(|i| &all[i])
        .collect()
}

/// Positions in `all` of the markets `filter` would return.
pub fn matching_indices(all: &[Market], criteria: &Criteria) -> Vec<usize> {
    // Resolve once per run; an unresolvable term leaves distance filtering off.
    let radius = criteria
        .distance_term()
        .and_then(|(term, radius)| resolve(term).map(|center| (center, radius)));

    let indices: Vec<usize> = all
        .iter()
        .enumerate()
        .filter(|(_, m)| matches(m, criteria, radius))
        .map(|(i, _)| i)
        .collect();

    debug!(
        total = all.len(),
        matched = indices.len(),
        distance_active = radius.is_some(),
        "filter run"
    );
    indices
}

fn matches(m: &Market, c: &Criteria, radius: Option<(LatLng, f64)>) -> bool {
    if let Some(search) = &c.search {
        if !m.search_text.contains(search.as_str()) {
            return false;
        }
    }

    if let Some(month) = c.month {
        if m.month != Some(month) {
            return false;
        }
    }

    if let Some(term) = &c.location {
        if !location_matches(m, term) {
            return false;
        }
    }

    if let Some((center, radius_km)) = radius {
        if !m.coords.is_some_and(|at| distance_km(center, at) <= radius_km) {
            return false;
        }
    }

    match c.price {
        Some(PriceFilter::Free) => !m.is_paid,
        Some(PriceFilter::Paid) => m.is_paid,
        None => true,
    }
}

fn location_matches(m: &Market, term: &str) -> bool {
    let postal: String = m
        .postal_code
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let compact_term: String = term.chars().filter(|c| !c.is_whitespace()).collect();

    m.city.to_lowercase().contains(term)
        || (!compact_term.is_empty() && postal.contains(&compact_term))
        || m.venue.to_lowercase().contains(term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawMarket;

    struct Fixture {
        title: &'static str,
        city: &'static str,
        postal: &'static str,
        venue: &'static str,
        date: &'static str,
        fee: &'static str,
        coords: Option<(f64, f64)>,
    }

    fn build(fixtures: &[Fixture]) -> Vec<Market> {
        fixtures
            .iter()
            .map(|f| {
                Market::from_raw(
                    RawMarket {
                        title: f.title.to_string(),
                        city: f.city.to_string(),
                        postal_code: f.postal.to_string(),
                        venue: f.venue.to_string(),
                        date: f.date.to_string(),
                        entry_fee: f.fee.to_string(),
                        link: format!("https://example.nl/{}", f.title),
                        lat: f.coords.map(|c| serde_json::json!(c.0)),
                        lng: f.coords.map(|c| serde_json::json!(c.1)),
                        ..Default::default()
                    },
                    2025,
                )
            })
            .collect()
    }

    fn dataset() -> Vec<Market> {
        build(&[
            Fixture {
                title: "Vlooienmarkt De Pijp",
                city: "Amsterdam",
                postal: "1072 AB",
                venue: "Sporthal Pijp",
                date: "zaterdag 13 september",
                fee: "€ 3,00",
                coords: Some((52.3550, 4.8950)),
            },
            Fixture {
                title: "Rommelmarkt Ahoy",
                city: "Rotterdam",
                postal: "3084 BA",
                venue: "Ahoy",
                date: "zondag 5 oktober",
                fee: "Gratis",
                coords: Some((51.8840, 4.4880)),
            },
            Fixture {
                title: "Kofferbakmarkt",
                city: "Amstelveen",
                postal: "1181",
                venue: "",
                date: "zondag 12 oktober",
                fee: "",
                coords: Some((52.3030, 4.8600)),
            },
            Fixture {
                title: "Wintermarkt",
                city: "",
                postal: "",
                venue: "Jaarbeurs",
                date: "zaterdag 10 januari",
                fee: "€ 5",
                coords: Some((52.0880, 5.1130)),
            },
        ])
    }

    fn titles(view: &[&Market]) -> Vec<String> {
        view.iter().map(|m| m.title.clone()).collect()
    }

    fn criteria(input: CriteriaInput) -> Criteria {
        Criteria::from_input(&input)
    }

    #[test]
    fn empty_criteria_admit_everything_in_order() {
        let all = dataset();
        let view = filter(&all, &Criteria::default());
        assert_eq!(view.len(), all.len());
        assert!(view.iter().zip(&all).all(|(a, b)| std::ptr::eq(*a, b)));
    }

    #[test]
    fn search_is_case_insensitive_over_search_text() {
        let all = dataset();
        let c = criteria(CriteriaInput { search: Some("  AHOY ".into()), ..Default::default() });
        assert_eq!(titles(&filter(&all, &c)), vec!["Rommelmarkt Ahoy"]);
    }

    #[test]
    fn month_matches_exactly() {
        let all = dataset();
        let c = criteria(CriteriaInput { month: Some("Oktober".into()), ..Default::default() });
        assert_eq!(titles(&filter(&all, &c)), vec!["Rommelmarkt Ahoy", "Kofferbakmarkt"]);
    }

    #[test]
    fn location_matches_city_postal_or_venue() {
        let all = dataset();
        let by_city = criteria(CriteriaInput { location: Some("amst".into()), ..Default::default() });
        assert_eq!(titles(&filter(&all, &by_city)), vec!["Vlooienmarkt De Pijp", "Kofferbakmarkt"]);

        let by_postal = criteria(CriteriaInput { location: Some("1072ab".into()), ..Default::default() });
        assert_eq!(titles(&filter(&all, &by_postal)), vec!["Vlooienmarkt De Pijp"]);

        let by_spaced_postal = criteria(CriteriaInput { location: Some("1072 AB".into()), ..Default::default() });
        assert_eq!(titles(&filter(&all, &by_spaced_postal)), vec!["Vlooienmarkt De Pijp"]);

        let by_venue = criteria(CriteriaInput { location: Some("jaarbeurs".into()), ..Default::default() });
        assert_eq!(titles(&filter(&all, &by_venue)), vec!["Wintermarkt"]);
    }

    #[test]
    fn distance_narrows_the_location_match() {
        let all = dataset();
        // Amstelveen lies within 15 km but fails the "amsterdam" location match.
        let c = criteria(CriteriaInput {
            location: Some("Amsterdam".into()),
            distance: Some("15".into()),
            ..Default::default()
        });
        assert_eq!(titles(&filter(&all, &c)), vec!["Vlooienmarkt De Pijp"]);

        let near_postal = criteria(CriteriaInput {
            location: Some("1072".into()),
            distance: Some("80".into()),
            ..Default::default()
        });
        assert_eq!(titles(&filter(&all, &near_postal)), vec!["Vlooienmarkt De Pijp"]);
    }

    #[test]
    fn radius_excludes_location_matches_outside_it() {
        let all = build(&[
            Fixture {
                title: "Noordermarkt",
                city: "Amsterdam",
                postal: "1015",
                venue: "",
                date: "",
                fee: "",
                coords: Some((52.3790, 4.8860)),
            },
            Fixture {
                title: "Markt Amsterdamsestraatweg",
                city: "Utrecht",
                postal: "3513",
                venue: "Amsterdamsestraatweg",
                date: "",
                fee: "",
                coords: Some((52.1040, 5.0960)),
            },
        ]);
        let c = criteria(CriteriaInput {
            location: Some("amsterdam".into()),
            distance: Some("10".into()),
            ..Default::default()
        });
        assert_eq!(titles(&filter(&all, &c)), vec!["Noordermarkt"]);
    }

    #[test]
    fn unresolvable_distance_term_degrades_to_plain_location() {
        let all = dataset();
        let with_radius = criteria(CriteriaInput {
            location: Some("Nergenshuizen".into()),
            distance: Some("25".into()),
            ..Default::default()
        });
        let without_radius = criteria(CriteriaInput {
            location: Some("Nergenshuizen".into()),
            ..Default::default()
        });
        assert_eq!(filter(&all, &with_radius), filter(&all, &without_radius));

        let search_only = criteria(CriteriaInput {
            search: Some("markt".into()),
            location: Some("Rotterdam-Noord".into()),
            distance: Some("5".into()),
            ..Default::default()
        });
        // The term does not resolve, so only the substring location check applies.
        assert!(filter(&all, &search_only).is_empty());
    }

    #[test]
    fn radius_without_location_is_inactive() {
        let all = dataset();
        let c = criteria(CriteriaInput { distance: Some("1".into()), ..Default::default() });
        assert!(c.distance_term().is_none());
        assert_eq!(filter(&all, &c).len(), all.len());
    }

    #[test]
    fn price_splits_free_and_paid() {
        let all = dataset();
        let free = criteria(CriteriaInput { price: Some("free".into()), ..Default::default() });
        assert_eq!(titles(&filter(&all, &free)), vec!["Rommelmarkt Ahoy", "Kofferbakmarkt"]);
        let paid = criteria(CriteriaInput { price: Some("betaald".into()), ..Default::default() });
        assert_eq!(titles(&filter(&all, &paid)), vec!["Vlooienmarkt De Pijp", "Wintermarkt"]);
    }

    #[test]
    fn criteria_combine_with_and() {
        let all = dataset();
        let c = criteria(CriteriaInput {
            search: Some("markt".into()),
            month: Some("oktober".into()),
            price: Some("paid".into()),
            ..Default::default()
        });
        assert!(filter(&all, &c).is_empty());

        let c = criteria(CriteriaInput {
            search: Some("markt".into()),
            month: Some("oktober".into()),
            price: Some("free".into()),
            ..Default::default()
        });
        assert_eq!(titles(&filter(&all, &c)), vec!["Rommelmarkt Ahoy", "Kofferbakmarkt"]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let all = dataset();
        let c = criteria(CriteriaInput { search: Some("markt".into()), ..Default::default() });
        assert_eq!(filter(&all, &c), filter(&all, &c));
    }

    #[test]
    fn loose_input_is_normalized() {
        let c = criteria(CriteriaInput {
            search: Some("   ".into()),
            month: Some("maart".into()),
            distance: Some("7,5".into()),
            price: Some("whatever".into()),
            ..Default::default()
        });
        assert_eq!(c.search, None);
        assert_eq!(c.month, None);
        assert_eq!(c.radius_km, Some(7.5));
        assert_eq!(c.price, None);

        let negative = criteria(CriteriaInput { distance: Some("-3".into()), ..Default::default() });
        assert_eq!(negative.radius_km, None);
        assert!(negative.is_empty());
    }
}
