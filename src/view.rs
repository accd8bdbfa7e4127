//! What the map and sidebar renderers receive for the current state.

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::{is_this_week, sort_by_date};
use crate::geo::GeoGrouping;
use crate::selection::{Header, Provenance, SelectionController};
use crate::types::{LatLng, Market, MarketId, Month};

pub const VENUE_PLACEHOLDER: &str = "Locatie onbekend";
pub const FIELD_PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Serialize)]
pub struct MapMarker {
    pub id: MarketId,
    pub title: String,
    pub at: LatLng,
    /// Markets sharing this spot, this one included.
    pub badge: usize,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SidebarCard {
    pub id: MarketId,
    pub title: String,
    pub venue: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub date: String,
    pub date_value: Option<NaiveDate>,
    pub month: Option<Month>,
    pub opening_time: String,
    pub entry_fee: String,
    pub is_paid: bool,
    pub link: String,
    pub visible: bool,
    pub highlighted: bool,
    pub tag: Option<Provenance>,
    pub this_week: bool,
}

impl SidebarCard {
    pub fn from_market(m: &Market, selection: &SelectionController, today: NaiveDate) -> Self {
        Self {
            id: m.id.clone(),
            title: m.title.clone(),
            venue: or_placeholder(&m.venue, VENUE_PLACEHOLDER),
            address: or_placeholder(&m.location_address, FIELD_PLACEHOLDER),
            postal_code: or_placeholder(&m.postal_code, FIELD_PLACEHOLDER),
            city: or_placeholder(&m.city, FIELD_PLACEHOLDER),
            date: or_placeholder(&m.date, FIELD_PLACEHOLDER),
            date_value: m.date_value,
            month: m.month,
            opening_time: or_placeholder(&m.opening_time, FIELD_PLACEHOLDER),
            entry_fee: or_placeholder(&m.entry_fee, FIELD_PLACEHOLDER),
            is_paid: m.is_paid,
            link: m.link.clone(),
            visible: selection.is_visible(&m.id),
            highlighted: selection.is_highlighted(&m.id),
            tag: selection.tags(&m.id).primary(),
            this_week: m.date_value.is_some_and(|d| is_this_week(d, today)),
        }
    }
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    match value.trim() {
        "" => placeholder.to_string(),
        v => v.to_string(),
    }
}

/// Markers in filtered-view order. Markets without coordinates are left off the map.
pub fn map_markers(view: &[&Market], grouping: &GeoGrouping, selection: &SelectionController) -> Vec<MapMarker> {
    view.iter()
        .filter_map(|m| {
            m.coords.map(|at| MapMarker {
                id: m.id.clone(),
                title: m.title.clone(),
                at,
                badge: grouping.group_size(&m.id),
                highlighted: selection.is_highlighted(&m.id),
            })
        })
        .collect()
}

/// Cards in date order (upcoming, past, undated).
pub fn sidebar_cards(view: &[&Market], selection: &SelectionController, today: NaiveDate) -> Vec<SidebarCard> {
    let mut ordered = view.to_vec();
    sort_by_date(&mut ordered, today);
    ordered
        .into_iter()
        .map(|m| SidebarCard::from_market(m, selection, today))
        .collect()
}

/// Full render snapshot: header plus both layers.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub header: Header,
    pub header_text: String,
    pub total: usize,
    pub filtered: usize,
    pub markers: Vec<MapMarker>,
    pub cards: Vec<SidebarCard>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawMarket;

    fn market(title: &str, date: &str, coords: Option<(f64, f64)>) -> Market {
        Market::from_raw(
            RawMarket {
                title: title.to_string(),
                date: date.to_string(),
                city: "Leiden".to_string(),
                link: format!("https://example.nl/{title}"),
                lat: coords.map(|c| serde_json::json!(c.0)),
                lng: coords.map(|c| serde_json::json!(c.1)),
                ..Default::default()
            },
            2025,
        )
    }

    #[test]
    fn markers_carry_badges_and_skip_unlocated() {
        let all = vec![
            market("A", "", Some((52.16, 4.49))),
            market("B", "", Some((52.16, 4.49))),
            market("C", "", None),
        ];
        let view: Vec<&Market> = all.iter().collect();
        let grouping = GeoGrouping::build(&view);
        let markers = map_markers(&view, &grouping, &SelectionController::new());
        assert_eq!(markers.len(), 2);
        assert!(markers.iter().all(|m| m.badge == 2 && !m.highlighted));
    }

    #[test]
    fn cards_are_date_sorted_with_placeholders_and_week_flag() {
        let all = vec![
            market("Later", "zaterdag 25 oktober", None),
            market("Soon", "vrijdag 10 oktober", None),
            market("Undated", "", None),
        ];
        let view: Vec<&Market> = all.iter().collect();
        // Wednesday
        let today = NaiveDate::from_ymd_opt(2025, 10, 8).unwrap();
        let cards = sidebar_cards(&view, &SelectionController::new(), today);

        let titles: Vec<&str> = cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Soon", "Later", "Undated"]);
        assert!(cards[0].this_week);
        assert!(!cards[1].this_week);
        assert_eq!(cards[0].venue, VENUE_PLACEHOLDER);
        assert_eq!(cards[2].date, FIELD_PLACEHOLDER);
        assert!(cards.iter().all(|c| c.visible && c.tag.is_none()));
    }
}
