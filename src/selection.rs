//! Highlight and location-view state shared by the map and the sidebar.
//!
//! Two modes: `Normal` shows every card of the filtered view with nothing
//! highlighted; `LocationView` narrows the cards to one same-location group
//! plus every market in the same city, and highlights exactly the activated
//! market. Every transition into `LocationView` rebuilds the state from
//! scratch, so there is never more than one highlighted market.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::geo::{city_group, GeoGrouping};
use crate::types::{Market, MarketId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    ExactLocation,
    SameCity,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::ExactLocation => write!(f, "zelfde locatie"),
            Provenance::SameCity => write!(f, "zelfde plaats"),
        }
    }
}

/// Why a card is part of the location view. Both flags can be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProvenanceTags {
    pub exact_location: bool,
    pub same_city: bool,
}

impl ProvenanceTags {
    /// Exact location always wins over same city.
    pub fn primary(self) -> Option<Provenance> {
        if self.exact_location {
            Some(Provenance::ExactLocation)
        } else if self.same_city {
            Some(Provenance::SameCity)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationView {
    pub selected: MarketId,
    pub city: String,
    /// Union of the location group and the city group, location group first.
    pub members: Vec<MarketId>,
    tags: HashMap<MarketId, ProvenanceTags>,
    pub same_location_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SelectionState {
    #[default]
    Normal,
    LocationView(LocationView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// A marker or card was clicked.
    Activate(MarketId),
    Back,
    MapClickEmpty,
    CriteriaChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Header {
    AllMarkets {
        count: usize,
    },
    Location {
        city: String,
        same_location: usize,
        total: usize,
    },
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Header::AllMarkets { count } => write!(f, "{count} markten"),
            Header::Location { city, same_location, total } => write!(
                f,
                "{same_location} op deze locatie · {total} in {city}"
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: SelectionState,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn in_location_view(&self) -> bool {
        matches!(self.state, SelectionState::LocationView(_))
    }

    pub fn highlighted(&self) -> Option<&MarketId> {
        match &self.state {
            SelectionState::Normal => None,
            SelectionState::LocationView(lv) => Some(&lv.selected),
        }
    }

    pub fn is_highlighted(&self, id: &MarketId) -> bool {
        self.highlighted() == Some(id)
    }

    /// Card visibility: everything in `Normal`, union members in `LocationView`.
    pub fn is_visible(&self, id: &MarketId) -> bool {
        match &self.state {
            SelectionState::Normal => true,
            SelectionState::LocationView(lv) => lv.tags.contains_key(id),
        }
    }

    pub fn tags(&self, id: &MarketId) -> ProvenanceTags {
        match &self.state {
            SelectionState::Normal => ProvenanceTags::default(),
            SelectionState::LocationView(lv) => lv.tags.get(id).copied().unwrap_or_default(),
        }
    }

    pub fn header(&self, view_len: usize) -> Header {
        match &self.state {
            SelectionState::Normal => Header::AllMarkets { count: view_len },
            SelectionState::LocationView(lv) => Header::Location {
                city: lv.city.clone(),
                same_location: lv.same_location_count,
                total: lv.members.len(),
            },
        }
    }

    pub fn handle(&mut self, event: SelectionEvent, view: &[&Market], grouping: &GeoGrouping) -> bool {
        match event {
            SelectionEvent::Activate(id) => self.activate(&id, view, grouping),
            SelectionEvent::Back | SelectionEvent::MapClickEmpty | SelectionEvent::CriteriaChanged => {
                self.reset();
                true
            }
        }
    }

    /// Enter (or re-enter) the location view for `id`. Returns false and
    /// leaves the state untouched when `id` is not in the current view.
    pub fn activate(&mut self, id: &MarketId, view: &[&Market], grouping: &GeoGrouping) -> bool {
        let Some(target) = view.iter().copied().find(|m| &m.id == id) else {
            warn!(market_id = %id, "activation ignored: market not in current view");
            return false;
        };
        let location_group = grouping
            .group_of(id)
            .map(<[MarketId]>::to_vec)
            .unwrap_or_else(|| vec![id.clone()]);
        let city_members = city_group(view, target);

        let mut members = Vec::with_capacity(location_group.len() + city_members.len());
        let mut tags: HashMap<MarketId, ProvenanceTags> = HashMap::new();
        for member in &location_group {
            tags.entry(member.clone()).or_default().exact_location = true;
            members.push(member.clone());
        }
        for member in city_members {
            let entry = tags.entry(member.clone()).or_default();
            if !entry.exact_location && !entry.same_city {
                members.push(member);
            }
            entry.same_city = true;
        }

        let city = match target.city.trim() {
            "" => "onbekende plaats".to_string(),
            c => c.to_string(),
        };
        debug!(
            market_id = %id,
            same_location = location_group.len(),
            total = members.len(),
            city = %city,
            "location view"
        );

        // Replaces any previous location view in one assignment.
        self.state = SelectionState::LocationView(LocationView {
            selected: id.clone(),
            city,
            members,
            tags,
            same_location_count: location_group.len(),
        });
        true
    }

    pub fn back(&mut self) {
        self.reset();
    }

    pub fn map_click_empty(&mut self) {
        self.reset();
    }

    pub fn reset(&mut self) {
        if self.in_location_view() {
            debug!("back to all markets");
        }
        self.state = SelectionState::Normal;
    }
}
