use chrono::NaiveDate;
use tracing::debug;

use crate::filter::{matching_indices, Criteria};
use crate::geo::GeoGrouping;
use crate::selection::{Header, SelectionController, SelectionEvent};
use crate::types::{Market, MarketId};
use crate::view::{map_markers, sidebar_cards, MapMarker, SidebarCard, Snapshot};

/// All mutable state of one map session, owned by a single caller.
///
/// The filtered view is stored as positions into `markets`; outside this type
/// markets are only ever referred to by `MarketId`.
#[derive(Debug, Clone)]
pub struct Session {
    markets: Vec<Market>,
    criteria: Criteria,
    filtered: Vec<usize>,
    grouping: GeoGrouping,
    selection: SelectionController,
}

impl Session {
    pub fn new(markets: Vec<Market>) -> Self {
        let mut session = Self {
            markets,
            criteria: Criteria::default(),
            filtered: Vec::new(),
            grouping: GeoGrouping::default(),
            selection: SelectionController::new(),
        };
        session.refilter();
        session
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn view(&self) -> Vec<&Market> {
        self.filtered.iter().map(|&i| &self.markets[i]).collect()
    }

    pub fn view_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn grouping(&self) -> &GeoGrouping {
        &self.grouping
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Re-filter from scratch. Any location view is dropped, since it was
    /// built against the previous view.
    pub fn apply_criteria(&mut self, criteria: Criteria) {
        self.criteria = criteria;
        self.refilter();
        self.selection.reset();
        debug!(filtered = self.filtered.len(), groups = self.grouping.len(), "criteria applied");
    }

    fn refilter(&mut self) {
        self.filtered = matching_indices(&self.markets, &self.criteria);
        let view: Vec<&Market> = self.filtered.iter().map(|&i| &self.markets[i]).collect();
        self.grouping = GeoGrouping::build(&view);
    }

    pub fn handle(&mut self, event: SelectionEvent) -> bool {
        if event == SelectionEvent::CriteriaChanged {
            self.selection.reset();
            return true;
        }
        let view: Vec<&Market> = self.filtered.iter().map(|&i| &self.markets[i]).collect();
        self.selection.handle(event, &view, &self.grouping)
    }

    pub fn activate(&mut self, id: &MarketId) -> bool {
        self.handle(SelectionEvent::Activate(id.clone()))
    }

    pub fn back(&mut self) {
        self.handle(SelectionEvent::Back);
    }

    pub fn map_click_empty(&mut self) {
        self.handle(SelectionEvent::MapClickEmpty);
    }

    pub fn header(&self) -> Header {
        self.selection.header(self.filtered.len())
    }

    pub fn map_view(&self) -> Vec<MapMarker> {
        map_markers(&self.view(), &self.grouping, &self.selection)
    }

    pub fn sidebar_view(&self, today: NaiveDate) -> Vec<SidebarCard> {
        sidebar_cards(&self.view(), &self.selection, today)
    }

    pub fn snapshot(&self, today: NaiveDate) -> Snapshot {
        let header = self.header();
        Snapshot {
            header_text: header.to_string(),
            header,
            total: self.markets.len(),
            filtered: self.filtered.len(),
            markers: self.map_view(),
            cards: self.sidebar_view(today),
        }
    }
}
