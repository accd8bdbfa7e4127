use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{info, warn};

use fleamarket_map::config::Config;
use fleamarket_map::debounce::Debouncer;
use fleamarket_map::filter::{Criteria, CriteriaInput, PriceFilter};
use fleamarket_map::loader::load_markets;
use fleamarket_map::types::{MarketId, Month};
use fleamarket_map::view::{MapMarker, SidebarCard};
use fleamarket_map::Session;

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready(String),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Search,
    Location,
    Radius,
    Month,
    Price,
}

impl Field {
    pub const ALL: [Field; 5] = [Field::Search, Field::Location, Field::Radius, Field::Month, Field::Price];

    pub fn label(self) -> &'static str {
        match self {
            Field::Search => "Zoek",
            Field::Location => "Plaats/postcode",
            Field::Radius => "Straal km",
            Field::Month => "Maand",
            Field::Price => "Entree",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, Field::Search | Field::Location | Field::Radius)
    }

    fn step(self, forward: bool) -> Field {
        let idx = Field::ALL.iter().position(|f| *f == self).unwrap_or(0);
        let len = Field::ALL.len();
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        Field::ALL[next]
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterInputs {
    pub search: String,
    pub location: String,
    pub radius: String,
    pub month: Option<Month>,
    pub price: Option<PriceFilter>,
}

impl FilterInputs {
    pub fn to_input(&self) -> CriteriaInput {
        CriteriaInput {
            search: Some(self.search.clone()),
            month: self.month.map(|m| m.as_str().to_string()),
            location: Some(self.location.clone()),
            distance: Some(self.radius.clone()),
            price: self.price.map(|p| match p {
                PriceFilter::Free => "free".to_string(),
                PriceFilter::Paid => "paid".to_string(),
            }),
        }
    }
}

pub struct AppState {
    pub status: LoadStatus,
    pub session: Session,
    pub inputs: FilterInputs,
    pub focus: Field,
    /// Index into the visible cards.
    pub cursor: usize,
    pub today: NaiveDate,
    debouncer: Debouncer,
}

impl AppState {
    pub fn new(debounce: Duration, today: NaiveDate) -> Self {
        Self {
            status: LoadStatus::Loading,
            session: Session::new(Vec::new()),
            inputs: FilterInputs::default(),
            focus: Field::Search,
            cursor: 0,
            today,
            debouncer: Debouncer::new(debounce),
        }
    }

    /// One load per run. On failure the panes stay empty and the header shows why.
    pub async fn load(&mut self, cfg: &Config) {
        match load_markets(cfg).await {
            Ok((markets, stats)) => {
                info!("TUI loaded {} markets from {}", markets.len(), stats.source);
                self.session = Session::new(markets);
                self.status = LoadStatus::Ready(stats.source);
            }
            Err(e) => {
                warn!("TUI load failed: {e}");
                self.status = LoadStatus::Failed(e.to_string());
            }
        }
    }

    pub fn focus_next(&mut self, forward: bool) {
        self.focus = self.focus.step(forward);
    }

    fn text_field(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Search => Some(&mut self.inputs.search),
            Field::Location => Some(&mut self.inputs.location),
            Field::Radius => Some(&mut self.inputs.radius),
            Field::Month | Field::Price => None,
        }
    }

    pub fn type_char(&mut self, c: char, now: Instant) {
        let edited = match self.text_field() {
            Some(field) => {
                field.push(c);
                true
            }
            None => false,
        };
        if edited {
            self.debouncer.touch(now);
        }
    }

    pub fn backspace(&mut self, now: Instant) {
        let edited = self.text_field().is_some_and(|field| field.pop().is_some());
        if edited {
            self.debouncer.touch(now);
        }
    }

    /// Left/Right on the month or price selector; applies immediately.
    pub fn cycle(&mut self, forward: bool) {
        match self.focus {
            Field::Month => {
                self.inputs.month = cycle_option(&Month::ALL, self.inputs.month, forward);
            }
            Field::Price => {
                self.inputs.price =
                    cycle_option(&[PriceFilter::Free, PriceFilter::Paid], self.inputs.price, forward);
            }
            _ => return,
        }
        self.debouncer.cancel();
        self.apply_filters();
    }

    /// Runs a pending debounced re-filter once its quiet period is over.
    pub fn tick(&mut self, now: Instant) {
        if self.debouncer.fire(now) {
            self.apply_filters();
        }
    }

    pub fn poll_timeout(&self, now: Instant, idle: Duration) -> Duration {
        self.debouncer.remaining(now).unwrap_or(idle)
    }

    pub fn apply_filters(&mut self) {
        let criteria = Criteria::from_input(&self.inputs.to_input());
        self.session.apply_criteria(criteria);
        self.cursor = 0;
    }

    pub fn visible_cards(&self) -> Vec<SidebarCard> {
        self.session
            .sidebar_view(self.today)
            .into_iter()
            .filter(|c| c.visible)
            .collect()
    }

    pub fn markers(&self) -> Vec<MapMarker> {
        self.session.map_view()
    }

    pub fn move_cursor(&mut self, down: bool) {
        let max = self.visible_cards().len().saturating_sub(1);
        self.cursor = if down {
            (self.cursor + 1).min(max)
        } else {
            self.cursor.saturating_sub(1)
        };
    }

    /// Open the location view for the card under the cursor and keep the
    /// cursor on it.
    pub fn activate_selected(&mut self) {
        let Some(id) = self.visible_cards().get(self.cursor).map(|c| c.id.clone()) else {
            return;
        };
        if self.session.activate(&id) {
            self.cursor = self.position_of(&id).unwrap_or(0);
        }
    }

    pub fn back(&mut self) {
        let current = self.visible_cards().get(self.cursor).map(|c| c.id.clone());
        self.session.back();
        self.cursor = current.and_then(|id| self.position_of(&id)).unwrap_or(0);
    }

    fn position_of(&self, id: &MarketId) -> Option<usize> {
        self.visible_cards().iter().position(|c| &c.id == id)
    }
}

fn cycle_option<T: Copy + PartialEq>(values: &[T], current: Option<T>, forward: bool) -> Option<T> {
    // None sits between the last and the first value.
    let idx = current.and_then(|c| values.iter().position(|v| *v == c));
    match (idx, forward) {
        (None, true) => values.first().copied(),
        (None, false) => values.last().copied(),
        (Some(i), true) => values.get(i + 1).copied(),
        (Some(0), false) => None,
        (Some(i), false) => values.get(i - 1).copied(),
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

pub fn format_badge(badge: usize) -> String {
    if badge > 1 {
        format!("×{badge}")
    } else {
        String::new()
    }
}
