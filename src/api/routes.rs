use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::filter::{Criteria, CriteriaInput};
use crate::selection::SelectionController;
use crate::state::Session;
use crate::types::{Market, MarketId, Month};
use crate::view::{SidebarCard, Snapshot};

/// Read-only dataset shared by all requests. Each request builds its own
/// `Session`, so there is no shared mutable state.
#[derive(Clone)]
pub struct ApiState {
    pub markets: Arc<Vec<Market>>,
    pub source: String,
    /// Fixed "today" for deterministic responses; the local date when `None`.
    pub today: Option<NaiveDate>,
}

impl ApiState {
    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/months", get(get_months))
        .route("/markets", get(get_markets))
        .route("/markets/:id", get(get_market))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct MarketsQuery {
    #[serde(flatten)]
    pub criteria: CriteriaInput,
    /// Market id whose location view should be shown.
    pub selected: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub markets: usize,
    pub source: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        markets: state.markets.len(),
        source: state.source.clone(),
    })
}

async fn get_months() -> Json<Vec<&'static str>> {
    Json(Month::ALL.iter().map(|m| m.as_str()).collect())
}

async fn get_markets(
    State(state): State<ApiState>,
    Query(params): Query<MarketsQuery>,
) -> Result<Json<Snapshot>, AppError> {
    let mut session = Session::new(state.markets.as_ref().clone());
    session.apply_criteria(Criteria::from_input(&params.criteria));

    if let Some(selected) = params.selected.as_deref().filter(|s| !s.trim().is_empty()) {
        let id = MarketId(selected.trim().to_string());
        if !session.activate(&id) {
            return Err(AppError::NotFound(format!("market {id} is not in the filtered view")));
        }
    }

    Ok(Json(session.snapshot(state.today())))
}

async fn get_market(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<SidebarCard>, AppError> {
    let market = state
        .markets
        .iter()
        .find(|m| m.id.as_str() == id)
        .ok_or_else(|| AppError::NotFound(format!("market {id}")))?;
    Ok(Json(SidebarCard::from_market(
        market,
        &SelectionController::new(),
        state.today(),
    )))
}
