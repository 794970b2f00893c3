pub mod cycle;
pub mod dashboard;
pub mod liquidity;
pub mod logs;

use axum::Router;
use serde::Deserialize;
use std::sync::Arc;

use crate::state::AppState;

/// `?exchange=` query parameter shared by every endpoint.
#[derive(Debug, Deserialize)]
pub struct ExchangeQuery {
    pub exchange: Option<String>,
}

/// Assemble the API router.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(dashboard::routes())
        .merge(liquidity::routes())
        .merge(logs::routes())
        .merge(cycle::routes())
}

/// Re-render a stored `%Y-%m-%d %H:%M:%S` stamp in the minute-resolution
/// form the API serves. Anything unparseable passes through unchanged.
pub fn display_timestamp(stored: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(stored, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| stored.to_string())
}
