use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::core::aggregate::{parse_breakdown, sanitize_spread};
use crate::db::dashboard;
use crate::error::HubError;
use crate::state::AppState;

use super::{display_timestamp, ExchangeQuery};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/calculate", get(api_summary))
        .route("/api/dashboard", get(api_dashboard))
}

#[derive(Debug, Serialize)]
struct ExchangeSummary {
    total_liquidity: f64,
    average_spread: f64,
    total_countries: usize,
    unique_payment_methods_count: usize,
}

/// Roll all persisted dashboard rows for one exchange into headline
/// numbers. Spread and method counts re-derive from the stored strings, not
/// from raw listings; malformed values sanitize instead of failing.
async fn api_summary(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ExchangeQuery>,
) -> Result<Json<ExchangeSummary>, HubError> {
    let handle = state.exchange(q.exchange.as_deref())?;
    let conn = handle.pool.get()?;
    let rows = dashboard::fetch_rows(&conn)?;

    let mut total_liquidity = 0.0;
    let mut total_spread = 0.0;
    let mut countries: HashSet<String> = HashSet::new();
    let mut methods: HashSet<String> = HashSet::new();

    for row in &rows {
        total_liquidity += row.total_liquidity;
        total_spread += sanitize_spread(&row.spread);
        countries.insert(row.country.clone());
        for entry in parse_breakdown(&row.available_payment_methods) {
            methods.insert(entry.method);
        }
    }

    let average_spread = if rows.is_empty() {
        0.0
    } else {
        total_spread / rows.len() as f64
    };

    Ok(Json(ExchangeSummary {
        total_liquidity,
        average_spread,
        total_countries: countries.len(),
        unique_payment_methods_count: methods.len(),
    }))
}

/// Full dashboard rows with the breakdown string re-parsed into a list.
async fn api_dashboard(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ExchangeQuery>,
) -> Result<Json<Vec<Value>>, HubError> {
    let handle = state.exchange(q.exchange.as_deref())?;
    let conn = handle.pool.get()?;
    let rows = dashboard::fetch_rows(&conn)?;

    let data = rows
        .iter()
        .map(|row| {
            json!({
                "date_time": display_timestamp(&row.captured_at),
                "country": row.country,
                "fiat_currency": row.fiat_currency,
                "total_liquidity": row.total_liquidity,
                "volume_weighted_price": row.volume_weighted_price,
                "exchange_rate": row.exchange_rate,
                "spread": row.spread,
                "available_payment_methods": parse_breakdown(&row.available_payment_methods),
            })
        })
        .collect();

    Ok(Json(data))
}
