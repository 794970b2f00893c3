use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Map, Number, Value};
use std::sync::Arc;

use crate::db::logs;
use crate::error::HubError;
use crate::state::AppState;

use super::{display_timestamp, ExchangeQuery};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/logs", get(api_logs))
}

/// Historical per-country liquidity rows, newest first, in the wide shape:
/// one object per cycle with a `timestamp` key plus one key per country.
/// Countries the cycle never saw read as 0.
async fn api_logs(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ExchangeQuery>,
) -> Result<Json<Vec<Value>>, HubError> {
    let Some(exchange) = q.exchange.as_deref().filter(|e| !e.trim().is_empty()) else {
        return Err(HubError::Validation("exchange name is required".to_string()));
    };
    let handle = state.exchange(Some(exchange))?;
    let conn = handle.pool.get()?;

    let rows = logs::fetch_wide(&conn)?;
    if rows.is_empty() {
        return Err(HubError::NotFound("no log data found".to_string()));
    }

    let data = rows
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            obj.insert(
                "timestamp".to_string(),
                Value::String(display_timestamp(&row.captured_at)),
            );
            // Full column set: every known country, absent ones at 0.
            for country in handle.countries.countries() {
                let liquidity = row.by_country.get(country).copied().unwrap_or(0.0);
                obj.insert(country.to_string(), number(liquidity));
            }
            // Countries persisted under an older map still surface.
            for (country, liquidity) in &row.by_country {
                obj.entry(country.clone()).or_insert_with(|| number(*liquidity));
            }
            Value::Object(obj)
        })
        .collect();

    Ok(Json(data))
}

fn number(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}
