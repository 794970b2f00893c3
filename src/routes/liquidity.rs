use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::HubError;
use crate::query::{liquidity_for, LiquidityResult};
use crate::state::AppState;

use super::ExchangeQuery;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/get_liquidity", post(api_get_liquidity))
}

#[derive(Debug, Deserialize)]
struct LiquidityRequest {
    #[serde(default)]
    country: String,
    #[serde(default)]
    payment_methods: Vec<String>,
}

async fn api_get_liquidity(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ExchangeQuery>,
    Json(body): Json<LiquidityRequest>,
) -> Result<Json<LiquidityResult>, HubError> {
    if body.country.trim().is_empty() || body.payment_methods.is_empty() {
        return Err(HubError::Validation(
            "country and payment methods are required".to_string(),
        ));
    }

    let handle = state.exchange(q.exchange.as_deref())?;
    let requested: HashSet<String> = body
        .payment_methods
        .iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();

    let result = liquidity_for(handle, body.country.trim(), &requested)?;
    Ok(Json(result))
}
