use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;

use crate::error::HubError;
use crate::pipeline::{run_cycle, CycleReport, CycleRequest};
use crate::state::AppState;

use super::ExchangeQuery;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/cycle", post(api_cycle))
}

/// Ingest one full scrape cycle for an exchange.
///
/// The external scraping layer delivers raw listing batches per currency;
/// the hub aggregates and persists them. One cycle runs at a time per
/// exchange; reads are never blocked and may observe a partially updated
/// dashboard while this runs.
async fn api_cycle(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ExchangeQuery>,
    Json(request): Json<CycleRequest>,
) -> Result<Json<CycleReport>, HubError> {
    if request.batches.is_empty() {
        return Err(HubError::Validation("cycle contains no batches".to_string()));
    }

    let handle = state.exchange(q.exchange.as_deref())?;
    let _cycle = handle.cycle_lock.lock().await;

    let cache = state.config.data_dir.join("exchange_rates.json");
    let quotes = handle.cycle_quotes(&cache).await;

    let report = run_cycle(handle, &quotes, &request)?;
    tracing::info!(
        "{}: cycle {} persisted {} currencies (log written: {})",
        handle.config.exchange_name,
        report.captured_at,
        report.currencies.len(),
        report.log_written,
    );
    Ok(Json(report))
}
