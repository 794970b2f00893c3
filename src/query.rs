use std::collections::HashSet;

use serde::Serialize;

use crate::core::normalize::{is_bank_label, split_labels, BANK_BUCKET};
use crate::db::{self, listings};
use crate::error::HubError;
use crate::state::ExchangeHandle;

/// How a stored listing matched a liquidity query. Explicit so the
/// at-most-once rule is enforced by type, not by ad-hoc flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchState {
    Unmatched,
    /// Request asked for "Bank Transfer" and the listing carries some
    /// bank-like label.
    MatchedBank,
    /// Exact-string overlap between the listing's labels and the request.
    MatchedOther,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LiquidityResult {
    pub specific_liquidity: String,
    pub specific_vwap: String,
}

/// Classify one listing against the requested method set.
///
/// The bank rule here is intentionally different from the aggregator's
/// bucket collapse: it fires on the REQUEST naming "Bank Transfer" while the
/// listing carries any bank-like label, and wins over label intersection.
fn classify(raw_methods: &str, requested: &HashSet<String>) -> MatchState {
    let labels: Vec<&str> = split_labels(raw_methods).collect();

    if requested.contains(BANK_BUCKET) && labels.iter().any(|l| is_bank_label(l)) {
        return MatchState::MatchedBank;
    }
    if labels.iter().any(|l| requested.contains(*l)) {
        return MatchState::MatchedOther;
    }
    MatchState::Unmatched
}

/// Liquidity and VWAP over the stored listings of the country's currency
/// that accept any of the requested payment methods. Each listing counts at
/// most once.
pub fn liquidity_for(
    handle: &ExchangeHandle,
    country: &str,
    requested: &HashSet<String>,
) -> Result<LiquidityResult, HubError> {
    let fiat = handle
        .countries
        .fiat_for_country(country)
        .ok_or_else(|| HubError::NotFound(format!("country '{country}' is not recognized")))?
        .to_string();

    let conn = handle.pool.get()?;

    // A database without a listings table, or a currency no cycle has ever
    // ingested, means "no data scraped yet" — NotFound, not an internal
    // failure.
    if !db::has_table(&conn, "listings") {
        return Err(HubError::NotFound(
            "table 'listings' does not exist in the database".to_string(),
        ));
    }
    let rows = listings::fetch_for_currency(&conn, &fiat)?;
    if rows.is_empty() {
        return Err(HubError::NotFound(format!(
            "no listings recorded for '{fiat}'"
        )));
    }

    let mut total_liquidity = 0.0;
    let mut weighted_price_sum = 0.0;

    for listing in &rows {
        match classify(&listing.payment_methods, requested) {
            MatchState::Unmatched => {}
            MatchState::MatchedBank | MatchState::MatchedOther => {
                total_liquidity += listing.available_amount;
                weighted_price_sum += listing.price * listing.available_amount;
            }
        }
    }

    let vwap = if total_liquidity > 0.0 {
        weighted_price_sum / total_liquidity
    } else {
        0.0
    };

    Ok(LiquidityResult {
        specific_liquidity: format!("{total_liquidity:.2}"),
        specific_vwap: format!("{vwap:.2}"),
    })
}
