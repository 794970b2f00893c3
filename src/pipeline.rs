use std::collections::HashMap;

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::aggregate::{aggregate, coerce_scraped_number, CurrencySummary, Listing};
use crate::db::{dashboard, dashboard::DashboardRow, listings, logs};
use crate::error::HubError;
use crate::rates::RateQuotes;
use crate::state::ExchangeHandle;

pub const CAPTURE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One raw listing as delivered by the (external) scraping layer. Numeric
/// fields arrive either as numbers or as scraped text and are coerced.
#[derive(Debug, Clone, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub advertiser_name: String,
    pub price: Value,
    pub available_amount: Value,
    #[serde(default)]
    pub payment_methods: String,
}

/// Full cycle payload: one batch of raw listings per fiat currency.
#[derive(Debug, Deserialize)]
pub struct CycleRequest {
    pub batches: HashMap<String, Vec<RawListing>>,
}

#[derive(Debug, Serialize)]
pub struct CycleReport {
    pub captured_at: String,
    /// fiat code -> total liquidity persisted this cycle.
    pub currencies: HashMap<String, f64>,
    pub log_written: bool,
}

fn coerce_value(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => coerce_scraped_number(s),
        _ => 0.0,
    }
}

/// Spread of the VWAP against the reference rate, formatted `"NN.NN%"`.
///
/// `"0.00%"` doubles as the "unknown" sentinel whenever the VWAP is zero or
/// the reference quote is missing; consumers must not read it as a true
/// zero spread.
pub fn format_spread(rate: Option<f64>, vwap: f64) -> String {
    match rate {
        Some(rate) if vwap > 0.0 && rate > 0.0 => {
            format!("{:.2}%", ((rate / vwap) - 1.0).abs() * 100.0)
        }
        _ => "0.00%".to_string(),
    }
}

/// Build the persisted snapshot row for one currency's aggregates.
pub fn build_dashboard_row(
    handle: &ExchangeHandle,
    currency: &str,
    summary: &CurrencySummary,
    rate: Option<f64>,
    captured_at: &str,
) -> DashboardRow {
    // An unresolvable country is tolerated: the row persists with an empty
    // country field.
    let country = handle
        .countries
        .country_of(currency)
        .unwrap_or_default()
        .to_string();

    DashboardRow {
        country,
        fiat_currency: currency.to_string(),
        total_liquidity: summary.total_liquidity,
        volume_weighted_price: summary.volume_weighted_price,
        exchange_rate: rate.unwrap_or(0.0),
        spread: format_spread(rate, summary.volume_weighted_price),
        available_payment_methods: summary.payment_method_breakdown.clone(),
        advertiser_count: summary.advertiser_count,
        captured_at: captured_at.to_string(),
    }
}

/// Run one full cycle for an exchange: replace each currency's listings,
/// aggregate, upsert its dashboard row, then append one log row.
///
/// Currencies commit independently; there is no cycle-wide transaction. A
/// crash mid-cycle leaves later currencies stale until the next cycle.
pub fn run_cycle(
    handle: &ExchangeHandle,
    quotes: &RateQuotes,
    request: &CycleRequest,
) -> Result<CycleReport, HubError> {
    let mut batches: HashMap<String, &Vec<RawListing>> = HashMap::new();
    for (currency, batch) in &request.batches {
        let code = currency.trim().to_uppercase();
        if !handle.config.currency_list.contains(&code) {
            return Err(HubError::Validation(format!(
                "currency '{currency}' is not configured for exchange '{}'",
                handle.config.exchange_name
            )));
        }
        batches.insert(code, batch);
    }

    let captured_at = Local::now().format(CAPTURE_FORMAT).to_string();
    let mut totals: HashMap<String, f64> = HashMap::new();

    // Strictly sequential per currency, in configured order.
    for currency in &handle.config.currency_list {
        let Some(batch) = batches.get(currency) else {
            continue;
        };

        let listings: Vec<Listing> = batch
            .iter()
            .map(|raw| Listing {
                advertiser_name: raw.advertiser_name.clone(),
                price: coerce_value(&raw.price),
                available_amount: coerce_value(&raw.available_amount),
                payment_methods: raw.payment_methods.clone(),
                captured_at: captured_at.clone(),
            })
            .collect();

        let mut conn = handle.pool.get()?;
        listings::replace_for_currency(&mut conn, currency, &listings)?;

        let summary = aggregate(&listings);
        let rate = quotes.rate_for(currency);

        dashboard::clear_for_currency(&conn, currency)?;
        dashboard::upsert_row(
            &conn,
            &build_dashboard_row(handle, currency, &summary, rate, &captured_at),
        )?;

        tracing::debug!(
            "{}: {currency} liquidity {:.2}, vwap {:.2}, {} advertisers",
            handle.config.exchange_name,
            summary.total_liquidity,
            summary.volume_weighted_price,
            summary.advertiser_count,
        );

        totals.insert(currency.clone(), summary.total_liquidity);
    }

    // One wide row per cycle: every known country is a column, unseen
    // currencies default to 0.
    let mut by_country: HashMap<String, f64> = handle
        .countries
        .countries()
        .map(|c| (c.to_string(), 0.0))
        .collect();
    for (fiat, liquidity) in &totals {
        if let Some(country) = handle.countries.country_of(fiat) {
            by_country.insert(country.to_string(), *liquidity);
        }
    }

    let log_written = if by_country.is_empty() {
        false
    } else {
        let mut conn = handle.pool.get()?;
        let written = logs::write_cycle(&mut conn, &captured_at, &by_country)?;
        if !written {
            tracing::warn!(
                "{}: log row for {captured_at} already exists, skipping",
                handle.config.exchange_name
            );
        }
        written
    };

    Ok(CycleReport {
        captured_at,
        currencies: totals,
        log_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExchangeConfig;
    use crate::country::CurrencyCountryMap;
    use crate::db::pool::open_memory_pool;
    use crate::db::schema;
    use crate::state::ExchangeHandle;

    fn test_handle(currencies: &[&str]) -> ExchangeHandle {
        let pool = open_memory_pool();
        schema::init(&pool.get().unwrap()).unwrap();

        ExchangeHandle::new(
            ExchangeConfig {
                exchange_name: "okx".to_string(),
                currency_list: currencies.iter().map(|c| c.to_string()).collect(),
                storage_location: ":memory:".into(),
                reference_feed_location: "rates.json".to_string(),
                country_map_location: "fiat2country.json".into(),
            },
            pool,
            CurrencyCountryMap::from_map(HashMap::from([
                ("JPY".to_string(), "Japan".to_string()),
                ("INR".to_string(), "India".to_string()),
            ])),
        )
    }

    fn raw(price: f64, amount: &str, methods: &str) -> RawListing {
        RawListing {
            advertiser_name: "adv".to_string(),
            price: serde_json::json!(price),
            available_amount: serde_json::json!(amount),
            payment_methods: methods.to_string(),
        }
    }

    #[test]
    fn cycle_persists_dashboard_rows_and_one_log_row() {
        let handle = test_handle(&["JPY", "INR"]);
        let quotes = RateQuotes {
            quotes: HashMap::from([("USDJPY".to_string(), 148.0)]),
        };
        let request = CycleRequest {
            batches: HashMap::from([(
                "JPY".to_string(),
                vec![raw(100.0, "10", "Wise"), raw(200.0, "30", "SBI Bank")],
            )]),
        };

        let report = run_cycle(&handle, &quotes, &request).unwrap();
        assert!(report.log_written);
        assert!((report.currencies["JPY"] - 40.0).abs() < 1e-9);

        let conn = handle.pool.get().unwrap();
        let rows = crate::db::dashboard::fetch_rows(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.country, "Japan");
        assert!((row.volume_weighted_price - 175.0).abs() < 1e-9);
        assert!((row.exchange_rate - 148.0).abs() < 1e-9);
        // |148/175 - 1| * 100 = 15.43%
        assert_eq!(row.spread, "15.43%");

        // One log row, every known country a column, INR defaulted to 0.
        let log = crate::db::logs::fetch_wide(&conn).unwrap();
        assert_eq!(log.len(), 1);
        assert!((log[0].by_country["Japan"] - 40.0).abs() < 1e-9);
        assert_eq!(log[0].by_country["India"], 0.0);
    }

    #[test]
    fn unconfigured_currency_is_rejected() {
        let handle = test_handle(&["JPY"]);
        let quotes = RateQuotes { quotes: HashMap::new() };
        let request = CycleRequest {
            batches: HashMap::from([("XYZ".to_string(), vec![])]),
        };

        match run_cycle(&handle, &quotes, &request) {
            Err(HubError::Validation(msg)) => assert!(msg.contains("XYZ")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn missing_quote_stores_zero_rate_and_sentinel_spread() {
        let handle = test_handle(&["INR"]);
        let quotes = RateQuotes { quotes: HashMap::new() };
        let request = CycleRequest {
            batches: HashMap::from([("INR".to_string(), vec![raw(90.0, "5", "UPI")])]),
        };

        run_cycle(&handle, &quotes, &request).unwrap();

        let conn = handle.pool.get().unwrap();
        let rows = crate::db::dashboard::fetch_rows(&conn).unwrap();
        assert_eq!(rows[0].exchange_rate, 0.0);
        assert_eq!(rows[0].spread, "0.00%");
    }

    #[test]
    fn spread_formats_absolute_percentage_deviation() {
        // rate 148, vwap 150 -> |148/150 - 1| * 100 = 1.33%
        assert_eq!(format_spread(Some(148.0), 150.0), "1.33%");
        assert_eq!(format_spread(Some(150.0), 148.0), "1.35%");
    }

    #[test]
    fn zero_vwap_or_missing_rate_yields_the_sentinel() {
        assert_eq!(format_spread(Some(148.0), 0.0), "0.00%");
        assert_eq!(format_spread(None, 150.0), "0.00%");
    }

    #[test]
    fn coerce_value_accepts_numbers_and_scraped_text() {
        assert!((coerce_value(&serde_json::json!(12.5)) - 12.5).abs() < 1e-9);
        assert!((coerce_value(&serde_json::json!("1,234.56 USDT")) - 1234.56).abs() < 1e-9);
        assert_eq!(coerce_value(&serde_json::json!(null)), 0.0);
    }
}
