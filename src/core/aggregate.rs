use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::normalize::{bucket_listing, Bucket};

/// One listing's fields as the aggregator consumes them.
#[derive(Debug, Clone)]
pub struct Listing {
    pub advertiser_name: String,
    pub price: f64,
    pub available_amount: f64,
    /// Raw comma-separated method labels as scraped.
    pub payment_methods: String,
    pub captured_at: String,
}

/// Aggregated result for one currency's listings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CurrencySummary {
    pub total_liquidity: f64,
    pub volume_weighted_price: f64,
    /// `"Name (amount) (vwap)"` entries joined by `", "`, descending by amount.
    pub payment_method_breakdown: String,
    pub advertiser_count: i64,
}

static NON_NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.]").unwrap());

/// Coerce scraped numeric text (`"1,234.56 USDT"`, `"abc12.5%xyz"`) to a
/// float by stripping everything non-numeric. Anything unparseable is 0.0;
/// one bad row must never abort a batch.
pub fn coerce_scraped_number(text: &str) -> f64 {
    NON_NUMERIC
        .replace_all(text, "")
        .parse::<f64>()
        .unwrap_or(0.0)
}

/// Aggregate one currency's listings: total liquidity, VWAP and the
/// formatted per-method breakdown.
pub fn aggregate(listings: &[Listing]) -> CurrencySummary {
    let mut total = 0.0;
    let mut weighted_sum = 0.0;
    let mut buckets: HashMap<String, Bucket> = HashMap::new();

    for listing in listings {
        total += listing.available_amount;
        weighted_sum += listing.price * listing.available_amount;
        bucket_listing(
            &mut buckets,
            &listing.payment_methods,
            listing.price,
            listing.available_amount,
        );
    }

    let vwap = if total > 0.0 { weighted_sum / total } else { 0.0 };

    CurrencySummary {
        total_liquidity: total,
        volume_weighted_price: vwap,
        payment_method_breakdown: format_breakdown(&buckets),
        advertiser_count: listings.len() as i64,
    }
}

/// Render buckets as `"Name (amount:2dp) (vwap:2dp)"` joined by `", "`,
/// descending by amount (name breaks ties for determinism).
pub fn format_breakdown(buckets: &HashMap<String, Bucket>) -> String {
    let mut entries: Vec<(&str, f64, f64)> = buckets
        .iter()
        .map(|(name, b)| {
            let vwap = if b.amount > 0.0 { b.weighted / b.amount } else { 0.0 };
            (name.as_str(), b.amount, vwap)
        })
        .collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(b.0))
    });

    entries
        .iter()
        .map(|(name, amount, vwap)| format!("{name} ({amount:.2}) ({vwap:.2})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One parsed breakdown entry, as the dashboard API re-serves it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BreakdownEntry {
    pub method: String,
    pub liquidity: String,
    pub vwap: Option<String>,
}

/// Inverse of [`format_breakdown`]: turn a stored breakdown string back into
/// entries. Segments without parentheses are skipped, never an error.
pub fn parse_breakdown(stored: &str) -> Vec<BreakdownEntry> {
    stored
        .split(',')
        .filter_map(|segment| {
            let segment = segment.trim();
            if !segment.contains('(') || !segment.contains(')') {
                return None;
            }
            let mut parts = segment.split('(');
            let method = parts.next()?.trim().to_string();
            let liquidity = parts.next()?.split(')').next()?.trim().to_string();
            let vwap = parts
                .next()
                .and_then(|p| p.split(')').next())
                .map(|p| p.trim().to_string());
            Some(BreakdownEntry { method, liquidity, vwap })
        })
        .collect()
}

/// Numeric value of a stored spread string. Garbage around the digits is
/// stripped; a fully malformed value sanitizes to 0.0 rather than failing.
pub fn sanitize_spread(stored: &str) -> f64 {
    coerce_scraped_number(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(price: f64, amount: f64, methods: &str) -> Listing {
        Listing {
            advertiser_name: "adv".to_string(),
            price,
            available_amount: amount,
            payment_methods: methods.to_string(),
            captured_at: "2025-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn vwap_over_two_listings() {
        let summary = aggregate(&[
            listing(100.0, 10.0, "Wise"),
            listing(200.0, 30.0, "Wise"),
        ]);
        assert!((summary.total_liquidity - 40.0).abs() < 1e-9);
        assert!((summary.volume_weighted_price - 175.0).abs() < 1e-9);
    }

    #[test]
    fn zero_listings_is_all_zero_with_empty_breakdown() {
        let summary = aggregate(&[]);
        assert_eq!(summary.total_liquidity, 0.0);
        assert_eq!(summary.volume_weighted_price, 0.0);
        assert_eq!(summary.payment_method_breakdown, "");
        assert_eq!(summary.advertiser_count, 0);
    }

    #[test]
    fn single_method_bucket_sums_match_listing_sums() {
        // Each listing carries exactly one non-bank label, so buckets
        // partition the liquidity exactly.
        let listings = [
            listing(100.0, 5.0, "Wise"),
            listing(110.0, 7.0, "PayPay"),
            listing(120.0, 3.0, "Wise"),
        ];
        let summary = aggregate(&listings);

        let bucket_total: f64 = parse_breakdown(&summary.payment_method_breakdown)
            .iter()
            .map(|e| e.liquidity.parse::<f64>().unwrap())
            .sum();
        assert!((bucket_total - summary.total_liquidity).abs() < 1e-9);
    }

    #[test]
    fn breakdown_sorts_descending_by_amount() {
        let summary = aggregate(&[
            listing(100.0, 5.0, "Wise"),
            listing(100.0, 50.0, "PayPay"),
        ]);
        assert_eq!(
            summary.payment_method_breakdown,
            "PayPay (50.00) (100.00), Wise (5.00) (100.00)"
        );
    }

    #[test]
    fn parse_breakdown_recovers_entries() {
        let parsed = parse_breakdown("PayPay (50.00) (100.00), Wise (5.00) (100.00)");
        assert_eq!(
            parsed,
            vec![
                BreakdownEntry {
                    method: "PayPay".to_string(),
                    liquidity: "50.00".to_string(),
                    vwap: Some("100.00".to_string()),
                },
                BreakdownEntry {
                    method: "Wise".to_string(),
                    liquidity: "5.00".to_string(),
                    vwap: Some("100.00".to_string()),
                },
            ]
        );
    }

    #[test]
    fn parse_breakdown_skips_malformed_segments() {
        let parsed = parse_breakdown("garbage, Wise (5.00) (100.00)");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].method, "Wise");
    }

    #[test]
    fn coercion_strips_non_numeric_text() {
        assert!((coerce_scraped_number("1,234.56 USDT") - 1234.56).abs() < 1e-9);
        assert_eq!(coerce_scraped_number("n/a"), 0.0);
        assert_eq!(coerce_scraped_number(""), 0.0);
    }

    #[test]
    fn spread_sanitizes_garbage_around_digits() {
        assert!((sanitize_spread("abc12.5%xyz") - 12.5).abs() < 1e-9);
        assert_eq!(sanitize_spread("%"), 0.0);
    }
}
