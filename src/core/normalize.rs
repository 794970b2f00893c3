use std::collections::HashMap;

/// Canonical bucket every bank-like label collapses into.
pub const BANK_BUCKET: &str = "Bank Transfer";

/// Running totals for one canonical payment-method bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bucket {
    pub amount: f64,
    /// Σ(price·amount) — divided out into a VWAP once the batch is complete.
    pub weighted: f64,
}

/// Trimmed, non-empty labels of a raw comma-separated method string.
pub fn split_labels(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Any label containing "bank", case-insensitive, counts as a bank method.
pub fn is_bank_label(label: &str) -> bool {
    label.to_lowercase().contains("bank")
}

/// Fold one listing's labels into the bucket map.
///
/// Bank-like labels collapse into [`BANK_BUCKET`] and contribute at most
/// once per listing. Every other distinct label receives the listing's FULL
/// amount: buckets answer "how much liquidity accepts method X", they are
/// not a partition, so bucket sums may exceed total liquidity.
pub fn bucket_listing(
    buckets: &mut HashMap<String, Bucket>,
    raw_methods: &str,
    price: f64,
    amount: f64,
) {
    let mut counted_bank = false;

    for label in split_labels(raw_methods) {
        let key = if is_bank_label(label) {
            if counted_bank {
                continue;
            }
            counted_bank = true;
            BANK_BUCKET
        } else {
            label
        };

        let bucket = buckets.entry(key.to_string()).or_default();
        bucket.amount += amount;
        bucket.weighted += price * amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_like_labels_collapse_and_count_once() {
        let mut buckets = HashMap::new();
        bucket_listing(
            &mut buckets,
            "Bank Transfer, Bank transfer, Bank Transfer (BoA)",
            100.0,
            50.0,
        );

        assert_eq!(buckets.len(), 1);
        let bank = &buckets[BANK_BUCKET];
        assert!((bank.amount - 50.0).abs() < 1e-9);
        assert!((bank.weighted - 5_000.0).abs() < 1e-9);
    }

    #[test]
    fn each_non_bank_label_gets_the_full_amount() {
        let mut buckets = HashMap::new();
        bucket_listing(&mut buckets, "PayPay, Wise", 200.0, 10.0);

        assert!((buckets["PayPay"].amount - 10.0).abs() < 1e-9);
        assert!((buckets["Wise"].amount - 10.0).abs() < 1e-9);
    }

    #[test]
    fn empty_and_whitespace_labels_are_discarded() {
        let mut buckets = HashMap::new();
        bucket_listing(&mut buckets, " , ,, Wise ,", 100.0, 5.0);

        assert_eq!(buckets.len(), 1);
        assert!(buckets.contains_key("Wise"));
    }

    #[test]
    fn mixed_bank_and_other_labels_both_counted() {
        let mut buckets = HashMap::new();
        bucket_listing(&mut buckets, "SBI Bank, PayPay", 150.0, 20.0);

        assert!((buckets[BANK_BUCKET].amount - 20.0).abs() < 1e-9);
        assert!((buckets["PayPay"].amount - 20.0).abs() < 1e-9);
    }
}
