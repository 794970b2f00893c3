use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::HubError;

/// currencylayer-style live quotes payload: `quotes` maps `"USD" + code`
/// to the USD rate for that code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateQuotes {
    #[serde(default)]
    pub quotes: HashMap<String, f64>,
}

impl RateQuotes {
    /// Reference rate for a fiat code. USD is the reference currency and is
    /// fixed at 1.0; an absent quote is `None` (tolerated upstream, not an
    /// error).
    pub fn rate_for(&self, fiat: &str) -> Option<f64> {
        let fiat = fiat.to_uppercase();
        if fiat == "USD" {
            return Some(1.0);
        }
        self.quotes.get(&format!("USD{fiat}")).copied()
    }
}

pub fn load_from_file(path: &Path) -> Result<RateQuotes, HubError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

async fn fetch(location: &str) -> Result<(RateQuotes, String), HubError> {
    let body = reqwest::get(location)
        .await?
        .error_for_status()?
        .text()
        .await?;
    let quotes: RateQuotes = serde_json::from_str(&body)?;
    Ok((quotes, body))
}

/// Refresh quotes from the configured feed location.
///
/// An http(s) URL is fetched live; the raw payload is cached at `cache` so
/// a later outage can fall back to it. Anything else is read as a local
/// JSON file.
pub async fn refresh(location: &str, cache: &Path) -> Result<RateQuotes, HubError> {
    if !location.starts_with("http://") && !location.starts_with("https://") {
        return load_from_file(Path::new(location));
    }

    match fetch(location).await {
        Ok((quotes, body)) => {
            if let Err(e) = std::fs::write(cache, body) {
                tracing::warn!("failed to cache quotes at {}: {e}", cache.display());
            }
            Ok(quotes)
        }
        Err(e) => {
            tracing::warn!(
                "rate feed fetch failed ({e}); falling back to cached quotes at {}",
                cache.display()
            );
            load_from_file(cache)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_is_fixed_at_one() {
        let q = RateQuotes { quotes: HashMap::new() };
        assert_eq!(q.rate_for("USD"), Some(1.0));
        assert_eq!(q.rate_for("usd"), Some(1.0));
    }

    #[tokio::test]
    async fn refresh_reads_a_plain_file_location() {
        let path = std::env::temp_dir().join(format!("liq-hub-quotes-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"quotes": {"USDJPY": 148.25}}"#).unwrap();

        let quotes = refresh(path.to_str().unwrap(), &path).await.unwrap();
        assert_eq!(quotes.rate_for("JPY"), Some(148.25));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn quotes_are_keyed_usd_prefixed() {
        let q = RateQuotes {
            quotes: HashMap::from([("USDJPY".to_string(), 148.25)]),
        };
        assert_eq!(q.rate_for("JPY"), Some(148.25));
        assert_eq!(q.rate_for("EUR"), None);
    }
}
