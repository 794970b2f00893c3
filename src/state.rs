use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::{ExchangeConfig, HubConfig};
use crate::country::CurrencyCountryMap;
use crate::db::pool::{open_pool, DbPool};
use crate::db::schema;
use crate::error::HubError;
use crate::rates::{self, RateQuotes};

/// Everything one exchange needs at runtime.
pub struct ExchangeHandle {
    pub config: ExchangeConfig,
    pub pool: DbPool,
    pub countries: CurrencyCountryMap,
    /// Serializes the write cycle: currencies are processed strictly one at
    /// a time per exchange, while reads go through the pool concurrently.
    pub cycle_lock: Mutex<()>,
    /// Last successfully loaded quotes; a feed outage falls back to these
    /// instead of degrading every spread to the sentinel.
    pub last_quotes: Mutex<Option<RateQuotes>>,
}

impl ExchangeHandle {
    pub fn new(config: ExchangeConfig, pool: DbPool, countries: CurrencyCountryMap) -> Self {
        Self {
            config,
            pool,
            countries,
            cycle_lock: Mutex::new(()),
            last_quotes: Mutex::new(None),
        }
    }

    /// Quotes for one cycle: refresh from the configured feed, remembering
    /// the result; on failure reuse the previous cycle's quotes if any.
    pub async fn cycle_quotes(&self, cache: &Path) -> RateQuotes {
        match rates::refresh(&self.config.reference_feed_location, cache).await {
            Ok(quotes) => {
                *self.last_quotes.lock().await = Some(quotes.clone());
                quotes
            }
            Err(e) => match self.last_quotes.lock().await.clone() {
                Some(quotes) => {
                    tracing::warn!(
                        "{}: rate feed unavailable ({e}); reusing previous quotes",
                        self.config.exchange_name
                    );
                    quotes
                }
                None => {
                    tracing::warn!(
                        "{}: rate feed unavailable ({e}) and no previous quotes; spreads will use the sentinel",
                        self.config.exchange_name
                    );
                    RateQuotes::default()
                }
            },
        }
    }
}

/// Shared application state, passed to all route handlers via `axum::extract::State`.
pub struct AppState {
    pub config: HubConfig,
    pub exchanges: HashMap<String, ExchangeHandle>,
    /// Fallback when a request omits `exchange` (first configured exchange).
    pub default_exchange: String,
}

impl AppState {
    pub fn new(config: HubConfig) -> Result<Arc<Self>, HubError> {
        let mut exchanges = HashMap::new();

        for ex in &config.exchanges {
            let pool = open_pool(&ex.storage_location, 8)?;
            let conn = pool.get()?;
            schema::init(&conn)?;

            let countries = match CurrencyCountryMap::load(&ex.country_map_location) {
                Ok(map) => {
                    if map.is_empty() {
                        tracing::warn!(
                            "country map for '{}' at {} is empty; country lookups will miss",
                            ex.exchange_name,
                            ex.country_map_location.display()
                        );
                    }
                    map
                }
                Err(e) => {
                    tracing::warn!(
                        "no country map for '{}' at {} ({e}); country lookups will miss",
                        ex.exchange_name,
                        ex.country_map_location.display()
                    );
                    CurrencyCountryMap::default()
                }
            };

            exchanges.insert(
                ex.exchange_name.clone(),
                ExchangeHandle::new(ex.clone(), pool, countries),
            );
        }

        let default_exchange = config
            .exchanges
            .first()
            .map(|ex| ex.exchange_name.clone())
            .unwrap_or_default();

        Ok(Arc::new(Self {
            config,
            exchanges,
            default_exchange,
        }))
    }

    /// Resolve an exchange by name, or the default when `None`.
    pub fn exchange(&self, name: Option<&str>) -> Result<&ExchangeHandle, HubError> {
        let name = match name {
            Some(n) if !n.trim().is_empty() => n.trim().to_lowercase(),
            _ => self.default_exchange.clone(),
        };
        self.exchanges
            .get(&name)
            .ok_or_else(|| HubError::Validation(format!("unknown exchange '{name}'")))
    }
}
