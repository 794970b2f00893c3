use std::env;
use std::path::PathBuf;

/// Fiat currencies scraped by default when an exchange has no explicit list.
const DEFAULT_CURRENCIES: &str = "AED,AMD,ARS,AUD,AZN,BGN,BHD,BRL,BWP,BYN,CAD,CHF,CLP,CNY,COP,CZK,DKK,DOP,EGP,ETB,EUR,GBP,GEL,GHS,HUF,IDR,ILS,INR,IQD,ISK,JMD,JOD,JPY,KES,KGS,KWD,KZT,LAK,LKR,MAD,MDL,MOP,MXN,NOK,NZD,OMR,PEN,PKR,PLN,PYG,QAR,RON,RSD,RWF,SAR,SDG,SEK,THB,TJS,TND,TRY,TTD,TZS,UAH,UGX,USD,UYU,UZS,VES,VND,XAF,XOF,ZAR,ZMW";

/// Everything one exchange needs, injected at construction.
///
/// Replaces the hard-coded per-exchange currency lists and filesystem paths
/// the scraping scripts used to carry.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub exchange_name: String,
    /// Currencies processed per cycle, in cycle order.
    pub currency_list: Vec<String>,
    /// SQLite file for this exchange.
    pub storage_location: PathBuf,
    /// Reference-rate quotes: a JSON file path or an http(s) URL.
    pub reference_feed_location: String,
    /// fiat code -> country display name JSON file.
    pub country_map_location: PathBuf,
}

/// Hub configuration derived from environment variables.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub bind: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub exchanges: Vec<ExchangeConfig>,
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_path(name: &str, default: &str) -> PathBuf {
    PathBuf::from(env_str(name, default))
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl HubConfig {
    pub fn from_env() -> Self {
        let data_dir = env_path("LIQ_HUB_DATA_DIR", "./data");

        // Shared quotes file unless an exchange overrides it.
        let default_feed = env_str(
            "LIQ_HUB_RATES_FEED",
            data_dir
                .join("exchange_rates.json")
                .to_str()
                .unwrap_or("exchange_rates.json"),
        );

        let exchanges = env_str("LIQ_HUB_EXCHANGES", "okx,binance,bybit")
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .map(|name| {
                let upper = name.to_uppercase();
                let currencies = env_str(
                    &format!("LIQ_HUB_{upper}_CURRENCIES"),
                    DEFAULT_CURRENCIES,
                );
                let storage = env_path(
                    &format!("LIQ_HUB_{upper}_DB"),
                    data_dir
                        .join(format!("{name}_data.db"))
                        .to_str()
                        .unwrap_or("data.db"),
                );
                let country_map = env_path(
                    &format!("LIQ_HUB_{upper}_COUNTRY_MAP"),
                    data_dir
                        .join(&name)
                        .join("fiat2country.json")
                        .to_str()
                        .unwrap_or("fiat2country.json"),
                );
                let feed = env_str(&format!("LIQ_HUB_{upper}_RATES_FEED"), &default_feed);

                ExchangeConfig {
                    exchange_name: name,
                    currency_list: split_csv(&currencies),
                    storage_location: storage,
                    reference_feed_location: feed,
                    country_map_location: country_map,
                }
            })
            .collect();

        Self {
            bind: env_str("LIQ_HUB_BIND", "127.0.0.1"),
            port: env_u16("LIQ_HUB_PORT", 8600),
            data_dir,
            exchanges,
        }
    }
}
