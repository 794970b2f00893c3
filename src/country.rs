use std::collections::HashMap;
use std::path::Path;

use crate::error::HubError;

/// Static fiat-code -> country display name table, loaded once per exchange
/// and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct CurrencyCountryMap {
    fiat_to_country: HashMap<String, String>,
}

impl CurrencyCountryMap {
    pub fn load(path: &Path) -> Result<Self, HubError> {
        let raw = std::fs::read_to_string(path)?;
        let fiat_to_country: HashMap<String, String> = serde_json::from_str(&raw)?;
        Ok(Self::from_map(fiat_to_country))
    }

    pub fn from_map(fiat_to_country: HashMap<String, String>) -> Self {
        Self { fiat_to_country }
    }

    /// Country for a fiat code, `None` when the code is unmapped.
    pub fn country_of(&self, fiat: &str) -> Option<&str> {
        self.fiat_to_country
            .get(&fiat.to_uppercase())
            .map(String::as_str)
    }

    /// Reverse lookup: case-insensitive exact match on the country name.
    pub fn fiat_for_country(&self, country: &str) -> Option<&str> {
        self.fiat_to_country
            .iter()
            .find(|(_, mapped)| mapped.eq_ignore_ascii_case(country))
            .map(|(fiat, _)| fiat.as_str())
    }

    /// Every known country name. Defines the full column set of a log row.
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.fiat_to_country.values().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fiat_to_country.is_empty()
    }
}
