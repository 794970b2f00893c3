use rusqlite::Connection;

use crate::error::HubError;

/// Create the exchange's tables if they do not exist yet.
///
/// Listings live in one table partitioned by a `currency` column and the
/// historical log is a normalized (captured_at, country, liquidity) series;
/// no schema is ever built from scraped strings.
pub fn init(conn: &Connection) -> Result<(), HubError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS listings (
             id               INTEGER PRIMARY KEY AUTOINCREMENT,
             currency         TEXT NOT NULL,
             advertiser_name  TEXT,
             price            REAL NOT NULL,
             available_amount REAL NOT NULL,
             payment_methods  TEXT NOT NULL,
             captured_at      TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_listings_currency ON listings(currency);

         CREATE TABLE IF NOT EXISTS dashboard (
             country                   TEXT,
             fiat_currency             TEXT NOT NULL,
             total_liquidity           REAL NOT NULL,
             volume_weighted_price     REAL NOT NULL,
             exchange_rate             REAL NOT NULL,
             spread                    TEXT NOT NULL,
             available_payment_methods TEXT NOT NULL,
             advertiser_count          INTEGER NOT NULL,
             captured_at               TEXT NOT NULL,
             PRIMARY KEY (fiat_currency, captured_at)
         );

         CREATE TABLE IF NOT EXISTS liquidity_log (
             captured_at TEXT NOT NULL,
             country     TEXT NOT NULL,
             liquidity   REAL NOT NULL,
             PRIMARY KEY (captured_at, country)
         );",
    )?;
    Ok(())
}
