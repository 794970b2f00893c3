use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::HubError;

/// One persisted dashboard snapshot: a single currency's aggregates for one
/// cycle. Keyed (fiat_currency, captured_at); a colliding insert overwrites.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardRow {
    pub country: String,
    pub fiat_currency: String,
    pub total_liquidity: f64,
    pub volume_weighted_price: f64,
    pub exchange_rate: f64,
    pub spread: String,
    pub available_payment_methods: String,
    pub advertiser_count: i64,
    pub captured_at: String,
}

pub fn upsert_row(conn: &Connection, row: &DashboardRow) -> Result<(), HubError> {
    conn.execute(
        "INSERT OR REPLACE INTO dashboard (
             country, fiat_currency, total_liquidity, volume_weighted_price,
             exchange_rate, spread, available_payment_methods, advertiser_count, captured_at
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            row.country,
            row.fiat_currency,
            row.total_liquidity,
            row.volume_weighted_price,
            row.exchange_rate,
            row.spread,
            row.available_payment_methods,
            row.advertiser_count,
            row.captured_at,
        ],
    )?;
    Ok(())
}

/// Drop a currency's previous snapshot ahead of a fresh cycle.
pub fn clear_for_currency(conn: &Connection, fiat_currency: &str) -> Result<(), HubError> {
    conn.execute("DELETE FROM dashboard WHERE fiat_currency = ?", params![fiat_currency])?;
    Ok(())
}

pub fn fetch_rows(conn: &Connection) -> Result<Vec<DashboardRow>, HubError> {
    let mut stmt = conn.prepare(
        "SELECT country, fiat_currency, total_liquidity, volume_weighted_price,
                exchange_rate, spread, available_payment_methods, advertiser_count, captured_at
         FROM dashboard ORDER BY fiat_currency",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(DashboardRow {
                country: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                fiat_currency: row.get(1)?,
                total_liquidity: row.get(2)?,
                volume_weighted_price: row.get(3)?,
                exchange_rate: row.get(4)?,
                spread: row.get(5)?,
                available_payment_methods: row.get(6)?,
                advertiser_count: row.get(7)?,
                captured_at: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;

    fn row(fiat: &str, captured_at: &str, liquidity: f64) -> DashboardRow {
        DashboardRow {
            country: "Japan".to_string(),
            fiat_currency: fiat.to_string(),
            total_liquidity: liquidity,
            volume_weighted_price: 150.0,
            exchange_rate: 148.0,
            spread: "1.33%".to_string(),
            available_payment_methods: "Bank Transfer (10.00) (150.00)".to_string(),
            advertiser_count: 3,
            captured_at: captured_at.to_string(),
        }
    }

    #[test]
    fn colliding_key_overwrites_instead_of_versioning() {
        let conn = Connection::open_in_memory().unwrap();
        schema::init(&conn).unwrap();

        upsert_row(&conn, &row("JPY", "2025-01-01 00:00:00", 10.0)).unwrap();
        upsert_row(&conn, &row("JPY", "2025-01-01 00:00:00", 99.0)).unwrap();

        let rows = fetch_rows(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert!((rows[0].total_liquidity - 99.0).abs() < 1e-9);
    }

    #[test]
    fn distinct_captured_at_keeps_both_rows() {
        let conn = Connection::open_in_memory().unwrap();
        schema::init(&conn).unwrap();

        upsert_row(&conn, &row("JPY", "2025-01-01 00:00:00", 10.0)).unwrap();
        upsert_row(&conn, &row("JPY", "2025-01-01 00:00:01", 11.0)).unwrap();

        assert_eq!(fetch_rows(&conn).unwrap().len(), 2);
    }
}
