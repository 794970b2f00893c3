use rusqlite::{params, Connection};

use crate::core::aggregate::Listing;
use crate::error::HubError;

/// Replace a currency's listings with a fresh batch.
///
/// Delete + insert commit together, but independently of any other
/// currency: there is no cycle-wide transaction by design.
pub fn replace_for_currency(
    conn: &mut Connection,
    currency: &str,
    listings: &[Listing],
) -> Result<(), HubError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM listings WHERE currency = ?", params![currency])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO listings (currency, advertiser_name, price, available_amount, payment_methods, captured_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )?;
        for l in listings {
            stmt.execute(params![
                currency,
                l.advertiser_name,
                l.price,
                l.available_amount,
                l.payment_methods,
                l.captured_at,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// All stored listings for one currency.
pub fn fetch_for_currency(conn: &Connection, currency: &str) -> Result<Vec<Listing>, HubError> {
    let mut stmt = conn.prepare(
        "SELECT advertiser_name, price, available_amount, payment_methods, captured_at
         FROM listings WHERE currency = ? ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![currency], |row| {
            Ok(Listing {
                advertiser_name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                price: row.get(1)?,
                available_amount: row.get(2)?,
                payment_methods: row.get(3)?,
                captured_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
