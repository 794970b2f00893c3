use std::collections::HashMap;

use rusqlite::{params, Connection};

use crate::error::HubError;

/// Append one cycle's per-country liquidity series.
///
/// Every entry in `by_country` gets a row for this `captured_at`. If any row
/// already carries this exact timestamp the whole write is skipped (returns
/// `false`) — duplicates are never merged.
pub fn write_cycle(
    conn: &mut Connection,
    captured_at: &str,
    by_country: &HashMap<String, f64>,
) -> Result<bool, HubError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM liquidity_log WHERE captured_at = ?)",
        params![captured_at],
        |row| row.get(0),
    )?;
    if exists {
        return Ok(false);
    }

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO liquidity_log (captured_at, country, liquidity) VALUES (?, ?, ?)",
        )?;
        for (country, liquidity) in by_country {
            stmt.execute(params![captured_at, country, liquidity])?;
        }
    }
    tx.commit()?;
    Ok(true)
}

/// One wide log row as the API serves it: a timestamp plus a liquidity value
/// per country.
#[derive(Debug, Clone)]
pub struct WideLogRow {
    pub captured_at: String,
    pub by_country: HashMap<String, f64>,
}

/// Reconstruct wide rows from the normalized series, newest first.
pub fn fetch_wide(conn: &Connection) -> Result<Vec<WideLogRow>, HubError> {
    let mut stmt = conn.prepare(
        "SELECT captured_at, country, liquidity FROM liquidity_log ORDER BY captured_at DESC",
    )?;
    let entries = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows: Vec<WideLogRow> = Vec::new();
    for (captured_at, country, liquidity) in entries {
        match rows.last_mut() {
            Some(last) if last.captured_at == captured_at => {
                last.by_country.insert(country, liquidity);
            }
            _ => rows.push(WideLogRow {
                captured_at,
                by_country: HashMap::from([(country, liquidity)]),
            }),
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;

    #[test]
    fn duplicate_captured_at_is_a_noop() {
        let mut conn = Connection::open_in_memory().unwrap();
        schema::init(&conn).unwrap();

        let first = HashMap::from([("Japan".to_string(), 10.0)]);
        let second = HashMap::from([("Japan".to_string(), 99.0)]);

        assert!(write_cycle(&mut conn, "2025-01-01 00:00:00", &first).unwrap());
        assert!(!write_cycle(&mut conn, "2025-01-01 00:00:00", &second).unwrap());

        let rows = fetch_wide(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert!((rows[0].by_country["Japan"] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn close_timestamps_yield_distinct_rows_newest_first() {
        let mut conn = Connection::open_in_memory().unwrap();
        schema::init(&conn).unwrap();

        let data = HashMap::from([("Japan".to_string(), 1.0)]);
        write_cycle(&mut conn, "2025-01-01 00:00:00", &data).unwrap();
        write_cycle(&mut conn, "2025-01-01 00:00:01", &data).unwrap();

        let rows = fetch_wide(&conn).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].captured_at, "2025-01-01 00:00:01");
    }
}
