pub mod dashboard;
pub mod listings;
pub mod logs;
pub mod pool;
pub mod schema;

use rusqlite::{params, Connection};

/// Check if a table exists in the database.
pub fn has_table(conn: &Connection, table: &str) -> bool {
    conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?")
        .and_then(|mut s| s.query_row(params![table], |_| Ok(())))
        .is_ok()
}
