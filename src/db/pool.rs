use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use crate::error::HubError;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Create a read-write SQLite connection pool for the given database file,
/// creating the parent directory if needed.
pub fn open_pool(path: &Path, max_size: u32) -> Result<DbPool, HubError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let manager = SqliteConnectionManager::file(path);
    Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| HubError::Db(format!("failed to open pool for {}: {e}", path.display())))
}

/// In-memory pool, used by tests.
#[cfg(test)]
pub fn open_memory_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    Pool::builder().max_size(1).build(manager).unwrap()
}
