use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use crate::types::error::{Result, ShelfError};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

pub fn create_pool(db_path: &Path) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path);

    let pool = Pool::builder()
        .max_size(8)
        .build(manager)
        .map_err(|e| ShelfError::Store(format!("Failed to create database pool: {}", e)))?;

    apply_pragmas(&pool)?;
    Ok(pool)
}

/// In-memory pool for tests. A single connection, since every
/// `:memory:` connection is its own database.
pub fn create_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory();

    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| ShelfError::Store(format!("Failed to create database pool: {}", e)))?;

    apply_pragmas(&pool)?;
    Ok(pool)
}

fn apply_pragmas(pool: &DbPool) -> Result<()> {
    let conn = pool.get()?;

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -8000;
         PRAGMA temp_store = MEMORY;
         PRAGMA foreign_keys = ON;",
    )?;

    Ok(())
}
