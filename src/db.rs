//! Database connection and validation utilities
//!
//! Opens the climate dataset read-only behind an r2d2 pool and checks the
//! hand-declared schema in `model` against what the file actually contains,
//! so a wrong or truncated dataset fails at startup with a clear message
//! instead of on the first request.

use crate::config::DatabaseConfig;
use crate::model::{MEASUREMENT_COLUMNS, MEASUREMENT_TABLE, STATION_COLUMNS, STATION_TABLE};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// SQLite connection pool type alias
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Pooled connection type alias
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Database setup and access errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error(
        "Climate dataset not found at {}.\n\n  \
         Place hawaii.sqlite under Resources/ or point DATABASE_PATH \
         (or database.path in climate.toml) at the dataset file.",
        .0.display()
    )]
    MissingDatabase(PathBuf),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(
        "Required table '{0}' does not exist in the dataset.\n\n  \
         The service expects the measurement and station tables of the \
         climate dataset; check that DATABASE_PATH names the right file."
    )]
    MissingTable(String),

    #[error("Table '{table}' is missing columns: {}", .missing.join(", "))]
    MissingColumns { table: String, missing: Vec<String> },
}

/// Create a read-only connection pool over the dataset file
pub fn create_pool(config: &DatabaseConfig) -> Result<ConnectionPool, DbError> {
    let path = Path::new(&config.path);
    if !path.is_file() {
        return Err(DbError::MissingDatabase(path.to_path_buf()));
    }

    info!(path = %config.path, max_connections = config.max_connections, "Opening climate dataset");

    let manager = SqliteConnectionManager::file(path).with_flags(
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    );

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .build(manager)?;

    debug!("Database connection pool created");
    Ok(pool)
}

/// Verify both dataset tables exist with the declared columns
pub fn verify_schema(conn: &Connection) -> Result<(), DbError> {
    verify_table(conn, MEASUREMENT_TABLE, MEASUREMENT_COLUMNS)?;
    verify_table(conn, STATION_TABLE, STATION_COLUMNS)?;
    Ok(())
}

fn verify_table(conn: &Connection, table: &str, columns: &[&str]) -> Result<(), DbError> {
    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(DbError::MissingTable(table.to_string()));
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;

    let missing: Vec<String> = columns
        .iter()
        .filter(|col| !present.iter().any(|p| p.eq_ignore_ascii_case(col)))
        .map(|col| col.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(DbError::MissingColumns {
            table: table.to_string(),
            missing,
        });
    }

    debug!(table, "Schema verified");
    Ok(())
}

/// Open the pool and verify the schema with one of its connections
pub fn connect_and_verify(config: &DatabaseConfig) -> Result<ConnectionPool, DbError> {
    let pool = create_pool(config)?;
    {
        let conn = pool.get()?;
        verify_schema(&conn)?;
    }
    Ok(pool)
}
