// ==========================================
// Inbound Flow Engine - SQLite Connection Setup
// ==========================================
// Goal:
// - every Connection::open goes through the same PRAGMA setup
// - one busy_timeout for all readers, so concurrent reads do not
//   fail with sporadic SQLITE_BUSY
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// Default busy_timeout (ms)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// schema_version the readers expect
///
/// Used for a startup warning only; no automatic migration.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Environment variable overriding the database path
pub const DB_PATH_ENV: &str = "INBOUND_FLOW_DB_PATH";

/// Apply the shared PRAGMAs to a connection
///
/// foreign_keys and busy_timeout are per-connection settings.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the shared setup applied
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Read schema_version (None when the table does not exist)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Log a warning when the database schema is older or newer than expected
pub fn warn_on_schema_mismatch(conn: &Connection) {
    match read_schema_version(conn) {
        Ok(Some(v)) if v == CURRENT_SCHEMA_VERSION => {}
        Ok(Some(v)) => tracing::warn!(
            found = v,
            expected = CURRENT_SCHEMA_VERSION,
            "schema_version mismatch, lookups may fail"
        ),
        Ok(None) => tracing::warn!("schema_version table missing"),
        Err(e) => tracing::warn!(error = %e, "failed to read schema_version"),
    }
}

/// Default database path
///
/// 1. `INBOUND_FLOW_DB_PATH` when set and non-blank
/// 2. `<data_dir>/inbound-flow/inbound_flow.db`
/// 3. `./inbound_flow.db`
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./inbound_flow.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("inbound-flow");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("inbound_flow.db");
        }
    }

    path.to_string_lossy().to_string()
}
