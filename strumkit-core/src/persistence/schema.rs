use rusqlite::{params, Connection, Result as SqlResult};

/// Schema version for the key/value store.
pub const SCHEMA_VERSION: i32 = 1;

/// Create all tables and record the schema version.
pub fn create_tables(conn: &Connection) -> SqlResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        params![SCHEMA_VERSION],
    )?;
    Ok(())
}

/// Highest schema version applied to this database, if any.
pub fn current_version(conn: &Connection) -> SqlResult<Option<i32>> {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

-- One JSON document per key. `version` is the document format the value
-- was written in, so older documents can be upgraded on load.
CREATE TABLE IF NOT EXISTS storage (
    key TEXT PRIMARY KEY,
    version INTEGER NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";
