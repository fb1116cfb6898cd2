//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS entries (
        id               TEXT PRIMARY KEY,
        owner_id         TEXT NOT NULL,
        title            TEXT NOT NULL,
        content          TEXT NOT NULL,
        mood             TEXT NOT NULL,
        mood_intensity   INTEGER NOT NULL DEFAULT 5,
        tags             JSON NOT NULL DEFAULT '[]',
        is_important     INTEGER NOT NULL DEFAULT 0,
        is_resolved      INTEGER NOT NULL DEFAULT 0,
        word_count       INTEGER NOT NULL DEFAULT 0,
        reading_time_min INTEGER NOT NULL DEFAULT 0,

        -- Provider output, including the processed gate
        analysis         JSON NOT NULL DEFAULT '{}',

        created_at       DATETIME NOT NULL,
        updated_at       DATETIME NOT NULL
    );

    -- Every query is owner-scoped; window queries sort by created_at
    CREATE INDEX IF NOT EXISTS idx_entries_owner_created ON entries(owner_id, created_at DESC);
    CREATE INDEX IF NOT EXISTS idx_entries_owner_mood ON entries(owner_id, mood);
    CREATE INDEX IF NOT EXISTS idx_entries_owner_updated ON entries(owner_id, updated_at DESC);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Run migrations twice - should be idempotent
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let exists: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='entries'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(exists, 1, "entries table should exist");
    }

    #[test]
    fn test_indexes_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND tbl_name='entries'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(indexes.contains(&"idx_entries_owner_created".to_string()));
        assert!(indexes.contains(&"idx_entries_owner_mood".to_string()));
    }
}
