//! Database schema definitions
//!
//! This module contains the SQL schema for the Review-Trawl checkpoint database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One resumable checkpoint per crawl target
CREATE TABLE IF NOT EXISTS checkpoints (
    target_key TEXT PRIMARY KEY,
    seeds TEXT NOT NULL,
    state TEXT NOT NULL,
    status TEXT NOT NULL,
    failed_url TEXT,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_checkpoints_status ON checkpoints(status);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
