//! Database schema definitions
//!
//! This module contains the SQL schema for the Listing-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per unique listing
CREATE TABLE IF NOT EXISTS job_listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    identity_key TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    organization TEXT NOT NULL,
    locality TEXT NOT NULL,
    compensation TEXT NOT NULL,
    work_mode TEXT NOT NULL,
    description TEXT NOT NULL,
    source TEXT NOT NULL,
    keyword TEXT NOT NULL,
    first_seen_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_job_listings_locality ON job_listings(locality);
CREATE INDEX IF NOT EXISTS idx_job_listings_organization ON job_listings(organization);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
