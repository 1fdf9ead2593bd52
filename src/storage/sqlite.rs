//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Sink trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Sink, StorageError, StorageResult};
use crate::storage::ItemRecord;
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite listing sink
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Looks up one stored listing by key
    pub fn get_by_key(&self, key: &str) -> StorageResult<Option<ItemRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT identity_key, title, organization, locality, compensation, work_mode,
                    description, source, keyword
             FROM job_listings WHERE identity_key = ?1",
        )?;

        let item = stmt.query_row(params![key], row_to_item).optional()?;
        Ok(item)
    }
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRecord> {
    Ok(ItemRecord {
        identity_key: row.get(0)?,
        title: row.get(1)?,
        organization: row.get(2)?,
        locality: row.get(3)?,
        compensation: row.get(4)?,
        work_mode: row.get(5)?,
        description: row.get(6)?,
        source: row.get(7)?,
        keyword: row.get(8)?,
    })
}

impl Sink for SqliteSink {
    fn upsert(&mut self, item: &ItemRecord) -> StorageResult<()> {
        if item.identity_key.trim().is_empty() {
            return Err(StorageError::EmptyKey);
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO job_listings (
                identity_key, title, organization, locality, compensation, work_mode,
                description, source, keyword, first_seen_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
             ON CONFLICT(identity_key) DO UPDATE SET
                title = excluded.title,
                organization = excluded.organization,
                locality = excluded.locality,
                compensation = excluded.compensation,
                work_mode = excluded.work_mode,
                description = excluded.description,
                source = excluded.source,
                updated_at = excluded.updated_at",
            params![
                item.identity_key,
                item.title,
                item.organization,
                item.locality,
                item.compensation,
                item.work_mode,
                item.description,
                item.source,
                item.keyword,
                now,
            ],
        )?;
        Ok(())
    }

    fn exists_by_key(&self, key: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM job_listings WHERE identity_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM job_listings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn all_items(&self) -> StorageResult<Vec<ItemRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT identity_key, title, organization, locality, compensation, work_mode,
                    description, source, keyword
             FROM job_listings ORDER BY id",
        )?;

        let items = stmt
            .query_map([], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.conn
            .query_row("PRAGMA wal_checkpoint(PASSIVE)", [], |_| Ok(()))?;
        Ok(())
    }
}
