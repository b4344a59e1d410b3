//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! A single connection is shared behind a mutex; every upsert is one
//! statement, so concurrent writers never interleave within a row.

use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{IndexRecord, LemmaRecord, NewSite, PageRecord, SiteRecord, SiteStatistics};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SITE_COLUMNS: &str = "id, status, status_time, last_error, url, name";
const PAGE_COLUMNS: &str = "id, site_id, path, code, content";
const LEMMA_COLUMNS: &str = "id, site_id, lemma, frequency";
const INDEX_COLUMNS: &str = "id, page_id, lemma_id, rank_value";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (tests and throwaway runs)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    let status: String = row.get(1)?;
    let status = SiteStatus::from_db_string(&status)
        .ok_or_else(|| conversion_error(1, format!("unknown site status '{}'", status)))?;

    let status_time: String = row.get(2)?;
    let status_time = DateTime::parse_from_rfc3339(&status_time)
        .map_err(|e| conversion_error(2, format!("bad status_time '{}': {}", status_time, e)))?
        .with_timezone(&Utc);

    Ok(SiteRecord {
        id: row.get(0)?,
        status,
        status_time,
        last_error: row.get(3)?,
        url: row.get(4)?,
        name: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        code: row.get(3)?,
        content: row.get(4)?,
    })
}

fn lemma_from_row(row: &Row<'_>) -> rusqlite::Result<LemmaRecord> {
    Ok(LemmaRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        lemma: row.get(2)?,
        frequency: row.get(3)?,
    })
}

fn index_from_row(row: &Row<'_>) -> rusqlite::Result<IndexRecord> {
    Ok(IndexRecord {
        id: row.get(0)?,
        page_id: row.get(1)?,
        lemma_id: row.get(2)?,
        rank: row.get(3)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Site Management =====

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let conn = self.conn()?;
        let site = conn
            .query_row(
                &format!("SELECT {} FROM site WHERE url = ?1", SITE_COLUMNS),
                params![url],
                site_from_row,
            )
            .optional()?;
        Ok(site)
    }

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM site WHERE id = ?1", SITE_COLUMNS),
            params![site_id],
            site_from_row,
        )
        .optional()?
        .ok_or(StorageError::SiteNotFound(site_id))
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM site ORDER BY id", SITE_COLUMNS))?;
        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    fn insert_site(&self, site: &NewSite) -> StorageResult<SiteRecord> {
        let conn = self.conn()?;
        let record = conn.query_row(
            &format!(
                "INSERT INTO site (status, status_time, last_error, url, name)
                 VALUES (?1, ?2, NULL, ?3, ?4) RETURNING {}",
                SITE_COLUMNS
            ),
            params![
                site.status.to_db_string(),
                site.status_time.to_rfc3339(),
                site.url,
                site.name
            ],
            site_from_row,
        )?;
        Ok(record)
    }

    fn update_site(&self, site: &SiteRecord) -> StorageResult<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE site SET status = ?1, status_time = ?2, last_error = ?3, url = ?4, name = ?5
             WHERE id = ?6",
            params![
                site.status.to_db_string(),
                site.status_time.to_rfc3339(),
                site.last_error,
                site.url,
                site.name,
                site.id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::SiteNotFound(site.id));
        }
        Ok(())
    }

    // ===== Page Management =====

    fn upsert_page(
        &self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
    ) -> StorageResult<PageRecord> {
        let conn = self.conn()?;
        let page = conn.query_row(
            &format!(
                "INSERT INTO page (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(site_id, path) DO UPDATE SET code = excluded.code, content = excluded.content
                 RETURNING {}",
                PAGE_COLUMNS
            ),
            params![site_id, path, code, content],
            page_from_row,
        )?;
        Ok(page)
    }

    fn list_pages(&self, site_id: i64) -> StorageResult<Vec<PageRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM page WHERE site_id = ?1 ORDER BY id",
            PAGE_COLUMNS
        ))?;
        let pages = stmt
            .query_map(params![site_id], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    // ===== Lemma Management =====

    fn increment_lemma_frequency(
        &self,
        site_id: i64,
        lemma: &str,
        delta: i64,
    ) -> StorageResult<LemmaRecord> {
        let conn = self.conn()?;
        let record = conn.query_row(
            &format!(
                "INSERT INTO lemma (site_id, lemma, frequency) VALUES (?1, ?2, ?3)
                 ON CONFLICT(site_id, lemma) DO UPDATE SET frequency = frequency + excluded.frequency
                 RETURNING {}",
                LEMMA_COLUMNS
            ),
            params![site_id, lemma, delta],
            lemma_from_row,
        )?;
        Ok(record)
    }

    fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM lemma WHERE site_id = ?1 AND lemma = ?2",
                    LEMMA_COLUMNS
                ),
                params![site_id, lemma],
                lemma_from_row,
            )
            .optional()?;
        Ok(record)
    }

    // ===== Search Index =====

    fn upsert_index_entry(
        &self,
        page_id: i64,
        lemma_id: i64,
        rank: f64,
    ) -> StorageResult<IndexRecord> {
        let conn = self.conn()?;
        let record = conn.query_row(
            &format!(
                "INSERT INTO search_index (page_id, lemma_id, rank_value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(page_id, lemma_id) DO UPDATE SET rank_value = excluded.rank_value
                 RETURNING {}",
                INDEX_COLUMNS
            ),
            params![page_id, lemma_id, rank],
            index_from_row,
        )?;
        Ok(record)
    }

    fn delete_index_entries_for_page(&self, page_id: i64) -> StorageResult<usize> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM search_index WHERE page_id = ?1",
            params![page_id],
        )?;
        Ok(removed)
    }

    fn index_entries_for_page(&self, page_id: i64) -> StorageResult<Vec<IndexRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM search_index WHERE page_id = ?1 ORDER BY id",
            INDEX_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![page_id], index_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ===== Statistics =====

    fn site_statistics(&self, site_id: i64) -> StorageResult<SiteStatistics> {
        let conn = self.conn()?;
        let count = |sql: &str| -> StorageResult<u64> {
            let n: i64 = conn.query_row(sql, params![site_id], |row| row.get(0))?;
            Ok(n as u64)
        };

        Ok(SiteStatistics {
            pages: count("SELECT COUNT(*) FROM page WHERE site_id = ?1")?,
            lemmas: count("SELECT COUNT(*) FROM lemma WHERE site_id = ?1")?,
            index_entries: count(
                "SELECT COUNT(*) FROM search_index si JOIN page p ON p.id = si.page_id
                 WHERE p.site_id = ?1",
            )?,
        })
    }
}
