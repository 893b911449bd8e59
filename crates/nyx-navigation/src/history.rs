//! History log
//!
//! One row per committed top-level navigation, newest first when read back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use nyx_storage::Database;

pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub visited_at: DateTime<Utc>,
}

pub struct HistoryManager {
    db: Database,
    /// Oldest entries beyond this count are dropped on insert
    limit: usize,
}

impl HistoryManager {
    pub fn new(db: Database) -> Self {
        Self::with_limit(db, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(db: Database, limit: usize) -> Self {
        Self {
            db,
            limit: limit.max(1),
        }
    }

    /// Append a visit. An empty title is stored as the url.
    pub fn record_visit(&self, url: &str, title: &str) -> Result<()> {
        let title = if title.trim().is_empty() { url } else { title };
        let visited_at = Utc::now().to_rfc3339();

        Ok(self.db.transaction(|conn| {
            conn.execute(
                "INSERT INTO history (url, title, visited_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![url, title, visited_at],
            )?;
            conn.execute(
                "DELETE FROM history WHERE id NOT IN
                 (SELECT id FROM history ORDER BY id DESC LIMIT ?1)",
                [self.limit as i64],
            )?;
            Ok(())
        })?)
    }

    /// Search history by url or title substring
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let pattern = format!("%{}%", query.to_lowercase());
        self.query(
            "SELECT id, url, title, visited_at FROM history
             WHERE LOWER(url) LIKE ?1 OR LOWER(title) LIKE ?1
             ORDER BY id DESC
             LIMIT ?2",
            rusqlite::params![pattern, limit as i64],
        )
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.query(
            "SELECT id, url, title, visited_at FROM history
             ORDER BY id DESC
             LIMIT ?1",
            rusqlite::params![limit as i64],
        )
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.db.with_connection(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
            Ok(count as usize)
        })?)
    }

    pub fn clear_all(&self) -> Result<()> {
        Ok(self.db.with_connection(|conn| {
            conn.execute("DELETE FROM history", [])?;
            Ok(())
        })?)
    }

    fn query(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<HistoryEntry>> {
        Ok(self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(sql)?;

            let entries: Vec<HistoryEntry> = stmt
                .query_map(params, |row| {
                    let visited_str: String = row.get(3)?;
                    let visited_at = DateTime::parse_from_rfc3339(&visited_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now());

                    Ok(HistoryEntry {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        title: row.get(2)?,
                        visited_at,
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();

            Ok(entries)
        })?)
    }
}

impl Clone for HistoryManager {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            limit: self.limit,
        }
    }
}
