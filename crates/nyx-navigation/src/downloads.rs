//! Download log
//!
//! Downloads are only recorded, not tracked byte by byte: a record is
//! written as completed the moment a surface reports one started.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;
use nyx_storage::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Completed,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for DownloadStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" => Ok(DownloadStatus::Completed),
            _ => Err(format!("Unknown download status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRecord {
    pub id: String,
    pub file_name: String,
    pub status: DownloadStatus,
    pub created_at: DateTime<Utc>,
}

impl DownloadRecord {
    fn started_now() -> Self {
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            file_name: format!("download-{}", created_at.timestamp_millis()),
            status: DownloadStatus::Completed,
            created_at,
        }
    }
}

pub struct DownloadLog {
    db: Database,
}

impl DownloadLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record a download reported by a surface.
    pub fn record_started(&self) -> Result<DownloadRecord> {
        let record = DownloadRecord::started_now();

        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO downloads (id, file_name, status, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    record.id,
                    record.file_name,
                    record.status.as_str(),
                    record.created_at.timestamp_millis(),
                ],
            )?;
            Ok(())
        })?;

        tracing::info!(download_id = %record.id, file_name = %record.file_name, "Recorded download");

        Ok(record)
    }

    /// All downloads, newest first
    pub fn list(&self) -> Result<Vec<DownloadRecord>> {
        Ok(self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, file_name, status, created_at FROM downloads
                 ORDER BY created_at DESC, rowid DESC",
            )?;

            let records: Vec<DownloadRecord> = stmt
                .query_map([], |row| {
                    let status_str: String = row.get(2)?;
                    let millis: i64 = row.get(3)?;

                    Ok(DownloadRecord {
                        id: row.get(0)?,
                        file_name: row.get(1)?,
                        status: status_str.parse().unwrap_or(DownloadStatus::Completed),
                        created_at: Utc
                            .timestamp_millis_opt(millis)
                            .single()
                            .unwrap_or_else(Utc::now),
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();

            Ok(records)
        })?)
    }
}

impl Clone for DownloadLog {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
