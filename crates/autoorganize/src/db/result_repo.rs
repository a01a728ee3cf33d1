//! Result repository: CRUD for the `organization_results` table.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::organize::result::{FileOrganizerKind, FileSortingStatus, OrganizationResult};

const DUPLICATE_DELIMITER: char = '|';

/// A raw result row from the database.
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub id: String,
    pub original_path: String,
    pub target_path: Option<String>,
    pub file_length: i64,
    pub organization_date: String,
    pub status: String,
    pub kind: String,
    pub status_message: Option<String>,
    pub extracted_name: Option<String>,
    pub extracted_year: Option<i32>,
    pub extracted_season: Option<u32>,
    pub extracted_episode: Option<u32>,
    pub extracted_ending_episode: Option<u32>,
    pub duplicate_paths: Option<String>,
}

impl ResultRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            original_path: row.get("original_path")?,
            target_path: row.get("target_path")?,
            file_length: row.get("file_length")?,
            organization_date: row.get("organization_date")?,
            status: row.get("status")?,
            kind: row.get("kind")?,
            status_message: row.get("status_message")?,
            extracted_name: row.get("extracted_name")?,
            extracted_year: row.get("extracted_year")?,
            extracted_season: row.get("extracted_season")?,
            extracted_episode: row.get("extracted_episode")?,
            extracted_ending_episode: row.get("extracted_ending_episode")?,
            duplicate_paths: row.get("duplicate_paths")?,
        })
    }

    pub fn into_result(self) -> Result<OrganizationResult, DatabaseError> {
        let invalid = |reason: String| DatabaseError::InvalidData {
            id: self.id.clone(),
            reason,
        };

        let date = DateTime::parse_from_rfc3339(&self.organization_date)
            .map_err(|e| invalid(format!("bad organization_date: {}", e)))?
            .with_timezone(&Utc);
        let status: FileSortingStatus = self.status.parse().map_err(invalid)?;
        let kind: FileOrganizerKind = self.kind.parse().map_err(invalid)?;

        let original_file_name = std::path::Path::new(&self.original_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let duplicate_paths = self
            .duplicate_paths
            .as_deref()
            .map(|d| {
                d.split(DUPLICATE_DELIMITER)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(OrganizationResult {
            id: self.id,
            original_path: self.original_path,
            original_file_name,
            target_path: self.target_path,
            file_size: self.file_length.max(0) as u64,
            date,
            kind,
            status,
            status_message: self.status_message,
            extracted_name: self.extracted_name,
            extracted_year: self.extracted_year,
            extracted_season_number: self.extracted_season,
            extracted_episode_number: self.extracted_episode,
            extracted_ending_episode_number: self.extracted_ending_episode,
            duplicate_paths,
            is_in_progress: false,
        })
    }
}

impl From<&OrganizationResult> for ResultRow {
    fn from(result: &OrganizationResult) -> Self {
        let duplicate_paths = if result.duplicate_paths.is_empty() {
            None
        } else {
            Some(result.duplicate_paths.join(&DUPLICATE_DELIMITER.to_string()))
        };

        Self {
            id: result.id.clone(),
            original_path: result.original_path.clone(),
            target_path: result.target_path.clone(),
            file_length: i64::try_from(result.file_size).unwrap_or(i64::MAX),
            organization_date: result.date.to_rfc3339_opts(SecondsFormat::Micros, true),
            status: result.status.as_str().to_string(),
            kind: result.kind.as_str().to_string(),
            status_message: result.status_message.clone(),
            extracted_name: result.extracted_name.clone(),
            extracted_year: result.extracted_year,
            extracted_season: result.extracted_season_number,
            extracted_episode: result.extracted_episode_number,
            extracted_ending_episode: result.extracted_ending_episode_number,
            duplicate_paths,
        }
    }
}

/// Inserts a row, or overwrites every column of the row with the same id.
pub fn upsert(db: &Database, row: &ResultRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO organization_results (id, original_path, target_path, file_length,
             organization_date, status, kind, status_message, extracted_name, extracted_year,
             extracted_season, extracted_episode, extracted_ending_episode, duplicate_paths)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(id) DO UPDATE SET
                original_path=excluded.original_path,
                target_path=excluded.target_path,
                file_length=excluded.file_length,
                organization_date=excluded.organization_date,
                status=excluded.status,
                kind=excluded.kind,
                status_message=excluded.status_message,
                extracted_name=excluded.extracted_name,
                extracted_year=excluded.extracted_year,
                extracted_season=excluded.extracted_season,
                extracted_episode=excluded.extracted_episode,
                extracted_ending_episode=excluded.extracted_ending_episode,
                duplicate_paths=excluded.duplicate_paths",
            params![
                row.id,
                row.original_path,
                row.target_path,
                row.file_length,
                row.organization_date,
                row.status,
                row.kind,
                row.status_message,
                row.extracted_name,
                row.extracted_year,
                row.extracted_season,
                row.extracted_episode,
                row.extracted_ending_episode,
                row.duplicate_paths,
            ],
        )?;
        Ok(())
    })
}

fn select_one(conn: &Connection, column: &str, value: &str) -> Result<Option<ResultRow>, DatabaseError> {
    let sql = format!("SELECT * FROM organization_results WHERE {} = ?1 LIMIT 1", column);
    Ok(conn
        .query_row(&sql, params![value], ResultRow::from_row)
        .optional()?)
}

/// Finds a result by its id.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<ResultRow>, DatabaseError> {
    db.with_read_conn(|conn| select_one(conn, "id", id))
}

pub fn find_by_original_path(db: &Database, path: &str) -> Result<Option<ResultRow>, DatabaseError> {
    db.with_read_conn(|conn| select_one(conn, "original_path", path))
}

/// Newest first, returning (rows, total_count). `limit = None` returns
/// everything after `offset`.
pub fn query(
    db: &Database,
    offset: u64,
    limit: Option<u64>,
) -> Result<(Vec<ResultRow>, u64), DatabaseError> {
    db.with_read_conn(|conn| {
        let total: u64 =
            conn.query_row("SELECT COUNT(*) FROM organization_results", [], |r| r.get(0))?;

        let limit = limit.map(|l| l.min(i64::MAX as u64) as i64).unwrap_or(-1);
        let offset = offset.min(i64::MAX as u64) as i64;
        let mut stmt = conn.prepare(
            "SELECT * FROM organization_results
             ORDER BY organization_date DESC, id ASC
             LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
            .query_map(params![limit, offset], ResultRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// Deletes one result. Returns whether a row was removed.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM organization_results WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}

pub fn delete_all(db: &Database) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| Ok(conn.execute("DELETE FROM organization_results", [])?))
}

pub fn delete_by_status(db: &Database, status: FileSortingStatus) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn.execute(
            "DELETE FROM organization_results WHERE status = ?1",
            params![status.as_str()],
        )?)
    })
}
