//! Smart match repository: CRUD for the `smart_match` table.
//!
//! Connection-level functions are public so callers can compose a
//! read-modify-write inside one writer transaction.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DatabaseError};
use crate::organize::result::{FileOrganizerKind, SmartMatchEntry};

#[derive(Debug, Clone)]
pub struct SmartMatchRow {
    pub id: String,
    pub item_name: String,
    pub display_name: String,
    pub kind: String,
    /// JSON array of strings.
    pub match_strings: String,
}

impl SmartMatchRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            item_name: row.get("item_name")?,
            display_name: row.get("display_name")?,
            kind: row.get("kind")?,
            match_strings: row.get("match_strings")?,
        })
    }

    pub fn into_entry(self) -> Result<SmartMatchEntry, DatabaseError> {
        let kind: FileOrganizerKind = self.kind.parse().map_err(|reason| DatabaseError::InvalidData {
            id: self.id.clone(),
            reason,
        })?;
        let match_strings: Vec<String> =
            serde_json::from_str(&self.match_strings).map_err(|e| DatabaseError::InvalidData {
                id: self.id.clone(),
                reason: format!("bad match_strings: {}", e),
            })?;

        Ok(SmartMatchEntry {
            id: self.id,
            item_name: self.item_name,
            display_name: self.display_name,
            kind,
            match_strings,
        })
    }
}

impl From<&SmartMatchEntry> for SmartMatchRow {
    fn from(entry: &SmartMatchEntry) -> Self {
        Self {
            id: entry.id.clone(),
            item_name: entry.item_name.clone(),
            display_name: entry.display_name.clone(),
            kind: entry.kind.as_str().to_string(),
            // Serializing a Vec<String> cannot fail.
            match_strings: serde_json::to_string(&entry.match_strings)
                .unwrap_or_else(|_| "[]".to_string()),
        }
    }
}

pub fn select_by_id(conn: &Connection, id: &str) -> Result<Option<SmartMatchRow>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT * FROM smart_match WHERE id = ?1",
            params![id],
            SmartMatchRow::from_row,
        )
        .optional()?)
}

pub fn write(conn: &Connection, row: &SmartMatchRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO smart_match (id, item_name, display_name, kind, match_strings)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            item_name=excluded.item_name,
            display_name=excluded.display_name,
            kind=excluded.kind,
            match_strings=excluded.match_strings",
        params![
            row.id,
            row.item_name,
            row.display_name,
            row.kind,
            row.match_strings
        ],
    )?;
    Ok(())
}

pub fn remove(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let n = conn.execute("DELETE FROM smart_match WHERE id = ?1", params![id])?;
    Ok(n > 0)
}

pub fn upsert(db: &Database, row: &SmartMatchRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| write(conn, row))
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<SmartMatchRow>, DatabaseError> {
    db.with_read_conn(|conn| select_by_id(conn, id))
}

pub fn find_by_kind(db: &Database, kind: FileOrganizerKind) -> Result<Vec<SmartMatchRow>, DatabaseError> {
    db.with_read_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM smart_match WHERE kind = ?1 ORDER BY item_name DESC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![kind.as_str()], SmartMatchRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Item name descending, returning (rows, total_count).
pub fn query(
    db: &Database,
    offset: u64,
    limit: Option<u64>,
) -> Result<(Vec<SmartMatchRow>, u64), DatabaseError> {
    db.with_read_conn(|conn| {
        let total: u64 = conn.query_row("SELECT COUNT(*) FROM smart_match", [], |r| r.get(0))?;

        let limit = limit.map(|l| l.min(i64::MAX as u64) as i64).unwrap_or(-1);
        let offset = offset.min(i64::MAX as u64) as i64;
        let mut stmt = conn.prepare(
            "SELECT * FROM smart_match ORDER BY item_name DESC, id ASC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
            .query_map(params![limit, offset], SmartMatchRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| remove(conn, id))
}

pub fn delete_all(db: &Database) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| Ok(conn.execute("DELETE FROM smart_match", [])?))
}
