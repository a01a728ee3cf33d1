//! Domain-level access to the organization log and smart matches.

use super::result_repo::{self, ResultRow};
use super::smart_match_repo::{self, SmartMatchRow};
use super::{Database, DatabaseError};
use crate::organize::result::{
    FileOrganizerKind, FileSortingStatus, OrganizationResult, QueryResult, SmartMatchEntry,
};

#[derive(Clone)]
pub struct ResultStore {
    db: Database,
}

impl ResultStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn save_result(&self, result: &OrganizationResult) -> Result<(), DatabaseError> {
        result_repo::upsert(&self.db, &ResultRow::from(result))
    }

    pub fn get_result(&self, id: &str) -> Result<Option<OrganizationResult>, DatabaseError> {
        result_repo::find_by_id(&self.db, id)?
            .map(ResultRow::into_result)
            .transpose()
    }

    pub fn get_result_by_original_path(
        &self,
        path: &str,
    ) -> Result<Option<OrganizationResult>, DatabaseError> {
        result_repo::find_by_original_path(&self.db, path)?
            .map(ResultRow::into_result)
            .transpose()
    }

    /// Skips `start` records, newest first, and takes at most `limit`.
    pub fn query_results(
        &self,
        start: u64,
        limit: Option<u64>,
    ) -> Result<QueryResult<OrganizationResult>, DatabaseError> {
        let (rows, total) = result_repo::query(&self.db, start, limit)?;
        let items = rows
            .into_iter()
            .map(ResultRow::into_result)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QueryResult {
            items,
            total_record_count: total,
        })
    }

    pub fn delete_result(&self, id: &str) -> Result<bool, DatabaseError> {
        result_repo::delete(&self.db, id)
    }

    pub fn delete_all(&self) -> Result<usize, DatabaseError> {
        result_repo::delete_all(&self.db)
    }

    pub fn delete_all_successful(&self) -> Result<usize, DatabaseError> {
        result_repo::delete_by_status(&self.db, FileSortingStatus::Success)
    }

    /// Saves an entry. An entry without match strings is deleted instead.
    pub fn save_smart_match(&self, entry: &SmartMatchEntry) -> Result<(), DatabaseError> {
        if entry.match_strings.is_empty() {
            smart_match_repo::delete(&self.db, &entry.id)?;
            return Ok(());
        }
        smart_match_repo::upsert(&self.db, &SmartMatchRow::from(entry))
    }

    pub fn get_smart_match(&self, id: &str) -> Result<Option<SmartMatchEntry>, DatabaseError> {
        smart_match_repo::find_by_id(&self.db, id)?
            .map(SmartMatchRow::into_entry)
            .transpose()
    }

    pub fn query_smart_matches(
        &self,
        start: u64,
        limit: Option<u64>,
    ) -> Result<QueryResult<SmartMatchEntry>, DatabaseError> {
        let (rows, total) = smart_match_repo::query(&self.db, start, limit)?;
        let items = rows
            .into_iter()
            .map(SmartMatchRow::into_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QueryResult {
            items,
            total_record_count: total,
        })
    }

    pub fn smart_matches_for_kind(
        &self,
        kind: FileOrganizerKind,
    ) -> Result<Vec<SmartMatchEntry>, DatabaseError> {
        smart_match_repo::find_by_kind(&self.db, kind)?
            .into_iter()
            .map(SmartMatchRow::into_entry)
            .collect()
    }

    pub fn delete_smart_match(&self, id: &str) -> Result<bool, DatabaseError> {
        smart_match_repo::delete(&self.db, id)
    }

    pub fn delete_all_smart_matches(&self) -> Result<usize, DatabaseError> {
        smart_match_repo::delete_all(&self.db)
    }

    /// Removes one match string. The entry is deleted once it has none left.
    ///
    /// Returns `false` when the entry does not exist.
    pub fn delete_match_string(&self, id: &str, value: &str) -> Result<bool, DatabaseError> {
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let Some(row) = smart_match_repo::select_by_id(&tx, id)? else {
                return Ok(false);
            };
            let mut entry = row.into_entry()?;
            entry.remove(value);
            if entry.match_strings.is_empty() {
                smart_match_repo::remove(&tx, id)?;
            } else {
                smart_match_repo::write(&tx, &SmartMatchRow::from(&entry))?;
            }
            tx.commit()?;
            Ok(true)
        })
    }

    /// Appends `value` to the entry for this item, creating the entry if
    /// needed. Duplicates (ignoring case) are not added twice.
    pub fn add_match_string(
        &self,
        kind: FileOrganizerKind,
        item_name: &str,
        display_name: &str,
        value: &str,
    ) -> Result<SmartMatchEntry, DatabaseError> {
        let id = SmartMatchEntry::id_for(kind, item_name);
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let mut entry = match smart_match_repo::select_by_id(&tx, &id)? {
                Some(row) => row.into_entry()?,
                None => SmartMatchEntry {
                    id: id.clone(),
                    item_name: item_name.to_string(),
                    display_name: display_name.to_string(),
                    kind,
                    match_strings: Vec::new(),
                },
            };
            entry.add(value);
            smart_match_repo::write(&tx, &SmartMatchRow::from(&entry))?;
            tx.commit()?;
            Ok(entry)
        })
    }
}
