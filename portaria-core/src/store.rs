//! In-memory visitor list backed by [`LocalStorage`].
//!
//! The list is ordered most-recent-first for local entries. Every mutating
//! call is expected to be followed by [`RecordStore::persist`]; the store
//! itself never writes behind the caller's back.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::format::{digits, format_cpf};
use crate::models::{VisitStats, VisitorRecord, VisitorStatus};
use crate::storage::{LocalStorage, StorageError, StorageKey};

/// How many departed visits the history view shows.
pub const HISTORY_LIMIT: usize = 15;

pub struct RecordStore {
    storage: LocalStorage,
    records: Vec<VisitorRecord>,
    responsibles: Vec<String>,
}

impl RecordStore {
    /// Loads the record list and the responsible cache. Missing keys load as
    /// empty lists; so do files that no longer parse, with a warning, so a
    /// later pull can rewrite them. Read failures are still returned.
    pub fn load(storage: LocalStorage) -> Result<Self, StorageError> {
        let records = load_list(&storage, StorageKey::Visitors)?;
        let responsibles = load_list(&storage, StorageKey::Responsibles)?;

        Ok(Self {
            storage,
            records,
            responsibles,
        })
    }

    /// Writes both lists back to storage.
    pub fn persist(&self) -> Result<(), StorageError> {
        self.storage.save(StorageKey::Visitors, &self.records)?;
        self.storage
            .save(StorageKey::Responsibles, &self.responsibles)?;
        Ok(())
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn records(&self) -> &[VisitorRecord] {
        &self.records
    }

    pub fn responsibles(&self) -> &[String] {
        &self.responsibles
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts a record at the front.
    pub fn append(&mut self, record: VisitorRecord) {
        self.records.insert(0, record);
    }

    pub fn get(&self, id: &str) -> Option<&VisitorRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Applies `mutate` to the record with the given id, keeping its
    /// position. Returns a copy of the updated record.
    pub fn update_by_id<F>(&mut self, id: &str, mutate: F) -> Option<VisitorRecord>
    where
        F: FnOnce(&mut VisitorRecord),
    {
        let record = self.records.iter_mut().find(|r| r.id == id)?;
        mutate(record);
        Some(record.clone())
    }

    /// Replaces the whole record list.
    pub fn replace_all(&mut self, records: Vec<VisitorRecord>) {
        self.records = records;
    }

    pub fn replace_responsibles(&mut self, responsibles: Vec<String>) {
        self.responsibles = responsibles;
    }

    /// First record whose CPF digits equal `cpf_digits`.
    pub fn find_by_identifier(&self, cpf_digits: &str) -> Option<&VisitorRecord> {
        if cpf_digits.is_empty() {
            return None;
        }
        self.records
            .iter()
            .find(|r| digits(&r.identifier) == cpf_digits)
    }

    /// Records currently inside, in store order.
    pub fn active(&self) -> Vec<&VisitorRecord> {
        self.records.iter().filter(|r| r.is_inside()).collect()
    }

    /// Departed records in reverse store order, capped at [`HISTORY_LIMIT`].
    ///
    /// Snapshot rows arrive oldest-first, so after a pull this lists the most
    /// recent departures first.
    pub fn history(&self) -> Vec<&VisitorRecord> {
        self.records
            .iter()
            .rev()
            .filter(|r| r.status == VisitorStatus::Departed)
            .take(HISTORY_LIMIT)
            .collect()
    }

    /// Case-insensitive name match, or CPF match against the stored digits
    /// or their masked form.
    pub fn search(&self, query: &str) -> Vec<&VisitorRecord> {
        let needle = query.trim().to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                r.full_name.to_lowercase().contains(&needle)
                    || r.identifier.contains(&needle)
                    || format_cpf(&r.identifier).contains(&needle)
            })
            .collect()
    }

    pub fn stats(&self, today: NaiveDate) -> VisitStats {
        VisitStats::from_records(&self.records, today)
    }
}

fn load_list<T: DeserializeOwned>(
    storage: &LocalStorage,
    key: StorageKey,
) -> Result<Vec<T>, StorageError> {
    match storage.load(key) {
        Ok(list) => Ok(list.unwrap_or_default()),
        Err(StorageError::ParseError(path, e)) => {
            tracing::warn!(
                "Ignoring unreadable {} at {}: {}",
                key.name(),
                path.display(),
                e
            );
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SyncStatus;
    use tempfile::TempDir;

    fn test_store() -> (RecordStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_path_buf());
        (RecordStore::load(storage).unwrap(), temp_dir)
    }

    fn entry(name: &str, cpf: &str) -> VisitorRecord {
        VisitorRecord::new_entry(name, cpf, "11999998888", "Ana", "05/03/2024, 09:00:00")
    }

    #[test]
    fn test_load_empty() {
        let (store, _temp) = test_store();
        assert!(store.is_empty());
        assert!(store.responsibles().is_empty());
    }

    #[test]
    fn test_corrupt_files_load_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_path_buf());
        std::fs::write(storage.path(StorageKey::Visitors), "[not json").unwrap();
        std::fs::write(storage.path(StorageKey::Responsibles), "{").unwrap();

        let mut store = RecordStore::load(storage).unwrap();
        assert!(store.is_empty());
        assert!(store.responsibles().is_empty());

        store.append(entry("joe", "12345678901"));
        store.persist().unwrap();
        let reloaded = RecordStore::load(LocalStorage::new(temp_dir.path().to_path_buf())).unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_append_prepends() {
        let (mut store, _temp) = test_store();
        store.append(entry("first", "11111111111"));
        store.append(entry("second", "22222222222"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].full_name, "SECOND");
        assert_eq!(store.records()[1].full_name, "FIRST");
    }

    #[test]
    fn test_persist_and_reload() {
        let (mut store, temp) = test_store();
        store.append(entry("joe", "12345678901"));
        store.replace_responsibles(vec!["Ana".to_string()]);
        store.persist().unwrap();

        let reloaded = RecordStore::load(LocalStorage::new(temp.path().to_path_buf())).unwrap();
        assert_eq!(reloaded.records(), store.records());
        assert_eq!(reloaded.responsibles(), ["Ana".to_string()]);
    }

    #[test]
    fn test_update_by_id_preserves_order() {
        let (mut store, _temp) = test_store();
        store.append(entry("a", "11111111111"));
        store.append(entry("b", "22222222222"));
        store.append(entry("c", "33333333333"));
        let target = store.records()[1].id.clone();

        let updated = store
            .update_by_id(&target, |r| r.sync_status = SyncStatus::Synced)
            .unwrap();

        assert_eq!(updated.sync_status, SyncStatus::Synced);
        assert_eq!(store.records()[1].id, target);
        assert_eq!(store.records()[1].sync_status, SyncStatus::Synced);
        assert_eq!(store.records()[0].sync_status, SyncStatus::Pending);
    }

    #[test]
    fn test_update_unknown_id() {
        let (mut store, _temp) = test_store();
        store.append(entry("a", "11111111111"));
        assert!(store.update_by_id("missing", |_| {}).is_none());
    }

    #[test]
    fn test_find_by_identifier() {
        let (mut store, _temp) = test_store();
        store.append(entry("a", "11111111111"));
        store.append(entry("b", "22222222222"));

        assert_eq!(
            store.find_by_identifier("11111111111").unwrap().full_name,
            "A"
        );
        assert!(store.find_by_identifier("99999999999").is_none());
        assert!(store.find_by_identifier("").is_none());
    }

    #[test]
    fn test_active_and_history() {
        let (mut store, _temp) = test_store();
        store.append(entry("a", "11111111111"));
        store.append(entry("b", "22222222222"));
        let id = store.records()[1].id.clone();
        store.update_by_id(&id, |r| r.mark_departed("05/03/2024, 10:00:00"));

        let active: Vec<_> = store.active().iter().map(|r| r.full_name.clone()).collect();
        let history: Vec<_> = store.history().iter().map(|r| r.full_name.clone()).collect();
        assert_eq!(active, vec!["B"]);
        assert_eq!(history, vec!["A"]);
    }

    #[test]
    fn test_history_is_capped() {
        let (mut store, _temp) = test_store();
        for i in 0..20 {
            let mut record = entry(&format!("v{}", i), "11111111111");
            record.mark_departed("05/03/2024, 10:00:00");
            store.append(record);
        }

        let history = store.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].full_name, "V0");
    }

    #[test]
    fn test_search() {
        let (mut store, _temp) = test_store();
        store.append(entry("maria souza", "12345678901"));
        store.append(entry("joão", "98765432100"));

        assert_eq!(store.search("SOUZA").len(), 1);
        assert_eq!(store.search("987654").len(), 1);
        assert_eq!(store.search("123.456").len(), 1);
        assert_eq!(store.search("").len(), 2);
        assert!(store.search("nobody").is_empty());
    }
}
