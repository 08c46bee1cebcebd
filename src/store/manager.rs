//! In-memory record store
//!
//! The store is the only mutator of records. Reads share a lock; every
//! mutation runs under the exclusive write lock, so a reader never sees a
//! half-applied update.

use crate::error::{TodoError, TodoResult};
use crate::store::record::{NewRecord, Priority, Record, RecordPatch};
use parking_lot::RwLock;
use tracing::{debug, info};

/// Ordered, uniquely keyed record collection
#[derive(Debug)]
pub struct RecordStore {
    inner: RwLock<StoreState>,
}

#[derive(Debug)]
struct StoreState {
    /// Records in insertion order
    records: Vec<Record>,

    /// Next id to hand out. Only ever grows, so deleted ids are never reused.
    next_id: u64,
}

impl StoreState {
    fn position(&self, id: u64) -> TodoResult<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or(TodoError::NotFound(id))
    }
}

impl RecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreState {
                records: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Create a store holding the given records, in order.
    ///
    /// Fails if any record is invalid or two records share an id.
    pub fn with_records(records: Vec<Record>) -> TodoResult<Self> {
        for (i, record) in records.iter().enumerate() {
            NewRecord {
                name: record.name.clone(),
                description: record.description.clone(),
                priority: record.priority,
            }
            .validate()?;

            if records[..i].iter().any(|r| r.id == record.id) {
                return Err(TodoError::invalid(
                    "id",
                    format!("duplicate id {} in initial records", record.id),
                ));
            }
        }

        let next_id = match records.iter().map(|r| r.id).max() {
            Some(max) => max.checked_add(1).ok_or_else(id_space_exhausted)?,
            None => 1,
        };

        Ok(Self {
            inner: RwLock::new(StoreState { records, next_id }),
        })
    }

    /// Store preloaded with the two sample records
    pub fn seeded() -> Self {
        Self {
            inner: RwLock::new(StoreState {
                records: sample_records(),
                next_id: 3,
            }),
        }
    }

    /// List records in insertion order.
    ///
    /// A positive `limit` returns at most that many records from the front;
    /// an absent or non-positive limit returns everything.
    pub fn list(&self, limit: Option<i64>) -> Vec<Record> {
        let state = self.inner.read();
        match limit {
            Some(n) if n > 0 => {
                let n = usize::try_from(n).unwrap_or(usize::MAX);
                state.records.iter().take(n).cloned().collect()
            }
            _ => state.records.clone(),
        }
    }

    /// Get a record by id
    pub fn get(&self, id: u64) -> TodoResult<Record> {
        let state = self.inner.read();
        state
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(TodoError::NotFound(id))
    }

    /// Create a record and return its id
    pub fn create(&self, new: NewRecord) -> TodoResult<u64> {
        new.validate()?;

        let mut state = self.inner.write();
        let id = state.next_id;
        state.next_id = id.checked_add(1).ok_or_else(id_space_exhausted)?;
        state.records.push(new.into_record(id));

        info!(id, "Created todo");
        Ok(id)
    }

    /// Apply a partial update and return the updated record.
    ///
    /// Either every supplied field is applied or none is.
    pub fn update(&self, id: u64, patch: RecordPatch) -> TodoResult<Record> {
        patch.validate()?;

        let mut state = self.inner.write();
        let pos = state.position(id)?;
        let record = &mut state.records[pos];
        patch.apply_to(record);

        debug!(id, priority = %record.priority, "Updated todo");
        Ok(record.clone())
    }

    /// Remove a record and return it
    pub fn delete(&self, id: u64) -> TodoResult<Record> {
        let mut state = self.inner.write();
        let pos = state.position(id)?;
        let removed = state.records.remove(pos);

        info!(id, "Deleted todo");
        Ok(removed)
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn id_space_exhausted() -> TodoError {
    TodoError::invalid("id", "no ids left to assign")
}

/// The two records a fresh seeded store starts with
pub fn sample_records() -> Vec<Record> {
    vec![
        Record {
            id: 1,
            name: "sports".to_string(),
            description: "Go to Gym".to_string(),
            priority: Priority::Medium,
        },
        Record {
            id: 2,
            name: "Grocery".to_string(),
            description: "Get grocery".to_string(),
            priority: Priority::High,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn sample_scenario() {
        let store = RecordStore::seeded();

        let id = store
            .create(NewRecord::new("Laundry", "Wash clothes"))
            .unwrap();
        assert_eq!(id, 3);
        assert_eq!(store.get(3).unwrap().priority, Priority::Low);

        let updated = store
            .update(1, RecordPatch::default().priority(Priority::High))
            .unwrap();
        assert_eq!(updated.id, 1);
        assert_eq!(updated.name, "sports");
        assert_eq!(updated.description, "Go to Gym");
        assert_eq!(updated.priority, Priority::High);

        let removed = store.delete(2).unwrap();
        assert_eq!(removed.name, "Grocery");
        assert!(matches!(store.get(2), Err(TodoError::NotFound(2))));
    }

    #[test]
    fn id_space_exhaustion_is_an_error() {
        let last = Record {
            id: u64::MAX,
            name: "last".to_string(),
            description: "highest id".to_string(),
            priority: Priority::Low,
        };
        let err = RecordStore::with_records(vec![last.clone()]).err().unwrap();
        assert!(matches!(err, TodoError::InvalidInput { field: "id", .. }));

        let store = RecordStore::with_records(vec![Record {
            id: u64::MAX - 1,
            ..last
        }])
        .unwrap();
        let err = store.create(NewRecord::new("more", "one too many")).unwrap_err();
        assert!(matches!(err, TodoError::InvalidInput { field: "id", .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_on_empty_store_starts_at_one() {
        let store = RecordStore::new();
        assert_eq!(store.create(NewRecord::new("first", "one")).unwrap(), 1);
        assert_eq!(store.create(NewRecord::new("second", "two")).unwrap(), 2);
    }

    #[test]
    fn created_id_exceeds_existing_ids() {
        let store = RecordStore::seeded();
        for i in 0..5 {
            let max = store.list(None).iter().map(|r| r.id).max().unwrap_or(0);
            let id = store
                .create(NewRecord::new(format!("task-{}", i), "something"))
                .unwrap();
            assert!(id > max);
        }
    }

    #[test]
    fn create_keeps_supplied_fields() {
        let store = RecordStore::new();
        let id = store
            .create(NewRecord::new("Laundry", "Wash clothes").with_priority(Priority::Medium))
            .unwrap();
        let record = store.get(id).unwrap();
        assert_eq!(record.name, "Laundry");
        assert_eq!(record.description, "Wash clothes");
        assert_eq!(record.priority, Priority::Medium);
    }

    #[test]
    fn deleted_ids_are_never_reused() {
        let store = RecordStore::seeded();
        let id = store.create(NewRecord::new("Laundry", "Wash")).unwrap();
        store.delete(id).unwrap();

        let next = store.create(NewRecord::new("Dishes", "Wash")).unwrap();
        assert_ne!(next, id);
        assert!(next > id);
        assert!(store.get(id).is_err());
    }

    #[test]
    fn invalid_create_leaves_store_untouched() {
        let store = RecordStore::seeded();
        assert!(store.create(NewRecord::new("ab", "short")).is_err());
        assert_eq!(store.len(), 2);
        // The failed attempt does not burn an id
        assert_eq!(store.create(NewRecord::new("abc", "ok")).unwrap(), 3);
    }

    #[test]
    fn update_is_all_or_nothing() {
        let store = RecordStore::seeded();
        let before = store.get(1).unwrap();

        let err = store
            .update(
                1,
                RecordPatch::default()
                    .name("Running")
                    .description("")
                    .priority(Priority::Low),
            )
            .unwrap_err();
        assert!(matches!(err, TodoError::InvalidInput { .. }));
        assert_eq!(store.get(1).unwrap(), before);
    }

    #[test]
    fn update_missing_id_is_not_found() {
        let store = RecordStore::seeded();
        let err = store
            .update(42, RecordPatch::default().name("nothing"))
            .unwrap_err();
        assert!(matches!(err, TodoError::NotFound(42)));
    }

    #[test]
    fn delete_missing_id_is_not_found() {
        let store = RecordStore::new();
        assert!(matches!(store.delete(1), Err(TodoError::NotFound(1))));
    }

    #[test]
    fn list_respects_limit_and_order() {
        let store = RecordStore::seeded();
        store.create(NewRecord::new("Laundry", "Wash")).unwrap();

        let first = store.list(Some(1));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, 1);

        let ids: Vec<u64> = store.list(None).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert_eq!(store.list(Some(0)).len(), 3);
        assert_eq!(store.list(Some(-5)).len(), 3);
        assert_eq!(store.list(Some(100)).len(), 3);
    }

    #[test]
    fn list_empty_store() {
        assert!(RecordStore::new().list(None).is_empty());
        assert!(RecordStore::new().list(Some(1)).is_empty());
    }

    #[test]
    fn with_records_rejects_duplicates() {
        let mut records = sample_records();
        records[1].id = 1;
        assert!(RecordStore::with_records(records).is_err());
    }

    #[test]
    fn with_records_continues_after_highest_id() {
        let mut records = sample_records();
        records[0].id = 10;
        let store = RecordStore::with_records(records).unwrap();
        assert_eq!(store.create(NewRecord::new("next", "one")).unwrap(), 11);
    }

    #[test]
    fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(RecordStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|i| {
                            store
                                .create(NewRecord::new(format!("t{}-{}", t, i), "work"))
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(store.len(), 200);
    }
}
