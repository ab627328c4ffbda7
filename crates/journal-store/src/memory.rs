//! In-memory store implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use journal_core::{ApodRecord, InsertOutcome, JournalReader, JournalWriter, Result};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

#[derive(Debug, Default)]
struct Journal {
    records: BTreeMap<NaiveDate, ApodRecord>,
    next_id: i64,
}

/// Simple in-memory store for testing and development.
///
/// Records are kept in a date-ordered map behind a `RwLock` and are lost when
/// the store is dropped. Uniqueness per date is checked and written under the
/// same write lock, so concurrent inserts for one date yield exactly one
/// [`InsertOutcome::Inserted`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    journal: RwLock<Journal>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.journal.read().await.records.len()
    }

    /// Returns true if no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.journal.read().await.records.is_empty()
    }
}

#[async_trait]
impl JournalWriter for InMemoryStore {
    #[instrument(skip(self, record), fields(date = %record.date))]
    async fn insert(&self, record: &ApodRecord) -> Result<InsertOutcome> {
        let mut guard = self.journal.write().await;
        let journal = &mut *guard;
        let id = journal.next_id + 1;

        match journal.records.entry(record.date) {
            Entry::Occupied(_) => {
                debug!("Record already stored");
                Ok(InsertOutcome::Duplicate)
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                journal.next_id = id;
                debug!(id, "Inserted record");
                Ok(InsertOutcome::Inserted { id })
            }
        }
    }
}

#[async_trait]
impl JournalReader for InMemoryStore {
    #[instrument(skip(self))]
    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<ApodRecord>> {
        let journal = self.journal.read().await;
        Ok(journal.records.get(&date).cloned())
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<ApodRecord>> {
        let journal = self.journal.read().await;
        Ok(journal.records.values().rev().cloned().collect())
    }
}
