//! Store traits for persisting journal records.
//!
//! The write path and the read path are separate traits: the ingestion worker
//! only holds a [`JournalWriter`], the read API only holds a [`JournalReader`].
//! Both are implemented by the same backend.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{error::Result, record::ApodRecord};

/// Result of a successful call to [`JournalWriter::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted {
        /// Surrogate key assigned by the storage engine.
        id: i64,
    },
    /// A record for this date already exists; nothing was written.
    Duplicate,
}

impl InsertOutcome {
    /// Returns true if the record was already present.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate)
    }
}

/// Append-only write access to the journal.
///
/// Implementations must enforce one record per date inside the storage engine
/// itself (a uniqueness constraint), and derive [`InsertOutcome::Duplicate`] from
/// the engine's constraint violation rather than from a prior read.
#[async_trait]
pub trait JournalWriter: Send + Sync {
    /// Persists a new record keyed by its date.
    ///
    /// Returns `Ok(InsertOutcome::Duplicate)` when the date is already stored and
    /// `Err` for any other failure.
    async fn insert(&self, record: &ApodRecord) -> Result<InsertOutcome>;
}

/// Read access to the journal.
#[async_trait]
pub trait JournalReader: Send + Sync {
    /// Retrieves the record for an exact date.
    ///
    /// Returns `Ok(None)` if no record exists for that date.
    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<ApodRecord>>;

    /// Retrieves every record, most recent date first.
    ///
    /// Returns an empty vector when the journal is empty.
    async fn get_all(&self) -> Result<Vec<ApodRecord>>;
}
