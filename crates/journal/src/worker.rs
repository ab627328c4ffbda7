//! The ingestion worker: fetch, store, classify, sleep.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use journal_core::{InsertOutcome, JournalWriter, RecordSource};

use crate::policy::PollPolicy;

/// State carried between cycles.
///
/// Lives only as long as the worker; a restart starts from zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerState {
    consecutive_duplicates: u32,
}

impl WorkerState {
    /// Number of consecutive cycles that ended in a duplicate.
    #[must_use]
    pub const fn consecutive_duplicates(&self) -> u32 {
        self.consecutive_duplicates
    }
}

/// How a single cycle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new record was stored.
    Inserted {
        /// Date of the stored record.
        date: NaiveDate,
        /// Row id assigned by the store.
        id: i64,
    },
    /// The fetched record was already stored.
    Duplicate {
        /// Date of the fetched record.
        date: NaiveDate,
        /// Consecutive duplicates including this one.
        consecutive: u32,
    },
    /// The source did not deliver a record. The store was not called.
    FetchFailed,
    /// The store failed for a reason other than a duplicate.
    StoreFailed {
        /// Date of the record that could not be stored.
        date: NaiveDate,
    },
}

/// Result of [`IngestionWorker::run_cycle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleReport {
    /// How the cycle ended.
    pub outcome: CycleOutcome,
    /// How long to sleep before the next cycle.
    pub wait: Duration,
}

/// Periodically pulls today's record from a [`RecordSource`] and writes it to
/// a [`JournalWriter`].
///
/// The worker never stops on error. Every failure is logged and retried after
/// the wait chosen by its [`PollPolicy`]; only cancellation ends [`run`](Self::run).
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use journal::{IngestionWorker, NasaApodSource, PollPolicy, SqliteStore};
/// use tokio_util::sync::CancellationToken;
///
/// let store = Arc::new(SqliteStore::new("journal.db")?);
/// let source = Arc::new(NasaApodSource::new("DEMO_KEY"));
/// let worker = IngestionWorker::new(source, store, PollPolicy::default());
///
/// let shutdown = CancellationToken::new();
/// tokio::spawn(worker.run(shutdown.child_token()));
/// ```
pub struct IngestionWorker {
    source: Arc<dyn RecordSource>,
    store: Arc<dyn JournalWriter>,
    policy: PollPolicy,
    state: WorkerState,
}

impl std::fmt::Debug for IngestionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionWorker")
            .field("source", &self.source.name())
            .field("policy", &self.policy)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl IngestionWorker {
    /// Create a worker with a fresh duplicate counter.
    #[must_use]
    pub fn new(
        source: Arc<dyn RecordSource>,
        store: Arc<dyn JournalWriter>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            source,
            store,
            policy,
            state: WorkerState::default(),
        }
    }

    /// Returns the poll policy.
    #[must_use]
    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Returns the state carried between cycles.
    #[must_use]
    pub const fn state(&self) -> WorkerState {
        self.state
    }

    /// Runs one fetch and store attempt and decides the next wait.
    ///
    /// Makes at most one write per call, and none when the fetch fails.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn run_cycle(&mut self) -> CycleReport {
        let record = match self.source.fetch_today().await {
            Ok(record) => record,
            Err(e) => {
                let wait = self.policy.wait_after_fetch_error();
                warn!(
                    error = %e,
                    kind = e.kind(),
                    wait_secs = wait.as_secs(),
                    consecutive_duplicates = self.state.consecutive_duplicates,
                    "Failed to fetch record"
                );
                return CycleReport {
                    outcome: CycleOutcome::FetchFailed,
                    wait,
                };
            }
        };

        let date = record.date;
        match self.store.insert(&record).await {
            Ok(InsertOutcome::Inserted { id }) => {
                self.state.consecutive_duplicates = 0;
                let wait = self.policy.wait_after_insert();
                info!(%date, id, wait_secs = wait.as_secs(), "Record saved");
                CycleReport {
                    outcome: CycleOutcome::Inserted { date, id },
                    wait,
                }
            }
            Ok(InsertOutcome::Duplicate) => {
                let wait = self
                    .policy
                    .wait_after_duplicate(self.state.consecutive_duplicates);
                self.state.consecutive_duplicates =
                    self.state.consecutive_duplicates.saturating_add(1);
                let consecutive = self.state.consecutive_duplicates;
                info!(
                    %date,
                    consecutive_duplicates = consecutive,
                    wait_secs = wait.as_secs(),
                    "Record already stored"
                );
                CycleReport {
                    outcome: CycleOutcome::Duplicate { date, consecutive },
                    wait,
                }
            }
            Err(e) => {
                self.state.consecutive_duplicates = 0;
                let wait = self.policy.wait_after_store_error();
                error!(
                    %date,
                    error = %e,
                    kind = e.kind(),
                    wait_secs = wait.as_secs(),
                    "Failed to save record"
                );
                CycleReport {
                    outcome: CycleOutcome::StoreFailed { date },
                    wait,
                }
            }
        }
    }

    /// Runs cycles until `shutdown` is cancelled.
    ///
    /// Cancellation interrupts both the sleep and an in-flight cycle. Returns
    /// the state at the time the loop stopped.
    pub async fn run(mut self, shutdown: CancellationToken) -> WorkerState {
        info!(
            source = self.source.name(),
            poll_interval_secs = self.policy.poll_interval.as_secs(),
            fetch_retry_interval_secs = self.policy.fetch_retry_interval.as_secs(),
            duplicate_retry_interval_secs = self.policy.duplicate_retry_interval.as_secs(),
            duplicate_threshold = self.policy.duplicate_threshold,
            "Ingestion worker started"
        );

        loop {
            let report = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                report = self.run_cycle() => report,
            };

            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(report.wait) => {}
            }
        }

        info!(
            consecutive_duplicates = self.state.consecutive_duplicates,
            "Ingestion worker stopped"
        );
        self.state
    }
}
