//! SQLite-based store implementation.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use journal_core::{
    ApodRecord, InsertOutcome, JournalError, JournalReader, JournalWriter, MediaKind, Result,
};
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, ffi, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{Span, debug, instrument};

use crate::migrations::apply_migrations;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str = "SELECT apod_date, title, explanation, url, hd_url, copyright, media_type, service_version
     FROM apod_journal";

type SharedConnection = Arc<Mutex<Connection>>;

/// SQLite-based journal store.
///
/// One row per date, enforced by a `UNIQUE` constraint on `apod_date`. File-backed
/// stores run in WAL mode with a writer connection and a separate read-only
/// connection, so queries from the read API proceed while an insert is in flight.
///
/// Statements run on tokio's blocking pool; a writer waiting out `busy_timeout`
/// never stalls the async runtime.
#[derive(Debug)]
pub struct SqliteStore {
    writer: SharedConnection,
    reader: SharedConnection,
}

impl SqliteStore {
    /// Open (or create) a SQLite store at the given path.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut writer = Connection::open(path).map_err(storage_error)?;
        writer.busy_timeout(BUSY_TIMEOUT).map_err(storage_error)?;
        let mode: String = writer
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(storage_error)?;
        debug!(journal_mode = %mode, "Opened SQLite writer connection");

        let applied = apply_migrations(&mut writer).map_err(storage_error)?;
        debug!(applied, "SQLite store schema up to date");

        let reader = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(storage_error)?;
        reader.busy_timeout(BUSY_TIMEOUT).map_err(storage_error)?;

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            reader: Arc::new(Mutex::new(reader)),
        })
    }

    /// Create an in-memory SQLite store.
    ///
    /// Useful for testing; data is lost when the store is dropped. Reads and
    /// writes share a single connection.
    ///
    /// # Errors
    /// Returns an error if migrations fail.
    pub fn in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().map_err(storage_error)?;
        apply_migrations(&mut conn).map_err(storage_error)?;
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self {
            writer: Arc::clone(&conn),
            reader: conn,
        })
    }
}

/// Runs `f` against `conn` on the blocking pool, inside the caller's span.
async fn run_blocking<T, F>(conn: &SharedConnection, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
{
    let conn = Arc::clone(conn);
    let span = Span::current();

    tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        let guard = conn
            .lock()
            .map_err(|e| JournalError::Storage(e.to_string()))?;
        f(&guard)
    })
    .await
    .map_err(|e| JournalError::Storage(format!("SQLite task failed: {e}")))?
}

#[async_trait]
impl JournalWriter for SqliteStore {
    #[instrument(skip(self, record), fields(date = %record.date))]
    async fn insert(&self, record: &ApodRecord) -> Result<InsertOutcome> {
        let record = record.clone();
        let ingested_at = Utc::now().to_rfc3339();

        run_blocking(&self.writer, move |conn| {
            let result = conn.execute(
                "INSERT INTO apod_journal
                 (apod_date, title, explanation, url, hd_url, copyright, media_type, service_version, ingested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.date.to_string(),
                    record.title,
                    record.explanation,
                    record.url,
                    record.hd_url,
                    record.copyright,
                    record.media_type.as_str(),
                    record.service_version,
                    ingested_at
                ],
            );

            match result {
                Ok(_) => {
                    let id = conn.last_insert_rowid();
                    debug!(id, "Inserted record");
                    Ok(InsertOutcome::Inserted { id })
                }
                Err(e) if is_unique_violation(&e) => {
                    debug!("Record already stored");
                    Ok(InsertOutcome::Duplicate)
                }
                Err(e) => Err(storage_error(e)),
            }
        })
        .await
    }
}

#[async_trait]
impl JournalReader for SqliteStore {
    #[instrument(skip(self))]
    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<ApodRecord>> {
        run_blocking(&self.reader, move |conn| {
            let row = conn
                .query_row(
                    &format!("{SELECT_COLUMNS} WHERE apod_date = ?1"),
                    params![date.to_string()],
                    RecordRow::from_row,
                )
                .optional()
                .map_err(storage_error)?;

            match row {
                Some(row) => Ok(Some(row.try_into()?)),
                None => {
                    debug!("No record stored for date");
                    Ok(None)
                }
            }
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<ApodRecord>> {
        run_blocking(&self.reader, |conn| {
            let mut stmt = conn
                .prepare(&format!("{SELECT_COLUMNS} ORDER BY apod_date DESC"))
                .map_err(storage_error)?;

            let rows = stmt
                .query_map([], RecordRow::from_row)
                .map_err(storage_error)?;

            let mut records = Vec::new();
            for row in rows {
                let row = row.map_err(storage_error)?;
                records.push(row.try_into()?);
            }

            debug!("Loaded {} records", records.len());
            Ok(records)
        })
        .await
    }
}

/// Raw column values, converted to an [`ApodRecord`] outside the rusqlite row callback.
struct RecordRow {
    date: String,
    title: String,
    explanation: String,
    url: String,
    hd_url: Option<String>,
    copyright: Option<String>,
    media_type: String,
    service_version: String,
}

impl RecordRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            date: row.get(0)?,
            title: row.get(1)?,
            explanation: row.get(2)?,
            url: row.get(3)?,
            hd_url: row.get(4)?,
            copyright: row.get(5)?,
            media_type: row.get(6)?,
            service_version: row.get(7)?,
        })
    }
}

impl TryFrom<RecordRow> for ApodRecord {
    type Error = JournalError;

    fn try_from(row: RecordRow) -> Result<Self> {
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| JournalError::Storage(format!("Invalid stored date {}: {e}", row.date)))?;
        let media_type = row
            .media_type
            .parse::<MediaKind>()
            .map_err(|e| JournalError::Storage(e.to_string()))?;

        Ok(Self {
            date,
            title: row.title,
            explanation: row.explanation,
            url: row.url,
            hd_url: row.hd_url,
            copyright: row.copyright,
            media_type,
            service_version: row.service_version,
        })
    }
}

/// True if the error is SQLite rejecting a row for violating a unique or primary key constraint.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

fn storage_error(e: rusqlite::Error) -> JournalError {
    JournalError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn record(date: &str) -> ApodRecord {
        ApodRecord::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            format!("Picture for {date}"),
            "An explanation.",
            format!("https://apod.nasa.gov/apod/image/{date}.jpg"),
            MediaKind::Image,
            "v1",
        )
    }

    #[tokio::test]
    async fn test_sqlite_store_initialization() {
        let store = SqliteStore::in_memory();
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn test_insert_twice_keeps_one_row() {
        let store = SqliteStore::in_memory().unwrap();
        let apod = record("2024-01-01");

        let first = store.insert(&apod).await.unwrap();
        assert!(matches!(first, InsertOutcome::Inserted { .. }));

        let second = store.insert(&apod).await.unwrap();
        assert_eq!(second, InsertOutcome::Duplicate);

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_detected_even_when_content_differs() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert(&record("2024-01-01")).await.unwrap();

        let mut changed = record("2024-01-01");
        changed.title = "A different title".to_string();
        assert_eq!(
            store.insert(&changed).await.unwrap(),
            InsertOutcome::Duplicate
        );

        let stored = store
            .get_by_date(changed.date)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "Picture for 2024-01-01");
    }

    #[tokio::test]
    async fn test_get_all_newest_first() {
        let store = SqliteStore::in_memory().unwrap();
        for date in ["2024-01-01", "2024-01-03", "2024-01-02"] {
            store.insert(&record(date)).await.unwrap();
        }

        let dates: Vec<String> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.date.to_string())
            .collect();
        assert_eq!(dates, vec!["2024-01-03", "2024-01-02", "2024-01-01"]);
    }

    #[tokio::test]
    async fn test_get_all_empty() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_date_not_found() {
        let store = SqliteStore::in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2099, 1, 1).unwrap();
        assert!(store.get_by_date(date).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_optional_fields_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let video = ApodRecord::new(
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            "Solar Eclipse",
            "Totality over Texas.",
            "https://www.youtube.com/embed/xyz",
            MediaKind::Video,
            "v1",
        )
        .with_copyright("Jane Doe");
        store.insert(&video).await.unwrap();

        let stored = store.get_by_date(video.date).await.unwrap().unwrap();
        assert_eq!(stored, video);
        assert!(stored.hd_url.is_none());
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store.insert(&record("2024-01-01")).await.unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(
            store.insert(&record("2024-01-01")).await.unwrap(),
            InsertOutcome::Duplicate
        );
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reader_sees_committed_insert() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("journal.db")).unwrap();

        store.insert(&record("2024-03-01")).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(store.get_by_date(date).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reads_not_blocked_by_open_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        let store = SqliteStore::new(&path).unwrap();
        store.insert(&record("2024-03-01")).await.unwrap();

        // A second writer holds the write lock with an uncommitted row.
        let other = Connection::open(&path).unwrap();
        other.execute_batch("BEGIN IMMEDIATE").unwrap();
        other
            .execute(
                "INSERT INTO apod_journal
                 (apod_date, title, explanation, url, media_type, service_version)
                 VALUES ('2024-03-02', 't', 'e', 'u', 'image', 'v1')",
                [],
            )
            .unwrap();

        let started = Instant::now();
        let all = store.get_all().await.unwrap();
        let pending = store
            .get_by_date(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap())
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(all.len(), 1);
        assert!(pending.is_none());
        assert!(
            elapsed < BUSY_TIMEOUT / 5,
            "reads waited {elapsed:?} behind an open write"
        );

        other.execute_batch("COMMIT").unwrap();
        assert_eq!(store.get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_locked_writer_does_not_stall_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        let store = Arc::new(SqliteStore::new(&path).unwrap());

        let other = Connection::open(&path).unwrap();
        other.execute_batch("BEGIN IMMEDIATE").unwrap();

        let insert = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.insert(&record("2024-04-01")).await }
        });

        // The insert waits on the lock in the blocking pool; this
        // single-threaded runtime keeps serving reads meanwhile.
        let started = Instant::now();
        assert!(store.get_all().await.unwrap().is_empty());
        assert!(started.elapsed() < BUSY_TIMEOUT / 5);

        other.execute_batch("COMMIT").unwrap();
        let outcome = insert.await.unwrap().unwrap();
        assert!(matches!(outcome, InsertOutcome::Inserted { .. }));
    }

    #[tokio::test]
    async fn test_two_stores_on_one_file_insert_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        let a = Arc::new(SqliteStore::new(&path).unwrap());
        let b = Arc::new(SqliteStore::new(&path).unwrap());

        let apod = record("2024-05-05");
        let (ra, rb) = tokio::join!(a.insert(&apod), b.insert(&apod));
        let outcomes = [ra.unwrap(), rb.unwrap()];

        let inserted = outcomes.iter().filter(|o| !o.is_duplicate()).count();
        assert_eq!(inserted, 1);
        assert_eq!(a.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_same_date() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert(&record("2024-06-01")).await })
            })
            .collect();

        let mut inserted = 0;
        for handle in handles {
            if !handle.await.unwrap().unwrap().is_duplicate() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }
}
