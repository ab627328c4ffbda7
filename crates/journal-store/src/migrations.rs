use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_apod_journal",
        sql: r#"
CREATE TABLE IF NOT EXISTS apod_journal (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    apod_date TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    explanation TEXT NOT NULL,
    url TEXT NOT NULL,
    hd_url TEXT,
    copyright TEXT,
    media_type TEXT NOT NULL,
    service_version TEXT NOT NULL
);
"#,
    },
    Migration {
        version: "0002_ingested_at",
        sql: r#"
ALTER TABLE apod_journal ADD COLUMN ingested_at TEXT;
"#,
    },
];

/// Applies every migration not yet recorded in `schema_migrations`.
///
/// Each migration runs in its own transaction together with its bookkeeping row.
/// Returns the number of migrations applied.
pub(crate) fn apply_migrations(conn: &mut Connection) -> rusqlite::Result<usize> {
    conn.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    let mut applied = 0;
    for migration in MIGRATIONS {
        let tx = conn.transaction()?;

        let already_applied = tx
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        if already_applied {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            params![migration.version],
        )?;
        tx.commit()?;

        debug!(version = migration.version, "Applied schema migration");
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_apply_once() {
        let mut conn = Connection::open_in_memory().unwrap();

        assert_eq!(apply_migrations(&mut conn).unwrap(), MIGRATIONS.len());
        assert_eq!(apply_migrations(&mut conn).unwrap(), 0);

        let recorded: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(recorded, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_date_column_is_unique() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();

        let insert = "INSERT INTO apod_journal
            (apod_date, title, explanation, url, media_type, service_version)
            VALUES ('2024-01-01', 't', 'e', 'u', 'image', 'v1')";
        conn.execute(insert, []).unwrap();

        let err = conn.execute(insert, []).unwrap_err();
        assert_eq!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        );
    }
}
