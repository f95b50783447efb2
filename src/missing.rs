//! Remember catalog queries that had no dataset, so later runs don't ask again for a while.
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;

/// How long a query stays marked as missing.
pub const MISSING_EXPIRY_DAYS: i64 = 30;

pub struct MissingDatasetDb {
    db_conn: Connection,
}

impl MissingDatasetDb {
    /// Open the cache at `db_file`, normally [`Paths::missing_db`](crate::Paths::missing_db).
    pub fn open_or_create(db_file: &Path) -> Result<Self> {
        let db_conn = Connection::open_with_flags(
            db_file,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;

        db_conn.execute(
            "CREATE TABLE IF NOT EXISTS missing (
                query_key TEXT PRIMARY KEY,
                noted     INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(MissingDatasetDb { db_conn })
    }

    /// Has `key` been found missing within the last [`MISSING_EXPIRY_DAYS`]?
    pub fn is_missing(&self, key: &str, now: DateTime<Utc>) -> Result<bool> {
        let noted: Option<i64> = self
            .db_conn
            .query_row(
                "SELECT noted FROM missing WHERE query_key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        let cutoff = (now - Duration::days(MISSING_EXPIRY_DAYS)).timestamp();
        Ok(noted.map(|noted| noted > cutoff).unwrap_or(false))
    }

    pub fn add(&self, key: &str, now: DateTime<Utc>) -> Result<()> {
        self.db_conn.execute(
            "INSERT INTO missing (query_key, noted) VALUES (?1, ?2)
             ON CONFLICT(query_key) DO UPDATE SET noted = excluded.noted",
            params![key, now.timestamp()],
        )?;

        Ok(())
    }

    /// Forget a key, e.g. after the dataset turned up.
    pub fn remove(&self, key: &str) -> Result<()> {
        self.db_conn
            .execute("DELETE FROM missing WHERE query_key = ?1", [key])?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let db = MissingDatasetDb::open_or_create(&dir.path().join("missing.db")).unwrap();
        let noted = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();
        let key = "litpop country_iso3num=574";

        assert!(!db.is_missing(key, noted).unwrap());
        db.add(key, noted).unwrap();

        assert!(db.is_missing(key, noted + Duration::days(29)).unwrap());
        assert!(!db.is_missing(key, noted + Duration::days(31)).unwrap());
        assert!(!db.is_missing("litpop country_iso3num=840", noted).unwrap());

        // Noting it again restarts the clock.
        db.add(key, noted + Duration::days(31)).unwrap();
        assert!(db.is_missing(key, noted + Duration::days(40)).unwrap());

        db.remove(key).unwrap();
        assert!(!db.is_missing(key, noted + Duration::days(40)).unwrap());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();

        MissingDatasetDb::open_or_create(&dir.path().join("missing.db"))
            .unwrap()
            .add("centroids", now)
            .unwrap();

        let db = MissingDatasetDb::open_or_create(&dir.path().join("missing.db")).unwrap();
        assert!(db.is_missing("centroids", now).unwrap());
        assert!(dir.path().join("missing.db").exists());
    }
}
