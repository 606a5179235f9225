//! Storage layer for wildex.
//!
//! This module provides `SQLite`-based persistence for locations. Each row
//! holds the codec's protobuf bytes under a caller-chosen key such as
//! `last_known` or a sighting id.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::location::{Location, LocationCodec};

/// A stored location with its key and last write time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredLocation {
    /// Key the location is stored under.
    pub key: String,
    /// The decoded location.
    pub location: Location,
    /// When the entry was last written.
    pub updated_at: DateTime<Utc>,
}

/// Persistent key-value store of locations.
#[derive(Debug)]
pub struct LocationStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    codec: LocationCodec,
}

impl LocationStore {
    /// Open or create a store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>, codec: LocationCodec) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Location store opened at {}", path.display());
        Ok(Self { path, conn, codec })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory(codec: LocationCodec) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
            codec,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store `location` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn put(&self, key: &str, location: &Location) -> Result<()> {
        let payload = self.codec.to_bytes(location);
        self.conn.execute(
            r"
            INSERT INTO locations (key, payload, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at
            ",
            params![key, payload, Utc::now().to_rfc3339()],
        )?;
        debug!(key, bytes = payload.len(), "Stored location");
        Ok(())
    }

    /// Location stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the stored bytes are corrupt.
    pub fn get(&self, key: &str) -> Result<Option<Location>> {
        let payload: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT payload FROM locations WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|bytes| {
                self.codec.from_bytes(&bytes).map_err(|e| {
                    warn!(key, error = %e, "Stored location is corrupt");
                    e
                })
            })
            .transpose()
    }

    /// Location stored under `key`, or the codec's default value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the stored bytes are corrupt.
    pub fn get_or_default(&self, key: &str) -> Result<Location> {
        Ok(self
            .get(key)?
            .unwrap_or_else(|| self.codec.default_value()))
    }

    /// Stored entry under `key` including its write time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the stored bytes are corrupt.
    pub fn entry(&self, key: &str) -> Result<Option<StoredLocation>> {
        let row: Option<(String, Vec<u8>, String)> = self
            .conn
            .query_row(
                "SELECT key, payload, updated_at FROM locations WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(key, payload, updated_at)| self.to_stored(key, &payload, &updated_at))
            .transpose()
    }

    /// All decodable entries, most recently written first.
    ///
    /// Corrupt rows are logged and skipped; use [`Self::get`] to surface the
    /// decode error for a specific key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<StoredLocation>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, payload, updated_at FROM locations ORDER BY updated_at DESC, key ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(key, payload, updated_at)| {
                match self.to_stored(key.clone(), &payload, &updated_at) {
                    Ok(stored) => Some(stored),
                    Err(e) => {
                        warn!(key = %key, error = %e, "Skipping corrupt stored location");
                        None
                    }
                }
            })
            .collect())
    }

    /// All keys, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM locations ORDER BY key ASC")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Write time of the entry under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM locations WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw.as_deref().map(parse_timestamp))
    }

    /// Delete the entry under `key`.
    ///
    /// Returns `true` if an entry was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM locations WHERE key = ?1", [key])?;
        Ok(affected > 0)
    }

    /// Number of stored entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))?;
        Ok(count)
    }

    fn to_stored(&self, key: String, payload: &[u8], updated_at: &str) -> Result<StoredLocation> {
        Ok(StoredLocation {
            location: self.codec.from_bytes(payload)?,
            updated_at: parse_timestamp(updated_at),
            key,
        })
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).map_or(DateTime::<Utc>::UNIX_EPOCH, |dt| dt.with_timezone(&Utc))
}
