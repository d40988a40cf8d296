use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::app_dirs::AppDirs;

/// Historic key name; the value is the best total time in seconds
pub const BEST_TIME_KEY: &str = "BestScore";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("preference database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to prepare preference directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("no usable location for the preference database")]
    NoLocation,
}

pub type Result<T> = std::result::Result<T, PreferenceError>;

/// Durable scalar key-value store. Missing keys read as 0.0.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<f64>;
    fn set(&mut self, key: &str, value: f64) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Preferences kept in a small sqlite database
#[derive(Debug)]
pub struct SqlitePreferenceStore {
    conn: Connection,
}

impl SqlitePreferenceStore {
    /// Open the database at the default state location
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::preferences_path().ok_or(PreferenceError::NoLocation)?;
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init(&conn)?;

        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    fn init(conn: &Connection) -> Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value REAL NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(())
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &str) -> Result<f64> {
        let value: Option<f64> = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0.0))
    }

    fn set(&mut self, key: &str, value: f64) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM preferences WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// In-process store, used when the database can't be opened
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: HashMap<String, f64>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<f64> {
        Ok(self.values.get(key).copied().unwrap_or(0.0))
    }

    fn set(&mut self, key: &str, value: f64) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Stored best total time. A raw value of 0 means nothing has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BestTime(Option<f64>);

impl BestTime {
    pub fn unset() -> Self {
        Self(None)
    }

    pub fn from_raw(raw: f64) -> Self {
        if raw == 0.0 {
            Self(None)
        } else {
            Self(Some(raw))
        }
    }

    pub fn seconds(&self) -> Option<f64> {
        self.0
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// A total beats the record when nothing is recorded or it is strictly smaller
    pub fn is_beaten_by(&self, total_secs: f64) -> bool {
        match self.0 {
            None => true,
            Some(best) => total_secs < best,
        }
    }

    pub fn load(store: &dyn PreferenceStore) -> Result<Self> {
        store.get(BEST_TIME_KEY).map(Self::from_raw)
    }

    pub fn save(store: &mut dyn PreferenceStore, total_secs: f64) -> Result<Self> {
        store.set(BEST_TIME_KEY, total_secs)?;
        Ok(Self::from_raw(total_secs))
    }
}
