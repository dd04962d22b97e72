//! SQLite document store for custom patterns and saved sets.
//!
//! Each document is a JSON value under a fixed key in the `storage` table,
//! tagged with the format version it was written in. Writes go through a
//! transaction in WAL mode, so a crash mid-save leaves the previous value.

pub mod migrate;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection as SqlConnection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use strumkit_types::{PracticeSetItem, RhythmPattern, SavedSet};
use thiserror::Error;

pub const CUSTOM_PATTERNS_KEY: &str = "ukuleleCustomPatterns";
pub const SAVED_SETS_KEY: &str = "savedSets";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the store holds, after upgrading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredData {
    pub custom_patterns: Vec<RhythmPattern>,
    pub saved_sets: Vec<SavedSet>,
    /// Only present in imported files; the practice set itself is not
    /// stored between sessions.
    pub practice_set: Vec<PracticeSetItem>,
}

pub struct Storage {
    conn: SqlConnection,
    path: PathBuf,
}

impl Storage {
    /// Open or create the database, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, PersistError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = SqlConnection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let tx = conn.unchecked_transaction()?;
        schema::create_tables(&tx)?;
        tx.commit()?;

        log::info!(target: "persistence", "opened {}", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema_version(&self) -> Result<Option<i32>, PersistError> {
        Ok(schema::current_version(&self.conn)?)
    }

    fn get(&self, key: &str) -> Result<Option<(i64, Value)>, PersistError> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT version, value FROM storage WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        match row {
            Some((version, text)) => Ok(Some((version, serde_json::from_str(&text)?))),
            None => Ok(None),
        }
    }

    fn put<T: Serialize + ?Sized>(
        conn: &SqlConnection,
        key: &str,
        version: i64,
        value: &T,
    ) -> Result<(), PersistError> {
        let text = serde_json::to_string(value)?;
        conn.execute(
            "INSERT INTO storage (key, version, value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET
                version = excluded.version,
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, version, text],
        )?;
        Ok(())
    }

    fn put_one<T: Serialize + ?Sized>(&self, key: &str, version: i64, value: &T) -> Result<(), PersistError> {
        let tx = self.conn.unchecked_transaction()?;
        Self::put(&tx, key, version, value)?;
        tx.commit()?;
        Ok(())
    }

    pub fn load_custom_patterns(&self) -> Result<Vec<RhythmPattern>, PersistError> {
        Ok(match self.get(CUSTOM_PATTERNS_KEY)? {
            Some((version, value)) => {
                if version < migrate::CUSTOM_PATTERNS_VERSION {
                    log::info!(target: "persistence", "upgrading custom patterns from version {}", version);
                }
                migrate::custom_patterns(value)
            }
            None => Vec::new(),
        })
    }

    pub fn save_custom_patterns(&self, patterns: &[RhythmPattern]) -> Result<(), PersistError> {
        self.put_one(CUSTOM_PATTERNS_KEY, migrate::CUSTOM_PATTERNS_VERSION, patterns)
    }

    pub fn load_saved_sets(&self) -> Result<Vec<SavedSet>, PersistError> {
        Ok(match self.get(SAVED_SETS_KEY)? {
            Some((_, value)) => migrate::saved_sets(value),
            None => Vec::new(),
        })
    }

    pub fn save_saved_sets(&self, sets: &[SavedSet]) -> Result<(), PersistError> {
        self.put_one(SAVED_SETS_KEY, migrate::SAVED_SETS_VERSION, sets)
    }

    pub fn load(&self) -> Result<StoredData, PersistError> {
        Ok(StoredData {
            custom_patterns: self.load_custom_patterns()?,
            saved_sets: self.load_saved_sets()?,
            practice_set: Vec::new(),
        })
    }

    /// Import a JSON file: either an export (`customPatterns`, `savedSets`,
    /// `practiceSet`) or a dump of the old storage keys. The upgraded
    /// patterns and sets replace the stored ones in one transaction.
    pub fn import_legacy(&self, path: &Path) -> Result<StoredData, PersistError> {
        let text = std::fs::read_to_string(path)?;
        let data = parse_legacy(&text)?;

        let tx = self.conn.unchecked_transaction()?;
        Self::put(&tx, CUSTOM_PATTERNS_KEY, migrate::CUSTOM_PATTERNS_VERSION, &data.custom_patterns)?;
        Self::put(&tx, SAVED_SETS_KEY, migrate::SAVED_SETS_VERSION, &data.saved_sets)?;
        tx.commit()?;

        log::info!(
            target: "persistence",
            "imported {} patterns and {} saved sets from {}",
            data.custom_patterns.len(),
            data.saved_sets.len(),
            path.display()
        );
        Ok(data)
    }
}

/// Read a legacy or exported document. Missing keys are empty.
pub fn parse_legacy(text: &str) -> Result<StoredData, PersistError> {
    let mut doc: Value = serde_json::from_str(text)?;
    let mut take = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| doc.get_mut(*k).map(Value::take))
            .map(migrate::unwrap_encoded)
    };

    Ok(StoredData {
        custom_patterns: take(&["customPatterns", CUSTOM_PATTERNS_KEY])
            .map(migrate::custom_patterns)
            .unwrap_or_default(),
        saved_sets: take(&[SAVED_SETS_KEY])
            .map(migrate::saved_sets)
            .unwrap_or_default(),
        practice_set: take(&["practiceSet"])
            .map(migrate::practice_set)
            .unwrap_or_default(),
    })
}
