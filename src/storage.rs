//! Full-snapshot persistence of the project list into one key-value slot.

use rusqlite::Connection;

use crate::config::Config;
use crate::db::{self, kv_repo};
use crate::error::{Result, TrackerError};
use crate::models::Project;

/// A durable string-keyed, string-valued store.
pub trait KeyValueMedium {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<bool>;
}

/// SQLite-backed medium.
pub struct SqliteMedium {
    conn: Connection,
}

impl SqliteMedium {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        kv_repo::list_keys(&self.conn)
    }
}

impl KeyValueMedium for SqliteMedium {
    fn get(&self, key: &str) -> Result<Option<String>> {
        kv_repo::get_value(&self.conn, key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        kv_repo::set_value(&self.conn, key, value)
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        kv_repo::remove_value(&self.conn, key)
    }
}

/// Mirrors the store's project list into a single named slot.
///
/// Without a medium every read is empty and every write is a no-op.
pub struct SnapshotStorage {
    medium: Option<Box<dyn KeyValueMedium>>,
    slot: String,
}

impl SnapshotStorage {
    pub fn new(medium: Box<dyn KeyValueMedium>, slot: impl Into<String>) -> Self {
        Self {
            medium: Some(medium),
            slot: slot.into(),
        }
    }

    pub fn unavailable(slot: impl Into<String>) -> Self {
        Self {
            medium: None,
            slot: slot.into(),
        }
    }

    pub fn open(config: &Config) -> Result<Self> {
        Ok(match db::open_db(&config.location)? {
            Some(conn) => Self::new(Box::new(SqliteMedium::new(conn)), config.slot.clone()),
            None => Self::unavailable(config.slot.clone()),
        })
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn is_available(&self) -> bool {
        self.medium.is_some()
    }

    /// The slot's stored text, exactly as written.
    pub fn raw(&self) -> Result<Option<String>> {
        match self.medium {
            Some(ref medium) => medium.get(&self.slot),
            None => Ok(None),
        }
    }

    /// Strict read: an unparseable slot is a `StorageCorrupt` error.
    pub fn read(&self) -> Result<Vec<Project>> {
        let Some(data) = self.raw()? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&data).map_err(|e| TrackerError::storage_corrupt(&self.slot, e))
    }

    /// Lenient read: any failure is logged and treated as empty storage.
    pub fn load(&self) -> Vec<Project> {
        self.read().unwrap_or_else(|e| {
            tracing::error!(
                slot = %self.slot,
                code = e.code.as_str(),
                error = %e,
                "failed to load projects"
            );
            Vec::new()
        })
    }

    /// Overwrite the slot with the full project list.
    pub fn save(&mut self, projects: &[Project]) -> Result<()> {
        let Some(ref mut medium) = self.medium else {
            return Ok(());
        };
        let data = serde_json::to_string(projects)?;
        medium.set(&self.slot, &data)?;
        tracing::debug!(
            slot = %self.slot,
            projects = projects.len(),
            bytes = data.len(),
            "saved snapshot"
        );
        Ok(())
    }

    /// Drop the slot entirely.
    pub fn clear(&mut self) -> Result<bool> {
        match self.medium {
            Some(ref mut medium) => medium.remove(&self.slot),
            None => Ok(false),
        }
    }
}
