use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::db::connection;

/// Slot key holding the serialized project list.
pub const DEFAULT_SLOT: &str = "project-tracker-data";

/// Environment variable overriding the database location. `:memory:` selects
/// a private in-memory database.
pub const DB_ENV: &str = "PROJTRACK_DB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum StorageLocation {
    File(PathBuf),
    Memory,
    /// No durable medium, e.g. a headless run outside any repository.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub location: StorageLocation,
    pub slot: String,
}

/// Optional `config.json` next to the database.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    slot: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::unavailable()
    }
}

impl Config {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StorageLocation::File(path.into()),
            slot: DEFAULT_SLOT.to_string(),
        }
    }

    pub fn memory() -> Self {
        Self {
            location: StorageLocation::Memory,
            slot: DEFAULT_SLOT.to_string(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            location: StorageLocation::Unavailable,
            slot: DEFAULT_SLOT.to_string(),
        }
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    /// Resolve configuration from the environment and the current directory.
    pub fn discover() -> Self {
        let cwd = env::current_dir().ok();
        Self::discover_from(env::var_os(DB_ENV).map(PathBuf::from), cwd.as_deref())
    }

    /// Resolution order: explicit database path, then the enclosing git
    /// repository's `.projtrack/projtrack.db`, otherwise unavailable.
    pub fn discover_from(db_override: Option<PathBuf>, cwd: Option<&Path>) -> Self {
        if let Some(path) = db_override.filter(|p| !p.as_os_str().is_empty()) {
            if path.as_os_str() == ":memory:" {
                return Self::memory();
            }
            return Self::file(path);
        }

        let Some(root) = cwd.and_then(connection::find_repo_root) else {
            tracing::info!("no repository found; durable storage unavailable");
            return Self::unavailable();
        };

        let mut config = Self::file(connection::db_path(&root));
        if let Some(slot) = read_config_file(&connection::config_path(&root)).slot {
            config.slot = slot;
        }
        config
    }
}

fn read_config_file(path: &Path) -> ConfigFile {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return ConfigFile::default(),
    };
    match serde_json::from_str(&content) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            ConfigFile::default()
        }
    }
}
