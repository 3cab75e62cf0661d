use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::config::StorageLocation;
use crate::error::TrackerError;

use super::migrations;

/// Find the nearest ancestor of `start` (inclusive) that contains `.git`.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(".git").exists() {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Get the path to the tracker database under a repository root.
pub fn db_path(root: &Path) -> PathBuf {
    root.join(".projtrack").join("projtrack.db")
}

/// Get the config file path under a repository root.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(".projtrack").join("config.json")
}

/// Open the durable medium for `location`, creating directories and schema
/// as needed. `Unavailable` yields `None`.
pub fn open_db(location: &StorageLocation) -> Result<Option<Connection>, TrackerError> {
    let conn = match location {
        StorageLocation::File(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let conn = Connection::open(path)?;
            configure_connection(&conn)?;
            conn
        }
        StorageLocation::Memory => Connection::open_in_memory()?,
        StorageLocation::Unavailable => return Ok(None),
    };
    migrations::run_migrations(&conn)?;
    Ok(Some(conn))
}

fn configure_connection(conn: &Connection) -> Result<(), TrackerError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;",
    )?;
    Ok(())
}
