use rusqlite::{params, Connection, OptionalExtension};

use crate::error::TrackerError;

pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>, TrackerError> {
    let value = conn
        .query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// Insert or overwrite. Last writer wins.
pub fn set_value(conn: &Connection, key: &str, value: &str) -> Result<(), TrackerError> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

pub fn remove_value(conn: &Connection, key: &str) -> Result<bool, TrackerError> {
    let changed = conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
    Ok(changed > 0)
}

pub fn list_keys(conn: &Connection) -> Result<Vec<String>, TrackerError> {
    let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key ASC")?;
    let keys = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(keys)
}
