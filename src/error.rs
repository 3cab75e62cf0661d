use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    StorageUnavailable,
    StorageCorrupt,
    Serialization,
    Database,
    Io,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::StorageCorrupt => "STORAGE_CORRUPT",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Database => "DATABASE_ERROR",
            Self::Io => "IO_ERROR",
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TrackerError {
    pub code: ErrorCode,
    pub message: String,
}

impl TrackerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn project_not_found(id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Project not found: {id}"))
    }

    pub fn task_not_found(project_id: &str, task_id: &str) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("Task not found: {task_id} (project {project_id})"),
        )
    }

    pub fn storage_unavailable() -> Self {
        Self::new(
            ErrorCode::StorageUnavailable,
            "Durable storage is not available in this context",
        )
    }

    pub fn storage_corrupt(slot: &str, detail: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::StorageCorrupt,
            format!("Stored data in slot '{slot}' could not be parsed: {detail}"),
        )
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Serialization, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Database, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Io, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

impl From<rusqlite::Error> for TrackerError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
