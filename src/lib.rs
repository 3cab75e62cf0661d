//! Local project and task tracking.
//!
//! Projects own an ordered list of tasks. The [`Store`] holds the
//! authoritative list and rewrites a single key-value slot after every
//! mutation; the [`Tracker`] façade mirrors it into immutable snapshots for a
//! presentation layer.

pub mod config;
pub mod db;
pub mod error;
pub mod facade;
pub mod lifecycle;
pub mod models;
pub mod storage;
pub mod store;

pub use config::{Config, StorageLocation};
pub use error::{ErrorCode, TrackerError};
pub use facade::{Snapshot, Tracker, ViewState};
pub use lifecycle::StoreLifecycle;
pub use models::{
    NewProject, NewTask, Project, ProjectPatch, ProjectStatus, ProjectType, Task, TaskPatch,
    TaskProgress, TaskStatus,
};
pub use storage::{KeyValueMedium, SnapshotStorage, SqliteMedium};
pub use store::Store;
