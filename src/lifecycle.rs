use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::models::timestamp::{self, Clock};
use crate::storage::SnapshotStorage;
use crate::store::Store;

enum Source {
    Config(Config),
    /// A pre-built adapter, consumed by the first open attempt.
    Storage(Option<SnapshotStorage>),
}

/// Owns the one [`Store`] of a process, opened on first access.
///
/// The store is hydrated exactly once; later calls hand back the same
/// instance. A failed open is sticky: every later access returns the same
/// error, so callers never see a store that was hydrated after they were
/// told loading failed.
pub struct StoreLifecycle {
    source: Source,
    clock: Clock,
    store: Option<Store>,
    failure: Option<TrackerError>,
}

impl StoreLifecycle {
    pub fn new(config: Config) -> Self {
        Self {
            source: Source::Config(config),
            clock: timestamp::system_clock,
            store: None,
            failure: None,
        }
    }

    pub fn from_storage(storage: SnapshotStorage) -> Self {
        Self {
            source: Source::Storage(Some(storage)),
            clock: timestamp::system_clock,
            store: None,
            failure: None,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_open(&self) -> bool {
        self.store.is_some()
    }

    /// The error that stopped the store from opening, if any.
    pub fn failure(&self) -> Option<&TrackerError> {
        self.failure.as_ref()
    }

    pub fn store(&mut self) -> Result<&mut Store> {
        if let Some(ref e) = self.failure {
            return Err(e.clone());
        }
        if self.store.is_none() {
            match self.open() {
                Ok(store) => self.store = Some(store),
                Err(e) => {
                    tracing::error!(
                        code = e.code.as_str(),
                        error = %e,
                        "project store failed to open"
                    );
                    self.failure = Some(e.clone());
                    return Err(e);
                }
            }
        }
        self.store
            .as_mut()
            .ok_or_else(|| TrackerError::database("project store failed to open"))
    }

    fn open(&mut self) -> Result<Store> {
        let storage = match self.source {
            Source::Config(ref config) => SnapshotStorage::open(config)?,
            Source::Storage(ref mut storage) => {
                storage.take().ok_or_else(TrackerError::storage_unavailable)?
            }
        };
        let store = Store::open(storage)?.with_clock(self.clock);
        tracing::debug!(
            slot = store.storage().slot(),
            available = store.storage().is_available(),
            projects = store.project_count(),
            tasks = store.task_count(),
            "opened project store"
        );
        Ok(store)
    }

    /// Release the store; the next access opens it again. A failed open is
    /// not undone by closing.
    pub fn close(&mut self) -> Option<Store> {
        self.store.take()
    }
}
