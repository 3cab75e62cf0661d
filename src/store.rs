use std::collections::HashSet;

use crate::error::{ErrorCode, Result, TrackerError};
use crate::models::timestamp::{self, Clock};
use crate::models::{NewProject, NewTask, Project, ProjectPatch, Task, TaskPatch};
use crate::storage::SnapshotStorage;

/// Authoritative in-memory project list, persisted after every mutation.
///
/// Lookups that miss are reported as `None`/`false`; `Err` is reserved for
/// failures of the durable medium. A mutation whose snapshot cannot be saved
/// leaves the in-memory list untouched.
pub struct Store {
    projects: Vec<Project>,
    storage: SnapshotStorage,
    clock: Clock,
    load_error: Option<TrackerError>,
}

impl Store {
    /// Hydrate from `storage`. A corrupt slot starts the store empty and is
    /// kept as [`Store::load_error`]; a failing medium is an error.
    pub fn open(storage: SnapshotStorage) -> Result<Self> {
        let (projects, load_error) = match storage.read() {
            Ok(projects) => (projects, None),
            Err(e) if e.code == ErrorCode::StorageCorrupt => {
                tracing::error!(
                    slot = storage.slot(),
                    error = %e,
                    "discarding unreadable project data"
                );
                (Vec::new(), Some(e))
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            projects,
            storage,
            clock: timestamp::system_clock,
            load_error,
        })
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn load_error(&self) -> Option<&TrackerError> {
        self.load_error.as_ref()
    }

    pub fn storage(&self) -> &SnapshotStorage {
        &self.storage
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn task_count(&self) -> usize {
        self.projects.iter().map(|p| p.tasks.len()).sum()
    }

    pub fn list_projects(&self) -> Vec<Project> {
        self.projects.clone()
    }

    pub fn get_project(&self, id: &str) -> Option<Project> {
        self.find_project(id).cloned()
    }

    pub fn get_task(&self, project_id: &str, task_id: &str) -> Option<Task> {
        self.find_project(project_id)?.task(task_id).cloned()
    }

    pub fn create_project(&mut self, fields: NewProject) -> Result<Project> {
        let now = timestamp::format((self.clock)());
        let project = fields.into_project(self.fresh_id(), &now);
        let created = self.commit(|projects| {
            projects.push(project.clone());
            Some(project)
        })?;
        created.ok_or_else(|| TrackerError::database("project was not created"))
    }

    pub fn update_project(&mut self, id: &str, patch: &ProjectPatch) -> Result<Option<Project>> {
        let now = (self.clock)();
        self.commit(|projects| {
            let project = projects.iter_mut().find(|p| p.id == id)?;
            patch.apply(project);
            project.updated_at = timestamp::stamp_after(now, &project.updated_at);
            Some(project.clone())
        })
    }

    /// Removes the project together with all of its tasks.
    pub fn delete_project(&mut self, id: &str) -> Result<bool> {
        let removed = self.commit(|projects| {
            let before = projects.len();
            projects.retain(|p| p.id != id);
            (projects.len() != before).then_some(())
        })?;
        Ok(removed.is_some())
    }

    pub fn add_task(&mut self, project_id: &str, fields: NewTask) -> Result<Option<Task>> {
        if self.find_project(project_id).is_none() {
            return Ok(None);
        }
        let now = (self.clock)();
        let task = fields.into_task(self.fresh_id(), &timestamp::format(now));
        self.commit(|projects| {
            let project = projects.iter_mut().find(|p| p.id == project_id)?;
            project.tasks.push(task.clone());
            project.updated_at = timestamp::stamp_after(now, &project.updated_at);
            Some(task)
        })
    }

    pub fn update_task(
        &mut self,
        project_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> Result<Option<Task>> {
        let now = (self.clock)();
        self.commit(|projects| {
            let project = projects.iter_mut().find(|p| p.id == project_id)?;
            let task = project.tasks.iter_mut().find(|t| t.id == task_id)?;
            patch.apply(task);
            task.updated_at = timestamp::stamp_after(now, &task.updated_at);
            let updated = task.clone();
            project.updated_at = timestamp::stamp_after(now, &project.updated_at);
            Some(updated)
        })
    }

    pub fn delete_task(&mut self, project_id: &str, task_id: &str) -> Result<bool> {
        let now = (self.clock)();
        let removed = self.commit(|projects| {
            let project = projects.iter_mut().find(|p| p.id == project_id)?;
            let before = project.tasks.len();
            project.tasks.retain(|t| t.id != task_id);
            if project.tasks.len() == before {
                return None;
            }
            project.updated_at = timestamp::stamp_after(now, &project.updated_at);
            Some(())
        })?;
        Ok(removed.is_some())
    }

    fn find_project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// A ULID not currently used by any project or task.
    fn fresh_id(&self) -> String {
        let in_use: HashSet<&str> = self
            .projects
            .iter()
            .flat_map(|p| {
                std::iter::once(p.id.as_str()).chain(p.tasks.iter().map(|t| t.id.as_str()))
            })
            .collect();
        loop {
            let id = ulid::Ulid::new().to_string();
            if !in_use.contains(id.as_str()) {
                return id;
            }
        }
    }

    /// Apply `mutate` to a working copy; on `Some`, persist the copy and make
    /// it current. On `None` nothing is written.
    fn commit<T>(
        &mut self,
        mutate: impl FnOnce(&mut Vec<Project>) -> Option<T>,
    ) -> Result<Option<T>> {
        let mut next = self.projects.clone();
        let Some(value) = mutate(&mut next) else {
            return Ok(None);
        };
        self.storage.save(&next)?;
        self.projects = next;
        Ok(Some(value))
    }
}
