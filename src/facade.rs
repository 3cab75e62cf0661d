//! Presentation-facing state: a published project snapshot plus loading and
//! error flags, kept in step with the [`Store`].
//!
//! No method here returns an error. Failures are logged and surface as a
//! single user-facing message in [`Tracker::error`]; the published snapshot
//! is left as it was.

use std::sync::Arc;

use crate::error::{Result, TrackerError};
use crate::lifecycle::StoreLifecycle;
use crate::models::{NewProject, NewTask, Project, ProjectPatch, Task, TaskPatch};
use crate::store::Store;

/// Immutable list of projects. Published snapshots are never modified; each
/// mutation publishes a new list that shares unchanged entries.
pub type Snapshot = Arc<[Arc<Project>]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    LoadProjects,
    AddProject,
    UpdateProject,
    DeleteProject,
    AddTask,
    UpdateTask,
    DeleteTask,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadProjects => "load projects",
            Self::AddProject => "add project",
            Self::UpdateProject => "update project",
            Self::DeleteProject => "delete project",
            Self::AddTask => "add task",
            Self::UpdateTask => "update task",
            Self::DeleteTask => "delete task",
        }
    }

    pub fn message(&self) -> String {
        format!("Failed to {}. Please try again.", self.as_str())
    }
}

/// The `{projects, loading, error}` triple as seen by the presentation layer.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub projects: Snapshot,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct Tracker {
    lifecycle: StoreLifecycle,
    projects: Snapshot,
    loading: bool,
    error: Option<String>,
    initialized: bool,
}

impl Tracker {
    /// A tracker that has not loaded yet: empty snapshot, `loading` set.
    pub fn new(lifecycle: StoreLifecycle) -> Self {
        Self {
            lifecycle,
            projects: Arc::from(Vec::new()),
            loading: true,
            error: None,
            initialized: false,
        }
    }

    /// Construct and load the initial snapshot.
    pub fn start(lifecycle: StoreLifecycle) -> Self {
        let mut tracker = Self::new(lifecycle);
        tracker.init();
        tracker
    }

    /// Load the initial snapshot. Only the first call has any effect.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let loaded = self.lifecycle.store().and_then(|store| match store.load_error() {
            Some(e) => Err(e.clone()),
            None => Ok(store.list_projects()),
        });
        match loaded {
            Ok(projects) => {
                self.projects = projects.into_iter().map(Arc::new).collect();
            }
            Err(e) => {
                self.projects = Arc::from(Vec::new());
                self.fail(Action::LoadProjects, &e);
            }
        }
        self.loading = false;
    }

    pub fn projects(&self) -> Snapshot {
        Arc::clone(&self.projects)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> ViewState {
        ViewState {
            projects: self.projects(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }

    /// Look up a project in the published snapshot, e.g. for a detail view.
    pub fn project(&self, id: &str) -> Option<Arc<Project>> {
        self.projects.iter().find(|p| p.id == id).cloned()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn add_project(&mut self, fields: NewProject) -> Option<Project> {
        let project = self.run(Action::AddProject, |store| store.create_project(fields))?;
        let entry = Arc::new(project.clone());
        self.projects = self.projects.iter().cloned().chain(std::iter::once(entry)).collect();
        Some(project)
    }

    pub fn update_project(&mut self, id: &str, patch: &ProjectPatch) -> Option<Project> {
        let project = self.run(Action::UpdateProject, |store| {
            store
                .update_project(id, patch)?
                .ok_or_else(|| TrackerError::project_not_found(id))
        })?;
        self.replace_project(project.clone());
        Some(project)
    }

    pub fn delete_project(&mut self, id: &str) -> bool {
        let deleted = self.run(Action::DeleteProject, |store| {
            if store.delete_project(id)? {
                Ok(())
            } else {
                Err(TrackerError::project_not_found(id))
            }
        });
        if deleted.is_none() {
            return false;
        }
        self.projects = self.projects.iter().filter(|p| p.id != id).cloned().collect();
        true
    }

    pub fn add_task(&mut self, project_id: &str, fields: NewTask) -> Option<Task> {
        let (task, project) = self.run(Action::AddTask, |store| {
            let task = store
                .add_task(project_id, fields)?
                .ok_or_else(|| TrackerError::project_not_found(project_id))?;
            with_owner(store, project_id, task)
        })?;
        self.replace_project(project);
        Some(task)
    }

    pub fn update_task(
        &mut self,
        project_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> Option<Task> {
        let (task, project) = self.run(Action::UpdateTask, |store| {
            let task = store
                .update_task(project_id, task_id, patch)?
                .ok_or_else(|| missing_task(store, project_id, task_id))?;
            with_owner(store, project_id, task)
        })?;
        self.replace_project(project);
        Some(task)
    }

    pub fn delete_task(&mut self, project_id: &str, task_id: &str) -> bool {
        let project = self.run(Action::DeleteTask, |store| {
            if !store.delete_task(project_id, task_id)? {
                return Err(missing_task(store, project_id, task_id));
            }
            store
                .get_project(project_id)
                .ok_or_else(|| TrackerError::project_not_found(project_id))
        });
        match project {
            Some(project) => {
                self.replace_project(project);
                true
            }
            None => false,
        }
    }

    /// Run one store operation; any error counts as failure of `action`.
    fn run<T>(&mut self, action: Action, op: impl FnOnce(&mut Store) -> Result<T>) -> Option<T> {
        match self.lifecycle.store().and_then(op) {
            Ok(value) => Some(value),
            Err(e) => {
                self.fail(action, &e);
                None
            }
        }
    }

    fn fail(&mut self, action: Action, cause: &TrackerError) {
        if cause.is_not_found() {
            tracing::warn!(
                action = action.as_str(),
                error = %cause,
                "operation referenced an unknown id"
            );
        } else {
            tracing::error!(
                action = action.as_str(),
                code = cause.code.as_str(),
                error = %cause,
                "operation failed"
            );
        }
        self.error = Some(action.message());
    }

    /// Publish a new snapshot with the entry for `project.id` swapped out.
    fn replace_project(&mut self, project: Project) {
        let entry = Arc::new(project);
        self.projects = self
            .projects
            .iter()
            .map(|p| {
                if p.id == entry.id {
                    Arc::clone(&entry)
                } else {
                    Arc::clone(p)
                }
            })
            .collect();
    }
}

fn with_owner(store: &Store, project_id: &str, task: Task) -> Result<(Task, Project)> {
    let project = store
        .get_project(project_id)
        .ok_or_else(|| TrackerError::project_not_found(project_id))?;
    Ok((task, project))
}

/// Names the project when it is the project, not the task, that is missing.
fn missing_task(store: &Store, project_id: &str, task_id: &str) -> TrackerError {
    if store.get_project(project_id).is_none() {
        TrackerError::project_not_found(project_id)
    } else {
        TrackerError::task_not_found(project_id, task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DEFAULT_SLOT};
    use crate::models::{ProjectStatus, ProjectType, TaskStatus};
    use crate::storage::{KeyValueMedium, SnapshotStorage};

    fn tracker() -> Tracker {
        Tracker::start(StoreLifecycle::new(Config::memory()))
    }

    fn new_project(title: &str) -> NewProject {
        NewProject::new(title, "D1", ProjectType::Saas, ProjectStatus::Planning)
    }

    /// Reads succeed with fixed contents; writes fail.
    struct ReadOnly(Option<String>);

    impl KeyValueMedium for ReadOnly {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(self.0.clone())
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(TrackerError::database("attempt to write a readonly database"))
        }
        fn remove(&mut self, _key: &str) -> Result<bool> {
            Err(TrackerError::database("attempt to write a readonly database"))
        }
    }

    struct Unreadable;

    impl KeyValueMedium for Unreadable {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(TrackerError::io("permission denied"))
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Ok(())
        }
        fn remove(&mut self, _key: &str) -> Result<bool> {
            Ok(false)
        }
    }

    fn tracker_over(medium: impl KeyValueMedium + 'static) -> Tracker {
        let storage = SnapshotStorage::new(Box::new(medium), DEFAULT_SLOT);
        Tracker::start(StoreLifecycle::from_storage(storage))
    }

    #[test]
    fn test_new_is_loading_until_init() {
        let mut tracker = Tracker::new(StoreLifecycle::new(Config::memory()));
        assert!(tracker.loading());
        tracker.init();
        assert!(!tracker.loading());
        assert!(tracker.error().is_none());
        assert!(tracker.projects().is_empty());
    }

    #[test]
    fn test_add_project_publishes_new_snapshot() {
        let mut tracker = tracker();
        let before = tracker.projects();
        let project = tracker.add_project(new_project("T1")).unwrap();
        assert!(before.is_empty());
        assert_eq!(tracker.projects().len(), 1);
        assert_eq!(*tracker.project(&project.id).unwrap(), project);
    }

    #[test]
    fn test_unchanged_entries_are_shared() {
        let mut tracker = tracker();
        let a = tracker.add_project(new_project("A")).unwrap();
        let b = tracker.add_project(new_project("B")).unwrap();
        let before = tracker.projects();

        tracker.add_task(&b.id, NewTask::new("t", "d")).unwrap();
        let after = tracker.projects();

        assert!(Arc::ptr_eq(&before[0], &after[0]));
        assert!(!Arc::ptr_eq(&before[1], &after[1]));
        assert!(before[1].tasks.is_empty());
        assert_eq!(after[1].tasks.len(), 1);
        assert_eq!(after[0].id, a.id);
    }

    #[test]
    fn test_task_operations_update_owner() {
        let mut tracker = tracker();
        let p = tracker.add_project(new_project("T1")).unwrap();
        let t = tracker.add_task(&p.id, NewTask::new("Task1", "d")).unwrap();

        let updated = tracker
            .update_task(&p.id, &t.id, &TaskPatch::status(TaskStatus::Completed))
            .unwrap();
        let published = tracker.project(&p.id).unwrap();
        assert_eq!(published.tasks, vec![updated.clone()]);
        assert_eq!(published.updated_at, updated.updated_at);

        assert!(tracker.delete_task(&p.id, &t.id));
        assert!(tracker.project(&p.id).unwrap().tasks.is_empty());
        assert!(tracker.error().is_none());
    }

    #[test]
    fn test_update_and_delete_project() {
        let mut tracker = tracker();
        let p = tracker.add_project(new_project("T1")).unwrap();
        tracker
            .update_project(&p.id, &ProjectPatch::status(ProjectStatus::Completed))
            .unwrap();
        assert_eq!(tracker.project(&p.id).unwrap().status, ProjectStatus::Completed);
        assert!(tracker.delete_project(&p.id));
        assert!(tracker.project(&p.id).is_none());
    }

    #[test]
    fn test_unknown_id_sets_error_and_keeps_snapshot() {
        let mut tracker = tracker();
        tracker.add_project(new_project("T1")).unwrap();
        let before = tracker.projects();

        assert!(tracker.add_task("missing", NewTask::new("t", "d")).is_none());
        assert_eq!(tracker.error(), Some("Failed to add task. Please try again."));
        assert!(Arc::ptr_eq(&before, &tracker.projects()));

        assert!(!tracker.delete_project("missing"));
        assert_eq!(tracker.error(), Some("Failed to delete project. Please try again."));

        tracker.dismiss_error();
        assert!(tracker.error().is_none());
    }

    #[test]
    fn test_unknown_task_sets_error() {
        let mut tracker = tracker();
        let p = tracker.add_project(new_project("T1")).unwrap();
        let before = tracker.projects();

        let patch = TaskPatch::status(TaskStatus::Completed);
        assert!(tracker.update_task(&p.id, "missing", &patch).is_none());
        assert_eq!(tracker.error(), Some("Failed to update task. Please try again."));
        assert!(!tracker.delete_task(&p.id, "missing"));
        assert_eq!(tracker.error(), Some("Failed to delete task. Please try again."));
        assert!(Arc::ptr_eq(&before, &tracker.projects()));
    }

    #[test]
    fn test_missing_task_names_what_is_absent() {
        let mut lifecycle = StoreLifecycle::new(Config::memory());
        let store = lifecycle.store().unwrap();
        let p = store.create_project(new_project("T1")).unwrap();

        let e = missing_task(store, &p.id, "t9");
        assert!(e.is_not_found());
        assert_eq!(e.to_string(), format!("Task not found: t9 (project {})", p.id));

        let e = missing_task(store, "gone", "t9");
        assert!(e.is_not_found());
        assert_eq!(e.to_string(), "Project not found: gone");
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut tracker = tracker_over(ReadOnly(None));
        assert!(tracker.error().is_none());
        assert!(tracker.add_project(new_project("T1")).is_none());
        assert_eq!(tracker.error(), Some("Failed to add project. Please try again."));
        assert!(tracker.projects().is_empty());
    }

    #[test]
    fn test_corrupt_slot_on_init() {
        let tracker = tracker_over(ReadOnly(Some("not json".into())));
        let state = tracker.state();
        assert!(!state.loading);
        assert!(state.projects.is_empty());
        assert_eq!(state.error.as_deref(), Some("Failed to load projects. Please try again."));
    }

    #[test]
    fn test_unreadable_medium_on_init() {
        let mut tracker = tracker_over(Unreadable);
        assert!(!tracker.loading());
        assert!(tracker.projects().is_empty());
        assert_eq!(tracker.error(), Some("Failed to load projects. Please try again."));
        assert!(tracker.add_project(new_project("T1")).is_none());
    }

    #[test]
    fn test_action_messages() {
        assert_eq!(Action::UpdateTask.message(), "Failed to update task. Please try again.");
        assert_eq!(
            Action::DeleteProject.message(),
            "Failed to delete project. Please try again."
        );
    }
}
