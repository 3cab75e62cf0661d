use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::task::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Saas,
    App,
    #[default]
    Other,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saas => "saas",
            Self::App => "app",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "saas" => Some(Self::Saas),
            "app" => Some(Self::App),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    InProgress,
    Completed,
    OnHold,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::OnHold => "on-hold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planning" => Some(Self::Planning),
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "on-hold" => Some(Self::OnHold),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub status: ProjectStatus,
    pub tasks: Vec<Task>,
    #[serde(
        default,
        deserialize_with = "super::date::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "super::date::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,
    pub created_at: String,
    pub updated_at: String,
}

impl Project {
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Tasks in one status column, in insertion order.
    pub fn tasks_with_status(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.status == status)
    }

    pub fn task_progress(&self) -> TaskProgress {
        let mut progress = TaskProgress::default();
        for task in &self.tasks {
            match task.status {
                TaskStatus::Todo => progress.todo += 1,
                TaskStatus::InProgress => progress.in_progress += 1,
                TaskStatus::Completed => progress.completed += 1,
            }
        }
        progress.total = self.tasks.len();
        progress.percentage = if progress.total > 0 {
            (progress.completed as f64 / progress.total as f64) * 100.0
        } else {
            0.0
        };
        progress
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TaskProgress {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub percentage: f64,
}

/// Caller-supplied fields for a new project. Id, timestamps and the (empty)
/// task list are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub title: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub project_type: ProjectType,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(
        default,
        deserialize_with = "super::date::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "super::date::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,
}

impl NewProject {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        project_type: ProjectType,
        status: ProjectStatus,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            project_type,
            status,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub(crate) fn into_project(self, id: String, now: &str) -> Project {
        Project {
            id,
            title: self.title,
            description: self.description,
            project_type: self.project_type,
            status: self.status,
            tasks: Vec::new(),
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}

/// Partial update for a project. Task membership is changed only through the
/// task operations, so there is no `tasks` field here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<ProjectType>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
}

impl ProjectPatch {
    pub fn status(status: ProjectStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.project_type.is_none()
            && self.status.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    pub(crate) fn apply(&self, project: &mut Project) {
        if let Some(ref title) = self.title {
            project.title = title.clone();
        }
        if let Some(ref description) = self.description {
            project.description = description.clone();
        }
        if let Some(project_type) = self.project_type {
            project.project_type = project_type;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            project.end_date = end_date;
        }
    }
}
