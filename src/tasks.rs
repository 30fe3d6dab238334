//! Google Tasks API v1: task lists and tasks.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::service::{endpoint, Resource, Service, UrlKind};

/// Base URL for Google Tasks API v1.
pub const TASKS_API_BASE: &str = "https://tasks.googleapis.com/tasks/v1";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}

impl TaskList {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

impl Resource for TaskList {
    const KIND: &'static str = "task list";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// `needsAction` or `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("completed")
    }
}

impl Resource for Task {
    const KIND: &'static str = "task";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }
}

/// Task lists of the authenticated user.
#[derive(Debug, Clone)]
pub struct TaskListService {
    base_url: String,
}

impl TaskListService {
    pub fn new() -> Self {
        Self {
            base_url: TASKS_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for TaskListService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for TaskListService {
    type Object = TaskList;

    const NAME: &'static str = "tasklist";

    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url> {
        match kind {
            UrlKind::FetchAll | UrlKind::Create => {
                endpoint(&self.base_url, &["users", "@me", "lists"])
            }
            UrlKind::FetchOne(id) | UrlKind::Update(id) | UrlKind::Delete(id) => {
                endpoint(&self.base_url, &["users", "@me", "lists", id])
            }
        }
    }
}

/// Tasks of one task list.
#[derive(Debug, Clone)]
pub struct TaskService {
    base_url: String,
    tasklist_id: String,
    parent: Option<String>,
    show_completed: bool,
}

impl TaskService {
    pub fn new(tasklist_id: impl Into<String>) -> Self {
        Self {
            base_url: TASKS_API_BASE.to_string(),
            tasklist_id: tasklist_id.into(),
            parent: None,
            show_completed: true,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create new tasks as subtasks of `parent`.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Whether listings include completed tasks (default: yes).
    pub fn with_show_completed(mut self, show_completed: bool) -> Self {
        self.show_completed = show_completed;
        self
    }
}

impl Service for TaskService {
    type Object = Task;

    const NAME: &'static str = "task";

    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url> {
        let tasks = ["lists", self.tasklist_id.as_str(), "tasks"];
        match kind {
            UrlKind::FetchAll => {
                let mut url = endpoint(&self.base_url, &tasks)?;
                if !self.show_completed {
                    url.query_pairs_mut().append_pair("showCompleted", "false");
                }
                Ok(url)
            }
            UrlKind::Create => {
                let mut url = endpoint(&self.base_url, &tasks)?;
                if let Some(parent) = &self.parent {
                    url.query_pairs_mut().append_pair("parent", parent);
                }
                Ok(url)
            }
            UrlKind::FetchOne(id) | UrlKind::Update(id) | UrlKind::Delete(id) => {
                let mut segments = tasks.to_vec();
                segments.push(id);
                endpoint(&self.base_url, &segments)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasklist_urls() {
        let service = TaskListService::new();
        assert_eq!(
            service.build_url(UrlKind::FetchAll).unwrap().as_str(),
            "https://tasks.googleapis.com/tasks/v1/users/@me/lists"
        );
        assert_eq!(
            service.build_url(UrlKind::Delete("L1")).unwrap().as_str(),
            "https://tasks.googleapis.com/tasks/v1/users/@me/lists/L1"
        );
    }

    #[test]
    fn test_task_urls() {
        let service = TaskService::new("L1")
            .with_parent("T0")
            .with_show_completed(false);
        assert_eq!(
            service.build_url(UrlKind::FetchAll).unwrap().as_str(),
            "https://tasks.googleapis.com/tasks/v1/lists/L1/tasks?showCompleted=false"
        );
        assert_eq!(
            service.build_url(UrlKind::Create).unwrap().as_str(),
            "https://tasks.googleapis.com/tasks/v1/lists/L1/tasks?parent=T0"
        );
        assert_eq!(
            service.build_url(UrlKind::Update("T1")).unwrap().as_str(),
            "https://tasks.googleapis.com/tasks/v1/lists/L1/tasks/T1"
        );
    }

    #[test]
    fn test_task_json_mapping() {
        let task: Task = serde_json::from_str(
            r#"{"kind": "tasks#task", "id": "T1", "title": "Buy milk", "status": "completed"}"#,
        )
        .unwrap();
        assert!(task.is_completed());
        assert_eq!(task.id.as_deref(), Some("T1"));
    }
}
