use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task status options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    OnHold,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl TaskStatus {
    /// Status implied by a bare progress value, used by the quick-update
    /// path when the caller supplies no explicit status.
    pub fn from_progress(progress: i64) -> Self {
        match progress {
            0 => TaskStatus::Todo,
            100 => TaskStatus::Completed,
            _ => TaskStatus::InProgress,
        }
    }
}

/// A task. `parent_task_id = None` marks a main task; subtasks reference a
/// main task and never nest further.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "projectId")]
    pub project_id: String,
    #[serde(rename = "taskName")]
    pub task_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    pub progress: i64,
    #[serde(rename = "parentTaskId")]
    pub parent_task_id: Option<String>,
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(rename = "dueDate")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(rename = "completedAt")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskCreateInput {
    #[serde(rename = "taskName")]
    pub task_name: String,
    pub description: Option<String>,
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(rename = "dueDate")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Input for updating a task. Only supplied fields are written.
///
/// When `status` is present it wins outright and `progress` is independently
/// settable. When only `progress` is present the status is derived from it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdateInput {
    #[serde(rename = "taskName")]
    pub task_name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub progress: Option<i64>,
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(rename = "dueDate")]
    pub due_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_progress() {
        assert_eq!(TaskStatus::from_progress(0), TaskStatus::Todo);
        assert_eq!(TaskStatus::from_progress(100), TaskStatus::Completed);
        assert_eq!(TaskStatus::from_progress(1), TaskStatus::InProgress);
        assert_eq!(TaskStatus::from_progress(99), TaskStatus::InProgress);
    }
}
