use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{not_blank, nullable};

/// A task as loaded from the store, with its status slug and label ids resolved.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Task {
    pub id: i64,
    pub index: Option<i32>,
    pub title: String,
    pub content: Option<String>,
    pub status_id: i64,
    /// Slug of the task's status.
    pub status: String,
    pub assignee_id: Option<i64>,
    /// Ids of attached labels, ascending.
    pub label_ids: Vec<i64>,
    pub created_at: NaiveDate,
}

/// The writable part of a task, with every reference already resolved to an id.
/// Used for both inserts and full-row updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskData {
    pub index: Option<i32>,
    pub title: String,
    pub content: Option<String>,
    pub status_id: i64,
    pub assignee_id: Option<i64>,
    pub label_ids: Vec<i64>,
}

impl From<&Task> for TaskData {
    fn from(task: &Task) -> Self {
        Self {
            index: task.index,
            title: task.title.clone(),
            content: task.content.clone(),
            status_id: task.status_id,
            assignee_id: task.assignee_id,
            label_ids: task.label_ids.clone(),
        }
    }
}

/// Wire representation of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: i64,
    pub index: Option<i32>,
    pub created_at: NaiveDate,
    #[serde(rename = "assignee_id", alias = "assigneeId")]
    pub assignee_id: Option<i64>,
    pub title: String,
    pub content: Option<String>,
    pub status: String,
    pub task_label_ids: Vec<i64>,
}

impl From<Task> for TaskDto {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            index: task.index,
            created_at: task.created_at,
            assignee_id: task.assignee_id,
            title: task.title,
            content: task.content,
            status: task.status,
            task_label_ids: task.label_ids,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateRequest {
    pub index: Option<i32>,
    #[serde(rename = "assignee_id", alias = "assigneeId")]
    pub assignee_id: Option<i64>,
    #[validate(length(min = 1, max = 1000), custom = "not_blank")]
    pub title: String,
    pub content: Option<String>,
    /// Slug of an existing task status.
    #[validate(length(min = 1))]
    pub status: String,
    #[serde(default)]
    pub task_label_ids: Vec<i64>,
}

/// Partial update. `index`, `content` and `assignee_id` can be cleared with `null`;
/// `taskLabelIds`, when present, replaces the whole label set.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub index: Option<Option<i32>>,
    #[serde(
        rename = "assignee_id",
        alias = "assigneeId",
        default,
        deserialize_with = "nullable"
    )]
    pub assignee_id: Option<Option<i64>>,
    #[validate(length(min = 1, max = 1000), custom = "not_blank")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub content: Option<Option<String>>,
    #[validate(length(min = 1))]
    pub status: Option<String>,
    pub task_label_ids: Option<Vec<i64>>,
}

/// Filters for `GET /api/tasks`. All present filters must match.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    /// Case-insensitive substring of the title.
    pub title_cont: Option<String>,
    pub assignee_id: Option<i64>,
    /// Status slug.
    pub status: Option<String>,
    pub label_id: Option<i64>,
}

impl TaskQuery {
    /// Whether `task` passes every filter. Mirrors the SQL built by the Postgres store.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(needle) = &self.title_cont {
            if !task.title.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(assignee_id) = self.assignee_id {
            if task.assignee_id != Some(assignee_id) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if &task.status != status {
                return false;
            }
        }
        if let Some(label_id) = self.label_id {
            if !task.label_ids.contains(&label_id) {
                return false;
            }
        }
        true
    }
}
