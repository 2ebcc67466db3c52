use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use super::Store;
use crate::error::{AppError, ASSIGNEE_DELETE_MESSAGE, DUPLICATE_MESSAGE, REFERENCE_MESSAGE};
use crate::models::{
    Label, NewLabel, NewTaskStatus, NewUser, Task, TaskData, TaskQuery, TaskStatus, User,
};

#[derive(Debug, Clone)]
struct TaskRow {
    id: i64,
    index: Option<i32>,
    title: String,
    content: Option<String>,
    status_id: i64,
    assignee_id: Option<i64>,
    label_ids: BTreeSet<i64>,
    created_at: NaiveDate,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    statuses: BTreeMap<i64, TaskStatus>,
    labels: BTreeMap<i64, Label>,
    tasks: BTreeMap<i64, TaskRow>,
    last_user_id: i64,
    last_status_id: i64,
    last_label_id: i64,
    last_task_id: i64,
}

impl Tables {
    fn materialize(&self, row: &TaskRow) -> Task {
        Task {
            id: row.id,
            index: row.index,
            title: row.title.clone(),
            content: row.content.clone(),
            status_id: row.status_id,
            status: self
                .statuses
                .get(&row.status_id)
                .map(|s| s.slug.clone())
                .unwrap_or_default(),
            assignee_id: row.assignee_id,
            label_ids: row.label_ids.iter().copied().collect(),
            created_at: row.created_at,
        }
    }

    fn check_task_references(&self, task: &TaskData) -> Result<(), AppError> {
        let status_ok = self.statuses.contains_key(&task.status_id);
        let assignee_ok = task
            .assignee_id
            .map_or(true, |id| self.users.contains_key(&id));
        let labels_ok = task.label_ids.iter().all(|id| self.labels.contains_key(id));
        if status_ok && assignee_ok && labels_ok {
            Ok(())
        } else {
            Err(AppError::Conflict(REFERENCE_MESSAGE.into()))
        }
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn slug_taken(&self, slug: &str, except: Option<i64>) -> bool {
        self.statuses
            .values()
            .any(|s| s.slug == slug && Some(s.id) != except)
    }

    fn label_name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.labels
            .values()
            .any(|l| l.name == name && Some(l.id) != except)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn duplicate() -> AppError {
    AppError::Conflict(DUPLICATE_MESSAGE.into())
}

/// In-process store. All tables live behind one lock, so every check-then-write
/// runs atomically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(duplicate());
        }
        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            password_digest: user.password_digest,
            created_at: today(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, Some(user.id)) {
            return Err(duplicate());
        }
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::not_found("User", user.id))?;
        stored.email = user.email.clone();
        stored.first_name = user.first_name.clone();
        stored.last_name = user.last_name.clone();
        stored.password_digest = user.password_digest.clone();
        Ok(stored.clone())
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.tasks.values().any(|t| t.assignee_id == Some(id)) {
            return Err(AppError::Forbidden(ASSIGNEE_DELETE_MESSAGE.into()));
        }
        Ok(tables.users.remove(&id).is_some())
    }

    async fn user_has_tasks(&self, id: i64) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.values().any(|t| t.assignee_id == Some(id)))
    }

    async fn list_task_statuses(&self) -> Result<Vec<TaskStatus>, AppError> {
        Ok(self.tables.read().await.statuses.values().cloned().collect())
    }

    async fn find_task_status(&self, id: i64) -> Result<Option<TaskStatus>, AppError> {
        Ok(self.tables.read().await.statuses.get(&id).cloned())
    }

    async fn find_task_status_by_slug(&self, slug: &str) -> Result<Option<TaskStatus>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.statuses.values().find(|s| s.slug == slug).cloned())
    }

    async fn insert_task_status(&self, status: NewTaskStatus) -> Result<TaskStatus, AppError> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&status.slug, None) {
            return Err(duplicate());
        }
        tables.last_status_id += 1;
        let status = TaskStatus {
            id: tables.last_status_id,
            name: status.name,
            slug: status.slug,
            created_at: today(),
        };
        tables.statuses.insert(status.id, status.clone());
        Ok(status)
    }

    async fn update_task_status(&self, status: &TaskStatus) -> Result<TaskStatus, AppError> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&status.slug, Some(status.id)) {
            return Err(duplicate());
        }
        let stored = tables
            .statuses
            .get_mut(&status.id)
            .ok_or_else(|| AppError::not_found("Task status", status.id))?;
        stored.name = status.name.clone();
        stored.slug = status.slug.clone();
        Ok(stored.clone())
    }

    async fn delete_task_status(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.tasks.values().any(|t| t.status_id == id) {
            return Err(AppError::Conflict(REFERENCE_MESSAGE.into()));
        }
        Ok(tables.statuses.remove(&id).is_some())
    }

    async fn task_status_in_use(&self, id: i64) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.values().any(|t| t.status_id == id))
    }

    async fn list_labels(&self) -> Result<Vec<Label>, AppError> {
        Ok(self.tables.read().await.labels.values().cloned().collect())
    }

    async fn find_label(&self, id: i64) -> Result<Option<Label>, AppError> {
        Ok(self.tables.read().await.labels.get(&id).cloned())
    }

    async fn find_label_by_name(&self, name: &str) -> Result<Option<Label>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.labels.values().find(|l| l.name == name).cloned())
    }

    async fn insert_label(&self, label: NewLabel) -> Result<Label, AppError> {
        let mut tables = self.tables.write().await;
        if tables.label_name_taken(&label.name, None) {
            return Err(duplicate());
        }
        tables.last_label_id += 1;
        let label = Label {
            id: tables.last_label_id,
            name: label.name,
            created_at: today(),
        };
        tables.labels.insert(label.id, label.clone());
        Ok(label)
    }

    async fn update_label(&self, label: &Label) -> Result<Label, AppError> {
        let mut tables = self.tables.write().await;
        if tables.label_name_taken(&label.name, Some(label.id)) {
            return Err(duplicate());
        }
        let stored = tables
            .labels
            .get_mut(&label.id)
            .ok_or_else(|| AppError::not_found("Label", label.id))?;
        stored.name = label.name.clone();
        Ok(stored.clone())
    }

    async fn delete_label(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.tasks.values().any(|t| t.label_ids.contains(&id)) {
            return Err(AppError::Conflict(REFERENCE_MESSAGE.into()));
        }
        Ok(tables.labels.remove(&id).is_some())
    }

    async fn label_in_use(&self, id: i64) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.values().any(|t| t.label_ids.contains(&id)))
    }

    async fn existing_label_ids(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        let tables = self.tables.read().await;
        let existing: BTreeSet<i64> = ids
            .iter()
            .copied()
            .filter(|id| tables.labels.contains_key(id))
            .collect();
        Ok(existing.into_iter().collect())
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .map(|row| tables.materialize(row))
            .filter(|task| query.matches(task))
            .collect())
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.get(&id).map(|row| tables.materialize(row)))
    }

    async fn insert_task(&self, task: TaskData) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        tables.check_task_references(&task)?;
        tables.last_task_id += 1;
        let row = TaskRow {
            id: tables.last_task_id,
            index: task.index,
            title: task.title,
            content: task.content,
            status_id: task.status_id,
            assignee_id: task.assignee_id,
            label_ids: task.label_ids.into_iter().collect(),
            created_at: today(),
        };
        let created = tables.materialize(&row);
        tables.tasks.insert(row.id, row);
        Ok(created)
    }

    async fn update_task(&self, id: i64, task: TaskData) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.tasks.contains_key(&id) {
            return Err(AppError::not_found("Task", id));
        }
        tables.check_task_references(&task)?;
        let row = tables
            .tasks
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Task", id))?;
        row.index = task.index;
        row.title = task.title;
        row.content = task.content;
        row.status_id = task.status_id;
        row.assignee_id = task.assignee_id;
        row.label_ids = task.label_ids.into_iter().collect();
        let row = row.clone();
        Ok(tables.materialize(&row))
    }

    async fn delete_task(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.tasks.remove(&id).is_some())
    }
}
