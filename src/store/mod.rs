//! Persistence layer with pluggable storage backends.
//!
//! Handlers talk to a `web::Data<dyn Store>`. `PgStore` is the production backend;
//! `MemoryStore` keeps everything in process and backs dev mode (no `DATABASE_URL`)
//! as well as the HTTP tests. Both enforce the same uniqueness and reference rules
//! and report violations as `AppError::Conflict`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    Label, NewLabel, NewTaskStatus, NewUser, Task, TaskData, TaskQuery, TaskStatus, User,
};

#[async_trait]
pub trait Store: Send + Sync {
    /// List all users ordered by id.
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// Insert a user. Fails with `Conflict` if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;
    /// Overwrite every mutable column of an existing user.
    async fn update_user(&self, user: &User) -> Result<User, AppError>;
    /// Delete a user. Returns false if no such user existed and `Forbidden` if the
    /// user is still the assignee of a task.
    async fn delete_user(&self, id: i64) -> Result<bool, AppError>;
    /// Whether any task is assigned to the user.
    async fn user_has_tasks(&self, id: i64) -> Result<bool, AppError>;

    async fn list_task_statuses(&self) -> Result<Vec<TaskStatus>, AppError>;
    async fn find_task_status(&self, id: i64) -> Result<Option<TaskStatus>, AppError>;
    async fn find_task_status_by_slug(&self, slug: &str) -> Result<Option<TaskStatus>, AppError>;
    async fn insert_task_status(&self, status: NewTaskStatus) -> Result<TaskStatus, AppError>;
    async fn update_task_status(&self, status: &TaskStatus) -> Result<TaskStatus, AppError>;
    async fn delete_task_status(&self, id: i64) -> Result<bool, AppError>;
    /// Whether any task currently has this status.
    async fn task_status_in_use(&self, id: i64) -> Result<bool, AppError>;

    async fn list_labels(&self) -> Result<Vec<Label>, AppError>;
    async fn find_label(&self, id: i64) -> Result<Option<Label>, AppError>;
    async fn find_label_by_name(&self, name: &str) -> Result<Option<Label>, AppError>;
    async fn insert_label(&self, label: NewLabel) -> Result<Label, AppError>;
    async fn update_label(&self, label: &Label) -> Result<Label, AppError>;
    async fn delete_label(&self, id: i64) -> Result<bool, AppError>;
    /// Whether any task carries this label.
    async fn label_in_use(&self, id: i64) -> Result<bool, AppError>;
    /// The subset of `ids` that name existing labels, ascending and deduplicated.
    async fn existing_label_ids(&self, ids: &[i64]) -> Result<Vec<i64>, AppError>;

    /// List the tasks matching every filter in `query`, ordered by id.
    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, AppError>;
    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError>;
    async fn insert_task(&self, task: TaskData) -> Result<Task, AppError>;
    /// Replace a task's columns and label set. `NotFound` if the task is gone.
    async fn update_task(&self, id: i64, task: TaskData) -> Result<Task, AppError>;
    async fn delete_task(&self, id: i64) -> Result<bool, AppError>;
}

/// Builds the store selected by `config`: Postgres when a database URL is set,
/// otherwise the in-memory store.
pub async fn connect(config: &Config) -> Result<Arc<dyn Store>, AppError> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.db_max_connections).await?;
            store.init_schema().await?;
            info!("using PostgreSQL store");
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL is not set, using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
