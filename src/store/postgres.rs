use async_trait::async_trait;
use log::info;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};

use super::Store;
use crate::error::{AppError, ASSIGNEE_DELETE_MESSAGE};
use crate::models::{
    Label, NewLabel, NewTaskStatus, NewUser, Task, TaskData, TaskQuery, TaskStatus, User,
};

const USER_COLUMNS: &str = "id, email, first_name, last_name, password_digest, created_at";
const STATUS_COLUMNS: &str = "id, name, slug, created_at";
const LABEL_COLUMNS: &str = "id, name, created_at";

/// Selects tasks joined with their status slug and aggregated label ids.
/// Callers append `WHERE` conditions and ordering.
const TASK_SELECT: &str = r#"
    SELECT t.id, t.task_index AS "index", t.title, t.content, t.status_id,
           s.slug AS status, t.assignee_id,
           ARRAY(SELECT tl.label_id FROM task_labels tl
                 WHERE tl.task_id = t.id ORDER BY tl.label_id) AS label_ids,
           t.created_at
    FROM tasks t
    JOIN task_statuses s ON s.id = t.status_id
"#;

/// Escapes `LIKE` wildcards so user input only ever matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Creates the schema if it does not exist yet.
    pub async fn init_schema(&self) -> Result<(), AppError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                first_name TEXT,
                last_name TEXT,
                password_digest TEXT NOT NULL,
                created_at DATE NOT NULL DEFAULT CURRENT_DATE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS task_statuses (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                created_at DATE NOT NULL DEFAULT CURRENT_DATE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS labels (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(1000) NOT NULL UNIQUE,
                created_at DATE NOT NULL DEFAULT CURRENT_DATE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id BIGSERIAL PRIMARY KEY,
                task_index INTEGER,
                title TEXT NOT NULL,
                content TEXT,
                status_id BIGINT NOT NULL REFERENCES task_statuses(id),
                assignee_id BIGINT REFERENCES users(id),
                created_at DATE NOT NULL DEFAULT CURRENT_DATE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS task_labels (
                task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                label_id BIGINT NOT NULL REFERENCES labels(id),
                PRIMARY KEY (task_id, label_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_tasks_assignee_id ON tasks(assignee_id)",
            "CREATE INDEX IF NOT EXISTS idx_tasks_status_id ON tasks(status_id)",
            "CREATE INDEX IF NOT EXISTS idx_task_labels_label_id ON task_labels(label_id)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("database schema is ready");
        Ok(())
    }

    async fn replace_task_labels(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        task_id: i64,
        label_ids: &[i64],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM task_labels WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut **tx)
            .await?;
        if !label_ids.is_empty() {
            sqlx::query(
                "INSERT INTO task_labels (task_id, label_id) \
                 SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
            )
            .bind(task_id)
            .bind(label_ids)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn exists(&self, sql: &str, id: i64) -> Result<bool, AppError> {
        let (exists,): (bool,) = sqlx::query_as(sql).bind(id).fetch_one(&self.pool).await?;
        Ok(exists)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (email, first_name, last_name, password_digest) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_digest)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_user(&self, user: &User) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET email = $1, first_name = $2, last_name = $3, password_digest = $4 \
             WHERE id = $5 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_digest)
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("User", user.id))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::Forbidden(ASSIGNEE_DELETE_MESSAGE.into()),
                other => other,
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn user_has_tasks(&self, id: i64) -> Result<bool, AppError> {
        self.exists("SELECT EXISTS(SELECT 1 FROM tasks WHERE assignee_id = $1)", id)
            .await
    }

    async fn list_task_statuses(&self) -> Result<Vec<TaskStatus>, AppError> {
        let sql = format!("SELECT {} FROM task_statuses ORDER BY id", STATUS_COLUMNS);
        Ok(sqlx::query_as::<_, TaskStatus>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_task_status(&self, id: i64) -> Result<Option<TaskStatus>, AppError> {
        let sql = format!("SELECT {} FROM task_statuses WHERE id = $1", STATUS_COLUMNS);
        Ok(sqlx::query_as::<_, TaskStatus>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_task_status_by_slug(&self, slug: &str) -> Result<Option<TaskStatus>, AppError> {
        let sql = format!("SELECT {} FROM task_statuses WHERE slug = $1", STATUS_COLUMNS);
        Ok(sqlx::query_as::<_, TaskStatus>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_task_status(&self, status: NewTaskStatus) -> Result<TaskStatus, AppError> {
        let sql = format!(
            "INSERT INTO task_statuses (name, slug) VALUES ($1, $2) RETURNING {}",
            STATUS_COLUMNS
        );
        Ok(sqlx::query_as::<_, TaskStatus>(&sql)
            .bind(&status.name)
            .bind(&status.slug)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_task_status(&self, status: &TaskStatus) -> Result<TaskStatus, AppError> {
        let sql = format!(
            "UPDATE task_statuses SET name = $1, slug = $2 WHERE id = $3 RETURNING {}",
            STATUS_COLUMNS
        );
        sqlx::query_as::<_, TaskStatus>(&sql)
            .bind(&status.name)
            .bind(&status.slug)
            .bind(status.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Task status", status.id))
    }

    async fn delete_task_status(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM task_statuses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn task_status_in_use(&self, id: i64) -> Result<bool, AppError> {
        self.exists("SELECT EXISTS(SELECT 1 FROM tasks WHERE status_id = $1)", id)
            .await
    }

    async fn list_labels(&self) -> Result<Vec<Label>, AppError> {
        let sql = format!("SELECT {} FROM labels ORDER BY id", LABEL_COLUMNS);
        Ok(sqlx::query_as::<_, Label>(&sql).fetch_all(&self.pool).await?)
    }

    async fn find_label(&self, id: i64) -> Result<Option<Label>, AppError> {
        let sql = format!("SELECT {} FROM labels WHERE id = $1", LABEL_COLUMNS);
        Ok(sqlx::query_as::<_, Label>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_label_by_name(&self, name: &str) -> Result<Option<Label>, AppError> {
        let sql = format!("SELECT {} FROM labels WHERE name = $1", LABEL_COLUMNS);
        Ok(sqlx::query_as::<_, Label>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_label(&self, label: NewLabel) -> Result<Label, AppError> {
        let sql = format!(
            "INSERT INTO labels (name) VALUES ($1) RETURNING {}",
            LABEL_COLUMNS
        );
        Ok(sqlx::query_as::<_, Label>(&sql)
            .bind(&label.name)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_label(&self, label: &Label) -> Result<Label, AppError> {
        let sql = format!(
            "UPDATE labels SET name = $1 WHERE id = $2 RETURNING {}",
            LABEL_COLUMNS
        );
        sqlx::query_as::<_, Label>(&sql)
            .bind(&label.name)
            .bind(label.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Label", label.id))
    }

    async fn delete_label(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM labels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn label_in_use(&self, id: i64) -> Result<bool, AppError> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM task_labels WHERE label_id = $1)",
            id,
        )
        .await
    }

    async fn existing_label_ids(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT id FROM labels WHERE id = ANY($1) ORDER BY id")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(TASK_SELECT);
        builder.push(" WHERE TRUE");

        if let Some(title_cont) = &query.title_cont {
            builder
                .push(" AND t.title ILIKE ")
                .push_bind(format!("%{}%", escape_like(title_cont)));
        }
        if let Some(assignee_id) = query.assignee_id {
            builder.push(" AND t.assignee_id = ").push_bind(assignee_id);
        }
        if let Some(status) = &query.status {
            builder.push(" AND s.slug = ").push_bind(status.clone());
        }
        if let Some(label_id) = query.label_id {
            builder
                .push(" AND EXISTS (SELECT 1 FROM task_labels f WHERE f.task_id = t.id AND f.label_id = ")
                .push_bind(label_id)
                .push(")");
        }
        builder.push(" ORDER BY t.id");

        Ok(builder
            .build_query_as::<Task>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        let sql = format!("{} WHERE t.id = $1", TASK_SELECT);
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_task(&self, task: TaskData) -> Result<Task, AppError> {
        let mut tx = self.pool.begin().await?;
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO tasks (task_index, title, content, status_id, assignee_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(task.index)
        .bind(&task.title)
        .bind(&task.content)
        .bind(task.status_id)
        .bind(task.assignee_id)
        .fetch_one(&mut *tx)
        .await?;
        Self::replace_task_labels(&mut tx, id, &task.label_ids).await?;
        tx.commit().await?;

        self.find_task(id)
            .await?
            .ok_or_else(|| AppError::not_found("Task", id))
    }

    async fn update_task(&self, id: i64, task: TaskData) -> Result<Task, AppError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE tasks SET task_index = $1, title = $2, content = $3, status_id = $4, \
             assignee_id = $5 WHERE id = $6",
        )
        .bind(task.index)
        .bind(&task.title)
        .bind(&task.content)
        .bind(task.status_id)
        .bind(task.assignee_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Task", id));
        }
        Self::replace_task_labels(&mut tx, id, &task.label_ids).await?;
        tx.commit().await?;

        self.find_task(id)
            .await?
            .ok_or_else(|| AppError::not_found("Task", id))
    }

    async fn delete_task(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
