use crate::{
    error::AppError,
    models::{Task, TaskCreateRequest, TaskData, TaskDto, TaskQuery, TaskUpdateRequest},
    routes::list_response,
    store::Store,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use log::info;
use validator::Validate;

async fn load_task(store: &dyn Store, id: i64) -> Result<Task, AppError> {
    store
        .find_task(id)
        .await?
        .ok_or_else(|| AppError::not_found("Task", id))
}

/// Resolves a status slug to its id.
async fn resolve_status(store: &dyn Store, slug: &str) -> Result<i64, AppError> {
    store
        .find_task_status_by_slug(slug)
        .await?
        .map(|status| status.id)
        .ok_or_else(|| AppError::BadRequest(format!("Task status '{}' does not exist", slug)))
}

async fn check_assignee(store: &dyn Store, assignee_id: Option<i64>) -> Result<(), AppError> {
    if let Some(id) = assignee_id {
        if store.find_user(id).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "Assignee with id {} does not exist",
                id
            )));
        }
    }
    Ok(())
}

/// Retrieves the list of tasks.
///
/// All filters are optional and combined with AND. Tasks are ordered by id.
///
/// ## Query Parameters:
/// - `titleCont`: case-insensitive substring of the title.
/// - `assigneeId`: id of the assigned user.
/// - `status`: slug of the task status.
/// - `labelId`: id of a label the task carries.
///
/// ## Responses:
/// - `200 OK`: JSON array of `TaskDto`, with `X-Total-Count`.
/// - `400 Bad Request`: a filter could not be parsed.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn get_tasks(
    store: web::Data<dyn Store>,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = store.list_tasks(&query_params).await?;
    Ok(list_response(
        tasks.into_iter().map(TaskDto::from).collect(),
    ))
}

/// Creates a new task.
///
/// ## Request Body:
/// - `title`: required, not blank.
/// - `status`: slug of an existing task status.
/// - `index`, `content` (optional).
/// - `assignee_id` or `assigneeId` (optional): id of an existing user.
/// - `taskLabelIds` (optional): label ids. Ids that name no label are dropped.
///
/// ## Responses:
/// - `201 Created`: the new `TaskDto`.
/// - `400 Bad Request`: unknown status slug or assignee.
/// - `422 Unprocessable Entity`: validation failed.
#[post("")]
pub async fn create_task(
    store: web::Data<dyn Store>,
    task_data: web::Json<TaskCreateRequest>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task_data = task_data.into_inner();
    let store = store.get_ref();

    let status_id = resolve_status(store, &task_data.status).await?;
    check_assignee(store, task_data.assignee_id).await?;
    let label_ids = store.existing_label_ids(&task_data.task_label_ids).await?;

    let task = store
        .insert_task(TaskData {
            index: task_data.index,
            title: task_data.title,
            content: task_data.content,
            status_id,
            assignee_id: task_data.assignee_id,
            label_ids,
        })
        .await?;

    info!("created task {}", task.id);
    Ok(HttpResponse::Created().json(TaskDto::from(task)))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: the `TaskDto`.
/// - `404 Not Found`: no task with this id.
#[get("/{id}")]
pub async fn get_task(
    store: web::Data<dyn Store>,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = load_task(store.get_ref(), task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(TaskDto::from(task)))
}

/// Partially updates a task.
///
/// Absent fields keep their value. `index`, `content` and `assignee_id` may be `null`
/// to clear them. `taskLabelIds` replaces the whole label set.
///
/// ## Responses:
/// - `200 OK`: the updated `TaskDto`.
/// - `400 Bad Request`: unknown status slug or assignee.
/// - `404 Not Found`: no task with this id.
/// - `422 Unprocessable Entity`: validation failed.
#[put("/{id}")]
pub async fn update_task(
    store: web::Data<dyn Store>,
    task_id: web::Path<i64>,
    task_data: web::Json<TaskUpdateRequest>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let patch = task_data.into_inner();
    let store = store.get_ref();

    let task = load_task(store, task_id.into_inner()).await?;
    let mut data = TaskData::from(&task);

    if let Some(index) = patch.index {
        data.index = index;
    }
    if let Some(title) = patch.title {
        data.title = title;
    }
    if let Some(content) = patch.content {
        data.content = content;
    }
    if let Some(assignee_id) = patch.assignee_id {
        check_assignee(store, assignee_id).await?;
        data.assignee_id = assignee_id;
    }
    if let Some(slug) = patch.status {
        data.status_id = resolve_status(store, &slug).await?;
    }
    if let Some(label_ids) = patch.task_label_ids {
        data.label_ids = store.existing_label_ids(&label_ids).await?;
    }

    let task = store.update_task(task.id, data).await?;
    Ok(HttpResponse::Ok().json(TaskDto::from(task)))
}

/// Deletes a task by its ID. Its label links go with it.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no task with this id.
#[delete("/{id}")]
pub async fn delete_task(
    store: web::Data<dyn Store>,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();
    if !store.delete_task(id).await? {
        return Err(AppError::not_found("Task", id));
    }
    info!("deleted task {}", id);
    Ok(HttpResponse::NoContent().finish())
}
