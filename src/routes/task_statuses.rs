use crate::{
    error::AppError,
    models::{TaskStatus, TaskStatusCreateRequest, TaskStatusUpdateRequest},
    routes::list_response,
    store::Store,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use validator::Validate;

async fn load_status(store: &dyn Store, id: i64) -> Result<TaskStatus, AppError> {
    store
        .find_task_status(id)
        .await?
        .ok_or_else(|| AppError::not_found("Task status", id))
}

/// Lists all task statuses ordered by id.
#[get("")]
pub async fn get_task_statuses(store: web::Data<dyn Store>) -> Result<impl Responder, AppError> {
    Ok(list_response(store.list_task_statuses().await?))
}

#[get("/{id}")]
pub async fn get_task_status(
    store: web::Data<dyn Store>,
    status_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let status = load_status(store.get_ref(), status_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(status))
}

/// Creates a task status.
///
/// ## Responses:
/// - `201 Created`: the new status.
/// - `409 Conflict`: the slug is taken.
/// - `422 Unprocessable Entity`: blank name, or a slug outside `[a-z0-9_]`.
#[post("")]
pub async fn create_task_status(
    store: web::Data<dyn Store>,
    status_data: web::Json<TaskStatusCreateRequest>,
) -> Result<impl Responder, AppError> {
    status_data.validate()?;
    let status = store
        .insert_task_status(status_data.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(status))
}

/// Partially updates a task status. Tasks follow the new slug.
///
/// ## Responses:
/// - `200 OK`: the updated status.
/// - `404 Not Found`: no status with this id.
/// - `409 Conflict`: the new slug is taken.
#[put("/{id}")]
pub async fn update_task_status(
    store: web::Data<dyn Store>,
    status_id: web::Path<i64>,
    status_data: web::Json<TaskStatusUpdateRequest>,
) -> Result<impl Responder, AppError> {
    status_data.validate()?;
    let mut status = load_status(store.get_ref(), status_id.into_inner()).await?;
    status_data.into_inner().apply_to(&mut status);
    let status = store.update_task_status(&status).await?;
    Ok(HttpResponse::Ok().json(status))
}

/// Deletes a task status.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no status with this id.
/// - `409 Conflict`: some task still has this status.
#[delete("/{id}")]
pub async fn delete_task_status(
    store: web::Data<dyn Store>,
    status_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let id = status_id.into_inner();
    if store.task_status_in_use(id).await? {
        return Err(AppError::Conflict(
            "Task status is used by tasks and cannot be deleted".into(),
        ));
    }
    if !store.delete_task_status(id).await? {
        return Err(AppError::not_found("Task status", id));
    }
    Ok(HttpResponse::NoContent().finish())
}
