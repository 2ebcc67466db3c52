use crate::{
    error::AppError,
    models::{Label, LabelCreateRequest, LabelUpdateRequest, NewLabel},
    routes::list_response,
    store::Store,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use validator::Validate;

async fn load_label(store: &dyn Store, id: i64) -> Result<Label, AppError> {
    store
        .find_label(id)
        .await?
        .ok_or_else(|| AppError::not_found("Label", id))
}

#[get("")]
pub async fn get_labels(store: web::Data<dyn Store>) -> Result<impl Responder, AppError> {
    Ok(list_response(store.list_labels().await?))
}

#[get("/{id}")]
pub async fn get_label(
    store: web::Data<dyn Store>,
    label_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let label = load_label(store.get_ref(), label_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(label))
}

/// Creates a label.
///
/// ## Responses:
/// - `201 Created`: the new label.
/// - `409 Conflict`: a label with this name exists.
/// - `422 Unprocessable Entity`: the name is shorter than 3 or longer than 1000 characters.
#[post("")]
pub async fn create_label(
    store: web::Data<dyn Store>,
    label_data: web::Json<LabelCreateRequest>,
) -> Result<impl Responder, AppError> {
    label_data.validate()?;
    let label = store
        .insert_label(NewLabel {
            name: label_data.into_inner().name,
        })
        .await?;
    Ok(HttpResponse::Created().json(label))
}

#[put("/{id}")]
pub async fn update_label(
    store: web::Data<dyn Store>,
    label_id: web::Path<i64>,
    label_data: web::Json<LabelUpdateRequest>,
) -> Result<impl Responder, AppError> {
    label_data.validate()?;
    let mut label = load_label(store.get_ref(), label_id.into_inner()).await?;
    if let Some(name) = label_data.into_inner().name {
        label.name = name;
    }
    let label = store.update_label(&label).await?;
    Ok(HttpResponse::Ok().json(label))
}

/// Deletes a label.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no label with this id.
/// - `409 Conflict`: the label is attached to a task.
#[delete("/{id}")]
pub async fn delete_label(
    store: web::Data<dyn Store>,
    label_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let id = label_id.into_inner();
    if store.label_in_use(id).await? {
        return Err(AppError::Conflict(
            "Label is attached to tasks and cannot be deleted".into(),
        ));
    }
    if !store.delete_label(id).await? {
        return Err(AppError::not_found("Label", id));
    }
    Ok(HttpResponse::NoContent().finish())
}
