pub mod auth;
pub mod health;
pub mod labels;
pub mod task_statuses;
pub mod tasks;
pub mod users;

use actix_cors::Cors;
use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::auth::AuthMiddleware;
use crate::error::{json_error_handler, path_error_handler, query_error_handler};

/// Response header carrying the number of items in a list response.
pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// Registers the public health routes and the `/api` scope behind `AuthMiddleware`.
/// The store and `AuthSettings` are expected as app data.
pub fn app(cfg: &mut web::ServiceConfig) {
    extractors(cfg);
    cfg.service(health::health)
        .service(health::welcome)
        .service(web::scope("/api").wrap(AuthMiddleware).configure(config));
}

/// Any origin, method and header. All response headers are exposed so browsers
/// can read `X-Total-Count`.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .expose_any_header()
        .max_age(3600)
}

/// Registers every `/api` route. Mount it under a scope wrapped in `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(
            web::scope("/users")
                .service(users::get_users)
                .service(users::create_user)
                .service(users::get_user)
                .service(users::update_user)
                .service(users::delete_user),
        )
        .service(
            web::scope("/task_statuses")
                .service(task_statuses::get_task_statuses)
                .service(task_statuses::create_task_status)
                .service(task_statuses::get_task_status)
                .service(task_statuses::update_task_status)
                .service(task_statuses::delete_task_status),
        )
        .service(
            web::scope("/labels")
                .service(labels::get_labels)
                .service(labels::create_label)
                .service(labels::get_label)
                .service(labels::update_label)
                .service(labels::delete_label),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}

/// Makes malformed JSON bodies, query strings and path segments answer with the
/// usual `{"error": ...}` body and a 400 instead of actix's plain-text defaults.
fn extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler));
}

/// 200 with the items as a JSON array and `X-Total-Count` set.
pub(crate) fn list_response<T: Serialize>(items: Vec<T>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((TOTAL_COUNT_HEADER, items.len().to_string()))
        .json(items)
}
