use crate::{
    auth::{hash_password, AuthSettings, CurrentUser},
    error::{AppError, ASSIGNEE_DELETE_MESSAGE},
    models::{NewUser, User, UserCreateRequest, UserDto, UserUpdateRequest},
    routes::list_response,
    store::Store,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use log::info;
use validator::Validate;

async fn load_user(store: &dyn Store, id: i64) -> Result<User, AppError> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))
}

/// Users may only change or remove their own account.
fn ensure_self(current: &CurrentUser, user: &User) -> Result<(), AppError> {
    if current.id != user.id {
        return Err(AppError::Forbidden(
            "You can only modify your own account".into(),
        ));
    }
    Ok(())
}

/// Lists all users ordered by id.
///
/// ## Responses:
/// - `200 OK`: JSON array of `UserDto`, with `X-Total-Count`.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn get_users(store: web::Data<dyn Store>) -> Result<impl Responder, AppError> {
    let users = store.list_users().await?;
    Ok(list_response(
        users.into_iter().map(UserDto::from).collect(),
    ))
}

/// Retrieves a single user.
///
/// ## Responses:
/// - `200 OK`: the `UserDto`.
/// - `404 Not Found`: no user with this id.
#[get("/{id}")]
pub async fn get_user(
    store: web::Data<dyn Store>,
    user_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let user = load_user(store.get_ref(), user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

/// Registers a new user. This route is public.
///
/// ## Request Body:
/// - `email`: a valid, unused email.
/// - `firstName`, `lastName` (optional).
/// - `password`: at least 3 characters.
///
/// ## Responses:
/// - `201 Created`: the new `UserDto`.
/// - `409 Conflict`: the email is already registered.
/// - `422 Unprocessable Entity`: validation failed.
#[post("")]
pub async fn create_user(
    store: web::Data<dyn Store>,
    settings: web::Data<AuthSettings>,
    user_data: web::Json<UserCreateRequest>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;
    let user_data = user_data.into_inner();

    let password_digest = hash_password(&user_data.password, settings.bcrypt_cost)?;
    let user = store
        .insert_user(NewUser {
            email: user_data.email,
            first_name: user_data.first_name,
            last_name: user_data.last_name,
            password_digest,
        })
        .await?;

    info!("registered user {}", user.id);
    Ok(HttpResponse::Created().json(UserDto::from(user)))
}

/// Partially updates the caller's own account.
///
/// Absent fields are left unchanged. `firstName` and `lastName` may be `null`.
/// A new `password` is hashed before it is stored.
///
/// ## Responses:
/// - `200 OK`: the updated `UserDto`.
/// - `403 Forbidden`: the account belongs to someone else.
/// - `404 Not Found`: no user with this id.
/// - `409 Conflict`: the new email is taken.
/// - `422 Unprocessable Entity`: validation failed.
#[put("/{id}")]
pub async fn update_user(
    store: web::Data<dyn Store>,
    settings: web::Data<AuthSettings>,
    current: CurrentUser,
    user_id: web::Path<i64>,
    user_data: web::Json<UserUpdateRequest>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;

    let mut user = load_user(store.get_ref(), user_id.into_inner()).await?;
    ensure_self(&current, &user)?;

    user_data.apply_to(&mut user);
    if let Some(password) = &user_data.password {
        user.password_digest = hash_password(password, settings.bcrypt_cost)?;
    }

    let user = store.update_user(&user).await?;
    Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

/// Deletes the caller's own account.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `403 Forbidden`: the account belongs to someone else, or tasks are still assigned to it.
/// - `404 Not Found`: no user with this id.
#[delete("/{id}")]
pub async fn delete_user(
    store: web::Data<dyn Store>,
    current: CurrentUser,
    user_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let id = user_id.into_inner();
    let user = load_user(store.get_ref(), id).await?;
    ensure_self(&current, &user)?;

    if store.user_has_tasks(id).await? {
        return Err(AppError::Forbidden(ASSIGNEE_DELETE_MESSAGE.into()));
    }

    if !store.delete_user(id).await? {
        return Err(AppError::not_found("User", id));
    }
    info!("deleted user {}", id);
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn user(id: i64, email: &str) -> User {
        User {
            id,
            email: email.to_string(),
            first_name: None,
            last_name: None,
            password_digest: String::new(),
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_ensure_self_matches_on_id() {
        let current = CurrentUser {
            id: 2,
            email: "jane@example.com".to_string(),
        };

        assert!(ensure_self(&current, &user(2, "jane@example.com")).is_ok());
        // The account was renamed after the token was issued.
        assert!(ensure_self(&current, &user(2, "jane.doe@example.com")).is_ok());
        assert!(matches!(
            ensure_self(&current, &user(3, "jane@example.com")),
            Err(AppError::Forbidden(_))
        ));
    }
}
