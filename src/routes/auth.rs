use crate::{
    auth::{generate_token, verify_password, AuthSettings, LoginRequest},
    error::AppError,
    store::Store,
};
use actix_web::{post, web, HttpResponse, Responder};
use log::info;
use validator::Validate;

/// Login user
///
/// Checks the email and password and returns a signed JWT.
///
/// ## Request Body:
/// - `username`: the user's email.
/// - `password`: the plain-text password.
///
/// ## Responses:
/// - `200 OK`: the raw token as `text/plain`.
/// - `401 Unauthorized`: unknown email or wrong password. Both give the same message.
/// - `422 Unprocessable Entity`: `username` is not an email or `password` is empty.
#[post("/login")]
pub async fn login(
    store: web::Data<dyn Store>,
    settings: web::Data<AuthSettings>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = store
        .find_user_by_email(&login_data.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    if !verify_password(&login_data.password, &user.password_digest)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = generate_token(&settings, user.id, &user.email)?;
    info!("user {} logged in", user.id);

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{hash_password, verify_token};
    use crate::models::NewUser;
    use crate::store::MemoryStore;
    use actix_web::{test, App};
    use serde_json::json;
    use std::sync::Arc;

    fn settings() -> AuthSettings {
        AuthSettings::new("login-test-secret", 1, 4)
    }

    async fn store_with_user(settings: &AuthSettings) -> Arc<dyn Store> {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        store
            .insert_user(NewUser {
                email: "jane@example.com".into(),
                first_name: None,
                last_name: None,
                password_digest: hash_password("secret", settings.bcrypt_cost).unwrap(),
            })
            .await
            .unwrap();
        store
    }

    #[actix_web::test]
    async fn test_login_returns_token() {
        let settings = settings();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(store_with_user(&settings).await))
                .app_data(web::Data::new(settings.clone()))
                .service(login),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({"username": "jane@example.com", "password": "secret"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body = test::read_body(resp).await;
        let token = String::from_utf8(body.to_vec()).unwrap();
        let claims = verify_token(&settings, &token).unwrap();
        assert_eq!(claims.sub, "jane@example.com");
        assert_eq!(claims.uid, 1);
    }

    #[actix_web::test]
    async fn test_login_rejects_bad_credentials() {
        let settings = settings();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(store_with_user(&settings).await))
                .app_data(web::Data::new(settings))
                .service(login),
        )
        .await;

        for (username, password) in [
            ("jane@example.com", "wrong"),
            ("nobody@example.com", "secret"),
        ] {
            let req = test::TestRequest::post()
                .uri("/login")
                .set_json(json!({"username": username, "password": password}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 401, "{} / {}", username, password);

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "Invalid credentials");
        }
    }

    #[actix_web::test]
    async fn test_login_validation() {
        let settings = settings();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(store_with_user(&settings).await))
                .app_data(web::Data::new(settings))
                .service(login),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({"username": "not-an-email", "password": "secret"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 422);
    }
}
