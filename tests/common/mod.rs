#![allow(dead_code)]

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header;
use actix_web::test;
use serde_json::json;
use task_manager::auth::AuthSettings;
use task_manager::models::UserDto;
use task_manager::seed::{seed, ADMIN_EMAIL, ADMIN_PASSWORD};
use task_manager::store::{MemoryStore, Store};

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

pub fn test_settings() -> AuthSettings {
    AuthSettings::new("integration-test-secret", 1, 4)
}

/// A fresh in-memory store holding the default seed data.
pub async fn seeded_store() -> Arc<dyn Store> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    seed(store.as_ref(), &test_settings())
        .await
        .expect("Failed to seed the test store");
    store
}

/// The `App` as `main` assembles it, over an `Arc<dyn Store>`. Shared by
/// `init_app` and the tests that run a real `HttpServer`.
macro_rules! test_app {
    ($store:expr) => {
        actix_web::App::new()
            .app_data(actix_web::web::Data::from($store))
            .app_data(actix_web::web::Data::new($crate::common::test_settings()))
            .wrap(task_manager::routes::cors())
            .wrap(actix_web::middleware::Logger::default())
            .configure(task_manager::routes::app)
    };
}

/// The application as `main` assembles it, over the given store.
pub async fn init_app(
    store: Arc<dyn Store>,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(test_app!(store)).await
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn login(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> Result<String, String> {
    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "username": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;

    if !status.is_success() {
        return Err(format!(
            "Failed to log in. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

pub async fn login_admin(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
) -> TestUser {
    let token = login(app, ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .expect("Failed to log in as the seeded admin");
    // The seed inserts the admin first into an empty store.
    TestUser {
        id: 1,
        email: ADMIN_EMAIL.to_string(),
        token,
    }
}

pub async fn register_and_login_user(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> Result<TestUser, String> {
    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({
            "email": email,
            "firstName": "Test",
            "lastName": "User",
            "password": password
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;

    if !status.is_success() {
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    let user: UserDto = serde_json::from_slice(&body)
        .map_err(|e| format!("Failed to parse registration response: {}", e))?;

    let token = login(app, email, password).await?;
    Ok(TestUser {
        id: user.id,
        email: user.email,
        token,
    })
}
