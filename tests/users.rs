mod common;

use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::json;
use task_manager::models::UserDto;
use task_manager::seed::ADMIN_EMAIL;

use common::{bearer, init_app, login, login_admin, register_and_login_user, seeded_store};

#[test_log::test(actix_web::test)]
async fn test_user_registration_and_listing() {
    let app = init_app(seeded_store().await).await;

    let jane = register_and_login_user(&app, "jane@example.com", "secret")
        .await
        .expect("Failed to register Jane");
    assert_eq!(jane.id, 2);

    // Duplicate email
    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "email": "jane@example.com", "password": "other" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Invalid email and too short password
    for payload in [
        json!({ "email": "not-an-email", "password": "secret" }),
        json!({ "email": "joe@example.com", "password": "ab" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/users")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "payload {}",
            payload
        );
    }

    let req = test::TestRequest::get()
        .uri("/api/users")
        .append_header(bearer(&jane.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("X-Total-Count").unwrap(), "2");
    let users: Vec<UserDto> = test::read_body_json(resp).await;
    let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(emails, vec![ADMIN_EMAIL, "jane@example.com"]);

    // The password digest is never serialized.
    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", jane.id))
        .append_header(bearer(&jane.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["firstName"], "Test");
    assert!(body.get("password").is_none());
    assert!(body.get("passwordDigest").is_none());

    let req = test::TestRequest::get()
        .uri("/api/users/999")
        .append_header(bearer(&jane.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[test_log::test(actix_web::test)]
async fn test_user_can_update_only_themself() {
    let app = init_app(seeded_store().await).await;
    let admin = login_admin(&app).await;
    let jane = register_and_login_user(&app, "jane@example.com", "secret")
        .await
        .expect("Failed to register Jane");

    let req = test::TestRequest::put()
        .uri(&format!("/api/users/{}", jane.id))
        .append_header(bearer(&admin.token))
        .set_json(json!({ "firstName": "Hacked" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/users/{}", jane.id))
        .append_header(bearer(&jane.token))
        .set_json(json!({ "firstName": "Janet", "lastName": null, "password": "new-secret" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: UserDto = test::read_body_json(resp).await;
    assert_eq!(updated.first_name.as_deref(), Some("Janet"));
    assert_eq!(updated.last_name, None);
    assert_eq!(updated.email, "jane@example.com");

    // The new password replaces the old one.
    assert!(login(&app, "jane@example.com", "secret").await.is_err());
    assert!(login(&app, "jane@example.com", "new-secret").await.is_ok());

    // Taking someone else's email
    let req = test::TestRequest::put()
        .uri(&format!("/api/users/{}", jane.id))
        .append_header(bearer(&jane.token))
        .set_json(json!({ "email": ADMIN_EMAIL }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::put()
        .uri("/api/users/999")
        .append_header(bearer(&jane.token))
        .set_json(json!({ "firstName": "Nobody" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[test_log::test(actix_web::test)]
async fn test_user_deletion_rules() {
    let app = init_app(seeded_store().await).await;
    let admin = login_admin(&app).await;
    let jane = register_and_login_user(&app, "jane@example.com", "secret")
        .await
        .expect("Failed to register Jane");

    // Someone else's account
    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}", jane.id))
        .append_header(bearer(&admin.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // An assignee cannot be removed while the task exists.
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .append_header(bearer(&jane.token))
        .set_json(json!({ "title": "Jane's task", "status": "draft", "assignee_id": jane.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let task: serde_json::Value = test::read_body_json(resp).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}", jane.id))
        .append_header(bearer(&jane.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", task["id"]))
        .append_header(bearer(&jane.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}", jane.id))
        .append_header(bearer(&jane.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", jane.id))
        .append_header(bearer(&admin.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
