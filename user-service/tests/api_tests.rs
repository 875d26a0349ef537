mod common;

use auth::Claims;
use common::TestApp;
use common::ADMIN_EMAIL;
use common::ADMIN_PASSWORD;
use reqwest::StatusCode;
use serde_json::json;
use user_service::domain::user::models::UserId;

async fn message(response: reqwest::Response) -> String {
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    body["data"]["message"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_authenticate_success() {
    let app = TestApp::spawn().await;
    let user_id = app.register("alice@example.com", "secret1", "Alice").await;

    let response = app.login("alice@example.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status_code"], 200);
    assert_eq!(body["data"]["user"]["id"], user_id.as_str());
    assert_eq!(body["data"]["user"]["email"], "alice@example.com");
    assert_eq!(body["data"]["user"]["role"], "user");
    assert!(body["data"]["user"].get("password_hash").is_none());

    // Issued token decodes to the account's identity
    let token = body["data"]["token"].as_str().unwrap();
    let claims: Claims = app.jwt_handler.decode(token).expect("Token must validate");
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.role, "user");
    assert!(claims.exp > claims.iat);
}

#[tokio::test]
async fn test_authenticate_wrong_password() {
    let app = TestApp::spawn().await;
    app.register("alice@example.com", "secret1", "Alice").await;

    let response = app.login("alice@example.com", "wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Invalid credentials");
}

#[tokio::test]
async fn test_authenticate_unknown_email_matches_wrong_password() {
    let app = TestApp::spawn().await;

    let response = app.login("nobody@example.com", "x").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Invalid credentials");
}

#[tokio::test]
async fn test_deactivated_account_cannot_log_in() {
    let app = TestApp::spawn().await;
    let user_id = app.register("alice@example.com", "secret1", "Alice").await;

    let response = app
        .patch_authenticated(
            &format!("/api/v1/users/{}/status", user_id),
            &app.admin_token(),
        )
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["is_active"], false);

    let response = app.login("alice@example.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "User account is deactivated");

    // Reactivation restores access
    app.patch_authenticated(
        &format!("/api/v1/users/{}/status", user_id),
        &app.admin_token(),
    )
    .json(&json!({ "is_active": true }))
    .send()
    .await
    .unwrap();

    let response = app.login("alice@example.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "bob@example.com", "password": "abc", "name": "Bob" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "not-an-email", "password": "secret1", "name": "Bob" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::spawn().await;
    app.register("alice@example.com", "secret1", "Alice").await;

    let response = app
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "alice@example.com", "password": "secret1", "name": "Alice 2" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(message(response).await.contains("already exists"));
}

#[tokio::test]
async fn test_me_returns_caller() {
    let app = TestApp::spawn().await;

    let response = app
        .get_authenticated("/api/v1/auth/me", &app.admin_token())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["email"], ADMIN_EMAIL);
    assert_eq!(body["data"]["role"], "admin");
}

#[tokio::test]
async fn test_missing_authorization_header() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/v1/users").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Authorization header required");
}

#[tokio::test]
async fn test_wrong_authorization_scheme() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/api/v1/users")
        .header("Authorization", format!("Basic {}", app.admin_token()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Invalid authorization header format");
}

#[tokio::test]
async fn test_invalid_token() {
    let app = TestApp::spawn().await;

    let response = app
        .get_authenticated("/api/v1/users", "not.a.token")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Invalid token");
}

#[tokio::test]
async fn test_expired_token() {
    let app = TestApp::spawn().await;

    let claims = Claims::for_user(
        app.admin.id,
        ADMIN_EMAIL,
        "admin",
        chrono::Duration::hours(1),
    )
    .unwrap()
    .with_expiration(chrono::Utc::now().timestamp() - 60);
    let token = app.jwt_handler.encode(&claims).unwrap();

    let response = app
        .get_authenticated("/api/v1/users", &token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Token expired");
}

#[tokio::test]
async fn test_non_admin_cannot_create_users() {
    let app = TestApp::spawn().await;
    app.register("alice@example.com", "secret1", "Alice").await;

    let login: serde_json::Value = app
        .login("alice@example.com", "secret1")
        .await
        .json()
        .await
        .unwrap();
    let token = login["data"]["token"].as_str().unwrap();

    let response = app
        .post_authenticated("/api/v1/users", token)
        .json(&json!({
            "email": "mallory@example.com",
            "password": "secret1",
            "name": "Mallory",
            "role": "admin"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(message(response).await, "Insufficient permissions");
}

#[tokio::test]
async fn test_admin_creates_user_with_role() {
    let app = TestApp::spawn().await;

    let response = app
        .post_authenticated("/api/v1/users", &app.admin_token())
        .json(&json!({
            "email": "guest@example.com",
            "password": "secret1",
            "name": "Guest",
            "role": "guest"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status_code"], 201);
    assert_eq!(body["data"]["role"], "guest");
    assert_eq!(body["data"]["is_active"], true);
}

#[tokio::test]
async fn test_admin_create_rejects_unknown_role() {
    let app = TestApp::spawn().await;

    let response = app
        .post_authenticated("/api/v1/users", &app.admin_token())
        .json(&json!({
            "email": "root@example.com",
            "password": "secret1",
            "name": "Root",
            "role": "superuser"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_user_by_id_and_email() {
    let app = TestApp::spawn().await;
    let user_id = app.register("alice@example.com", "secret1", "Alice").await;
    let token = app.admin_token();

    let response = app
        .get_authenticated(&format!("/api/v1/users/{}", user_id), &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Alice");

    let response = app
        .get_authenticated("/api/v1/users/email?email=alice@example.com", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["id"], user_id.as_str());
}

#[tokio::test]
async fn test_get_user_not_found_and_bad_id() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let response = app
        .get_authenticated(&format!("/api/v1/users/{}", UserId::new()), &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .get_authenticated("/api/v1/users/not-a-uuid", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_users_paginates() {
    let app = TestApp::spawn().await;
    for i in 0..3 {
        app.register(&format!("user{}@example.com", i), "secret1", "User")
            .await;
    }

    let response = app
        .get_authenticated("/api/v1/users?offset=1&limit=2", &app.admin_token())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total"], 4);
    assert_eq!(body["data"]["offset"], 1);
    assert_eq!(body["data"]["limit"], 2);
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_and_delete_user() {
    let app = TestApp::spawn().await;
    let user_id = app.register("alice@example.com", "secret1", "Alice").await;
    let token = app.admin_token();

    let response = app
        .put_authenticated(&format!("/api/v1/users/{}", user_id), &token)
        .json(&json!({ "name": "Alice Cooper", "role": "guest" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Alice Cooper");
    assert_eq!(body["data"]["role"], "guest");

    let response = app
        .put_authenticated(&format!("/api/v1/users/{}", user_id), &token)
        .json(&json!({ "email": ADMIN_EMAIL }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .delete_authenticated(&format!("/api/v1/users/{}", user_id), &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .delete_authenticated(&format!("/api/v1/users/{}", user_id), &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_login_workflow() {
    let app = TestApp::spawn().await;

    // Admin logs in with a password, not a minted token
    let response = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    let admin_token = body["data"]["token"].as_str().unwrap().to_string();

    let response = app
        .post_authenticated("/api/v1/users", &admin_token)
        .json(&json!({
            "email": "carol@example.com",
            "password": "secret1",
            "name": "Carol",
            "role": "user"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.login("carol@example.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    let carol_token = body["data"]["token"].as_str().unwrap();

    let response = app
        .get_authenticated("/api/v1/auth/me", carol_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["email"], "carol@example.com");
}

#[tokio::test]
async fn test_list_users_rejects_bad_window() {
    let app = TestApp::spawn().await;

    let response = app
        .get_authenticated("/api/v1/users?limit=0", &app.admin_token())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
