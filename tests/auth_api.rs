//! Authentication API integration tests
//!
//! Signup, login, current user, Google sign-in and the password reset flow.

mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::TestApp;

async fn signup(app: &TestApp, username: &str, password: &str) -> axum_test::TestResponse {
    app.server
        .post("/api/auth/signup")
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": password,
        }))
        .await
}

async fn login(app: &TestApp, username: &str, password: &str) -> axum_test::TestResponse {
    app.server
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": password }))
        .await
}

#[tokio::test]
async fn test_signup_login_and_me() {
    let app = TestApp::new().await;

    let response = signup(&app, "alice", "correct-horse").await;
    assert_status!(response, StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["token"].as_str().is_some());

    // Email works as the login name too, case-insensitively
    let response = login(&app, "ALICE@example.com", "correct-horse").await;
    assert_status!(response, StatusCode::OK);
    let token = response.json::<Value>()["token"].as_str().unwrap().to_string();

    let response = app.server.get("/api/auth/me").authorization_bearer(&token).await;
    assert_status!(response, StatusCode::OK);
    let me: Value = response.json();
    assert_eq!(me["email"], "alice@example.com");
    assert_eq!(me["unread_notifications"], 0);
}

#[tokio::test]
async fn test_signup_rejections() {
    let app = TestApp::new().await;
    assert_status!(signup(&app, "bob", "long-enough").await, StatusCode::CREATED);

    // Same username and email
    assert_status!(signup(&app, "bob", "long-enough").await, StatusCode::CONFLICT);
    assert_status!(signup(&app, "carol", "short").await, StatusCode::BAD_REQUEST);
    assert_status!(signup(&app, "9lives", "long-enough").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let app = TestApp::new().await;
    assert_status!(signup(&app, "dave", "right-password").await, StatusCode::CREATED);

    let wrong_password = login(&app, "dave", "wrong-password").await;
    let unknown_user = login(&app, "nobody", "right-password").await;
    assert_status!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_status!(unknown_user, StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong_password.json::<Value>()["error"],
        unknown_user.json::<Value>()["error"]
    );
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new().await;

    assert_status!(app.server.get("/api/auth/me").await, StatusCode::UNAUTHORIZED);
    assert_status!(app.server.get("/api/workspaces").await, StatusCode::UNAUTHORIZED);
    assert_status!(
        app.server.get("/api/auth/me").authorization_bearer("not-a-jwt").await,
        StatusCode::UNAUTHORIZED
    );

    let response = app.server.get("/health").await;
    assert_status!(response, StatusCode::OK);
}

#[tokio::test]
async fn test_update_me_sets_and_clears_slack_id() {
    let app = TestApp::new().await;
    let erin = app.user("erin").await;

    let response = app.patch(&erin, "/api/auth/me", json!({ "slack_user_id": "U123" })).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.json::<Value>()["slack_user_id"], "U123");

    let response = app.patch(&erin, "/api/auth/me", json!({ "slack_user_id": "" })).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.json::<Value>()["slack_user_id"], Value::Null);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::new().await;
    assert_status!(signup(&app, "frank", "old-password").await, StatusCode::CREATED);

    let response = app
        .server
        .post("/api/auth/forgot-password")
        .json(&json!({ "email": "frank@example.com" }))
        .await;
    assert_status!(response, StatusCode::OK);

    let mail = app.mailer.sent();
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].to, "frank@example.com");
    let token = mail[0]
        .body
        .split("token=")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .expect("reset link in email")
        .to_string();

    let response = app
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "token": token, "password": "new-password" }))
        .await;
    assert_status!(response, StatusCode::OK);

    assert_status!(login(&app, "frank", "old-password").await, StatusCode::UNAUTHORIZED);
    assert_status!(login(&app, "frank", "new-password").await, StatusCode::OK);

    // Tokens are single use
    let response = app
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "token": token, "password": "another-password" }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/api/auth/forgot-password")
        .json(&json!({ "email": "ghost@example.com" }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_google_login_creates_then_reuses_account() {
    let app = TestApp::new().await;

    let first = app
        .server
        .post("/api/auth/google")
        .json(&json!({ "credential": "good:g-77:zoe@example.com" }))
        .await;
    assert_status!(first, StatusCode::OK);
    let first: Value = first.json();
    assert_eq!(first["user"]["google_linked"], true);

    let second = app
        .server
        .post("/api/auth/google")
        .json(&json!({ "credential": "good:g-77:zoe@example.com" }))
        .await;
    assert_status!(second, StatusCode::OK);
    assert_eq!(second.json::<Value>()["user"]["id"], first["user"]["id"]);

    let rejected = app
        .server
        .post("/api/auth/google")
        .json(&json!({ "credential": "forged" }))
        .await;
    assert_status!(rejected, StatusCode::UNAUTHORIZED);
}
