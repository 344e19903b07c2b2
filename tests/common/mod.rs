//! Common test utilities and helpers
//!
//! - `TestApp` builds the full router on an in-memory store with recording
//!   chat/mail backends and a fake Google verifier
//! - Assertion macros for `Result`s
//!
//! Each integration test file declares `mod common;` and only uses part of
//! this module.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};
use uuid::Uuid;

use workhub::backend::auth::oauth::{IdentityError, IdentityVerifier, VerifiedIdentity};
use workhub::backend::auth::sessions::create_token;
use workhub::backend::auth::users::{create_user, save_user};
use workhub::backend::notify::{ChatNotifier, Mailer, NotifyError};
use workhub::backend::server::{build_state, create_app_from_state, AppState, ServerConfig};
use workhub::backend::store::MemoryStore;
use workhub::shared::model::Notification;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a response has the expected status, showing the body if not
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status_code(),
            $status,
            "unexpected status, body: {}",
            $response.text()
        );
    };
}

/// Chat backend that records deliveries and can be told to fail
#[derive(Default)]
pub struct RecordingChat {
    pub fail: Mutex<bool>,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingChat {
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
    }
}

#[async_trait]
impl ChatNotifier for RecordingChat {
    async fn send(&self, chat_user_id: &str, notification: &Notification) -> Result<(), NotifyError> {
        if *self.fail.lock().unwrap() {
            return Err(NotifyError::Rejected("channel_not_found".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_user_id.to_string(), notification.title.clone()));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer that keeps every message in memory
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.to).collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Accepts credentials of the form `good:<subject>:<email>`
pub struct FakeGoogle;

#[async_trait]
impl IdentityVerifier for FakeGoogle {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, IdentityError> {
        match credential.split(':').collect::<Vec<_>>().as_slice() {
            ["good", subject, email] => Ok(VerifiedIdentity {
                subject: subject.to_string(),
                email: email.to_string(),
                name: None,
            }),
            _ => Err(IdentityError::Invalid("bad credential".into())),
        }
    }
}

/// A user with a valid session token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub token: String,
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub chat: Arc<RecordingChat>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = ServerConfig::builder()
            .jwt_secret(TEST_SECRET)
            .app_base_url("https://work.example.com")
            .build()
            .expect("test config");
        let chat = Arc::new(RecordingChat::default());
        let mailer = Arc::new(RecordingMailer::default());
        let state = build_state(
            config,
            Arc::new(MemoryStore::new()),
            chat.clone(),
            mailer.clone(),
            Arc::new(FakeGoogle),
        );
        let app = create_app_from_state(state.clone()).await.expect("app");
        let server = TestServer::new(app).expect("test server");
        Self {
            server,
            state,
            chat,
            mailer,
        }
    }

    /// Create a user directly in the store (no bcrypt round) and sign a token
    pub async fn user(&self, username: &str) -> TestUser {
        let email = format!("{}@example.com", username);
        let user = create_user(self.state.store.as_ref(), username.to_string(), email.clone(), None)
            .await
            .expect("create user");
        let token = create_token(TEST_SECRET, user.id, user.email.clone(), Some(user.username.clone()))
            .expect("token");
        TestUser {
            id: user.id,
            username: username.to_string(),
            email,
            token,
        }
    }

    /// Same as `user`, with a Slack member id attached
    pub async fn slack_user(&self, username: &str, slack_id: &str) -> TestUser {
        let test_user = self.user(username).await;
        let store = self.state.store.as_ref();
        let mut user = workhub::backend::auth::users::get_user_by_id(store, test_user.id)
            .await
            .expect("load user")
            .expect("user exists");
        user.slack_user_id = Some(slack_id.to_string());
        save_user(store, &mut user).await.expect("save user");
        test_user
    }

    pub async fn get(&self, user: &TestUser, path: &str) -> TestResponse {
        self.server.get(path).authorization_bearer(&user.token).await
    }

    pub async fn post(&self, user: &TestUser, path: &str, body: Value) -> TestResponse {
        self.server.post(path).authorization_bearer(&user.token).json(&body).await
    }

    pub async fn patch(&self, user: &TestUser, path: &str, body: Value) -> TestResponse {
        self.server.patch(path).authorization_bearer(&user.token).json(&body).await
    }

    pub async fn delete(&self, user: &TestUser, path: &str) -> TestResponse {
        self.server.delete(path).authorization_bearer(&user.token).await
    }

    /// Create a workspace owned by `owner` and return its JSON
    pub async fn workspace(&self, owner: &TestUser, module: &str, name: &str) -> Value {
        let response = self
            .post(owner, "/api/workspaces", json!({ "module": module, "name": name }))
            .await;
        assert_status!(response, StatusCode::CREATED);
        response.json()
    }

    pub async fn board(&self, owner: &TestUser, workspace_id: &str, name: &str) -> Value {
        let response = self
            .post(
                owner,
                &format!("/api/workspaces/{}/boards", workspace_id),
                json!({ "name": name }),
            )
            .await;
        assert_status!(response, StatusCode::CREATED);
        response.json()
    }

    pub async fn group(&self, owner: &TestUser, board_id: &str, name: &str) -> Value {
        let response = self
            .post(owner, &format!("/api/boards/{}/groups", board_id), json!({ "name": name }))
            .await;
        assert_status!(response, StatusCode::CREATED);
        response.json()
    }

    pub async fn add_member(&self, admin: &TestUser, workspace_id: &str, member: &TestUser) {
        let response = self
            .post(
                admin,
                &format!("/api/workspaces/{}/members", workspace_id),
                json!({ "user_id": member.id }),
            )
            .await;
        assert_status!(response, StatusCode::CREATED);
    }

    /// Workspace → board → group in one call; returns the three ids
    pub async fn tree(&self, owner: &TestUser, module: &str) -> (String, String, String) {
        let ws = self.workspace(owner, module, "Team").await;
        let ws_id = id_of(&ws);
        let board = self.board(owner, &ws_id, "Main").await;
        let board_id = id_of(&board);
        let group = self.group(owner, &board_id, "Inbox").await;
        (ws_id, board_id, id_of(&group))
    }
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("document id").to_string()
}

pub fn ids(values: &Value, field: &str) -> Vec<String> {
    values[field]
        .as_array()
        .map(|ids| ids.iter().filter_map(|id| id.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}
