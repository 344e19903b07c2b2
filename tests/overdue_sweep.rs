//! Overdue sweep integration tests

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use common::{id_of, TestApp};
use workhub::backend::sweep::run_overdue_sweep;

async fn overdue_titles(app: &TestApp, user: &common::TestUser) -> usize {
    let inbox: Value = app.get(user, "/api/notifications").await.json();
    inbox["notifications"]
        .as_array()
        .map(|all| {
            all.iter()
                .filter(|n| n["title"].as_str().is_some_and(|t| t.starts_with("Overdue")))
                .count()
        })
        .unwrap_or(0)
}

#[tokio::test]
async fn test_sweep_notifies_once_per_interval() {
    let app = TestApp::new().await;
    let admin = app.user("admin").await;
    let dev = app.user("dev").await;
    let (ws_id, _, group_id) = app.tree(&admin, "dev").await;
    app.add_member(&admin, &ws_id, &dev).await;

    let yesterday = Utc::now() - Duration::days(1);
    let response = app
        .post(
            &admin,
            &format!("/api/groups/{}/items/bugs", group_id),
            json!({ "name": "Late fix", "assignee": dev.id, "due_date": yesterday }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);

    let now = Utc::now();
    assert_eq!(assert_ok!(run_overdue_sweep(&app.state, now).await), 1);
    assert_eq!(assert_ok!(run_overdue_sweep(&app.state, now + Duration::hours(1)).await), 0);
    assert_eq!(overdue_titles(&app, &dev).await, 1);

    let next_interval = now + Duration::days(1) + Duration::minutes(1);
    assert_eq!(assert_ok!(run_overdue_sweep(&app.state, next_interval).await), 1);
    assert_eq!(overdue_titles(&app, &dev).await, 2);
}

#[tokio::test]
async fn test_sweep_skips_closed_unassigned_and_future_items() {
    let app = TestApp::new().await;
    let admin = app.user("admin").await;
    let agent = app.user("agent").await;
    let (ws_id, _, group_id) = app.tree(&admin, "service").await;
    app.add_member(&admin, &ws_id, &agent).await;
    let path = format!("/api/groups/{}/items/tickets", group_id);
    let past = Utc::now() - Duration::days(3);

    app.post(&admin, &path, json!({ "name": "Nobody", "due_date": past })).await;
    app.post(
        &admin,
        &path,
        json!({ "name": "Closed", "assignee": agent.id, "due_date": past, "status": "resolved" }),
    )
    .await;
    app.post(
        &admin,
        &path,
        json!({ "name": "Later", "assignee": agent.id, "due_date": Utc::now() + Duration::days(3) }),
    )
    .await;

    assert_eq!(assert_ok!(run_overdue_sweep(&app.state, Utc::now()).await), 0);
}

#[tokio::test]
async fn test_new_due_date_rearms_the_reminder() {
    let app = TestApp::new().await;
    let admin = app.user("admin").await;
    let (_, _, group_id) = app.tree(&admin, "workmanagement").await;

    let task: Value = app
        .post(
            &admin,
            &format!("/api/groups/{}/items/items", group_id),
            json!({ "name": "Report", "assignee": admin.id, "due_date": Utc::now() - Duration::days(2) }),
        )
        .await
        .json();

    let now = Utc::now();
    assert_eq!(assert_ok!(run_overdue_sweep(&app.state, now).await), 1);

    let response = app
        .patch(
            &admin,
            &format!("/api/items/items/{}", id_of(&task)),
            json!({ "due_date": now - Duration::hours(1) }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.json::<Value>()["overdue_notified_at"], Value::Null);

    assert_eq!(assert_ok!(run_overdue_sweep(&app.state, now).await), 1);
}
