//! Direct messages between members and administrators.

mod common;

use axum::http::{Method, StatusCode};
use common::{authed, TestApp};
use domains::Role;
use serde_json::json;

#[tokio::test]
async fn posters_write_to_admins_and_the_inbox_tracks_reads() {
    let app = TestApp::new();
    let poster = app.profile(Role::Poster, "合唱団").await;
    let admin = app.profile(Role::Admin, "窓口").await;

    let (_, recipients) = app
        .json(authed(Method::GET, "/api/dashboard/messages/recipients", poster, None))
        .await;
    let recipients = recipients.as_array().unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0]["name"], "窓口");

    let (status, body) = app
        .json(authed(
            Method::POST,
            "/api/dashboard/messages",
            poster,
            Some(json!({ "receiver_ids": [admin, admin], "content": "会場について相談です" })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sent"], 1);

    let (_, inbox) = app.json(authed(Method::GET, "/api/dashboard/messages", admin, None)).await;
    assert_eq!(inbox["unread"], 1);
    assert!(inbox["remaining"].is_null());
    let message = &inbox["messages"][0];
    assert_eq!(message["sender_name"], "合唱団");
    let id = message["id"].as_str().unwrap().to_string();

    let response = app
        .send(authed(Method::POST, &format!("/api/dashboard/messages/{id}/read"), admin, None))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let (_, inbox) = app.json(authed(Method::GET, "/api/dashboard/messages", admin, None)).await;
    assert_eq!(inbox["unread"], 0);

    // Only the receiver can delete.
    let response = app
        .send(authed(Method::DELETE, &format!("/api/dashboard/messages/{id}"), poster, None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app
        .send(authed(Method::DELETE, &format!("/api/dashboard/messages/{id}"), admin, None))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn posters_cannot_message_each_other() {
    let app = TestApp::new();
    let poster = app.profile(Role::Poster, "囲碁クラブ").await;
    let other = app.profile(Role::Poster, "将棋クラブ").await;

    let (status, _) = app
        .json(authed(
            Method::POST,
            "/api/dashboard/messages",
            poster,
            Some(json!({ "receiver_ids": [other], "content": "こんにちは" })),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cooldown_applies_between_poster_messages() {
    let app = TestApp::new();
    let poster = app.profile(Role::Poster, "ランニング部").await;
    let admin = app.profile(Role::SuperAdmin, "代表者").await;
    let send = || {
        authed(
            Method::POST,
            "/api/dashboard/messages",
            poster,
            Some(json!({ "receiver_ids": [admin], "content": "質問があります" })),
        )
    };

    let (status, _) = app.json(send()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.json(send()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "QUOTA_EXCEEDED");

    let (_, inbox) = app.json(authed(Method::GET, "/api/dashboard/messages", poster, None)).await;
    assert_eq!(inbox["remaining"], 9);
}
