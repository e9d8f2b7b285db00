//! Anonymous browsing and visitor submissions.

mod common;

use axum::http::{Method, StatusCode};
use common::{authed, day, get, post_json, TestApp};
use domains::{Category, Event, EventRepository, Role};
use serde_json::{json, Value};

async fn retag(app: &TestApp, event: Event, tags: &[&str]) {
    let tags = tags.iter().map(|t| t.to_string()).collect();
    EventRepository::update(app.store.as_ref(), Event { tags, ..event })
        .await
        .unwrap();
}

fn titles(page: &Value) -> Vec<String> {
    page["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn default_list_shows_the_coming_month_in_date_order() {
    let app = TestApp::new();
    let poster = app.profile(Role::Poster, "浜名湖ヨット").await;
    app.event(poster, "来週", day(6, 8), None).await;
    app.event(poster, "明日", day(6, 2), None).await;
    app.event(poster, "昨日", day(5, 31), None).await;
    app.event(poster, "再来月", day(8, 1), None).await;

    let (status, page) = app.json(get("/api/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&page), ["明日", "来週"]);
    assert_eq!(page["total"], 2);
    assert_eq!(page["page"], 1);
    assert_eq!(page["total_pages"], 1);
    assert_eq!(page["events"][0]["poster"]["name"], "浜名湖ヨット");
}

#[tokio::test]
async fn category_filter_lifts_the_one_month_cap() {
    let app = TestApp::new();
    let poster = app.profile(Role::Poster, "ジャズ同好会").await;
    app.event(poster, "夏のライブ", day(6, 21), Some(Category::MusicLive)).await;
    app.event(poster, "秋のライブ", day(9, 20), Some(Category::MusicLive)).await;
    app.event(poster, "夏祭り", day(6, 14), Some(Category::Festival)).await;

    let uri = format!("/api/events?category={}", urlencoding::encode(Category::MusicLive.label()));
    let (status, page) = app.json(get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&page), ["夏のライブ", "秋のライブ"]);

    let (_, newest) = app.json(get(&format!("{uri}&sort=newest"))).await;
    assert_eq!(titles(&newest), ["秋のライブ", "夏のライブ"]);
}

#[tokio::test]
async fn unknown_filter_labels_are_rejected() {
    let app = TestApp::new();
    let (status, body) = app.json(get("/api/events?sort=popular")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn kept_ids_narrow_the_page() {
    let app = TestApp::new();
    let poster = app.profile(Role::Poster, "公民館").await;
    let kept = app.event(poster, "囲碁教室", day(6, 3), None).await;
    app.event(poster, "将棋教室", day(6, 4), None).await;

    let (_, page) = app.json(get(&format!("/api/events?kept={},999", kept.id))).await;
    assert_eq!(titles(&page), ["囲碁教室"]);
}

#[tokio::test]
async fn views_are_counted_and_shown_on_detail() {
    let app = TestApp::new();
    let poster = app.profile(Role::Poster, "商店街").await;
    let event = app.event(poster, "夜店", day(6, 6), None).await;

    for _ in 0..2 {
        let response = app
            .send(post_json(&format!("/api/events/{}/view", event.id), json!({})))
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let (status, detail) = app.json(get(&format!("/api/events/{}", event.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["view_count"], 2);
    assert!(detail["image_url"].is_null());

    let response = app.send(post_json("/api/events/4040/view", json!({}))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reports_reach_the_moderation_queue() {
    let app = TestApp::new();
    let poster = app.profile(Role::Poster, "フリマ").await;
    let admin = app.profile(Role::Admin, "見回り").await;
    let event = app.event(poster, "フリーマーケット", day(6, 7), None).await;

    let (status, _) = app
        .json(post_json(&format!("/api/events/{}/reports", event.id), json!({ "reason": "  " })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, report) = app
        .json(post_json(&format!("/api/events/{}/reports", event.id), json!({ "reason": "連絡先が違う" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, reports) = app.json(authed(Method::GET, "/api/dashboard/reports", admin, None)).await;
    assert_eq!(reports.as_array().unwrap().len(), 1);
    assert_eq!(reports[0]["reason"], "連絡先が違う");

    let response = app
        .send(authed(Method::DELETE, &format!("/api/dashboard/reports/{}", report["id"]), admin, None))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (_, reports) = app.json(authed(Method::GET, "/api/dashboard/reports", admin, None)).await;
    assert!(reports.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn meta_lists_the_fixed_vocabularies() {
    let app = TestApp::new();
    let (status, meta) = app.json(get("/api/meta")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(meta["categories"].as_array().unwrap().len(), Category::ALL.len());
    assert_eq!(meta["rain_ok_tag"], "雨でもOK");
    assert_eq!(meta["max_tags"], 4);
}

#[tokio::test]
async fn keyword_and_rain_ok_narrow_the_list_together() {
    let app = TestApp::new();
    let poster = app.profile(Role::Poster, "佐鳴湖音楽祭").await;
    let night = app.event(poster, "Summer Jazz Night", day(6, 20), None).await;
    retag(&app, night, &["雨でもOK"]).await;
    app.event(poster, "jazz 野外ステージ", day(6, 21), None).await;
    let fireworks = app.event(poster, "花火大会", day(6, 22), None).await;
    retag(&app, fireworks, &["雨でもOK", "ジャズ"]).await;

    let (status, page) = app.json(get("/api/events?keyword=JAZZ&rain_ok=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&page), ["Summer Jazz Night"]);

    let (_, page) = app.json(get("/api/events?keyword=jazz")).await;
    assert_eq!(titles(&page), ["Summer Jazz Night", "jazz 野外ステージ"]);

    let by_tag = format!("/api/events?keyword={}&rain_ok=1", urlencoding::encode("ジャズ"));
    let (_, page) = app.json(get(&by_tag)).await;
    assert_eq!(titles(&page), ["花火大会"]);

    let partial_tag = format!("/api/events?keyword={}", urlencoding::encode("ジャ"));
    let (_, page) = app.json(get(&partial_tag)).await;
    assert_eq!(page["total"], 0);
}
