mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use common::*;

#[tokio::test]
async fn test_session_is_issued_and_kept() {
    let (app, state) = build_default_app().await;

    let cookie = open_session(&app).await;
    assert!(cookie.starts_with("chapterlog_session="));

    let response = get(&app, "/api/session", &cookie).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.cookie.as_deref(), Some(cookie.as_str()));
    assert_eq!(response.body["item_count"], 0);
    assert_eq!(
        response.body["owner_id"],
        cookie.trim_start_matches("chapterlog_session=")
    );
    assert_eq!(state.sessions.read().await.session_count(), 1);
}

#[tokio::test]
async fn test_config_endpoint() {
    let (app, _) = build_default_app().await;
    let cookie = open_session(&app).await;

    let response = get(&app, "/api/config", &cookie).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["min_query_length"], 3);
    assert_eq!(response.body["search_limit"], 10);
}

#[tokio::test]
async fn test_short_query_is_rejected_with_empty_results() {
    let (app, _) = build_default_app().await;
    let cookie = open_session(&app).await;

    let response = get(&app, "/api/search?q=%20ab%20", &cookie).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["candidates"], json!([]));
    assert!(response.body["message"].as_str().unwrap().contains('3'));
}

#[tokio::test]
async fn test_catalog_failure_answers_empty_list() {
    let (app, _) = build_test_app(Arc::new(DownCatalog)).await;
    let cookie = open_session(&app).await;

    let response = get(&app, "/api/search?q=solo", &cookie).await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["candidates"], json!([]));
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn test_track_then_read_to_completion() {
    let (app, _) = build_default_app().await;
    let cookie = open_session(&app).await;

    let response = get(&app, "/api/search?q=solo", &cookie).await;
    assert_eq!(response.status, StatusCode::OK);
    let candidates = response.body["candidates"].as_array().unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0]["externalId"], "1");
    assert_eq!(candidates[0]["alreadyTracked"], false);

    let response = post(&app, "/api/search/0/track", &cookie, None).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["tracked"], true);
    let id = response.body["item"]["id"].as_str().unwrap().to_string();
    assert_eq!(response.body["item"]["status"], "plan_to_read");
    assert_eq!(response.body["item"]["totalChapters"], 10);
    assert_eq!(response.body["item"]["mediaType"], "Manhwa");

    let response = get(&app, "/api/items", &cookie).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(response.body["counts"]["plan_to_read"], 1);

    let response = post(
        &app,
        &format!("/api/items/{id}/advance"),
        &cookie,
        Some(&json!({ "delta": 1 })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "reading");
    assert_eq!(response.body["currentChapter"], 1);

    let response = post(
        &app,
        &format!("/api/items/{id}/advance"),
        &cookie,
        Some(&json!({ "delta": 9 })),
    )
    .await;
    assert_eq!(response.body["status"], "completed");
    assert_eq!(response.body["currentChapter"], 10);

    let response = get(&app, "/api/items?status=completed", &cookie).await;
    assert_eq!(response.body["items"][0]["id"], id.as_str());
    assert_eq!(response.body["counts"]["completed"], 1);
    assert_eq!(response.body["counts"]["all"], 1);
}

#[tokio::test]
async fn test_candidate_is_tracked_once_per_search() {
    let (app, _) = build_default_app().await;
    let cookie = open_session(&app).await;

    get(&app, "/api/search?q=solo", &cookie).await;
    assert_eq!(post(&app, "/api/search/0/track", &cookie, None).await.status, StatusCode::CREATED);

    let again = post(&app, "/api/search/0/track", &cookie, None).await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body, json!({ "tracked": false }));

    // A new search still knows the title is on the list
    let response = get(&app, "/api/search?q=solo", &cookie).await;
    assert_eq!(response.body["candidates"][0]["alreadyTracked"], true);
    let retry = post(&app, "/api/search/0/track", &cookie, None).await;
    assert_eq!(retry.body["tracked"], false);

    let items = get(&app, "/api/items", &cookie).await;
    assert_eq!(items.body["items"].as_array().unwrap().len(), 1);

    let results = get(&app, "/api/search/results", &cookie).await;
    assert_eq!(results.body["candidates"][0]["alreadyTracked"], true);
}

#[tokio::test]
async fn test_track_without_results_or_out_of_range() {
    let (app, _) = build_default_app().await;
    let cookie = open_session(&app).await;

    let response = post(&app, "/api/search/0/track", &cookie, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    get(&app, "/api/search?q=solo", &cookie).await;
    let response = post(&app, "/api/search/7/track", &cookie, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_and_delete() {
    let (app, _) = build_default_app().await;
    let cookie = open_session(&app).await;

    get(&app, "/api/search?q=tower", &cookie).await;
    let tracked = post(&app, "/api/search/1/track", &cookie, None).await;
    let id = tracked.body["item"]["id"].as_str().unwrap().to_string();
    assert_eq!(tracked.body["item"]["totalChapters"], 0);

    let form = json!({
        "status": "plan_to_read",
        "currentChapter": "5",
        "totalChapters": 0,
        "rating": 12,
        "notes": "weekly"
    });
    let response = send(
        &app,
        request(Method::PUT, &format!("/api/items/{id}"), Some(&cookie), Some(&form)),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "reading");
    assert_eq!(response.body["currentChapter"], 5);
    assert_eq!(response.body["rating"], 10);
    assert_eq!(response.body["notes"], "weekly");
    assert_eq!(response.body["title"], "Tower of God");

    let fetched = get(&app, &format!("/api/items/{id}"), &cookie).await;
    assert_eq!(fetched.body, response.body);

    let deleted = send(
        &app,
        request(Method::DELETE, &format!("/api/items/{id}"), Some(&cookie), None),
    )
    .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let items = get(&app, "/api/items", &cookie).await;
    assert_eq!(items.body["items"], json!([]));

    let again = send(
        &app,
        request(Method::DELETE, &format!("/api/items/{id}"), Some(&cookie), None),
    )
    .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_item_is_not_found() {
    let (app, _) = build_default_app().await;
    let cookie = open_session(&app).await;

    let delta = json!({ "delta": 1 });
    let response = post(&app, "/api/items/missing/advance", &cookie, Some(&delta)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/api/items/missing", &cookie).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sessions_do_not_share_lists() {
    let (app, _) = build_default_app().await;
    let alice = open_session(&app).await;
    let bob = open_session(&app).await;
    assert_ne!(alice, bob);

    get(&app, "/api/search?q=solo", &alice).await;
    post(&app, "/api/search/0/track", &alice, None).await;

    assert_eq!(get(&app, "/api/items", &alice).await.body["counts"]["all"], 1);
    assert_eq!(get(&app, "/api/items", &bob).await.body["counts"]["all"], 0);

    // Bob's search results are his own
    let response = get(&app, "/api/search?q=solo", &bob).await;
    assert_eq!(response.body["candidates"][0]["alreadyTracked"], false);
}

#[tokio::test]
async fn test_list_query_options() {
    let (app, _) = build_default_app().await;
    let cookie = open_session(&app).await;

    get(&app, "/api/search?q=any%20title", &cookie).await;
    post(&app, "/api/search/0/track", &cookie, None).await;
    post(&app, "/api/search/1/track", &cookie, None).await;

    let response = get(&app, "/api/items?sort=title&direction=asc", &cookie).await;
    let titles: Vec<&str> = response.body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Solo Leveling", "Tower of God"]);

    let response = get(&app, "/api/items?q=TOWER", &cookie).await;
    assert_eq!(response.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(response.body["counts"]["all"], 2);

    let response = get(&app, "/api/items?status=paused", &cookie).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (app, state) = build_default_app().await;
    let cookie = open_session(&app).await;
    assert_eq!(state.sessions.read().await.session_count(), 1);

    let response = post(&app, "/api/session/logout", &cookie, None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(state.sessions.read().await.session_count(), 0);
}

#[tokio::test]
async fn test_events_stream_starts_with_snapshot() {
    let (app, _) = build_default_app().await;
    let cookie = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/items/events", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let mut body = response.into_body();
    let frame = body.frame().await.unwrap().unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.starts_with("event: snapshot\n"));
    assert!(text.contains(r#""counts":{"all":0"#));
}
