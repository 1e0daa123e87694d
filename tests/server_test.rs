//! Tests for the REST surface, driven through the router without a listener.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use strictly_gomoku::{
    AppState, Identity, MatchCoordinator, MemoryStore, SessionRegistry, TokenDirectory, router,
};

fn app() -> Router {
    let directory = TokenDirectory::from_entries([
        ("tok-alice".to_string(), Identity::new(1, "alice".to_string())),
        ("tok-bob".to_string(), Identity::new(2, "bob".to_string())),
    ]);
    let coordinator = MatchCoordinator::new(
        Arc::new(MemoryStore::new()),
        Arc::new(directory),
        SessionRegistry::new(),
    );
    router(AppState::new(Arc::new(coordinator)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_root_banner() {
    let (status, body) = send(&app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_create_requires_token() {
    let app = app();
    let (status, _) = send(&app, post("/api/rooms", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, post("/api/rooms", Some("forged"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_room_lifecycle_over_http() {
    let app = app();

    let (status, created) = send(&app, post("/api/rooms", Some("tok-alice"), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], json!("waiting"));
    assert_eq!(created["player1_id"], json!(1));
    assert_eq!(created["player2_id"], Value::Null);
    assert_eq!(created["board"].as_array().unwrap().len(), 15);
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        post(&format!("/api/rooms/{}/join", id), Some("tok-alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, joined) = send(
        &app,
        post(&format!("/api/rooms/{}/join", id), Some("tok-bob"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["status"], json!("playing"));
    assert_eq!(joined["current_turn_id"], json!(1));

    let (status, _) = send(
        &app,
        post(
            &format!("/api/rooms/{}/move", id),
            Some("tok-bob"),
            Some(json!({ "x": 7, "y": 7 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Out-of-turn move");

    let (status, moved) = send(
        &app,
        post(
            &format!("/api/rooms/{}/move", id),
            Some("tok-alice"),
            Some(json!({ "x": 3, "y": 5 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["board"][5][3], json!(1));
    assert_eq!(moved["current_turn_id"], json!(2));

    let (status, detail) = send(&app, get(&format!("/api/rooms/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    let moves = detail["moves"].as_array().unwrap();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0]["seq"], json!(1));
    assert_eq!((moves[0]["x"].clone(), moves[0]["y"].clone()), (json!(3), json!(5)));
}

#[tokio::test]
async fn test_unknown_room_is_404() {
    let app = app();
    let (status, _) = send(&app, get("/api/rooms/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, post("/api/rooms/42/join", Some("tok-bob"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_rooms_paginates() {
    let app = app();
    for _ in 0..3 {
        send(&app, post("/api/rooms", Some("tok-alice"), None)).await;
    }

    let (status, all) = send(&app, get("/api/rooms")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, page) = send(&app, get("/api/rooms?skip=1&limit=1")).await;
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["id"], json!(2));
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/rooms")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_simple_request_carries_cors_header() {
    let request = Request::builder()
        .uri("/api/rooms")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_move_response_reflects_committed_move() {
    let app = app();
    let (_, created) = send(&app, post("/api/rooms", Some("tok-alice"), None)).await;
    let id = created["id"].as_i64().unwrap();
    send(&app, post(&format!("/api/rooms/{}/join", id), Some("tok-bob"), None)).await;

    let (status, moved) = send(
        &app,
        post(
            &format!("/api/rooms/{}/move", id),
            Some("tok-alice"),
            Some(json!({ "x": 0, "y": 0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["board"][0][0], json!(1));
    assert_eq!(moved["current_turn_id"], json!(2));
    assert_eq!(moved["status"], json!("playing"));
}
