use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use sceneit_core::{FailureKind, Resource};
use sceneit_infra::{default_http_client, Fetcher, HttpFetcher};
use serde_json::{json, Value};

async fn start_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route(
            "/api/movies/1",
            get(|| async { Json(json!({"movie_id": 1, "title": "Heat"})) }),
        )
        .route(
            "/api/boom",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "Database error"})),
                )
            }),
        )
        .route("/api/garbled", get(|| async { "{not json" }))
        .route("/api/empty", post(|| async { StatusCode::NO_CONTENT }))
        .route(
            "/api/likes/",
            post(|Json(body): Json<Value>| async move { Json(json!({"echo": body})) }),
        )
        .route(
            "/api/unlike_movie",
            delete(|Query(q): Query<HashMap<String, String>>| async move { Json(json!(q)) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

fn fetcher(addr: SocketAddr) -> HttpFetcher {
    HttpFetcher::new(default_http_client().unwrap(), &format!("http://{addr}/api")).unwrap()
}

#[tokio::test]
async fn get_decodes_json_body() {
    let (addr, handle) = start_server().await;
    let value = fetcher(addr).fetch(&Resource::get("/movies/1")).await.unwrap();
    assert_eq!(value["title"], "Heat");
    handle.abort();
}

#[tokio::test]
async fn non_success_status_is_network_failure_with_detail() {
    let (addr, handle) = start_server().await;
    let err = fetcher(addr).fetch(&Resource::get("/boom")).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Network);
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("Database error"), "{err}");
    handle.abort();
}

#[tokio::test]
async fn missing_route_is_not_found() {
    let (addr, handle) = start_server().await;
    let err = fetcher(addr).fetch(&Resource::get("/nope")).await.unwrap_err();
    assert!(err.is_not_found());
    handle.abort();
}

#[tokio::test]
async fn malformed_json_is_decode_failure() {
    let (addr, handle) = start_server().await;
    let err = fetcher(addr).fetch(&Resource::get("/garbled")).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Decode);
    handle.abort();
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let (addr, handle) = start_server().await;
    let value = fetcher(addr).fetch(&Resource::post("/empty")).await.unwrap();
    assert_eq!(value, Value::Null);
    handle.abort();
}

#[tokio::test]
async fn post_sends_json_body_and_delete_sends_query() {
    let (addr, handle) = start_server().await;
    let f = fetcher(addr);

    let posted = f
        .fetch(&Resource::post("/likes/").json(json!({"review_id": 5, "user_id": 7})))
        .await
        .unwrap();
    assert_eq!(posted["echo"]["review_id"], 5);

    let deleted = f
        .fetch(
            &Resource::delete("/unlike_movie")
                .query("user_id", 7)
                .query("movie_id", 42),
        )
        .await
        .unwrap();
    assert_eq!(deleted["movie_id"], "42");
    assert_eq!(deleted["user_id"], "7");
    handle.abort();
}

#[tokio::test]
async fn unreachable_backend_is_network_failure_without_status() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetcher(addr).fetch(&Resource::get("/movies/1")).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Network);
    assert_eq!(err.status(), None);
}
