// End-to-end tests driving the axum router

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use folio::{
    CatalogStore, CookieCsrf, Envelope, FileTemplates, PageLoader, PartialDetection,
    RenderPipeline, CATALOG_VERSION_HEADER,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn setup() -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "index.html", "+++\ntitle = \"Home\"\n+++\n<h1>Home</h1>");
    write(root, "users/[id]/index.html", "<h1>User {params.id}</h1>");
    write(root, "404/index.html", "<h1>Missing</h1>");
    write(
        root,
        "_layouts/default.html",
        "<!DOCTYPE html><html><head><title>{title}</title></head><body>{slots.content}</body></html>",
    );

    let store = Arc::new(CatalogStore::open(&PageLoader::new(root)).unwrap());
    let pipeline = RenderPipeline::new(store, Arc::new(FileTemplates::new(root)))
        .with_csrf(Arc::new(CookieCsrf::default()));
    (dir, folio_server::app(pipeline, PartialDetection::default()))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_full_page_request() {
    let (_dir, app) = setup();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CATALOG_VERSION_HEADER], "1");
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .starts_with("folio_csrf="));

    let body = body_string(response).await;
    assert!(body.contains("<title>Home</title>"));
    assert!(body.contains("<h1>Home</h1>"));
}

#[tokio::test]
async fn test_partial_request_by_header() {
    let (_dir, app) = setup();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/42")
                .header("x-folio-partial", "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

    let envelope: Envelope = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(envelope.ok);
    assert_eq!(envelope.html, "<h1>User 42</h1>");
}

#[tokio::test]
async fn test_partial_request_by_query() {
    let (_dir, app) = setup();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/7?partial=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let envelope: Envelope = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(envelope.html, "<h1>User 7</h1>");
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let (_dir, app) = setup();
    let response = app
        .oneshot(Request::builder().uri("/nope/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("<h1>Missing</h1>"));
}

#[tokio::test]
async fn test_encoded_traversal_is_404() {
    let (_dir, app) = setup();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/..%2F..%2Fetc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
