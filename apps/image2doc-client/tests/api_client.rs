use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

use image2doc_client::{
    ApiClient, ClientConfig, ClientError, DocumentStore, DocumentsApi, IntakeFlow,
};

#[derive(Clone)]
struct FakeServer {
    base_url: String,
}

async fn ocr(State(server): State<FakeServer>, body: Bytes) -> (StatusCode, Json<Value>) {
    let body = String::from_utf8_lossy(&body);
    if !body.contains("name=\"file\"") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No file uploaded" })),
        );
    }

    let document_id = body.contains("name=\"userId\"").then_some("d1");
    (
        StatusCode::OK,
        Json(json!({
            "text": "HELLO\nworld",
            "docxUrl": format!("{}/files/1.docx", server.base_url),
            "docPath": "/files/1.docx",
            "documentId": document_id,
        })),
    )
}

async fn list(Query(query): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    match query.get("userId").map(String::as_str) {
        Some("u1") => (
            StatusCode::OK,
            Json(json!([
                { "_id": "d2", "name": "Lease", "url": "http://x/files/2.docx", "uploadedAt": "2024-05-02T10:00:00.000Z", "text": "" },
                { "id": "d1", "name": "document 2024-05-01", "url": "http://x/files/1.docx", "uploadedAt": "2024-05-01T10:00:00.000Z", "text": "" }
            ])),
        ),
        Some(_) => (StatusCode::OK, Json(json!([]))),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "userId is required" })),
        ),
    }
}

async fn rename(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("Document not found: {}", id) })),
    )
}

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let app = Router::new()
        .route("/ocr", post(ocr))
        .route("/documents", get(list))
        .route("/documents/:id", patch(rename))
        .route("/files/1.docx", get(|| async { b"PK\x03\x04docx-body".to_vec() }))
        .route("/files/broken.docx", get(|| async { "<html>not found</html>" }))
        .with_state(FakeServer {
            base_url: base_url.clone(),
        });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    base_url
}

fn write_png(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("page.png");
    RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]))
        .save_with_format(&path, ImageFormat::Png)
        .unwrap();
    path
}

#[tokio::test]
async fn intake_flow_records_server_document() {
    let base_url = start_server().await;
    let api = ApiClient::new(ClientConfig::new(&base_url)).unwrap();
    let store = DocumentStore::new(Arc::new(api.clone()), Some("u1".to_string()));
    let dir = TempDir::new().unwrap();

    let outcome = IntakeFlow::new(&api, &store)
        .run(&write_png(&dir), None)
        .await
        .unwrap();

    assert_eq!(outcome.response.text, "HELLO\nworld");
    assert_eq!(outcome.item.id, "d1");
    assert_eq!(outcome.item.url, format!("{}/files/1.docx", base_url));
    assert_eq!(store.documents().await, vec![outcome.item]);
}

#[tokio::test]
async fn intake_without_user_uses_timestamp_id() {
    let base_url = start_server().await;
    let api = ApiClient::new(ClientConfig::new(&base_url)).unwrap();
    let store = DocumentStore::new(Arc::new(api.clone()), None);
    let dir = TempDir::new().unwrap();

    let outcome = IntakeFlow::new(&api, &store)
        .run(&write_png(&dir), Some("Receipt"))
        .await
        .unwrap();

    assert!(outcome.item.id.parse::<i64>().is_ok());
    assert_eq!(outcome.item.name, "Receipt");
}

#[tokio::test]
async fn download_checks_zip_signature() {
    let base_url = start_server().await;
    let api = ApiClient::new(ClientConfig::new(&base_url)).unwrap();
    let dir = TempDir::new().unwrap();

    let out = dir.path().join("doc.docx");
    let written = api.download("/files/1.docx", &out).await.unwrap();
    assert_eq!(written, 13);
    assert!(std::fs::read(&out).unwrap().starts_with(b"PK\x03\x04"));

    let bad = dir.path().join("bad.docx");
    let err = api.download("/files/broken.docx", &bad).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidDocument(_)));
    assert!(!bad.exists());

    let err = api.download("/files/missing.docx", &bad).await.unwrap_err();
    assert!(matches!(err, ClientError::Server { status: 404, .. }));
}

#[tokio::test]
async fn list_and_failed_rename() {
    let base_url = start_server().await;
    let api = ApiClient::new(ClientConfig::new(&base_url)).unwrap();

    assert!(api.list_documents("someone-else").await.unwrap().is_empty());

    let store = DocumentStore::new(Arc::new(api), Some("u1".to_string()));
    assert_eq!(store.refresh().await.unwrap(), 2);
    let before = store.documents().await;
    assert_eq!(before[0].id, "d2");

    let err = store.rename("d1", "Renamed").await.unwrap_err();
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Document not found: d1");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(store.documents().await, before);
}
