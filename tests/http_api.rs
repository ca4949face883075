//! HTTP surface tests for the export/import endpoints, run against the real
//! lopdf-backed store over temporary directories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use lopdf::{Object, Stream, dictionary};
use marginalia::handler::{AppState, router};
use marginalia::pdf::PdfStore;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app(root: &Path) -> Router {
    let state = AppState {
        store: Arc::new(PdfStore::new()),
        root: root.to_path_buf(),
    };
    router().with_state(state)
}

fn write_pdf(path: &PathBuf, text: &str) {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content = format!("BT 72 720 Td ({text}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

async fn post(app: Router, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn export_of_empty_tree_is_an_empty_array() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = post(app(dir.path()), "/export", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"[]");
}

#[tokio::test]
async fn export_rejects_non_post_methods() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(Request::builder().uri("/export").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn export_fails_with_500_when_root_is_gone() {
    let dir = tempfile::tempdir().unwrap();
    let gone = dir.path().join("missing");
    let (status, _) = post(app(&gone), "/export", Body::empty()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn import_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = post(app(dir.path()), "/import", Body::from("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8_lossy(&body).contains("invalid json"));
}

#[tokio::test]
async fn import_of_empty_payload_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_pdf(&dir.path().join("doc.pdf"), "hello");

    let (status, body) = post(app(dir.path()), "/import", Body::from("[]")).await;
    assert_eq!(status, StatusCode::OK);
    let summary: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(summary["files"], json!([]));
    assert_eq!(summary["totalImported"], json!(0));
}

#[tokio::test]
async fn export_then_import_round_trips_annotations_by_hash() {
    let dir = tempfile::tempdir().unwrap();
    write_pdf(&dir.path().join("doc.pdf"), "hello");
    write_pdf(&dir.path().join("unrelated.pdf"), "something else");

    // Learn the document's identity from an export.
    let (status, body) = post(app(dir.path()), "/export", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let exported: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(exported.as_array().unwrap().len(), 2);
    let hash = exported[0]["hash"].as_str().unwrap().to_string();

    // A payload from "another machine": different path, same hash.
    let payload = json!([{
        "path": "/elsewhere/copy.pdf",
        "hash": hash,
        "annots": { "1": [{"text": "h1"}, {"text": "h2"}] },
    }]);
    let (status, body) = post(
        app(dir.path()),
        "/import",
        Body::from(payload.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let summary: Value = serde_json::from_slice(&body).unwrap();

    // Only the matching document is reported; the unrelated one is omitted.
    let files = summary["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0]["file"].as_str().unwrap().ends_with("doc.pdf"));
    assert_eq!(files[0]["imported"], json!(2));
    assert_eq!(files[0]["saved"], json!(true));
    assert!(files[0].get("error").is_none());
    assert_eq!(summary["totalImported"], json!(2));

    // Same payload again: the store dedups, so nothing new is applied.
    let (_, body) = post(
        app(dir.path()),
        "/import",
        Body::from(payload.to_string()),
    )
    .await;
    let summary: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(summary["files"][0]["imported"], json!(0));
    assert_eq!(summary["files"][0]["saved"], json!(false));
    assert_eq!(summary["totalImported"], json!(0));

    // The annotations survived on disk and identity did not drift.
    let (_, body) = post(app(dir.path()), "/export", Body::empty()).await;
    let exported: Value = serde_json::from_slice(&body).unwrap();
    let doc = exported
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["path"].as_str().unwrap().ends_with("doc.pdf"))
        .unwrap();
    assert_eq!(doc["hash"].as_str().unwrap(), hash);
    assert_eq!(doc["annots"]["1"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_summaries_for_one_hash_merge_transparently() {
    let dir = tempfile::tempdir().unwrap();
    write_pdf(&dir.path().join("doc.pdf"), "hello");

    let (_, body) = post(app(dir.path()), "/export", Body::empty()).await;
    let exported: Value = serde_json::from_slice(&body).unwrap();
    let hash = exported[0]["hash"].as_str().unwrap().to_string();

    // Two copies of the same content exported from different paths.
    let payload = json!([
        { "path": "/a/doc.pdf", "hash": hash, "annots": { "1": ["h1"] } },
        { "path": "/b/doc.pdf", "hash": hash, "annots": { "1": ["h2"] } },
    ]);
    let (_, body) = post(
        app(dir.path()),
        "/import",
        Body::from(payload.to_string()),
    )
    .await;
    let summary: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(summary["files"][0]["imported"], json!(2));
    assert_eq!(summary["totalImported"], json!(2));
}
