//! HTTP API over a real socket.

mod common;

use std::sync::Arc;

use common::harness;
use serde_json::{json, Value};

async fn spawn_server() -> String {
    let h = harness();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let pipeline = Arc::new(h.pipeline);
    tokio::spawn(async move {
        legal_lens::server::serve(listener, pipeline).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn health_reports_version() {
    let base = spawn_server().await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn ingest_ask_and_clear_conversation() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let report: Value = client
        .post(format!("{}/documents", base))
        .json(&json!({
            "text": "The buyer shall pay a penalty of $5,000 for late delivery of goods.",
            "id": "sale"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["doc_id"], "sale");
    assert_eq!(report["source_format"], "raw");
    assert_eq!(report["indexed"], true);

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({ "question": "What is the late delivery penalty?" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert!(body["answer"].as_str().unwrap().contains("$5,000"));
    assert_eq!(body["history"].as_array().unwrap().len(), 1);

    let conversation: Value = client
        .get(format!("{}/conversation", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(conversation["document"]["doc_id"], "sale");
    assert_eq!(
        conversation["history"][0]["question"],
        "What is the late delivery penalty?"
    );

    let resp = client
        .delete(format!("{}/conversation", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);

    let conversation: Value = client
        .get(format!("{}/conversation", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(conversation["document"].is_null());
    assert!(conversation["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn errors_use_the_error_envelope() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({ "question": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .post(format!("{}/documents", base))
        .json(&json!({ "text": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "no_text");

    let resp = client
        .post(format!("{}/documents", base))
        .json(&json!({ "path": "/tmp/presentation.pptx" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let resp = client
        .post(format!("{}/documents", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
}
