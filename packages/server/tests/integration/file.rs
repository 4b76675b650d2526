use std::sync::atomic::Ordering;

use reqwest::Method;
use reqwest::multipart::{Form, Part};

use filebox_server::observability::{API_LATENCY, EventLevel};

use crate::common::{TestApp, routes, test_config};

#[tokio::test]
async fn upload_get_delete_roundtrip() {
    let app = TestApp::spawn().await;

    let res = app.upload("a.txt", b"hello", "text/plain").await;
    assert_eq!(res.status, 201, "upload failed: {}", res.text);
    assert_eq!(res.body["filename"], "a.txt");
    let id = res.id();
    let storage_ref = res.body["storageRef"].as_str().unwrap().to_string();
    assert_eq!(storage_ref, format!("{id}-a.txt"));
    assert!(res.body["createdAt"].is_string());

    let stored = app.storage.object(&storage_ref).expect("blob should exist");
    assert_eq!(stored.data, b"hello");
    assert_eq!(stored.content_type, "text/plain");

    let res = app.get(&routes::file(&id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], id.as_str());
    assert_eq!(res.body["filename"], "a.txt");
    assert_eq!(res.body["storageRef"], storage_ref.as_str());

    let res = app.delete(&routes::file(&id)).await;
    assert_eq!(res.status, 204);
    assert!(res.text.is_empty());

    let res = app.get(&routes::file(&id)).await;
    assert_eq!(res.status, 404);
    assert!(res.text.is_empty());
    assert!(app.storage.object(&storage_ref).is_none());
    assert_eq!(app.persistence.file_count(), 0);
}

#[tokio::test]
async fn upload_guesses_content_type_from_filename() {
    let app = TestApp::spawn().await;

    let form = Form::new().part(
        "file",
        Part::bytes(b"%PDF-1.4".to_vec()).file_name("report.pdf"),
    );
    let res = app.post_form(routes::FILES, form).await;
    assert_eq!(res.status, 201, "upload failed: {}", res.text);

    let key = res.body["storageRef"].as_str().unwrap();
    assert_eq!(app.storage.object(key).unwrap().content_type, "application/pdf");
}

#[tokio::test]
async fn upload_of_unknown_type_is_octet_stream() {
    let app = TestApp::spawn().await;

    let form = Form::new().part("file", Part::bytes(vec![0u8, 1, 2]).file_name("blob"));
    let res = app.post_form(routes::FILES, form).await;
    assert_eq!(res.status, 201, "upload failed: {}", res.text);

    let key = res.body["storageRef"].as_str().unwrap();
    assert_eq!(
        app.storage.object(key).unwrap().content_type,
        "application/octet-stream"
    );
}

#[tokio::test]
async fn upload_ignores_unrelated_fields() {
    let app = TestApp::spawn().await;

    let form = Form::new()
        .text("description", "quarterly numbers")
        .part(
            "file",
            Part::bytes(b"1,2,3".to_vec())
                .file_name("numbers.csv")
                .mime_str("text/csv")
                .unwrap(),
        );
    let res = app.post_form(routes::FILES, form).await;
    assert_eq!(res.status, 201, "upload failed: {}", res.text);
    assert_eq!(res.body["filename"], "numbers.csv");
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let app = TestApp::spawn().await;

    let form = Form::new().text("description", "no file here");
    let res = app.post_form(routes::FILES, form).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert_eq!(app.storage.object_count(), 0);
    assert_eq!(app.persistence.file_count(), 0);
}

#[tokio::test]
async fn upload_without_filename_is_rejected() {
    let app = TestApp::spawn().await;

    let form = Form::new().part("file", Part::bytes(b"hello".to_vec()));
    let res = app.post_form(routes::FILES, form).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert_eq!(app.storage.object_count(), 0);
}

#[tokio::test]
async fn upload_with_two_file_parts_is_rejected() {
    let app = TestApp::spawn().await;

    let form = Form::new()
        .part("file", Part::bytes(b"one".to_vec()).file_name("one.txt"))
        .part("file", Part::bytes(b"two".to_vec()).file_name("two.txt"));
    let res = app.post_form(routes::FILES, form).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert_eq!(app.storage.object_count(), 0);
    assert_eq!(app.persistence.file_count(), 0);
}

#[tokio::test]
async fn non_multipart_upload_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app
        .client
        .post(app.url(routes::FILES))
        .header("Content-Type", "application/json")
        .body(r#"{"file":"hello"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(app.storage.object_count(), 0);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = TestApp::spawn().await;
    let limit = test_config().server.max_upload_size;

    let res = app
        .upload("big.bin", &vec![0u8; limit * 2], "application/octet-stream")
        .await;
    assert_eq!(res.status, 413);
    assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(app.storage.object_count(), 0);
    assert_eq!(app.persistence.file_count(), 0);
}

#[tokio::test]
async fn storage_failure_stores_no_metadata() {
    let app = TestApp::spawn().await;
    app.storage.fail_puts.store(true, Ordering::SeqCst);

    let res = app.upload("a.txt", b"hello", "text/plain").await;
    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "INTERNAL_ERROR");
    assert!(
        !res.text.contains("SlowDown"),
        "backend detail must not leak: {}",
        res.text
    );
    assert_eq!(app.persistence.file_count(), 0);
}

#[tokio::test]
async fn metadata_failure_logs_orphaned_blob() {
    let app = TestApp::spawn().await;
    app.persistence.fail_file_writes.store(true, Ordering::SeqCst);

    let res = app.upload("a.txt", b"hello", "text/plain").await;
    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "INTERNAL_ERROR");
    assert_eq!(app.persistence.file_count(), 0);
    assert_eq!(app.storage.object_count(), 1, "blob is left behind");

    let errors = app.sink.events_at(EventLevel::Error);
    let orphan = errors
        .iter()
        .find(|e| e.operation == "upload_file")
        .expect("orphaned blob should be logged");
    let key = orphan.get("storage_key").expect("event names the blob");
    assert!(app.storage.object(key).is_some());
    assert!(orphan.get("cause").is_some());
}

#[tokio::test]
async fn get_unknown_or_malformed_id_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::file(&uuid::Uuid::new_v4().to_string())).await;
    assert_eq!(res.status, 404);
    assert!(res.text.is_empty());

    let res = app.get(&routes::file("not-a-uuid")).await;
    assert_eq!(res.status, 404);
    assert!(res.text.is_empty());
}

#[tokio::test]
async fn lookup_failure_is_internal_error() {
    let app = TestApp::spawn().await;
    let id = app.upload_hello().await;
    app.persistence.fail_file_reads.store(true, Ordering::SeqCst);

    let res = app.get(&routes::file(&id)).await;
    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn delete_unknown_id_is_not_found_every_time() {
    let app = TestApp::spawn().await;
    let path = routes::file(&uuid::Uuid::new_v4().to_string());

    assert_eq!(app.delete(&path).await.status, 404);
    assert_eq!(app.delete(&path).await.status, 404);
}

#[tokio::test]
async fn second_delete_is_not_found() {
    let app = TestApp::spawn().await;
    let id = app.upload_hello().await;

    assert_eq!(app.delete(&routes::file(&id)).await.status, 204);
    assert_eq!(app.delete(&routes::file(&id)).await.status, 404);
}

#[tokio::test]
async fn storage_delete_failure_keeps_metadata() {
    let app = TestApp::spawn().await;
    let id = app.upload_hello().await;
    app.storage.fail_deletes.store(true, Ordering::SeqCst);

    let res = app.delete(&routes::file(&id)).await;
    assert_eq!(res.status, 500);
    assert!(app.persistence.file(&id).is_some(), "record must survive");

    let res = app.get(&routes::file(&id)).await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn metadata_delete_failure_leaves_stale_record() {
    let app = TestApp::spawn().await;
    let id = app.upload_hello().await;
    let key = app.persistence.file(&id).unwrap().storage_key;
    app.persistence
        .fail_file_deletes
        .store(true, Ordering::SeqCst);

    let res = app.delete(&routes::file(&id)).await;
    assert_eq!(res.status, 500);
    assert!(app.storage.object(&key).is_none(), "blob was deleted first");
    assert!(app.persistence.file(&id).is_some());

    let stale = app
        .sink
        .events_at(EventLevel::Error)
        .into_iter()
        .find(|e| e.operation == "delete_file")
        .expect("stale record should be logged");
    assert_eq!(stale.get("file_id"), Some(id.as_str()));
}

#[tokio::test]
async fn collection_path_requires_an_id_for_reads() {
    let app = TestApp::spawn().await;

    for method in [Method::GET, Method::DELETE] {
        let res = app.request(method.clone(), routes::FILES).await;
        assert_eq!(res.status, 400, "{method} /v1/file");
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    for method in [Method::PUT, Method::PATCH, Method::HEAD] {
        let res = app.request(method.clone(), routes::FILES).await;
        assert_eq!(res.status, 405, "{method} /v1/file");
        assert!(res.text.is_empty());
    }
}

#[tokio::test]
async fn item_path_rejects_writes() {
    let app = TestApp::spawn().await;
    let id = app.upload_hello().await;

    for method in [Method::POST, Method::PUT, Method::PATCH, Method::HEAD] {
        let res = app.request(method.clone(), &routes::file(&id)).await;
        assert_eq!(res.status, 405, "{method} /v1/file/{{id}}");
        assert!(res.text.is_empty());
    }
    assert!(app.persistence.file(&id).is_some());
}

#[tokio::test]
async fn request_latency_is_recorded_per_route() {
    let app = TestApp::spawn().await;
    let id = app.upload_hello().await;
    app.get(&routes::file(&id)).await;
    app.get(routes::HEALTH).await;
    app.get("/nowhere").await;

    assert!(app.sink.has_metric(API_LATENCY, "POST /v1/file"));
    assert!(app.sink.has_metric(API_LATENCY, "GET /v1/file/{id}"));
    assert!(app.sink.has_metric(API_LATENCY, "GET /healthz"));
    assert!(app.sink.has_metric(API_LATENCY, "GET unmatched"));
}

#[tokio::test]
async fn concurrent_uploads_get_distinct_ids() {
    let app = TestApp::spawn().await;

    let (a, b, c) = tokio::join!(
        app.upload("a.txt", b"one", "text/plain"),
        app.upload("a.txt", b"two", "text/plain"),
        app.upload("a.txt", b"three", "text/plain"),
    );
    for res in [&a, &b, &c] {
        assert_eq!(res.status, 201, "upload failed: {}", res.text);
    }

    let mut ids = vec![a.id(), b.id(), c.id()];
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
    assert_eq!(app.storage.object_count(), 3);
    assert_eq!(app.persistence.file_count(), 3);
}
