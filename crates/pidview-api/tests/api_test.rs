//! Upload, progress, file streaming and folder trigger endpoints.
//!
//! Run with: `cargo test -p pidview-api --test api_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::fakes::NotifyOutcome;
use helpers::fixtures::{minimal_pdf, seed_archive};
use helpers::{setup_test_app, setup_test_app_with, test_config, INPUT_ID, PROGRESS_TOKEN};
use pidview_core::AnalysisRequest;

fn pdf_part(name: &str) -> Part {
    Part::bytes(bytes::Bytes::from(minimal_pdf()))
        .file_name(name)
        .mime_type("application/pdf")
}

fn form_with_files(count: usize) -> MultipartForm {
    (0..count).fold(MultipartForm::new().add_text("note", "ignored"), |form, i| {
        form.add_part("files", pdf_part(&format!("drawing-{}.pdf", i + 1)))
    })
}

#[tokio::test]
async fn test_upload_rejects_wrong_file_counts() {
    for count in [0, 1, 3] {
        let app = setup_test_app().await;

        let response = app
            .client()
            .post("/api/upload")
            .add_header("Cookie", app.session_cookie())
            .multipart(form_with_files(count))
            .await;

        assert_eq!(response.status_code(), 400, "{} file(s)", count);
        assert!(app.drive.uploads().is_empty(), "{} file(s) reached Drive", count);
        assert!(app.upload_notifier.requests().is_empty());
    }
}

#[tokio::test]
async fn test_upload_two_files_writes_both_and_notifies_once() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/upload")
        .add_header("Cookie", app.session_cookie())
        .multipart(form_with_files(2))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    let job_id = body["jobId"].as_str().expect("jobId in response").to_string();
    assert_eq!(body["files"].as_array().map(Vec::len), Some(2));

    let uploads = app.drive.uploads();
    assert_eq!(uploads.len(), 2);
    assert!(uploads.iter().all(|(parent, _)| parent == INPUT_ID));
    assert_eq!(uploads[0].1.name, "drawing-1.pdf");
    assert_eq!(uploads[1].1.name, "drawing-2.pdf");

    let requests = app.upload_notifier.wait_for(1).await;
    assert_eq!(requests.len(), 1);
    match &requests[0] {
        AnalysisRequest::Upload {
            job_id: sent, files, ..
        } => {
            assert_eq!(sent.as_str(), job_id);
            assert_eq!(files.len(), 2);
        }
        other => panic!("Expected upload request, got {:?}", other),
    }
}

#[tokio::test]
async fn test_upload_without_input_folder_fails_before_writing() {
    let config = test_config(&[("DRIVE_FOLDER_ID_INPUT", "")]);
    let app = setup_test_app_with(config, NotifyOutcome::Deliver).await;

    let response = app
        .client()
        .post("/api/upload")
        .add_header("Cookie", app.session_cookie())
        .multipart(form_with_files(2))
        .await;

    assert_eq!(response.status_code(), 503);
    assert!(app.drive.uploads().is_empty());
}

#[tokio::test]
async fn test_upload_over_size_limit_is_payload_too_large() {
    let config = test_config(&[("MAX_UPLOAD_SIZE_MB", "1")]);
    let app = setup_test_app_with(config, NotifyOutcome::Deliver).await;
    let big = || {
        Part::bytes(bytes::Bytes::from(vec![b'%'; 700 * 1024]))
            .file_name("large.pdf")
            .mime_type("application/pdf")
    };

    let response = app
        .client()
        .post("/api/upload")
        .add_header("Cookie", app.session_cookie())
        .multipart(MultipartForm::new().add_part("files", big()).add_part("files", big()))
        .await;

    assert_eq!(response.status_code(), 413);
    assert!(app.drive.uploads().is_empty());
    assert!(app.upload_notifier.requests().is_empty());
}

#[tokio::test]
async fn test_progress_defaults_to_zero_then_reads_back() {
    let app = setup_test_app().await;
    let cookie = app.session_cookie();

    let before = app
        .client()
        .get("/api/progress?id=job-x")
        .add_header("Cookie", cookie.clone())
        .await;
    assert_eq!(before.status_code(), 200);
    assert_eq!(before.json::<serde_json::Value>()["progress"], 0);

    let post = app
        .client()
        .post("/api/progress")
        .add_header("Cookie", cookie.clone())
        .json(&serde_json::json!({ "id": "job-x", "progress": 42 }))
        .await;
    assert_eq!(post.status_code(), 200);
    assert_eq!(post.json::<serde_json::Value>()["success"], true);

    let after = app
        .client()
        .get("/api/progress?id=job-x")
        .add_header("Cookie", cookie)
        .await;
    assert_eq!(after.json::<serde_json::Value>()["progress"], 42);
}

#[tokio::test]
async fn test_progress_clamps_and_ignores_missing_id() {
    let app = setup_test_app().await;
    let cookie = app.session_cookie();

    let missing_id = app
        .client()
        .post("/api/progress")
        .add_header("Cookie", cookie.clone())
        .json(&serde_json::json!({ "progress": 50 }))
        .await;
    assert_eq!(missing_id.status_code(), 200);

    app.client()
        .post("/api/progress")
        .add_header("Cookie", cookie.clone())
        .json(&serde_json::json!({ "id": "job-y", "progress": 250 }))
        .await;
    let read = app
        .client()
        .get("/api/progress?id=job-y")
        .add_header("Cookie", cookie.clone())
        .await;
    assert_eq!(read.json::<serde_json::Value>()["progress"], 100);

    let no_id = app
        .client()
        .get("/api/progress")
        .add_header("Cookie", cookie)
        .await;
    assert_eq!(no_id.json::<serde_json::Value>()["progress"], 0);
}

#[tokio::test]
async fn test_progress_rejects_malformed_body() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/progress")
        .add_header("Cookie", app.session_cookie())
        .content_type("application/json")
        .bytes(bytes::Bytes::from_static(b"{not json"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_progress_reporter_token_bypasses_session() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/progress")
        .add_header("Authorization", format!("Bearer {}", PROGRESS_TOKEN))
        .json(&serde_json::json!({ "id": "job-z", "progress": 10 }))
        .await;
    assert_eq!(response.status_code(), 200);

    let wrong = app
        .client()
        .post("/api/progress")
        .add_header("Authorization", "Bearer nope")
        .json(&serde_json::json!({ "id": "job-z", "progress": 90 }))
        .await;
    assert_eq!(wrong.status_code(), 307);

    // the token only opens the write endpoint
    let read = app
        .client()
        .get("/api/progress?id=job-z")
        .add_header("Authorization", format!("Bearer {}", PROGRESS_TOKEN))
        .await;
    assert_eq!(read.status_code(), 307);
}

#[tokio::test]
async fn test_file_streams_bytes_with_drive_content_type() {
    let app = setup_test_app().await;
    seed_archive(&app.drive);

    let response = app
        .client()
        .get("/api/file/pdf_old")
        .add_header("Cookie", app.session_cookie())
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "application/pdf");
    assert_eq!(response.as_bytes().as_ref(), minimal_pdf().as_slice());
}

#[tokio::test]
async fn test_file_failures_are_not_found() {
    let app = setup_test_app().await;
    seed_archive(&app.drive);
    let cookie = app.session_cookie();

    let missing = app
        .client()
        .get("/api/file/does_not_exist")
        .add_header("Cookie", cookie.clone())
        .await;
    assert_eq!(missing.status_code(), 404);
    assert_eq!(missing.text(), "File not found");

    app.drive.set_failing(true);
    let failing = app
        .client()
        .get("/api/file/pdf_old")
        .add_header("Cookie", cookie)
        .await;
    assert_eq!(failing.status_code(), 404);
}

#[tokio::test]
async fn test_trigger_delivered() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/trigger")
        .add_header("Cookie", app.session_cookie())
        .json(&serde_json::json!({ "folderId": "system_1", "folderName": "Cooling water" }))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<serde_json::Value>()["success"], true);
    let requests = app.folder_notifier.requests();
    assert_eq!(requests.len(), 1);
    let sent = serde_json::to_value(&requests[0]).unwrap();
    assert_eq!(sent["folderId"], "system_1");
    assert_eq!(sent["folderName"], "Cooling water");
    assert!(sent["timestamp"].is_string());
}

#[tokio::test]
async fn test_trigger_without_webhook_is_unavailable() {
    let app = setup_test_app_with(test_config(&[]), NotifyOutcome::Skip).await;

    let response = app
        .client()
        .post("/api/trigger")
        .add_header("Cookie", app.session_cookie())
        .json(&serde_json::json!({}))
        .await;

    assert_eq!(response.status_code(), 503);
}

#[tokio::test]
async fn test_trigger_delivery_failure_is_bad_gateway() {
    let app = setup_test_app_with(test_config(&[]), NotifyOutcome::Fail).await;

    let response = app
        .client()
        .post("/api/trigger")
        .add_header("Cookie", app.session_cookie())
        .json(&serde_json::json!({ "folderId": "system_1" }))
        .await;

    assert_eq!(response.status_code(), 502);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UPSTREAM_ERROR");
    assert!(body.get("details").is_none());
}
