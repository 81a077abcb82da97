//! Integration tests for the generation endpoints' validation and error
//! mapping.
//!
//! No test reaches a real remote service: requests either fail validation
//! locally or hit the closed local port configured in `common`.

mod common;

use std::path::Path;

use axum::http::StatusCode;
use common::{body_json, png_bytes, post_multipart, Part};
use framelink_core::images::MAX_IMAGE_BYTES;

/// Names of files currently in the uploads area.
fn upload_names(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root.join("uploads"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// Validation failures: wrong count, extension, size, undecodable content
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_rejects_wrong_file_count() {
    let root = tempfile::tempdir().unwrap();
    let app = common::build_test_app(root.path());
    let png = png_bytes();

    let response = post_multipart(
        app,
        "/api/v1/generate",
        &[Part {
            name: "files",
            filename: Some("a.png"),
            content: &png,
        }],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["error"].as_str().unwrap().contains("Expected 2"));

    // The single saved upload must have been discarded.
    assert!(upload_names(root.path()).is_empty());
}

#[tokio::test]
async fn generate_rejects_unsupported_extension() {
    let root = tempfile::tempdir().unwrap();
    let app = common::build_test_app(root.path());
    let png = png_bytes();

    let response = post_multipart(
        app,
        "/api/v1/generate",
        &[
            Part {
                name: "files",
                filename: Some("a.txt"),
                content: &png,
            },
            Part {
                name: "files",
                filename: Some("b.png"),
                content: &png,
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("unsupported format"));
    assert!(upload_names(root.path()).is_empty());
}

#[tokio::test]
async fn generate_rejects_oversized_file() {
    let root = tempfile::tempdir().unwrap();
    let app = common::build_test_app(root.path());
    let oversized = vec![0u8; MAX_IMAGE_BYTES + 1];

    let response = post_multipart(
        app,
        "/api/v1/generate",
        &[Part {
            name: "files",
            filename: Some("big.png"),
            content: &oversized,
        }],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("10 MiB limit"));
    assert!(upload_names(root.path()).is_empty());
}

#[tokio::test]
async fn generate_rejects_undecodable_image() {
    let root = tempfile::tempdir().unwrap();
    let app = common::build_test_app(root.path());

    let response = post_multipart(
        app,
        "/api/v1/generate",
        &[Part {
            name: "files",
            filename: Some("fake.png"),
            content: b"this is not image data",
        }],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(upload_names(root.path()).is_empty());
}

#[tokio::test]
async fn sequence_rejects_wrong_image_count() {
    let root = tempfile::tempdir().unwrap();
    let app = common::build_test_app(root.path());
    let png = png_bytes();

    let response = post_multipart(
        app,
        "/api/v1/generate-sequence",
        &[
            Part {
                name: "files",
                filename: Some("a.png"),
                content: &png,
            },
            Part {
                name: "files",
                filename: Some("b.png"),
                content: &png,
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Expected 6 image files"));
    assert!(upload_names(root.path()).is_empty());
}

// ---------------------------------------------------------------------------
// Remote mapping: an unreachable synthesis service surfaces as 502 and
// never leaves uploads behind
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_maps_unreachable_remote_to_502() {
    let root = tempfile::tempdir().unwrap();
    let app = common::build_test_app(root.path());
    let png = png_bytes();

    let response = post_multipart(
        app,
        "/api/v1/generate",
        &[
            Part {
                name: "files",
                filename: Some("a.png"),
                content: &png,
            },
            Part {
                name: "files",
                filename: Some("b.png"),
                content: &png,
            },
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "REMOTE_UNREACHABLE");

    // Passthrough uploads are deleted after the submission attempt,
    // successful or not.
    assert!(upload_names(root.path()).is_empty());
}
