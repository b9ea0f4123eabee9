// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery routes exercised through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use diagrammer_core::DiagramFormat;
use diagrammer_gateway::{AccessToken, GatewayState, router};
use diagrammer_storage::ArtifactStore;
use tempfile::TempDir;
use tower::ServiceExt;

const SVG: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>";

async fn setup(token: AccessToken) -> (TempDir, Arc<ArtifactStore>, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ArtifactStore::open(dir.path().join("diagrams")).await.unwrap());
    let app = router(GatewayState::new(store.clone(), token));
    (dir, store, app)
}

async fn get(
    app: axum::Router,
    uri: &str,
    bearer: Option<&str>,
) -> (StatusCode, Option<String>, Vec<u8>) {
    let mut req = Request::builder().uri(uri);
    if let Some(token) = bearer {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let resp = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec();
    (status, content_type, body)
}

#[tokio::test]
async fn serves_artifact_with_media_type() {
    let (_dir, store, app) = setup(AccessToken::disabled()).await;
    let artifact = store.save(SVG, DiagramFormat::Svg).await.unwrap();

    let (status, content_type, body) =
        get(app, &format!("/diagrams/{}", artifact.file_name()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/svg+xml"));
    assert_eq!(body, SVG);
}

#[tokio::test]
async fn png_and_pdf_media_types() {
    let (_dir, store, app) = setup(AccessToken::disabled()).await;
    let png = store.save(b"\x89PNG", DiagramFormat::Png).await.unwrap();
    let pdf = store.save(b"%PDF-1.7", DiagramFormat::Pdf).await.unwrap();

    let (_, ct, _) = get(app.clone(), &format!("/diagrams/{}", png.file_name()), None).await;
    assert_eq!(ct.as_deref(), Some("image/png"));
    let (_, ct, _) = get(app, &format!("/diagrams/{}", pdf.file_name()), None).await;
    assert_eq!(ct.as_deref(), Some("application/pdf"));
}

#[tokio::test]
async fn unknown_artifact_is_404() {
    let (_dir, _store, app) = setup(AccessToken::disabled()).await;
    let (status, _, body) = get(
        app,
        "/diagrams/diagram_1700000000_0123456789abcdef0123456789abcdef.svg",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn wrong_extension_is_404() {
    let (_dir, store, app) = setup(AccessToken::disabled()).await;
    let artifact = store.save(SVG, DiagramFormat::Svg).await.unwrap();
    let (status, _, _) = get(app, &format!("/diagrams/{}.png", artifact.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn traversal_names_are_404() {
    let (dir, _store, app) = setup(AccessToken::disabled()).await;
    std::fs::write(dir.path().join("secret.svg"), b"top secret").unwrap();

    for uri in [
        "/diagrams/..%2Fsecret.svg",
        "/diagrams/%2E%2E%2Fsecret.svg",
        "/diagrams/secret.svg",
        "/diagrams/..%5Csecret.svg",
    ] {
        let (status, _, body) = get(app.clone(), uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert!(!body.windows(10).any(|w| w == b"top secret"), "{uri}");
    }
}

#[tokio::test]
async fn wrong_token_is_401_without_image_bytes() {
    let (_dir, store, app) = setup(AccessToken::new(Some("s3cret"))).await;
    let artifact = store.save(SVG, DiagramFormat::Svg).await.unwrap();
    let uri = format!("/diagrams/{}", artifact.file_name());

    let (status, _, body) = get(app.clone(), &format!("{uri}?token=nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!body.windows(4).any(|w| w == b"<svg"));

    let (status, _, _) = get(app.clone(), &uri, Some("nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = get(app, &uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_in_query_or_header_releases_bytes() {
    let (_dir, store, app) = setup(AccessToken::new(Some("s3cret"))).await;
    let artifact = store.save(SVG, DiagramFormat::Svg).await.unwrap();
    let uri = format!("/diagrams/{}", artifact.file_name());

    let (status, _, body) = get(app.clone(), &format!("{uri}?token=s3cret"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, SVG);

    let (status, _, body) = get(app, &uri, Some("s3cret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, SVG);
}

#[tokio::test]
async fn unauthorized_precedes_not_found() {
    let (_dir, _store, app) = setup(AccessToken::new(Some("s3cret"))).await;
    let (status, _, _) = get(app, "/diagrams/nothing.svg", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn healthz_is_public() {
    let (_dir, store, app) = setup(AccessToken::new(Some("s3cret"))).await;
    store.save(SVG, DiagramFormat::Svg).await.unwrap();

    let (status, _, body) = get(app, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["artifacts"], 1);
}

#[tokio::test]
async fn listing_is_gated_and_newest_first() {
    let (_dir, store, app) = setup(AccessToken::new(Some("s3cret"))).await;
    let first = store.save(SVG, DiagramFormat::Svg).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let second = store.save(b"\x89PNG", DiagramFormat::Png).await.unwrap();

    let (status, _, _) = get(app.clone(), "/diagrams", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = get(app, "/diagrams?token=s3cret", None).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let names: Vec<&str> = json["diagrams"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["file_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec![second.file_name(), first.file_name()]);
}

#[tokio::test]
async fn swept_artifact_is_404() {
    let (_dir, store, app) = setup(AccessToken::disabled()).await;
    let artifact = store.save(SVG, DiagramFormat::Svg).await.unwrap();
    std::fs::remove_file(&artifact.path).unwrap();

    let (status, _, _) = get(app, &format!("/diagrams/{}", artifact.file_name()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(store.get(&artifact.id).is_none());
}
