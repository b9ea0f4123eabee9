// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for artifact delivery.
//!
//! Handles GET /diagrams/{file_name}, GET /diagrams and GET /healthz.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use diagrammer_core::{Artifact, DiagramFormat, DiagrammerError};
use serde::Serialize;

use crate::server::GatewayState;

/// Artifacts are immutable once written, but tokens may rotate, so only
/// private caches may keep them.
const CACHE_CONTROL: &str = "private, max-age=3600";

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error description.
    pub error: String,
    /// Stable machine-readable code.
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
        }
    }
}

/// Response body for GET /healthz.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub artifacts: usize,
}

/// One entry in GET /diagrams.
#[derive(Debug, Serialize)]
pub struct DiagramEntry {
    pub file_name: String,
    pub format: DiagramFormat,
    pub size_bytes: u64,
    pub created_at: String,
}

impl From<&Artifact> for DiagramEntry {
    fn from(artifact: &Artifact) -> Self {
        Self {
            file_name: artifact.file_name(),
            format: artifact.format,
            size_bytes: artifact.size_bytes,
            created_at: artifact.created_at.to_rfc3339(),
        }
    }
}

/// Response body for GET /diagrams.
#[derive(Debug, Serialize)]
pub struct DiagramListResponse {
    pub diagrams: Vec<DiagramEntry>,
}

/// Maps a store error to an HTTP response without leaking storage paths.
pub fn error_response(err: &DiagrammerError) -> Response {
    let (status, message) = match err {
        DiagrammerError::NotFound(_) => (StatusCode::NOT_FOUND, "diagram not found".to_string()),
        DiagrammerError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            "missing or invalid access token".to_string(),
        ),
        DiagrammerError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to read diagram".to_string(),
        ),
    };
    (status, Json(ErrorResponse::new(err.code(), message))).into_response()
}

/// GET /diagrams/{file_name}
///
/// The name is resolved through the store's id grammar, so anything that is
/// not a well-formed artifact file name (including traversal attempts) is a
/// plain 404.
pub async fn get_diagram(
    State(state): State<GatewayState>,
    Path(file_name): Path<String>,
) -> Response {
    match state.store.load(&file_name).await {
        Ok((artifact, bytes)) => {
            tracing::debug!(file_name = %file_name, size_bytes = bytes.len(), "serving diagram");
            (
                StatusCode::OK,
                [
                    (
                        header::CONTENT_TYPE,
                        HeaderValue::from_static(artifact.format.media_type()),
                    ),
                    (header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL)),
                    (
                        header::X_CONTENT_TYPE_OPTIONS,
                        HeaderValue::from_static("nosniff"),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            if !matches!(e, DiagrammerError::NotFound(_)) {
                tracing::error!(file_name = %file_name, error = %e, "diagram read failed");
            }
            error_response(&e)
        }
    }
}

/// GET /diagrams
///
/// Lists tracked artifacts, newest first.
pub async fn list_diagrams(State(state): State<GatewayState>) -> Json<DiagramListResponse> {
    let diagrams = state.store.list().iter().map(DiagramEntry::from).collect();
    Json(DiagramListResponse { diagrams })
}

/// GET /healthz
pub async fn healthz(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        artifacts: state.store.len(),
    })
}
