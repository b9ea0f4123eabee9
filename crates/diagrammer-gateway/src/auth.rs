// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access-token check for artifact delivery.
//!
//! A request may present the token in two places (checked in order):
//! 1. Bearer token (`Authorization: Bearer <token>`)
//! 2. Query parameter (`?token=<token>`), so generated image URLs work in
//!    clients that cannot set headers.
//!
//! When no token is configured every request passes.

use axum::{
    Json,
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode, Uri, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::handlers::ErrorResponse;

/// The process-wide delivery secret. `None` disables the check.
#[derive(Clone, Default)]
pub struct AccessToken(Option<String>);

impl AccessToken {
    /// Builds the check from the configured token. Empty strings disable it.
    pub fn new(token: Option<&str>) -> Self {
        Self(token.filter(|t| !t.is_empty()).map(str::to_string))
    }

    /// An access token that lets every request through.
    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }

    /// Checks a presented credential against the configured secret.
    pub fn verify(&self, presented: Option<&str>) -> bool {
        match (&self.0, presented) {
            (None, _) => true,
            (Some(expected), Some(presented)) => {
                constant_time_eq(expected.as_bytes(), presented.as_bytes())
            }
            (Some(_), None) => false,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AccessToken")
            .field(&self.0.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Extracts the presented credential, preferring the bearer header.
pub fn presented_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| {
        Query::<TokenQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(q)| q.token)
    })
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware that rejects requests without a valid access token.
///
/// Rejections carry a JSON error body and never any artifact bytes.
pub async fn auth_middleware(
    State(token): State<AccessToken>,
    request: Request,
    next: Next,
) -> Response {
    let presented = presented_token(request.headers(), request.uri());
    if token.verify(presented.as_deref()) {
        return next.run(request).await;
    }

    tracing::debug!(
        path = %request.uri().path(),
        presented = presented.is_some(),
        "delivery rejected: invalid or missing token"
    );
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("unauthorized", "missing or invalid access token")),
    )
        .into_response()
}
