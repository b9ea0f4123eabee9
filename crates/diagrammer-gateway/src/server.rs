// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for artifact delivery.

use std::sync::Arc;
use std::time::Instant;

use axum::{Router, extract::Request, middleware as axum_middleware, routing::get};
use diagrammer_core::DiagrammerError;
use diagrammer_storage::ArtifactStore;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AccessToken, auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Where artifacts are read from.
    pub store: Arc<ArtifactStore>,
    /// Delivery secret (disabled when auth is off).
    pub token: AccessToken,
    /// Process start time for uptime reporting.
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(store: Arc<ArtifactStore>, token: AccessToken) -> Self {
        Self {
            store,
            token,
            started_at: Instant::now(),
        }
    }
}

/// Builds the delivery routes:
/// - GET /healthz (public)
/// - GET /diagrams (with auth)
/// - GET /diagrams/{file_name} (with auth)
///
/// Tracing and CORS layers are added by [`serve`] through [`http_layers`],
/// so routers merged in by the caller get them too.
pub fn router(state: GatewayState) -> Router {
    let token = state.token.clone();

    let public_routes = Router::new()
        .route("/healthz", get(handlers::healthz))
        .with_state(state.clone());

    let delivery_routes = Router::new()
        .route("/diagrams", get(handlers::list_diagrams))
        .route("/diagrams/{file_name}", get(handlers::get_diagram))
        .route_layer(axum_middleware::from_fn_with_state(token, auth_middleware))
        .with_state(state);

    Router::new().merge(public_routes).merge(delivery_routes)
}

/// Binds the listener for `host:port`.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, DiagrammerError> {
    let addr = format!("{host}:{port}");
    TcpListener::bind(&addr)
        .await
        .map_err(|e| DiagrammerError::Infrastructure {
            message: format!("failed to bind HTTP server to {addr}: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Wraps `app` in request tracing and permissive CORS.
///
/// Request spans record the method and path only. The query string can
/// carry the access token and never reaches the logs.
pub fn http_layers(app: Router) -> Router {
    app.layer(
        TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::debug_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        }),
    )
    .layer(CorsLayer::permissive())
}

/// Serves `app` until `cancel` fires, then drains in-flight requests.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    cancel: CancellationToken,
) -> Result<(), DiagrammerError> {
    let app = http_layers(app);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("HTTP server listening on {addr}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| DiagrammerError::Infrastructure {
            message: format!("HTTP server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn serve_returns_when_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::open(dir.path()).await.unwrap());
        let state = GatewayState::new(store, AccessToken::disabled());

        let listener = bind("127.0.0.1", 0).await.unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, router(state), cancel.clone()));

        cancel.cancel();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn request_logs_omit_query_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::open(dir.path()).await.unwrap());
        let artifact = store
            .save(b"<svg/>", diagrammer_core::DiagramFormat::Svg)
            .await
            .unwrap();
        let state = GatewayState::new(store, AccessToken::new(Some("TOPSECRET123")));
        let app = http_layers(router(state));

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("trace"))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let uri = format!("/diagrams/{}?token=TOPSECRET123", artifact.file_name());
        let resp = app
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), axum::http::StatusCode::OK);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains(&artifact.file_name()), "{output}");
        assert!(!output.contains("TOPSECRET123"), "{output}");
    }

    #[tokio::test]
    async fn bind_reports_address_in_use() {
        let first = bind("127.0.0.1", 0).await.unwrap();
        let port = first.local_addr().unwrap().port();
        let err = bind("127.0.0.1", port).await.unwrap_err();
        assert_eq!(err.code(), "infrastructure_error");
    }
}
