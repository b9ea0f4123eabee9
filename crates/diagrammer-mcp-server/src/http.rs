// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streamable HTTP MCP endpoint at `/mcp`.

use axum::{Router, middleware as axum_middleware};
use diagrammer_gateway::AccessToken;
use diagrammer_gateway::auth::auth_middleware;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService,
};

use crate::server::McpServer;

/// Routes for the MCP endpoint, gated by the same access token as delivery
/// since `resources/read` releases image bytes.
pub fn router(server: McpServer, token: AccessToken) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );
    Router::new()
        .nest_service("/mcp", service)
        .route_layer(axum_middleware::from_fn_with_state(token, auth_middleware))
}
