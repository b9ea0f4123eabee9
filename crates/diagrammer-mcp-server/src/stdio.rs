// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MCP over stdin/stdout.
//!
//! stdout carries protocol messages only; logging must go to stderr.
//! Each request runs on its own task, so a slow render never holds up a
//! `ping` or a `tools/list` sent after it.

use diagrammer_core::DiagrammerError;
use rmcp::transport::IntoTransport;
use rmcp::{RoleServer, ServiceExt};
use tokio_util::sync::CancellationToken;

use crate::server::McpServer;

/// Serves the process's stdin/stdout until EOF or cancellation.
pub async fn serve_stdio(
    server: McpServer,
    cancel: CancellationToken,
) -> Result<(), DiagrammerError> {
    serve_transport(server, rmcp::transport::stdio(), cancel).await
}

/// Serves one client over any `rmcp` transport, such as a `(reader, writer)`
/// pair. Returns when the client disconnects or `cancel` fires.
pub async fn serve_transport<T, E, A>(
    server: McpServer,
    transport: T,
    cancel: CancellationToken,
) -> Result<(), DiagrammerError>
where
    T: IntoTransport<RoleServer, E, A>,
    E: std::error::Error + Send + Sync + 'static,
{
    tracing::info!("MCP stdio transport started");
    let running = tokio::select! {
        running = server.serve_with_ct(transport, cancel.child_token()) => {
            running.map_err(|e| infrastructure(format!("MCP session failed to start: {e}")))?
        }
        _ = cancel.cancelled() => {
            tracing::info!("MCP stdio transport cancelled before initialization");
            return Ok(());
        }
    };

    let reason = running
        .waiting()
        .await
        .map_err(|e| infrastructure(format!("MCP session task failed: {e}")))?;
    tracing::info!(reason = ?reason, "MCP stdio transport stopped");
    Ok(())
}

fn infrastructure(message: String) -> DiagrammerError {
    DiagrammerError::Infrastructure {
        message,
        source: None,
    }
}
