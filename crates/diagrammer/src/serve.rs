// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `diagrammer serve`, `stdio` and `sweep` implementations.
//!
//! Wires the artifact store, renderer, generator and tool registry together
//! and runs them until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use diagrammer_config::DiagrammerConfig;
use diagrammer_core::{DiagrammerError, HealthStatus, PluginAdapter};
use diagrammer_gateway::{AccessToken, GatewayState};
use diagrammer_mcp_server::McpServer;
use diagrammer_render::{DiagramGenerator, MermaidCliRenderer, repair};
use diagrammer_storage::{ArtifactStore, RetentionSweeper};
use diagrammer_tools::{ImageLinks, RequestDefaults, ToolRegistry, register_builtins};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::shutdown;

/// Crates whose logs follow `server.log_level`; everything else logs at warn.
const LOG_TARGETS: &[&str] = &[
    "diagrammer",
    "diagrammer_core",
    "diagrammer_config",
    "diagrammer_storage",
    "diagrammer_render",
    "diagrammer_tools",
    "diagrammer_gateway",
    "diagrammer_mcp_server",
    "tower_http",
];

/// Everything a running server needs.
pub struct Services {
    pub store: Arc<ArtifactStore>,
    pub renderer: Arc<MermaidCliRenderer>,
    pub registry: Arc<ToolRegistry>,
    pub token: AccessToken,
}

impl Services {
    /// Opens the store, prepares the renderer and registers the tools.
    pub async fn build(config: &DiagrammerConfig) -> Result<Self, DiagrammerError> {
        let store = Arc::new(ArtifactStore::open(&config.diagrams.output_dir).await?);
        info!(
            output_dir = %store.root().display(),
            artifacts = store.len(),
            "artifact store opened"
        );

        let renderer = Arc::new(MermaidCliRenderer::new(&config.renderer)?);
        match renderer.health_check().await {
            Ok(HealthStatus::Healthy) => info!(binary = renderer.binary(), "renderer available"),
            Ok(HealthStatus::Degraded(msg)) | Ok(HealthStatus::Unhealthy(msg)) => {
                warn!(binary = renderer.binary(), "renderer not ready: {msg}");
            }
            Err(e) => warn!(binary = renderer.binary(), error = %e, "renderer health check failed"),
        }

        let generator = Arc::new(
            DiagramGenerator::new(
                renderer.clone(),
                store.clone(),
                config.renderer.max_retry_attempts,
                config.diagrams.max_diagram_size,
            )
            .with_repair(repair::from_mode(config.renderer.repair)),
        );

        let token = config.auth.effective_token();
        let mut registry = ToolRegistry::new();
        register_builtins(
            &mut registry,
            generator,
            RequestDefaults::from(&config.diagrams),
            ImageLinks::new(&config.server.public_base_url, token),
        );

        Ok(Self {
            store,
            renderer,
            registry: Arc::new(registry),
            token: AccessToken::new(token),
        })
    }

    pub fn mcp_server(&self) -> McpServer {
        McpServer::new(self.registry.clone(), self.store.clone())
    }

    /// Delivery routes plus the Streamable HTTP MCP endpoint at `/mcp`.
    pub fn http_app(&self) -> Router {
        diagrammer_gateway::router(GatewayState::new(self.store.clone(), self.token.clone()))
            .merge(diagrammer_mcp_server::http::router(
                self.mcp_server(),
                self.token.clone(),
            ))
    }
}

/// Starts the retention sweeper in the background, unless disabled.
fn spawn_sweeper(
    config: &DiagrammerConfig,
    store: Arc<ArtifactStore>,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    let sweeper = sweeper_for(config, store);
    if !sweeper.is_enabled() {
        info!("artifact cleanup disabled (cleanup_after_hours = 0)");
        return None;
    }
    Some(tokio::spawn(sweeper.run(cancel)))
}

fn sweeper_for(config: &DiagrammerConfig, store: Arc<ArtifactStore>) -> RetentionSweeper {
    RetentionSweeper::new(
        store,
        config.diagrams.cleanup_after_hours,
        Duration::from_secs(config.diagrams.sweep_interval_secs),
    )
}

/// Run `diagrammer serve`: HTTP delivery and MCP until SIGINT/SIGTERM.
pub async fn run_serve(config: DiagrammerConfig) -> Result<(), DiagrammerError> {
    let services = Services::build(&config).await?;
    let cancel = shutdown::install_signal_handler();
    let sweeper = spawn_sweeper(&config, services.store.clone(), cancel.clone());

    let listener = diagrammer_gateway::bind(&config.server.host, config.server.port).await?;
    let served = diagrammer_gateway::serve(listener, services.http_app(), cancel.clone()).await;

    cancel.cancel();
    finish(sweeper, &services).await;
    served
}

/// Run `diagrammer stdio`: MCP over stdin/stdout, optionally with HTTP
/// delivery alongside so returned image URLs resolve.
pub async fn run_stdio(config: DiagrammerConfig, with_http: bool) -> Result<(), DiagrammerError> {
    let services = Services::build(&config).await?;
    let cancel = shutdown::install_signal_handler();
    let sweeper = spawn_sweeper(&config, services.store.clone(), cancel.clone());

    let http = if with_http {
        match diagrammer_gateway::bind(&config.server.host, config.server.port).await {
            Ok(listener) => Some(tokio::spawn(diagrammer_gateway::serve(
                listener,
                services.http_app(),
                cancel.clone(),
            ))),
            Err(e) => {
                warn!(error = %e, "HTTP delivery unavailable; image URLs will not resolve");
                None
            }
        }
    } else {
        None
    };

    let result =
        diagrammer_mcp_server::stdio::serve_stdio(services.mcp_server(), cancel.clone()).await;

    // stdin closing ends the session.
    cancel.cancel();
    if let Some(handle) = http {
        match handle.await {
            Ok(Err(e)) => error!(error = %e, "HTTP server exited with error"),
            Err(e) => error!(error = %e, "HTTP server task failed"),
            Ok(Ok(())) => {}
        }
    }
    finish(sweeper, &services).await;
    result
}

/// Run `diagrammer sweep`: one retention pass, then exit.
pub async fn run_sweep(config: &DiagrammerConfig) -> Result<(), DiagrammerError> {
    let store = Arc::new(ArtifactStore::open(&config.diagrams.output_dir).await?);
    let sweeper = sweeper_for(config, store);
    if !sweeper.is_enabled() {
        println!("cleanup disabled (diagrams.cleanup_after_hours = 0)");
        return Ok(());
    }

    let report = sweeper.sweep().await;
    println!(
        "scanned {}, removed {}, failed {}",
        report.scanned, report.removed, report.failed
    );
    if report.failed > 0 {
        return Err(DiagrammerError::Internal(format!(
            "{} artifact(s) could not be removed",
            report.failed
        )));
    }
    Ok(())
}

async fn finish(sweeper: Option<JoinHandle<()>>, services: &Services) {
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            error!(error = %e, "retention sweeper task failed");
        }
    }
    if let Err(e) = services.renderer.shutdown().await {
        warn!(error = %e, "renderer shutdown failed");
    }
    info!("shutdown complete");
}

/// Initializes the tracing subscriber.
///
/// Logs always go to stderr so stdout stays free for JSON-RPC in stdio mode
/// and for command output otherwise. `RUST_LOG` overrides `log_level`.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

fn default_filter(log_level: &str) -> String {
    let mut directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={log_level}"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}
