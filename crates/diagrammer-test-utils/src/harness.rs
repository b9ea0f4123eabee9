// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the generation stack around a [`MockRenderer`]
//! and an artifact store in a temp directory, and exposes the tool
//! registry and delivery router built on top of it.

use std::sync::Arc;

use diagrammer_core::{DiagrammerError, RenderOutcome};
use diagrammer_gateway::{AccessToken, GatewayState};
use diagrammer_render::DiagramGenerator;
use diagrammer_storage::ArtifactStore;
use diagrammer_tools::{ImageLinks, RequestDefaults, ToolOutput, ToolRegistry, register_builtins};

use crate::mock_renderer::MockRenderer;

/// Base URL used for image links in tests.
pub const TEST_BASE_URL: &str = "http://localhost:8401";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    renderer: Option<MockRenderer>,
    max_attempts: u32,
    max_description_chars: usize,
    token: Option<String>,
    defaults: RequestDefaults,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            renderer: None,
            max_attempts: 5,
            max_description_chars: 50_000,
            token: None,
            defaults: RequestDefaults::default(),
        }
    }

    /// Queue renderer outcomes (successful renders once drained).
    pub fn with_outcomes(mut self, outcomes: Vec<RenderOutcome>) -> Self {
        self.renderer = Some(MockRenderer::with_outcomes(outcomes));
        self
    }

    /// Use a preconfigured mock renderer.
    pub fn with_renderer(mut self, renderer: MockRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_max_description_chars(mut self, max: usize) -> Self {
        self.max_description_chars = max;
        self
    }

    /// Enable delivery auth with `token`.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, DiagrammerError> {
        let temp_dir = tempfile::TempDir::new().map_err(DiagrammerError::storage)?;
        let store = Arc::new(ArtifactStore::open(temp_dir.path().join("diagrams")).await?);

        let renderer = Arc::new(self.renderer.unwrap_or_default());
        let generator = Arc::new(DiagramGenerator::new(
            renderer.clone(),
            store.clone(),
            self.max_attempts,
            self.max_description_chars,
        ));

        let mut registry = ToolRegistry::new();
        register_builtins(
            &mut registry,
            generator.clone(),
            self.defaults,
            ImageLinks::new(TEST_BASE_URL, self.token.as_deref()),
        );

        Ok(TestHarness {
            _temp_dir: temp_dir,
            store,
            renderer,
            generator,
            registry: Arc::new(registry),
            token: AccessToken::new(self.token.as_deref()),
        })
    }
}

/// A fully wired generation stack for integration tests.
pub struct TestHarness {
    // Held to keep the directory alive for the harness lifetime.
    _temp_dir: tempfile::TempDir,
    pub store: Arc<ArtifactStore>,
    pub renderer: Arc<MockRenderer>,
    pub generator: Arc<DiagramGenerator>,
    pub registry: Arc<ToolRegistry>,
    pub token: AccessToken,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Invokes a registered tool by name.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, DiagrammerError> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| DiagrammerError::NotFound(format!("tool {name}")))?;
        tool.invoke(arguments).await
    }

    /// The delivery router over this harness's store.
    pub fn gateway_router(&self) -> axum::Router {
        diagrammer_gateway::router(GatewayState::new(self.store.clone(), self.token.clone()))
    }
}
