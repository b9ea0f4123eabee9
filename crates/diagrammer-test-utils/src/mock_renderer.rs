// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock renderer adapter for deterministic testing.
//!
//! `MockRenderer` implements `RendererAdapter` with pre-configured outcomes,
//! so retry and delivery tests run without the real `mmdc` binary.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use diagrammer_core::{
    AdapterType, DiagrammerError, HealthStatus, PluginAdapter, RenderConfig, RenderOutcome,
    RendererAdapter,
};

/// Bytes returned by the default successful render.
pub const MOCK_SVG: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\"><text>mock</text></svg>";

/// A renderer that returns pre-configured outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty the
/// fallback outcome is returned (a successful [`MOCK_SVG`] render unless
/// changed with [`MockRenderer::with_fallback`]).
pub struct MockRenderer {
    outcomes: Mutex<VecDeque<RenderOutcome>>,
    fallback: RenderOutcome,
    delay: Option<Duration>,
    calls: AtomicU32,
    descriptions: Mutex<Vec<String>>,
    configs: Mutex<Vec<RenderConfig>>,
}

impl MockRenderer {
    /// A renderer that always succeeds.
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            fallback: RenderOutcome::Success {
                bytes: MOCK_SVG.to_vec(),
            },
            delay: None,
            calls: AtomicU32::new(0),
            descriptions: Mutex::new(Vec::new()),
            configs: Mutex::new(Vec::new()),
        }
    }

    /// A renderer pre-loaded with the given outcomes.
    pub fn with_outcomes(outcomes: Vec<RenderOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::from(outcomes)),
            ..Self::new()
        }
    }

    /// A renderer that rejects every description with `message`.
    pub fn always_syntax_error(message: &str) -> Self {
        Self::new().with_fallback(RenderOutcome::SyntaxFailure {
            message: message.to_string(),
            attempt: 1,
        })
    }

    /// Replaces the outcome returned once the queue is drained.
    pub fn with_fallback(mut self, outcome: RenderOutcome) -> Self {
        self.fallback = outcome;
        self
    }

    /// Sleeps before every render, to widen race windows in tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add an outcome to the end of the queue.
    pub async fn push_outcome(&self, outcome: RenderOutcome) {
        self.outcomes.lock().await.push_back(outcome);
    }

    /// Number of `render` invocations so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Descriptions received, in call order.
    pub async fn descriptions(&self) -> Vec<String> {
        self.descriptions.lock().await.clone()
    }

    /// Render configurations received, in call order.
    pub async fn configs(&self) -> Vec<RenderConfig> {
        self.configs.lock().await.clone()
    }
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockRenderer {
    fn name(&self) -> &str {
        "mock-renderer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Renderer
    }

    async fn health_check(&self) -> Result<HealthStatus, DiagrammerError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DiagrammerError> {
        Ok(())
    }
}

#[async_trait]
impl RendererAdapter for MockRenderer {
    async fn render(
        &self,
        description: &str,
        config: &RenderConfig,
        attempt: u32,
    ) -> RenderOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.descriptions.lock().await.push(description.to_string());
        self.configs.lock().await.push(config.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self
            .outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        // Scripted syntax failures report the attempt they were returned on.
        match outcome {
            RenderOutcome::SyntaxFailure { message, .. } => {
                RenderOutcome::SyntaxFailure { message, attempt }
            }
            other => other,
        }
    }
}
