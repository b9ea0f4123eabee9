// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Renderer adapter trait for the external diagram renderer.

use async_trait::async_trait;

use crate::traits::adapter::PluginAdapter;
use crate::types::{RenderConfig, RenderOutcome};

/// Adapter around an opaque diagram renderer.
///
/// Implementations never return `Err`: every way a render can go wrong is
/// folded into a [`RenderOutcome`] variant, so the retry orchestrator can
/// decide what is retryable. Each call is bounded by the adapter's own
/// wall-clock timeout.
#[async_trait]
pub trait RendererAdapter: PluginAdapter {
    /// Renders `description` with the given configuration.
    ///
    /// `attempt` is 1-based and is echoed back in
    /// [`RenderOutcome::SyntaxFailure`].
    async fn render(&self, description: &str, config: &RenderConfig, attempt: u32)
    -> RenderOutcome;
}
