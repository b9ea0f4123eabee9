// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Diagrammer integration tests.
//!
//! - [`MockRenderer`]: a scripted [`RendererAdapter`](diagrammer_core::RendererAdapter)
//!   that never spawns a process.
//! - [`TestHarness`]: a temp artifact store, generator, tool registry and
//!   gateway wired together.
//! - [`McpTestClient`]: line-delimited JSON-RPC over an in-memory pipe.

pub mod harness;
pub mod mcp_client;
pub mod mock_renderer;

pub use harness::{TEST_BASE_URL, TestHarness, TestHarnessBuilder};
pub use mcp_client::McpTestClient;
pub use mock_renderer::MockRenderer;
