// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MCP server for the Diagrammer tools.
//!
//! [`McpServer`] implements `rmcp`'s `ServerHandler` in front of the tool
//! registry and the artifact store. It is served over stdio ([`stdio`]) or
//! Streamable HTTP at `/mcp` ([`http`]).

pub mod http;
pub mod prompts;
pub mod server;
pub mod stdio;

pub use server::{McpServer, RESOURCE_SCHEME, SERVER_NAME, SERVER_VERSION};
