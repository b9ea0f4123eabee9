// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry.
//!
//! The [`Tool`] trait is the unit the protocol dispatcher calls into. The
//! [`ToolRegistry`] handles lookup by name and produces MCP-format tool
//! definitions for `tools/list`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use diagrammer_core::DiagrammerError;
use serde::Serialize;

/// Output from a tool invocation.
///
/// Caller mistakes (bad syntax, oversized input) are reported here with
/// `is_error = true` rather than as an `Err`, so the caller sees the
/// structured failure and can correct the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    /// Structured result returned to the caller.
    pub content: serde_json::Value,
    /// Whether the tool invocation resulted in an error.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: serde_json::Value) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    pub fn failure(content: serde_json::Value) -> Self {
        Self {
            content,
            is_error: true,
        }
    }
}

/// A callable tool.
///
/// Every tool provides a name, description, JSON Schema for its arguments,
/// and an async `invoke` method receiving the raw JSON arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used for lookup and in `tools/list`.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema describing the tool's arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Invokes the tool with the given JSON arguments.
    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, DiagrammerError>;
}

/// Registry of available tools, indexed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool under its `name()`, replacing any previous one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Sorted tool names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns MCP-format tool definitions, sorted by name.
    ///
    /// Each definition has the shape:
    /// ```json
    /// {
    ///   "name": "tool_name",
    ///   "description": "What the tool does",
    ///   "inputSchema": { ... JSON Schema ... }
    /// }
    /// ```
    pub fn tool_definitions(&self) -> Vec<serde_json::Value> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "inputSchema": t.parameters_schema(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
