// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`ServerHandler`] over the tool registry and the artifact store.
//!
//! Tools come from the registry, resources are the stored diagrams under
//! `diagram://<file_name>`, and prompts are the static guides in
//! [`crate::prompts`]. Protocol framing, the initialize handshake and
//! per-request concurrency are handled by `rmcp`.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use diagrammer_core::DiagrammerError;
use diagrammer_storage::ArtifactStore;
use diagrammer_tools::ToolRegistry;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, GetPromptRequestParam, GetPromptResult,
    ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult, ListToolsResult,
    PaginatedRequestParam, ReadResourceRequestParam, ReadResourceResult, ServerCapabilities,
    ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::prompts;

/// Server name reported during initialization.
pub const SERVER_NAME: &str = "diagrammer";

/// Server version reported during initialization.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// URI scheme for stored diagrams exposed as resources.
pub const RESOURCE_SCHEME: &str = "diagram://";

const INSTRUCTIONS: &str = "Render Mermaid diagrams with `generate_diagram`. \
    Check code with `validate_syntax` and browse supported types with \
    `list_diagram_types`. The `diagram_selection_guide` prompt explains how \
    to pick a type.";

/// MCP handler shared by the stdio and HTTP transports.
#[derive(Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    store: Arc<ArtifactStore>,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>, store: Arc<ArtifactStore>) -> Self {
        Self { registry, store }
    }

    fn resources(&self) -> Value {
        let resources: Vec<Value> = self
            .store
            .list()
            .iter()
            .map(|artifact| {
                let file_name = artifact.file_name();
                json!({
                    "uri": format!("{RESOURCE_SCHEME}{file_name}"),
                    "name": file_name,
                    "mimeType": artifact.format.media_type(),
                    "size": artifact.size_bytes,
                })
            })
            .collect();
        json!({ "resources": resources })
    }
}

/// Builds a protocol result from its MCP wire form.
fn from_wire<T: DeserializeOwned>(value: Value) -> Result<T, McpError> {
    serde_json::from_value(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder()
            .enable_prompts()
            .enable_resources()
            .enable_tools()
            .build();
        info.server_info.name = SERVER_NAME.to_string();
        info.server_info.version = SERVER_VERSION.to_string();
        info.instructions = Some(INSTRUCTIONS.to_string());
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        from_wire(json!({ "tools": self.registry.tool_definitions() }))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let name: &str = &request.name;
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| McpError::invalid_params(format!("Unknown tool: {name}"), None))?;
        let arguments = Value::Object(request.arguments.unwrap_or_default());

        tracing::debug!(tool = name, "tool call");
        match tool.invoke(arguments).await {
            Ok(output) if output.is_error => Ok(CallToolResult::structured_error(output.content)),
            Ok(output) => Ok(CallToolResult::structured(output.content)),
            Err(e) => {
                tracing::error!(tool = name, error = %e, "tool invocation failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        from_wire(self.resources())
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        from_wire(json!({
            "resourceTemplates": [{
                "uriTemplate": format!("{RESOURCE_SCHEME}{{file_name}}"),
                "name": "diagram",
                "description": "A rendered diagram by file name",
            }]
        }))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let uri = request.uri;
        let Some(file_name) = uri.strip_prefix(RESOURCE_SCHEME) else {
            return Err(McpError::invalid_params(
                format!("unsupported resource uri: {uri}"),
                None,
            ));
        };

        match self.store.load(file_name).await {
            Ok((artifact, bytes)) => from_wire(json!({
                "contents": [{
                    "uri": uri,
                    "mimeType": artifact.format.media_type(),
                    "blob": BASE64.encode(&bytes),
                }]
            })),
            Err(DiagrammerError::NotFound(_)) => Err(McpError::resource_not_found(
                "Resource not found",
                Some(json!({ "uri": uri })),
            )),
            Err(e) => {
                tracing::error!(uri = %uri, error = %e, "resource read failed");
                Err(McpError::internal_error("failed to read diagram", None))
            }
        }
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        let listed: Vec<Value> = prompts::PROMPTS
            .iter()
            .map(|p| json!({ "name": p.name, "description": p.description, "arguments": [] }))
            .collect();
        from_wire(json!({ "prompts": listed }))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        let prompt = prompts::find(&request.name).ok_or_else(|| {
            McpError::invalid_params(format!("Unknown prompt: {}", request.name), None)
        })?;
        from_wire(json!({
            "description": prompt.description,
            "messages": [{
                "role": "user",
                "content": { "type": "text", "text": prompt.text },
            }]
        }))
    }
}
