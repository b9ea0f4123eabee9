// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `list_diagram_types`: the supported diagram catalog.

use async_trait::async_trait;
use diagrammer_core::DiagrammerError;
use diagrammer_render::catalog;
use serde_json::json;

use crate::tool::{Tool, ToolOutput};

pub struct ListDiagramTypesTool;

#[async_trait]
impl Tool for ListDiagramTypesTool {
    fn name(&self) -> &str {
        "list_diagram_types"
    }

    fn description(&self) -> &str {
        "List the supported Mermaid diagram types, each with a short description and a \
         working example."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, _input: serde_json::Value) -> Result<ToolOutput, DiagrammerError> {
        let types = catalog();
        Ok(ToolOutput::success(json!({
            "diagram_types": types,
            "total_count": types.len(),
        })))
    }
}
