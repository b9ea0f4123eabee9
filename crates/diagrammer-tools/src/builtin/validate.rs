// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `validate_syntax`: classify a description without rendering it.

use async_trait::async_trait;
use diagrammer_core::DiagrammerError;
use diagrammer_render::classify;
use diagrammer_render::classifier::KNOWN_KEYWORDS;
use serde::Deserialize;
use serde_json::json;

use crate::tool::{Tool, ToolOutput};

#[derive(Debug, Deserialize)]
struct ValidateInput {
    #[serde(alias = "mermaid_code")]
    description: String,
}

/// Checks the leading type marker and reports structural metrics.
///
/// An unrecognised description is a normal result (`valid: false`), not a
/// tool error.
pub struct ValidateSyntaxTool {
    max_description_chars: usize,
}

impl ValidateSyntaxTool {
    pub fn new(max_description_chars: usize) -> Self {
        Self {
            max_description_chars,
        }
    }
}

#[async_trait]
impl Tool for ValidateSyntaxTool {
    fn name(&self) -> &str {
        "validate_syntax"
    }

    fn description(&self) -> &str {
        "Check a Mermaid description without rendering it. Returns whether the diagram \
         type is recognised, the detected type, node and line counts, and warnings."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "description": {
                    "type": "string",
                    "description": "Mermaid diagram source to check"
                }
            },
            "required": ["description"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, DiagrammerError> {
        let input: ValidateInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(e) => {
                return Ok(ToolOutput::failure(json!({
                    "valid": false,
                    "code": "validation_error",
                    "error": format!("invalid arguments: {e}"),
                })));
            }
        };

        let chars = input.description.chars().count();
        if chars > self.max_description_chars {
            return Ok(ToolOutput::failure(json!({
                "valid": false,
                "code": "validation_error",
                "error": format!(
                    "diagram description too large ({chars} chars, max {})",
                    self.max_description_chars
                ),
            })));
        }

        let result = classify(&input.description);
        tracing::debug!(
            valid = result.valid,
            diagram_type = %result.diagram_type_name(),
            node_count = result.node_count,
            "validated description"
        );

        let mut content = serde_json::to_value(&result)
            .map_err(|e| DiagrammerError::Internal(format!("serialize classification: {e}")))?;
        if let (false, Some(obj)) = (result.valid, content.as_object_mut()) {
            obj.insert(
                "suggestion".to_string(),
                json!(format!(
                    "Start the description with a diagram type keyword: {}",
                    KNOWN_KEYWORDS.join(", ")
                )),
            );
        }
        Ok(ToolOutput::success(content))
    }
}
