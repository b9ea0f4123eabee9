// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `generate_diagram`: render a description and return a delivery URL.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use diagrammer_config::DiagramsConfig;
use diagrammer_core::types::{SCALE_RANGE, WIDTH_RANGE};
use diagrammer_core::{
    Artifact, Background, DiagramFormat, DiagramRequest, DiagrammerError, RenderConfig, Theme,
};
use diagrammer_render::{DiagramGenerator, GenerationError, suggestion_for};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde_json::json;

use crate::tool::{Tool, ToolOutput};

/// Values used when a request leaves a parameter out.
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub format: DiagramFormat,
    pub theme: Theme,
    pub background: Background,
    pub scale: u8,
    pub width: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        let config = RenderConfig::default();
        Self {
            format: config.format,
            theme: config.theme,
            background: config.background,
            scale: config.scale,
            width: config.width,
        }
    }
}

impl From<&DiagramsConfig> for RequestDefaults {
    fn from(config: &DiagramsConfig) -> Self {
        Self {
            format: config.default_format,
            theme: config.default_theme,
            background: config.default_background,
            scale: config.default_scale,
            width: config.default_width,
        }
    }
}

/// Builds public image URLs for stored artifacts.
#[derive(Clone)]
pub struct ImageLinks {
    base_url: String,
    token: Option<String>,
}

impl ImageLinks {
    /// `token` is appended as `?token=` when present, so the URL works in
    /// clients that cannot send headers.
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
        }
    }

    pub fn url(&self, file_name: &str) -> String {
        match &self.token {
            Some(token) => format!(
                "{}/diagrams/{file_name}?token={}",
                self.base_url,
                utf8_percent_encode(token, NON_ALPHANUMERIC)
            ),
            None => format!("{}/diagrams/{file_name}", self.base_url),
        }
    }
}

impl std::fmt::Debug for ImageLinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLinks")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateInput {
    #[serde(alias = "mermaid_code")]
    description: String,
    #[serde(default, alias = "output_format")]
    format: Option<String>,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    background: Option<String>,
    #[serde(default)]
    scale: Option<i64>,
    #[serde(default)]
    width: Option<i64>,
}

/// Renders a diagram through the retry orchestrator.
pub struct GenerateDiagramTool {
    generator: Arc<DiagramGenerator>,
    defaults: RequestDefaults,
    links: ImageLinks,
}

impl GenerateDiagramTool {
    pub fn new(
        generator: Arc<DiagramGenerator>,
        defaults: RequestDefaults,
        links: ImageLinks,
    ) -> Self {
        Self {
            generator,
            defaults,
            links,
        }
    }

    fn build_request(&self, input: GenerateInput) -> Result<DiagramRequest, String> {
        let format = pick(
            input.format.as_deref(),
            self.defaults.format,
            "format",
            "svg, png or pdf",
        )?;
        let theme = pick(
            input.theme.as_deref(),
            self.defaults.theme,
            "theme",
            "default, dark, forest or neutral",
        )?;
        let background = pick(
            input.background.as_deref(),
            self.defaults.background,
            "background",
            "white or transparent",
        )?;

        let scale = match input.scale {
            None => self.defaults.scale,
            Some(s) => u8::try_from(s)
                .ok()
                .filter(|s| SCALE_RANGE.contains(s))
                .ok_or_else(|| {
                    format!(
                        "scale must be between {} and {}, got {s}",
                        SCALE_RANGE.start(),
                        SCALE_RANGE.end()
                    )
                })?,
        };
        let width = match input.width {
            None => self.defaults.width,
            Some(w) => u32::try_from(w)
                .ok()
                .filter(|w| WIDTH_RANGE.contains(w))
                .ok_or_else(|| {
                    format!(
                        "width must be between {} and {} pixels, got {w}",
                        WIDTH_RANGE.start(),
                        WIDTH_RANGE.end()
                    )
                })?,
        };

        Ok(DiagramRequest::new(
            input.description,
            RenderConfig {
                format,
                theme,
                background,
                scale,
                width,
            },
        ))
    }

    fn success(&self, artifact: &Artifact) -> ToolOutput {
        let file_name = artifact.file_name();
        ToolOutput::success(json!({
            "success": true,
            "message": format!(
                "Generated {} diagram ({} bytes)",
                artifact.format.extension().to_uppercase(),
                artifact.size_bytes
            ),
            "image_url": self.links.url(&file_name),
            "file_name": file_name,
            "format": artifact.format,
            "size_bytes": artifact.size_bytes,
        }))
    }

    fn failure(&self, err: &GenerationError) -> ToolOutput {
        let max_attempts = self.generator.max_attempts();
        let body = match err {
            GenerationError::Validation(message) => json!({
                "success": false,
                "error": message,
                "code": err.code(),
                "suggestion": validation_suggestion(message),
            }),
            GenerationError::ExhaustedRetries {
                attempts,
                last_error,
            } => json!({
                "success": false,
                "error": last_error,
                "code": err.code(),
                "suggestion": suggestion_for(last_error),
                "attempt": attempts,
                "max_attempts": max_attempts,
            }),
            GenerationError::Aborted { attempt, reason } => json!({
                "success": false,
                "error": reason,
                "code": err.code(),
                "suggestion": suggestion_for(reason),
                "attempt": attempt,
                "max_attempts": max_attempts,
            }),
            GenerationError::Storage(_) => json!({
                "success": false,
                "error": "failed to store the rendered diagram",
                "code": err.code(),
                "suggestion": "The service could not write the image. Try again later.",
            }),
        };
        ToolOutput::failure(body)
    }

    fn invalid_request(message: String) -> ToolOutput {
        ToolOutput::failure(json!({
            "success": false,
            "code": "validation_error",
            "suggestion": validation_suggestion(&message),
            "error": message,
        }))
    }
}

/// Parses an optional enum parameter, falling back to `default` when the
/// value is absent or blank.
fn pick<T: FromStr>(
    value: Option<&str>,
    default: T,
    name: &str,
    allowed: &str,
) -> Result<T, String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => T::from_str(v).map_err(|_| format!("invalid {name} `{v}`; use {allowed}")),
    }
}

fn validation_suggestion(message: &str) -> &'static str {
    if message.contains("empty") {
        "Provide diagram syntax, for example: graph TD\n    A[Start] --> B[End]"
    } else if message.contains("too large") {
        "Simplify the diagram or split it into multiple diagrams."
    } else if message.contains("scale") || message.contains("width") {
        "Use scale 1-3 and width 800-3200; both only affect png and pdf output."
    } else {
        "Check the request parameters against the tool's input schema."
    }
}

#[async_trait]
impl Tool for GenerateDiagramTool {
    fn name(&self) -> &str {
        "generate_diagram"
    }

    fn description(&self) -> &str {
        "Render a Mermaid diagram description to svg, png or pdf and return a URL to the image. \
         Syntax errors are retried up to the configured attempt limit and reported with the \
         renderer's message and a suggestion."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "description": {
                    "type": "string",
                    "description": "Mermaid diagram source, e.g. \"graph TD; A-->B\""
                },
                "format": {
                    "type": "string",
                    "enum": ["svg", "png", "pdf"],
                    "description": "Output format (defaults to the configured format)"
                },
                "theme": {
                    "type": "string",
                    "enum": ["default", "dark", "forest", "neutral"]
                },
                "background": {
                    "type": "string",
                    "enum": ["white", "transparent"]
                },
                "scale": {
                    "type": "integer",
                    "minimum": SCALE_RANGE.start(),
                    "maximum": SCALE_RANGE.end(),
                    "description": "Raster scale factor (png/pdf only)"
                },
                "width": {
                    "type": "integer",
                    "minimum": WIDTH_RANGE.start(),
                    "maximum": WIDTH_RANGE.end(),
                    "description": "Raster width in pixels (png/pdf only)"
                }
            },
            "required": ["description"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, DiagrammerError> {
        let input: GenerateInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(e) => return Ok(Self::invalid_request(format!("invalid arguments: {e}"))),
        };
        let request = match self.build_request(input) {
            Ok(request) => request,
            Err(message) => return Ok(Self::invalid_request(message)),
        };

        tracing::info!(
            format = %request.config.format,
            theme = %request.config.theme,
            chars = request.description.chars().count(),
            "generating diagram"
        );

        match self.generator.generate(&request).await {
            Ok(artifact) => Ok(self.success(&artifact)),
            Err(e) => {
                if let GenerationError::Storage(source) = &e {
                    tracing::error!(error = %source, "rendered diagram could not be stored");
                }
                Ok(self.failure(&e))
            }
        }
    }
}
