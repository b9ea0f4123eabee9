// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the renderer, artifact store, gateway and tools.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString};

use crate::error::DiagrammerError;

/// Accepted raster scale factors.
pub const SCALE_RANGE: RangeInclusive<u8> = 1..=3;

/// Accepted raster widths in pixels.
pub const WIDTH_RANGE: RangeInclusive<u32> = 800..=3200;

/// Default raster scale factor (balanced quality).
pub const DEFAULT_SCALE: u8 = 2;

/// Default raster width in pixels.
pub const DEFAULT_WIDTH: u32 = 1600;

/// Output image format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DiagramFormat {
    #[default]
    Svg,
    Png,
    Pdf,
}

impl DiagramFormat {
    /// File extension, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }

    /// HTTP media type for delivery.
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    /// Vector formats ignore scale and width.
    pub fn is_vector(self) -> bool {
        matches!(self, Self::Svg)
    }

    /// Resolves a format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Renderer colour theme.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Dark,
    Forest,
    Neutral,
}

/// Image background.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    #[default]
    White,
    Transparent,
}

/// Diagram families recognised by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum DiagramKind {
    #[strum(serialize = "flowchart")]
    #[serde(rename = "flowchart")]
    Flowchart,
    #[strum(serialize = "sequenceDiagram")]
    #[serde(rename = "sequenceDiagram")]
    Sequence,
    #[strum(serialize = "classDiagram")]
    #[serde(rename = "classDiagram")]
    Class,
    #[strum(serialize = "erDiagram")]
    #[serde(rename = "erDiagram")]
    Er,
    #[strum(serialize = "stateDiagram")]
    #[serde(rename = "stateDiagram")]
    State,
    #[strum(serialize = "gantt")]
    #[serde(rename = "gantt")]
    Gantt,
    #[strum(serialize = "pie")]
    #[serde(rename = "pie")]
    Pie,
    #[strum(serialize = "gitGraph")]
    #[serde(rename = "gitGraph")]
    GitGraph,
}

/// Renderer parameters for a single diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub format: DiagramFormat,
    pub theme: Theme,
    pub background: Background,
    /// Raster scale factor. Ignored for vector output.
    pub scale: u8,
    /// Raster width in pixels. Ignored for vector output.
    pub width: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: DiagramFormat::default(),
            theme: Theme::default(),
            background: Background::default(),
            scale: DEFAULT_SCALE,
            width: DEFAULT_WIDTH,
        }
    }
}

impl RenderConfig {
    /// Range-checks scale and width. Applies to vector formats too, so the
    /// API behaves the same regardless of format.
    pub fn validate(&self) -> Result<(), DiagrammerError> {
        if !SCALE_RANGE.contains(&self.scale) {
            return Err(DiagrammerError::Validation(format!(
                "scale must be between {} and {}, got {}",
                SCALE_RANGE.start(),
                SCALE_RANGE.end(),
                self.scale
            )));
        }
        if !WIDTH_RANGE.contains(&self.width) {
            return Err(DiagrammerError::Validation(format!(
                "width must be between {} and {} pixels, got {}",
                WIDTH_RANGE.start(),
                WIDTH_RANGE.end(),
                self.width
            )));
        }
        Ok(())
    }
}

/// A request to render a diagram description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramRequest {
    pub description: String,
    #[serde(flatten)]
    pub config: RenderConfig,
}

impl DiagramRequest {
    pub fn new(description: impl Into<String>, config: RenderConfig) -> Self {
        Self {
            description: description.into(),
            config,
        }
    }

    /// Checks the request before any renderer invocation.
    ///
    /// `max_chars` bounds the description length in characters.
    pub fn validate(&self, max_chars: usize) -> Result<(), DiagrammerError> {
        if self.description.trim().is_empty() {
            return Err(DiagrammerError::Validation(
                "diagram description is empty".to_string(),
            ));
        }
        let len = self.description.chars().count();
        if len > max_chars {
            return Err(DiagrammerError::Validation(format!(
                "diagram description too large ({len} chars, max {max_chars})"
            )));
        }
        self.config.validate()
    }
}

/// Result of a single renderer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Image bytes were produced.
    Success { bytes: Vec<u8> },
    /// The renderer rejected the description on the given 1-based attempt.
    SyntaxFailure { message: String, attempt: u32 },
    /// The renderer could not run, timed out, or crashed.
    InfrastructureFailure { reason: String },
}

impl RenderOutcome {
    /// Size of the produced image, zero for failures.
    pub fn byte_count(&self) -> usize {
        match self {
            Self::Success { bytes } => bytes.len(),
            _ => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Opaque artifact identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId(pub String);

impl ArtifactId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rendered image tracked by the artifact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub format: DiagramFormat,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    /// Storage location. Never exposed to callers.
    #[serde(skip)]
    pub path: PathBuf,
}

impl Artifact {
    /// Public file name, `<id>.<ext>`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.format.extension())
    }
}

/// Output of the classifier. A pure function of the description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub valid: bool,
    #[serde(serialize_with = "serialize_kind")]
    pub diagram_type: Option<DiagramKind>,
    /// Best-effort count of distinct node identifiers.
    pub node_count: usize,
    pub line_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ClassificationResult {
    /// Diagram type name, or `"unknown"`.
    pub fn diagram_type_name(&self) -> String {
        self.diagram_type
            .map(|k| k.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn serialize_kind<S: Serializer>(kind: &Option<DiagramKind>, s: S) -> Result<S::Ok, S::Error> {
    match kind {
        Some(k) => k.serialize(s),
        None => s.serialize_str("unknown"),
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Renderer,
    Storage,
    Gateway,
}
