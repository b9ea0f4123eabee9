// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Diagrammer service.

use thiserror::Error;

/// The primary error type shared by every Diagrammer crate.
///
/// Each variant maps to a stable [`code`](DiagrammerError::code) so tool
/// callers can tell "the diagram is wrong" apart from "the service is broken".
#[derive(Debug, Error)]
pub enum DiagrammerError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed or oversized request, caught before the renderer runs.
    #[error("validation error: {0}")]
    Validation(String),

    /// The renderer rejected the description on every allowed attempt.
    #[error("diagram syntax error after {attempts} attempt(s): {message}")]
    Syntax { message: String, attempts: u32 },

    /// The renderer could not run, crashed, or produced nothing usable.
    #[error("renderer unavailable: {message}")]
    Infrastructure {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unknown artifact identifier.
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or invalid access token.
    #[error("unauthorized")]
    Unauthorized,

    /// Artifact storage errors (filesystem I/O).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DiagrammerError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Validation(_) => "validation_error",
            Self::Syntax { .. } => "syntax_error",
            Self::Infrastructure { .. } => "infrastructure_error",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Storage { .. } => "storage_error",
            Self::Timeout { .. } => "timeout",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the failure is attributable to the caller's input.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Syntax { .. })
    }

    /// Wraps an I/O error as a storage error.
    pub fn storage(err: std::io::Error) -> Self {
        Self::Storage {
            source: Box::new(err),
        }
    }
}
