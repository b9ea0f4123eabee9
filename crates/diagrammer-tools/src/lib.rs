// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool-call boundary for the Diagrammer service.
//!
//! The [`Tool`] trait is what the protocol dispatcher invokes; the
//! [`builtin`] module provides `generate_diagram`, `validate_syntax` and
//! `list_diagram_types`.

pub mod builtin;
pub mod tool;

pub use builtin::{
    GenerateDiagramTool, ImageLinks, ListDiagramTypesTool, RequestDefaults, ValidateSyntaxTool,
    register_builtins,
};
pub use tool::{Tool, ToolOutput, ToolRegistry};
