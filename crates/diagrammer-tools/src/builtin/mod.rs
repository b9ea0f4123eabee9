// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in diagram tools.

pub mod generate;
pub mod list_types;
pub mod validate;

pub use generate::{GenerateDiagramTool, ImageLinks, RequestDefaults};
pub use list_types::ListDiagramTypesTool;
pub use validate::ValidateSyntaxTool;

use std::sync::Arc;

use diagrammer_render::DiagramGenerator;

use crate::ToolRegistry;

/// Registers `generate_diagram`, `validate_syntax` and `list_diagram_types`.
pub fn register_builtins(
    registry: &mut ToolRegistry,
    generator: Arc<DiagramGenerator>,
    defaults: RequestDefaults,
    links: ImageLinks,
) {
    let max_chars = generator.max_description_chars();
    registry.register(Arc::new(GenerateDiagramTool::new(generator, defaults, links)));
    registry.register(Arc::new(ValidateSyntaxTool::new(max_chars)));
    registry.register(Arc::new(ListDiagramTypesTool));
}
