// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering pipeline for the Diagrammer service.
//!
//! - [`classifier`]: renderer-free type detection and structural metrics.
//! - [`mmdc`]: the `mmdc` subprocess adapter.
//! - [`repair`]: strategies applied to a description between attempts.
//! - [`retry`]: the orchestrator tying renderer, repair and store together.

pub mod classifier;
pub mod mmdc;
pub mod repair;
pub mod retry;
pub mod suggest;

pub use classifier::{DiagramTypeInfo, catalog, classify};
pub use mmdc::MermaidCliRenderer;
pub use repair::{NoRepair, RepairStrategy, SanitizeRepair};
pub use retry::{DiagramGenerator, GenerationError};
pub use suggest::suggestion_for;
