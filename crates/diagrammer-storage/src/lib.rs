// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifact persistence for the Diagrammer service.
//!
//! Rendered images live as plain files under one root directory. The
//! [`ArtifactStore`] owns identity allocation and the metadata index; the
//! [`RetentionSweeper`] reclaims artifacts once they age out.

pub mod id;
pub mod store;
pub mod sweeper;

pub use store::ArtifactStore;
pub use sweeper::{RetentionSweeper, SweepReport};
