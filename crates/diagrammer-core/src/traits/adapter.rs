// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that pluggable components implement.

use async_trait::async_trait;

use crate::error::DiagrammerError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for Diagrammer adapters.
///
/// Provides identity, lifecycle, and health check capabilities so the binary
/// can report on every component the same way.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the type of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, DiagrammerError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), DiagrammerError>;
}
