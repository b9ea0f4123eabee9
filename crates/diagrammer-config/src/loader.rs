// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./diagrammer.toml` > `~/.config/diagrammer/diagrammer.toml`
//! > `/etc/diagrammer/diagrammer.toml` with environment variable overrides via
//! the `DIAGRAMMER_` prefix.

// figment::Error is external and cannot be boxed without a wrapper.
#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DiagrammerConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/diagrammer/diagrammer.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "diagrammer.toml";

/// Per-user config file under the XDG config directory.
pub fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("diagrammer/diagrammer.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/diagrammer/diagrammer.toml` (system-wide)
/// 3. `~/.config/diagrammer/diagrammer.toml` (user XDG config)
/// 4. `./diagrammer.toml` (local directory)
/// 5. `DIAGRAMMER_*` environment variables
pub fn load_config() -> Result<DiagrammerConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<DiagrammerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DiagrammerConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DiagrammerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DiagrammerConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DiagrammerConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `DIAGRAMMER_RENDERER_MAX_RETRY_ATTEMPTS` must map to
/// `renderer.max_retry_attempts`, not `renderer.max.retry.attempts`.
fn env_provider() -> Env {
    Env::prefixed("DIAGRAMMER_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("server_", "server.", 1)
            .replacen("renderer_", "renderer.", 1)
            .replacen("diagrams_", "diagrams.", 1)
            .replacen("auth_", "auth.", 1);
        mapped.into()
    })
}
