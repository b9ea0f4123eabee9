// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Diagrammer service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use diagrammer_core::types::{DEFAULT_SCALE, DEFAULT_WIDTH};
use diagrammer_core::{Background, DiagramFormat, Theme};
use serde::{Deserialize, Serialize};

/// Top-level Diagrammer configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiagrammerConfig {
    /// HTTP listener and public URL settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// External renderer settings.
    #[serde(default)]
    pub renderer: RendererConfig,

    /// Artifact defaults, limits and retention.
    #[serde(default)]
    pub diagrams: DiagramsConfig,

    /// Delivery authentication.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL used to build the `image_url` returned to callers.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: default_public_base_url(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8401
}

fn default_public_base_url() -> String {
    "http://localhost:8401".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// How a description is adjusted between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepairMode {
    /// Retry with the description unchanged.
    None,
    /// Strip code fences, BOM, smart quotes and stray whitespace.
    #[default]
    Sanitize,
}

/// External renderer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RendererConfig {
    /// Renderer executable name or path.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Wall-clock limit for a single render attempt.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum render attempts per generation request.
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    /// Repair strategy applied between attempts.
    #[serde(default)]
    pub repair: RepairMode,

    /// Launch the headless browser without its sandbox (needed in most containers).
    #[serde(default = "default_no_sandbox")]
    pub no_sandbox: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            timeout_secs: default_timeout_secs(),
            max_retry_attempts: default_max_retry_attempts(),
            repair: RepairMode::default(),
            no_sandbox: default_no_sandbox(),
        }
    }
}

fn default_binary() -> String {
    "mmdc".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retry_attempts() -> u32 {
    5
}

fn default_no_sandbox() -> bool {
    true
}

/// Artifact defaults, limits and retention.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiagramsConfig {
    /// Directory holding rendered artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum description length in characters.
    #[serde(default = "default_max_diagram_size")]
    pub max_diagram_size: usize,

    /// Format used when a request does not name one.
    #[serde(default)]
    pub default_format: DiagramFormat,

    /// Theme used when a request does not name one.
    #[serde(default)]
    pub default_theme: Theme,

    /// Background used when a request does not name one.
    #[serde(default)]
    pub default_background: Background,

    /// Raster scale used when a request does not name one.
    #[serde(default = "default_scale")]
    pub default_scale: u8,

    /// Raster width used when a request does not name one.
    #[serde(default = "default_width")]
    pub default_width: u32,

    /// Age after which artifacts are deleted. `0` disables cleanup.
    #[serde(default = "default_cleanup_after_hours")]
    pub cleanup_after_hours: u64,

    /// How often the retention sweeper runs.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_diagram_size: default_max_diagram_size(),
            default_format: DiagramFormat::default(),
            default_theme: Theme::default(),
            default_background: Background::default(),
            default_scale: default_scale(),
            default_width: default_width(),
            cleanup_after_hours: default_cleanup_after_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_output_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("diagrammer").join("diagrams"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "diagrams".to_string())
}

fn default_max_diagram_size() -> usize {
    50_000
}

fn default_scale() -> u8 {
    DEFAULT_SCALE
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_cleanup_after_hours() -> u64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

/// Delivery authentication configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Require a token before serving artifacts.
    #[serde(default)]
    pub enabled: bool,

    /// Process-wide shared secret.
    #[serde(default)]
    pub token: Option<String>,
}

impl AuthConfig {
    /// The secret to enforce, or `None` when auth is disabled.
    pub fn effective_token(&self) -> Option<&str> {
        if self.enabled {
            self.token.as_deref().filter(|t| !t.is_empty())
        } else {
            None
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_debug_redacts_token() {
        let auth = AuthConfig {
            enabled: true,
            token: Some("hunter2".into()),
        };
        let debug = format!("{auth:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn effective_token_requires_enabled_flag() {
        let mut auth = AuthConfig {
            enabled: false,
            token: Some("secret".into()),
        };
        assert_eq!(auth.effective_token(), None);
        auth.enabled = true;
        assert_eq!(auth.effective_token(), Some("secret"));
    }

    #[test]
    fn repair_mode_parses_lowercase() {
        let cfg: RendererConfig = toml::from_str("repair = \"none\"").unwrap();
        assert_eq!(cfg.repair, RepairMode::None);
        let cfg: RendererConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.repair, RepairMode::Sanitize);
    }

    #[test]
    fn diagram_defaults_parse_from_strings() {
        let cfg: DiagramsConfig = toml::from_str(
            r#"
default_format = "png"
default_theme = "forest"
default_background = "transparent"
"#,
        )
        .unwrap();
        assert_eq!(cfg.default_format, DiagramFormat::Png);
        assert_eq!(cfg.default_theme, Theme::Forest);
        assert_eq!(cfg.default_background, Background::Transparent);
    }
}
