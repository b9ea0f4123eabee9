// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as ranges, URL schemes, and auth consistency.

use diagrammer_core::types::{SCALE_RANGE, WIDTH_RANGE};

use crate::diagnostic::ConfigError;
use crate::model::DiagrammerConfig;

/// Upper bound on `renderer.max_retry_attempts`.
pub const MAX_RETRY_ATTEMPTS_LIMIT: u32 = 20;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DiagrammerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    let base = config.server.public_base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        fail(format!(
            "server.public_base_url must start with http:// or https://, got `{base}`"
        ));
    }

    if config.renderer.binary.trim().is_empty() {
        fail("renderer.binary must not be empty".to_string());
    }

    if config.renderer.timeout_secs == 0 {
        fail("renderer.timeout_secs must be at least 1".to_string());
    }

    let attempts = config.renderer.max_retry_attempts;
    if attempts == 0 || attempts > MAX_RETRY_ATTEMPTS_LIMIT {
        fail(format!(
            "renderer.max_retry_attempts must be between 1 and {MAX_RETRY_ATTEMPTS_LIMIT}, \
             got {attempts}"
        ));
    }

    if config.diagrams.output_dir.trim().is_empty() {
        fail("diagrams.output_dir must not be empty".to_string());
    }

    if config.diagrams.max_diagram_size == 0 {
        fail("diagrams.max_diagram_size must be at least 1".to_string());
    }

    if !SCALE_RANGE.contains(&config.diagrams.default_scale) {
        fail(format!(
            "diagrams.default_scale must be between {} and {}, got {}",
            SCALE_RANGE.start(),
            SCALE_RANGE.end(),
            config.diagrams.default_scale
        ));
    }

    if !WIDTH_RANGE.contains(&config.diagrams.default_width) {
        fail(format!(
            "diagrams.default_width must be between {} and {}, got {}",
            WIDTH_RANGE.start(),
            WIDTH_RANGE.end(),
            config.diagrams.default_width
        ));
    }

    if config.diagrams.cleanup_after_hours > 0 && config.diagrams.sweep_interval_secs == 0 {
        fail("diagrams.sweep_interval_secs must be at least 1 when cleanup is enabled".to_string());
    }

    if config.auth.enabled
        && config
            .auth
            .token
            .as_deref()
            .is_none_or(|t| t.trim().is_empty())
    {
        fail("auth.enabled is true but auth.token is not set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
