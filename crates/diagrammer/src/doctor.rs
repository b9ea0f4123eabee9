// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `diagrammer doctor` command implementation.
//!
//! Checks that the renderer can run, the output directory is writable and
//! the delivery settings are sensible.

use std::io::IsTerminal;
use std::net::IpAddr;
use std::path::Path;
use std::time::{Duration, Instant};

use diagrammer_config::DiagrammerConfig;
use diagrammer_core::{DiagrammerError, HealthStatus, PluginAdapter};
use diagrammer_render::MermaidCliRenderer;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `diagrammer doctor` command.
///
/// Configuration has already been loaded and validated by the time this
/// runs. Returns an error when any check fails.
pub async fn run_doctor(config: &DiagrammerConfig, plain: bool) -> Result<(), DiagrammerError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        CheckResult::new("Configuration", CheckStatus::Pass, "valid", Instant::now()),
        check_renderer(config).await,
        check_output_dir(Path::new(&config.diagrams.output_dir)).await,
        check_auth(config),
        check_retention(config),
    ];

    println!();
    println!("  diagrammer doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", format_line(result, use_color));
    }

    println!();
    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    if fail_count > 0 {
        return Err(DiagrammerError::Internal(format!(
            "{fail_count} check(s) failed"
        )));
    }
    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!("    {symbol} {:<16} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<16} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Runs `<binary> --version`.
async fn check_renderer(config: &DiagrammerConfig) -> CheckResult {
    let start = Instant::now();
    let renderer = match MermaidCliRenderer::new(&config.renderer) {
        Ok(r) => r,
        Err(e) => return CheckResult::new("Renderer", CheckStatus::Fail, e.to_string(), start),
    };
    match renderer.health_check().await {
        Ok(HealthStatus::Healthy) => CheckResult::new(
            "Renderer",
            CheckStatus::Pass,
            format!("`{}` runs", renderer.binary()),
            start,
        ),
        Ok(HealthStatus::Degraded(msg)) => {
            CheckResult::new("Renderer", CheckStatus::Warn, msg, start)
        }
        Ok(HealthStatus::Unhealthy(msg)) => {
            CheckResult::new("Renderer", CheckStatus::Fail, msg, start)
        }
        Err(e) => CheckResult::new("Renderer", CheckStatus::Fail, e.to_string(), start),
    }
}

/// Creates the directory if needed and writes a scratch file.
async fn check_output_dir(dir: &Path) -> CheckResult {
    let start = Instant::now();
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        return CheckResult::new(
            "Output dir",
            CheckStatus::Fail,
            format!("cannot create {}: {e}", dir.display()),
            start,
        );
    }

    let scratch = dir.join(format!(".doctor-scratch-{}", std::process::id()));
    let written = tokio::fs::write(&scratch, b"scratch").await;
    let _ = tokio::fs::remove_file(&scratch).await;
    match written {
        Ok(()) => CheckResult::new(
            "Output dir",
            CheckStatus::Pass,
            format!("{} writable", dir.display()),
            start,
        ),
        Err(e) => CheckResult::new(
            "Output dir",
            CheckStatus::Fail,
            format!("{} not writable: {e}", dir.display()),
            start,
        ),
    }
}

fn check_auth(config: &DiagrammerConfig) -> CheckResult {
    let start = Instant::now();
    if config.auth.effective_token().is_some() {
        return CheckResult::new("Delivery auth", CheckStatus::Pass, "token required", start);
    }
    let loopback = config
        .server
        .host
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(config.server.host == "localhost");
    if loopback {
        CheckResult::new(
            "Delivery auth",
            CheckStatus::Pass,
            "disabled (loopback only)",
            start,
        )
    } else {
        CheckResult::new(
            "Delivery auth",
            CheckStatus::Warn,
            format!("disabled while listening on {}", config.server.host),
            start,
        )
    }
}

fn check_retention(config: &DiagrammerConfig) -> CheckResult {
    let start = Instant::now();
    match config.diagrams.cleanup_after_hours {
        0 => CheckResult::new(
            "Retention",
            CheckStatus::Warn,
            "cleanup disabled, storage grows without bound",
            start,
        ),
        hours => CheckResult::new(
            "Retention",
            CheckStatus::Pass,
            format!(
                "artifacts removed after {hours}h (checked every {}s)",
                config.diagrams.sweep_interval_secs
            ),
            start,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn output_dir_check_creates_and_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("diagrams");
        let result = check_output_dir(&out).await;
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_renderer_fails() {
        let mut config = DiagrammerConfig::default();
        config.renderer.binary = "/nonexistent/diagrammer-mmdc".to_string();
        config.renderer.no_sandbox = false;
        assert_eq!(check_renderer(&config).await.status, CheckStatus::Fail);
    }

    #[test]
    fn public_bind_without_auth_warns() {
        let mut config = DiagrammerConfig::default();
        assert_eq!(check_auth(&config).status, CheckStatus::Pass);

        config.server.host = "0.0.0.0".to_string();
        assert_eq!(check_auth(&config).status, CheckStatus::Warn);

        config.auth.enabled = true;
        config.auth.token = Some("s3cret".to_string());
        assert_eq!(check_auth(&config).status, CheckStatus::Pass);
    }

    #[test]
    fn disabled_retention_warns() {
        let mut config = DiagrammerConfig::default();
        assert_eq!(check_retention(&config).status, CheckStatus::Pass);
        config.diagrams.cleanup_after_hours = 0;
        assert_eq!(check_retention(&config).status, CheckStatus::Warn);
    }

    #[test]
    fn plain_lines_are_tagged() {
        let result = CheckResult::new("Renderer", CheckStatus::Fail, "missing", Instant::now());
        let line = format_line(&result, false);
        assert!(line.contains("[FAIL]"));
        assert!(line.contains("missing"));
    }
}
