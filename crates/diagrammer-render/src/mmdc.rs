// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Renderer adapter for the Mermaid CLI (`mmdc`).
//!
//! Each attempt gets its own scratch directory holding the input description
//! and the output image. The directory is removed when the attempt ends, on
//! every path including timeouts. The child process is killed if the attempt
//! future is dropped.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use diagrammer_config::RendererConfig;
use diagrammer_core::{
    AdapterType, DiagrammerError, HealthStatus, PluginAdapter, RenderConfig, RenderOutcome,
    RendererAdapter,
};
use regex::Regex;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

/// Chromium flags needed to run headless inside most containers.
pub const PUPPETEER_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
];

const MAX_MESSAGE_CHARS: usize = 2000;

static SYNTAX_ERROR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        concat!(
            r"(?i)(parse error|syntax error|lexical error|unexpected token|expecting\s",
            r"|no diagram type detected|unknowndiagramerror)",
        ),
    )
    .unwrap()
});

/// Runs `mmdc` as a subprocess for every render.
#[derive(Debug)]
pub struct MermaidCliRenderer {
    binary: String,
    timeout: Duration,
    work_dir: TempDir,
    puppeteer_config: Option<PathBuf>,
}

impl MermaidCliRenderer {
    /// Prepares a private scratch directory and, when sandboxing is
    /// disabled, the puppeteer config passed with `-p`.
    pub fn new(config: &RendererConfig) -> Result<Self, DiagrammerError> {
        let work_dir = tempfile::Builder::new()
            .prefix("diagrammer-render-")
            .tempdir()
            .map_err(DiagrammerError::storage)?;

        let puppeteer_config = if config.no_sandbox {
            let path = work_dir.path().join("puppeteer-config.json");
            let body = serde_json::json!({ "args": PUPPETEER_ARGS });
            std::fs::write(&path, body.to_string()).map_err(DiagrammerError::storage)?;
            Some(path)
        } else {
            None
        };

        Ok(Self {
            binary: config.binary.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            work_dir,
            puppeteer_config,
        })
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn args(&self, input: &Path, output: &Path, config: &RenderConfig) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            input.into(),
            "-o".into(),
            output.into(),
            "-t".into(),
            config.theme.to_string().into(),
            "-b".into(),
            config.background.to_string().into(),
        ];
        if !config.format.is_vector() {
            args.extend([
                "-s".into(),
                config.scale.to_string().into(),
                "-w".into(),
                config.width.to_string().into(),
            ]);
        }
        if let Some(path) = &self.puppeteer_config {
            args.extend(["-p".into(), path.into()]);
        }
        args
    }

    async fn attempt(
        &self,
        description: &str,
        config: &RenderConfig,
        attempt: u32,
    ) -> RenderOutcome {
        let scratch = match tempfile::Builder::new()
            .prefix("attempt-")
            .tempdir_in(self.work_dir.path())
        {
            Ok(dir) => dir,
            Err(e) => {
                return RenderOutcome::InfrastructureFailure {
                    reason: format!("failed to create scratch directory: {e}"),
                };
            }
        };
        let input = scratch.path().join("input.mmd");
        let output = scratch
            .path()
            .join(format!("output.{}", config.format.extension()));

        if let Err(e) = tokio::fs::write(&input, description).await {
            return RenderOutcome::InfrastructureFailure {
                reason: format!("failed to write renderer input: {e}"),
            };
        }

        let mut command = Command::new(&self.binary);
        command
            .args(self.args(&input, &output, config))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(binary = %self.binary, format = %config.format, "invoking renderer");

        let result = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                return RenderOutcome::InfrastructureFailure {
                    reason: format!(
                        "renderer timed out after {}s",
                        self.timeout.as_secs()
                    ),
                };
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return RenderOutcome::InfrastructureFailure {
                    reason: format!("renderer binary `{}` not found", self.binary),
                };
            }
            Ok(Err(e)) => {
                return RenderOutcome::InfrastructureFailure {
                    reason: format!("failed to start renderer: {e}"),
                };
            }
            Ok(Ok(result)) => result,
        };

        let paths = ScrubPaths {
            input: &input,
            output: &output,
            scratch: self.work_dir.path(),
        };

        if !result.status.success() {
            let raw = if result.stderr.is_empty() {
                String::from_utf8_lossy(&result.stdout)
            } else {
                String::from_utf8_lossy(&result.stderr)
            };
            let message = sanitize_message(&raw, &paths);
            return classify_failure(result.status.code(), message, attempt);
        }

        match tokio::fs::read(&output).await {
            Ok(bytes) if !bytes.is_empty() => RenderOutcome::Success { bytes },
            Ok(_) => RenderOutcome::InfrastructureFailure {
                reason: "renderer exited successfully but produced an empty image".to_string(),
            },
            Err(e) => RenderOutcome::InfrastructureFailure {
                reason: format!("renderer exited successfully but produced no image: {}", e.kind()),
            },
        }
    }
}

/// Decides whether a failed run was the description's fault.
///
/// Only a normal non-zero exit whose message matches a known parser error
/// counts as a syntax failure. Signals and unrecognised messages are
/// infrastructure failures.
fn classify_failure(exit_code: Option<i32>, message: String, attempt: u32) -> RenderOutcome {
    let message = if message.is_empty() {
        "renderer failed without output".to_string()
    } else {
        message
    };
    match exit_code {
        Some(_) if SYNTAX_ERROR_RE.is_match(&message) => {
            RenderOutcome::SyntaxFailure { message, attempt }
        }
        Some(code) => RenderOutcome::InfrastructureFailure {
            reason: format!("renderer exited with status {code}: {message}"),
        },
        None => RenderOutcome::InfrastructureFailure {
            reason: format!("renderer terminated by signal: {message}"),
        },
    }
}

struct ScrubPaths<'a> {
    input: &'a Path,
    output: &'a Path,
    scratch: &'a Path,
}

/// Strips internal paths and JavaScript stack frames from renderer output
/// and bounds its length.
fn sanitize_message(raw: &str, paths: &ScrubPaths<'_>) -> String {
    let mut text = raw.to_string();
    for (path, placeholder) in [
        (paths.input, "<input>"),
        (paths.output, "<output>"),
        (paths.scratch, "<tmp>"),
    ] {
        let path = path.to_string_lossy();
        if !path.is_empty() {
            text = text.replace(path.as_ref(), placeholder);
        }
    }

    let cleaned = text
        .lines()
        .filter(|line| !line.trim_start().starts_with("at "))
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() > MAX_MESSAGE_CHARS {
        let truncated: String = cleaned.chars().take(MAX_MESSAGE_CHARS).collect();
        format!("{truncated}...")
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl PluginAdapter for MermaidCliRenderer {
    fn name(&self) -> &str {
        "mmdc"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Renderer
    }

    /// Runs `<binary> --version`.
    async fn health_check(&self) -> Result<HealthStatus, DiagrammerError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let status = match tokio::time::timeout(Duration::from_secs(10), command.output()).await {
            Err(_) => HealthStatus::Unhealthy(format!("`{} --version` timed out", self.binary)),
            Ok(Err(e)) => HealthStatus::Unhealthy(format!("cannot run `{}`: {e}", self.binary)),
            Ok(Ok(out)) if out.status.success() => HealthStatus::Healthy,
            Ok(Ok(out)) => HealthStatus::Degraded(format!(
                "`{} --version` exited with {}",
                self.binary, out.status
            )),
        };
        Ok(status)
    }

    async fn shutdown(&self) -> Result<(), DiagrammerError> {
        Ok(())
    }
}

#[async_trait]
impl RendererAdapter for MermaidCliRenderer {
    async fn render(
        &self,
        description: &str,
        config: &RenderConfig,
        attempt: u32,
    ) -> RenderOutcome {
        let outcome = self.attempt(description, config, attempt).await;
        match &outcome {
            RenderOutcome::Success { bytes } => {
                debug!(size_bytes = bytes.len(), "renderer succeeded");
            }
            RenderOutcome::SyntaxFailure { message, attempt } => {
                debug!(attempt, error = %message, "renderer rejected description");
            }
            RenderOutcome::InfrastructureFailure { reason } => {
                warn!(reason = %reason, "renderer infrastructure failure");
            }
        }
        outcome
    }
}
