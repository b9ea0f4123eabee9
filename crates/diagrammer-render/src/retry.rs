// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry orchestrator: render, repair and retry on syntax failures, store
//! on success.
//!
//! ```text
//! Attempting(n) --Success--------------------------> Succeeded
//! Attempting(n) --SyntaxFailure, n < max-----------> Attempting(n + 1)
//! Attempting(n) --SyntaxFailure, n == max----------> ExhaustedRetries
//! Attempting(n) --InfrastructureFailure------------> Aborted
//! ```

use std::sync::Arc;

use diagrammer_core::{Artifact, DiagramRequest, DiagrammerError, RenderOutcome, RendererAdapter};
use diagrammer_storage::ArtifactStore;
use thiserror::Error;
use tracing::{info, warn};

use crate::repair::{NoRepair, RepairStrategy};

/// Why a generation request produced no artifact.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The request was rejected before the renderer ran.
    #[error("{0}")]
    Validation(String),

    /// Every allowed attempt ended in a syntax failure.
    #[error("diagram syntax error after {attempts} attempt(s): {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },

    /// The renderer could not run. Never retried.
    #[error("renderer unavailable: {reason}")]
    Aborted { attempt: u32, reason: String },

    /// The image rendered but could not be stored.
    #[error("failed to store artifact: {0}")]
    Storage(#[source] DiagrammerError),
}

impl GenerationError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::ExhaustedRetries { .. } => "syntax_error",
            Self::Aborted { .. } => "infrastructure_error",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Render attempts made before giving up, if the renderer ran at all.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::ExhaustedRetries { attempts, .. } => Some(*attempts),
            Self::Aborted { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }
}

impl From<GenerationError> for DiagrammerError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Validation(message) => DiagrammerError::Validation(message),
            GenerationError::ExhaustedRetries {
                attempts,
                last_error,
            } => DiagrammerError::Syntax {
                message: last_error,
                attempts,
            },
            GenerationError::Aborted { reason, .. } => DiagrammerError::Infrastructure {
                message: reason,
                source: None,
            },
            GenerationError::Storage(e) => e,
        }
    }
}

enum AttemptState {
    Attempting(u32),
    Succeeded { attempt: u32, bytes: Vec<u8> },
    ExhaustedRetries { attempts: u32, last_error: String },
    Aborted { attempt: u32, reason: String },
}

/// Drives a renderer through bounded attempts and stores the result.
///
/// Holds no per-request state, so one instance serves concurrent requests.
pub struct DiagramGenerator {
    renderer: Arc<dyn RendererAdapter>,
    store: Arc<ArtifactStore>,
    repair: Arc<dyn RepairStrategy>,
    max_attempts: u32,
    max_description_chars: usize,
}

impl DiagramGenerator {
    pub fn new(
        renderer: Arc<dyn RendererAdapter>,
        store: Arc<ArtifactStore>,
        max_attempts: u32,
        max_description_chars: usize,
    ) -> Self {
        Self {
            renderer,
            store,
            repair: Arc::new(NoRepair),
            max_attempts: max_attempts.max(1),
            max_description_chars,
        }
    }

    /// Replaces the repair strategy (bare retry by default).
    pub fn with_repair(mut self, repair: Arc<dyn RepairStrategy>) -> Self {
        self.repair = repair;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn max_description_chars(&self) -> usize {
        self.max_description_chars
    }

    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    pub fn renderer(&self) -> &Arc<dyn RendererAdapter> {
        &self.renderer
    }

    /// Validates, renders with retries, and stores the resulting image.
    pub async fn generate(&self, request: &DiagramRequest) -> Result<Artifact, GenerationError> {
        request
            .validate(self.max_description_chars)
            .map_err(|e| match e {
                DiagrammerError::Validation(message) => GenerationError::Validation(message),
                other => GenerationError::Validation(other.to_string()),
            })?;

        let config = &request.config;
        let mut description = request.description.clone();
        let mut state = AttemptState::Attempting(1);

        loop {
            state = match state {
                AttemptState::Attempting(attempt) => {
                    match self.renderer.render(&description, config, attempt).await {
                        RenderOutcome::Success { bytes } => {
                            AttemptState::Succeeded { attempt, bytes }
                        }
                        RenderOutcome::SyntaxFailure { message, .. }
                            if attempt < self.max_attempts =>
                        {
                            warn!(
                                attempt,
                                max_attempts = self.max_attempts,
                                repair = self.repair.name(),
                                error = %message,
                                "syntax failure, retrying"
                            );
                            description = self.repair.repair(&description, &message);
                            AttemptState::Attempting(attempt + 1)
                        }
                        RenderOutcome::SyntaxFailure { message, .. } => {
                            AttemptState::ExhaustedRetries {
                                attempts: attempt,
                                last_error: message,
                            }
                        }
                        RenderOutcome::InfrastructureFailure { reason } => {
                            AttemptState::Aborted { attempt, reason }
                        }
                    }
                }
                AttemptState::Succeeded { attempt, bytes } => {
                    let artifact = self
                        .store
                        .save(&bytes, config.format)
                        .await
                        .map_err(GenerationError::Storage)?;
                    info!(
                        file_name = %artifact.file_name(),
                        size_bytes = artifact.size_bytes,
                        attempt,
                        "diagram generated"
                    );
                    return Ok(artifact);
                }
                AttemptState::ExhaustedRetries {
                    attempts,
                    last_error,
                } => {
                    warn!(
                        attempts,
                        error = %last_error,
                        "giving up after repeated syntax failures"
                    );
                    return Err(GenerationError::ExhaustedRetries {
                        attempts,
                        last_error,
                    });
                }
                AttemptState::Aborted { attempt, reason } => {
                    warn!(attempt, reason = %reason, "renderer unavailable, not retrying");
                    return Err(GenerationError::Aborted { attempt, reason });
                }
            };
        }
    }
}
