// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Description repair applied between retry attempts.
//!
//! The renderer is deterministic, so re-running an unchanged description
//! only helps against renderer flakiness. A strategy may rewrite the
//! description using the last syntax error before the next attempt.

use std::sync::Arc;

use diagrammer_config::RepairMode;

/// Rewrites a description after a syntax failure.
pub trait RepairStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Returns the description to use for the next attempt.
    fn repair(&self, description: &str, last_error: &str) -> String;
}

/// Retries with the description unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRepair;

impl RepairStrategy for NoRepair {
    fn name(&self) -> &str {
        "none"
    }

    fn repair(&self, description: &str, _last_error: &str) -> String {
        description.to_string()
    }
}

/// Removes common copy-paste damage: markdown code fences, a byte-order
/// mark, CRLF line endings, typographic quotes, non-breaking spaces and
/// trailing whitespace.
#[derive(Debug, Default, Clone, Copy)]
pub struct SanitizeRepair;

impl RepairStrategy for SanitizeRepair {
    fn name(&self) -> &str {
        "sanitize"
    }

    fn repair(&self, description: &str, _last_error: &str) -> String {
        let text = description
            .trim_start_matches('\u{feff}')
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .replace(['\u{201c}', '\u{201d}'], "\"")
            .replace(['\u{2018}', '\u{2019}'], "'")
            .replace('\u{00a0}', " ");

        text.lines()
            .filter(|line| !line.trim_start().starts_with("```"))
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

/// Builds the strategy selected in configuration.
pub fn from_mode(mode: RepairMode) -> Arc<dyn RepairStrategy> {
    match mode {
        RepairMode::None => Arc::new(NoRepair),
        RepairMode::Sanitize => Arc::new(SanitizeRepair),
    }
}
