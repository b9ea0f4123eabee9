// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifact identity generation and file-name parsing.
//!
//! Identifiers look like `diagram_<unix-seconds>_<32 hex chars>`. The random
//! part is a v4 UUID, so two concurrent saves within the same second still
//! get different ids. Anything that does not match this grammar exactly is
//! never resolved to a path.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use diagrammer_core::{ArtifactId, DiagramFormat};
use regex::Regex;

/// Suffix of in-progress writes. Such files are never served.
pub const PARTIAL_SUFFIX: &str = ".part";

static FILE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(diagram_[0-9]{1,20}_[0-9a-f]{32})\.(svg|png|pdf)$")
        .expect("artifact file name regex is valid")
});

/// Allocates a fresh identifier stamped with `now`.
pub fn generate(now: DateTime<Utc>) -> ArtifactId {
    ArtifactId(format!(
        "diagram_{}_{}",
        now.timestamp().max(0),
        uuid::Uuid::new_v4().simple()
    ))
}

/// Splits a public file name into its identifier and format.
///
/// Returns `None` for anything outside the artifact grammar, including
/// names containing path separators or `..`.
pub fn parse_file_name(file_name: &str) -> Option<(ArtifactId, DiagramFormat)> {
    let caps = FILE_NAME_RE.captures(file_name)?;
    let format = DiagramFormat::from_extension(&caps[2])?;
    Some((ArtifactId(caps[1].to_string()), format))
}

/// Public file name for an identifier and format.
pub fn file_name(id: &ArtifactId, format: DiagramFormat) -> String {
    format!("{id}.{}", format.extension())
}
