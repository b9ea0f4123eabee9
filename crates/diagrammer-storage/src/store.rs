// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem-backed artifact store with an in-memory metadata index.
//!
//! Every servable file has an index entry and every lookup goes through the
//! index first, so the store never builds a path from caller input.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use diagrammer_core::{Artifact, ArtifactId, DiagramFormat, DiagrammerError};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::id::{self, PARTIAL_SUFFIX};

/// Stores rendered artifacts under a single root directory.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    index: DashMap<ArtifactId, Artifact>,
}

impl ArtifactStore {
    /// Opens (creating if needed) the store rooted at `root`.
    ///
    /// Artifacts left by a previous run are re-registered using their file
    /// modification time as creation time. Leftover partial writes are removed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, DiagrammerError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(DiagrammerError::storage)?;
        let store = Self {
            root,
            index: DashMap::new(),
        };
        store.rescan().await?;
        Ok(store)
    }

    async fn rescan(&self) -> Result<usize, DiagrammerError> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(DiagrammerError::storage)?;
        let mut recovered = 0;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(DiagrammerError::storage)?
        {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };

            if name.ends_with(PARTIAL_SUFFIX) {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => debug!(file_name = name, "removed partial write"),
                    Err(e) => warn!(file_name = name, error = %e, "failed to remove partial write"),
                }
                continue;
            }

            let Some((id, format)) = id::parse_file_name(name) else {
                continue;
            };
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            let created_at = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            self.index.insert(
                id.clone(),
                Artifact {
                    id,
                    format,
                    size_bytes: meta.len(),
                    created_at,
                    path: entry.path(),
                },
            );
            recovered += 1;
        }

        if recovered > 0 {
            info!(
                recovered,
                root = %self.root.display(),
                "recovered artifacts from previous run"
            );
        }
        Ok(recovered)
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` as a new artifact.
    ///
    /// The data lands in a partial file that is renamed into place, and the
    /// index entry is added only after the rename, so readers see either the
    /// complete artifact or nothing.
    pub async fn save(
        &self,
        bytes: &[u8],
        format: DiagramFormat,
    ) -> Result<Artifact, DiagrammerError> {
        let created_at = Utc::now();
        let id = id::generate(created_at);
        let file_name = id::file_name(&id, format);
        let path = self.root.join(&file_name);
        let partial = self.root.join(format!("{file_name}{PARTIAL_SUFFIX}"));

        if let Err(e) = write_new(&partial, bytes).await {
            let _ = fs::remove_file(&partial).await;
            return Err(DiagrammerError::storage(e));
        }
        if let Err(e) = fs::rename(&partial, &path).await {
            let _ = fs::remove_file(&partial).await;
            return Err(DiagrammerError::storage(e));
        }

        let artifact = Artifact {
            id: id.clone(),
            format,
            size_bytes: bytes.len() as u64,
            created_at,
            path,
        };
        self.index.insert(id, artifact.clone());
        debug!(file_name = %file_name, size_bytes = bytes.len(), "artifact saved");
        Ok(artifact)
    }

    /// Looks up artifact metadata by public file name.
    pub fn resolve(&self, file_name: &str) -> Result<Artifact, DiagrammerError> {
        let not_found = || DiagrammerError::NotFound(file_name.to_string());
        let (id, format) = id::parse_file_name(file_name).ok_or_else(not_found)?;
        let artifact = self.get(&id).ok_or_else(not_found)?;
        if artifact.format != format {
            return Err(not_found());
        }
        Ok(artifact)
    }

    /// Reads an artifact's bytes by public file name.
    ///
    /// A tracked file that vanished (for example, swept mid-request) is
    /// dropped from the index and reported as not found.
    pub async fn load(&self, file_name: &str) -> Result<(Artifact, Vec<u8>), DiagrammerError> {
        let artifact = self.resolve(file_name)?;
        match fs::read(&artifact.path).await {
            Ok(bytes) => Ok((artifact, bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.index.remove(&artifact.id);
                debug!(file_name, "tracked artifact missing on disk");
                Err(DiagrammerError::NotFound(file_name.to_string()))
            }
            Err(e) => Err(DiagrammerError::storage(e)),
        }
    }

    /// Metadata for a tracked artifact.
    pub fn get(&self, id: &ArtifactId) -> Option<Artifact> {
        self.index.get(id).map(|entry| entry.value().clone())
    }

    /// Deletes an artifact. Returns `false` when `id` is not tracked.
    ///
    /// A file that is already gone still counts as deleted. Any other
    /// filesystem failure leaves the artifact tracked so a later sweep can
    /// try again.
    pub async fn delete(&self, id: &ArtifactId) -> Result<bool, DiagrammerError> {
        let Some((_, artifact)) = self.index.remove(id) else {
            return Ok(false);
        };
        match fs::remove_file(&artifact.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => {
                self.index.insert(artifact.id.clone(), artifact);
                Err(DiagrammerError::storage(e))
            }
        }
    }

    /// All tracked artifacts, newest first.
    pub fn list(&self) -> Vec<Artifact> {
        let mut artifacts: Vec<Artifact> = self
            .index
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        artifacts
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}
