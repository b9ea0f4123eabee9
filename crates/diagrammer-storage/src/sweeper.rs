// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic retention sweep that deletes artifacts past their age threshold.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::store::ArtifactStore;

/// Totals from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Artifacts examined.
    pub scanned: usize,
    /// Artifacts deleted.
    pub removed: usize,
    /// Deletions that failed and will be retried next sweep.
    pub failed: usize,
}

/// Deletes artifacts older than a fixed age.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    store: Arc<ArtifactStore>,
    max_age: Option<TimeDelta>,
    interval: Duration,
}

impl RetentionSweeper {
    /// `cleanup_after_hours == 0` disables sweeping.
    pub fn new(store: Arc<ArtifactStore>, cleanup_after_hours: u64, interval: Duration) -> Self {
        let max_age = i64::try_from(cleanup_after_hours)
            .ok()
            .filter(|h| *h > 0)
            .and_then(TimeDelta::try_hours);
        Self {
            store,
            max_age,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_age.is_some()
    }

    /// Runs one sweep as if the current time were `now`.
    ///
    /// Artifacts whose age is strictly greater than the threshold are
    /// deleted. Individual failures are logged and counted; the sweep
    /// always visits every artifact.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        let Some(max_age) = self.max_age else {
            return report;
        };

        let artifacts = self.store.list();
        report.scanned = artifacts.len();

        for artifact in artifacts {
            if now - artifact.created_at <= max_age {
                continue;
            }
            match self.store.delete(&artifact.id).await {
                Ok(true) => {
                    report.removed += 1;
                    debug!(file_name = %artifact.file_name(), "expired artifact removed");
                }
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        file_name = %artifact.file_name(),
                        error = %e,
                        "failed to remove expired artifact"
                    );
                }
            }
        }

        if report.removed > 0 || report.failed > 0 {
            info!(
                scanned = report.scanned,
                removed = report.removed,
                failed = report.failed,
                "retention sweep complete"
            );
        }
        report
    }

    /// Runs one sweep against the wall clock.
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Sweeps on a fixed interval until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        if !self.is_enabled() {
            info!("artifact cleanup disabled");
            return;
        }
        info!(
            interval_secs = self.interval.as_secs(),
            "retention sweeper started"
        );

        let mut interval = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep().await;
                }
                _ = cancel.cancelled() => {
                    info!("retention sweeper shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use diagrammer_core::DiagramFormat;

    use super::*;

    async fn store_with(count: usize) -> (tempfile::TempDir, Arc<ArtifactStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::open(dir.path()).await.unwrap());
        for _ in 0..count {
            store.save(b"<svg/>", DiagramFormat::Svg).await.unwrap();
        }
        (dir, store)
    }

    #[tokio::test]
    async fn young_artifacts_survive() {
        let (_dir, store) = store_with(2).await;
        let sweeper = RetentionSweeper::new(store.clone(), 24, Duration::from_secs(60));

        let report = sweeper
            .sweep_at(Utc::now() + TimeDelta::hours(23))
            .await;
        assert_eq!(report.scanned, 2);
        assert_eq!(report.removed, 0);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn expired_artifacts_are_removed_from_disk() {
        let (_dir, store) = store_with(2).await;
        let paths: Vec<_> = store.list().into_iter().map(|a| a.path).collect();
        let sweeper = RetentionSweeper::new(store.clone(), 24, Duration::from_secs(60));

        let report = sweeper
            .sweep_at(Utc::now() + TimeDelta::hours(25))
            .await;
        assert_eq!(report.removed, 2);
        assert!(store.is_empty());
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn failed_deletion_does_not_stop_sweep() {
        let (_dir, store) = store_with(2).await;
        let stuck = store.list().remove(0);
        // A directory in place of the file makes unlink fail.
        std::fs::remove_file(&stuck.path).unwrap();
        std::fs::create_dir(&stuck.path).unwrap();

        let sweeper = RetentionSweeper::new(store.clone(), 1, Duration::from_secs(60));
        let report = sweeper.sweep_at(Utc::now() + TimeDelta::hours(2)).await;
        assert_eq!(report.removed, 1);
        assert_eq!(report.failed, 1);
        assert!(store.get(&stuck.id).is_some());
    }

    #[tokio::test]
    async fn zero_hours_disables_cleanup() {
        let (_dir, store) = store_with(1).await;
        let sweeper = RetentionSweeper::new(store.clone(), 0, Duration::from_secs(60));
        assert!(!sweeper.is_enabled());

        let report = sweeper
            .sweep_at(Utc::now() + TimeDelta::days(365))
            .await;
        assert_eq!(report, SweepReport::default());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let (_dir, store) = store_with(0).await;
        let sweeper = RetentionSweeper::new(store, 24, Duration::from_secs(3600));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sweeper.run(cancel.clone()));
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper should stop promptly")
            .unwrap();
    }
}
