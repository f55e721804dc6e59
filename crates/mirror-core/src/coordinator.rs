//! Two-phase synchronization around a unit of work
//!
//! Before the unit of work: pull every remote file, then snapshot the local
//! root. After it: diff the local root against that snapshot and replay the
//! difference remotely.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::ReconciliationClient;
use crate::driver::StorageDriver;
use crate::event::ChangeKind;
use crate::{Error, Result};

/// Where the coordinator is within one reconciliation cycle.
///
/// `Idle → PullingRemote → SnapshotCaptured → (unit of work) →
/// DiffComputed → Applying → Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CyclePhase {
    Idle,
    PullingRemote,
    SnapshotCaptured,
    DiffComputed,
    Applying,
}

/// Outcome of the before-work phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullSummary {
    /// Remote files copied into the local root
    pub pulled: usize,
    /// Remote files whose copy reported failure
    pub failed: usize,
    /// Number of names in the freshly captured snapshot
    pub snapshot_size: usize,
}

/// Outcome of replaying one change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventReport {
    pub kind: ChangeKind,
    pub names: Vec<String>,
    /// Event-level outcome, as returned by [`ChangeEvent::apply`]
    ///
    /// [`ChangeEvent::apply`]: crate::event::ChangeEvent::apply
    pub success: bool,
    /// Names whose transfer reported failure without failing the event
    pub failed: Vec<String>,
}

/// Outcome of the after-work phase, kept for observability only.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per applied event, removal first
    pub events: Vec<EventReport>,
    /// Set when the events could not even be computed
    pub error: Option<String>,
}

impl CycleReport {
    /// Event-level results in application order.
    pub fn results(&self) -> Vec<bool> {
        self.events.iter().map(|e| e.success).collect()
    }

    pub fn success(&self) -> bool {
        self.error.is_none() && self.events.iter().all(|e| e.success)
    }

    /// Names that were not transferred although their event succeeded.
    pub fn failed_names(&self) -> impl Iterator<Item = &str> {
        self.events
            .iter()
            .flat_map(|e| e.failed.iter().map(String::as_str))
    }

    /// Every event succeeded and every name was transferred.
    pub fn fully_synchronized(&self) -> bool {
        self.success() && self.failed_names().next().is_none()
    }
}

/// Drives one [`ReconciliationClient`] through the before/after protocol.
///
/// Cycles must not overlap: a host that processes units of work
/// concurrently needs one coordinator per worker, or must serialize each
/// before/after pair itself.
#[derive(Debug)]
pub struct SyncCoordinator {
    client: ReconciliationClient,
    phase: CyclePhase,
    cycle_started: Option<DateTime<Utc>>,
}

impl SyncCoordinator {
    pub fn new(client: ReconciliationClient) -> Self {
        Self {
            client,
            phase: CyclePhase::Idle,
            cycle_started: None,
        }
    }

    pub fn from_driver(driver: Arc<dyn StorageDriver>) -> Self {
        Self::new(ReconciliationClient::new(driver))
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn client(&self) -> &ReconciliationClient {
        &self.client
    }

    /// Check out the newest remote state and snapshot it.
    ///
    /// # Errors
    ///
    /// Propagates enumeration failures; the unit of work must not run on a
    /// stale local root.
    pub fn before_unit_of_work(&mut self) -> Result<PullSummary> {
        tracing::info!("Checking out newest remote state");
        self.cycle_started = Some(Utc::now());
        self.phase = CyclePhase::PullingRemote;

        let pulled = self.client.pull_remote().and_then(|results| {
            let snapshot = self.client.capture_snapshot()?;
            Ok(PullSummary {
                pulled: results.iter().filter(|ok| **ok).count(),
                failed: results.iter().filter(|ok| !**ok).count(),
                snapshot_size: snapshot.len(),
            })
        });

        match pulled {
            Ok(summary) => {
                self.phase = CyclePhase::SnapshotCaptured;
                tracing::debug!(?summary, "Local snapshot ready");
                tracing::info!("Ready to process");
                Ok(summary)
            }
            Err(e) => {
                self.phase = CyclePhase::Idle;
                tracing::error!(error = %e, "Failed to prepare local mirror");
                Err(e)
            }
        }
    }

    /// Replay local changes made during the unit of work.
    ///
    /// Never fails: the unit of work has already completed, so every
    /// failure is logged and recorded in the report instead.
    pub fn after_unit_of_work(&mut self) -> CycleReport {
        tracing::info!("Synchronizing data after unit of work");
        let started_at = self.cycle_started.take().unwrap_or_else(Utc::now);
        let mut events = Vec::new();
        let mut error = None;

        // A stored snapshot may predate a failed before phase; diffing
        // against it would replay changes this cycle never captured
        let changes = if self.phase == CyclePhase::SnapshotCaptured {
            self.client.compute_change_events()
        } else {
            tracing::warn!(phase = ?self.phase, "After hook invoked outside a prepared cycle");
            Err(Error::CycleNotPrepared)
        };

        match changes {
            Ok(change_events) => {
                self.phase = CyclePhase::DiffComputed;
                tracing::debug!(
                    removed = change_events[0].names().len(),
                    added = change_events[1].names().len(),
                    "Change events computed"
                );

                self.phase = CyclePhase::Applying;
                for event in &change_events {
                    let (success, failed) = event.apply_collecting_failures();
                    events.push(EventReport {
                        kind: event.kind(),
                        names: event.names().iter().cloned().collect(),
                        success,
                        failed,
                    });
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to compute change events");
                error = Some(e.to_string());
            }
        }

        self.phase = CyclePhase::Idle;
        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            events,
            error,
        };

        tracing::debug!(results = ?report.results(), "Handled events");
        for name in report.failed_names() {
            tracing::warn!(name, "Local change was not replayed remotely");
        }
        tracing::info!(success = report.success(), "Done");
        report
    }

    /// Bracket `work` with both hook points.
    ///
    /// `work` only runs if the before phase succeeded; the after phase runs
    /// whenever `work` returns.
    pub fn run_unit_of_work<T>(&mut self, work: impl FnOnce() -> T) -> Result<(T, CycleReport)> {
        self.before_unit_of_work()?;
        let output = work();
        let report = self.after_unit_of_work();
        Ok((output, report))
    }
}
