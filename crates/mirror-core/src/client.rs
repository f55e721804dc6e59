//! Reconciliation client: snapshot state and diff production

use std::sync::Arc;

use crate::driver::StorageDriver;
use crate::event::ChangeEvent;
use crate::snapshot::{Difference, Snapshot};
use crate::{Error, Result};

/// Owns the latest local snapshot and turns local changes into events.
///
/// Long-lived: construct once per driver and reuse for every cycle. Not
/// meant to be shared between concurrently running cycles.
pub struct ReconciliationClient {
    driver: Arc<dyn StorageDriver>,
    snapshot: Option<Snapshot>,
}

impl ReconciliationClient {
    pub fn new(driver: Arc<dyn StorageDriver>) -> Self {
        Self {
            driver,
            snapshot: None,
        }
    }

    /// Pull every remote file into the local root.
    pub fn pull_remote(&self) -> Result<Vec<bool>> {
        self.driver.pull_all()
    }

    /// Read the local root as it is right now.
    pub fn local_contents(&self) -> Result<Snapshot> {
        Ok(Snapshot::new(self.driver.list_local_names()?))
    }

    /// Replace the stored snapshot with the current local listing.
    pub fn capture_snapshot(&mut self) -> Result<&Snapshot> {
        let snapshot = self.local_contents()?;
        tracing::debug!(
            names = ?snapshot.names(),
            captured_at = %snapshot.captured_at(),
            "Captured local snapshot"
        );
        Ok(self.snapshot.insert(snapshot))
    }

    /// The most recently captured snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SnapshotNotCaptured`] before the first capture.
    pub fn latest_snapshot(&self) -> Result<&Snapshot> {
        self.snapshot.as_ref().ok_or(Error::SnapshotNotCaptured)
    }

    /// Diff the stored snapshot against a fresh local listing.
    ///
    /// The stored snapshot is left untouched; only [`capture_snapshot`]
    /// replaces it.
    ///
    /// [`capture_snapshot`]: Self::capture_snapshot
    pub fn difference(&self) -> Result<Difference> {
        let previous = self.latest_snapshot()?;
        let current = self.local_contents()?;
        let diff = previous.difference(&current);

        tracing::debug!(
            previous = ?previous.names(),
            current = ?current.names(),
            removed = ?diff.removed,
            added = ?diff.added,
            "Computed local difference"
        );
        Ok(diff)
    }

    /// Produce exactly two events, removal first, even when either
    /// difference is empty.
    pub fn compute_change_events(&self) -> Result<[ChangeEvent<'_>; 2]> {
        let Difference { removed, added } = self.difference()?;
        let driver = self.driver.as_ref();

        Ok([
            ChangeEvent::removal(removed, driver),
            ChangeEvent::addition(added, driver),
        ])
    }
}

impl std::fmt::Debug for ReconciliationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationClient")
            .field("backend", &self.driver.kind())
            .field("roots", self.driver.roots())
            .field("snapshot", &self.snapshot)
            .finish()
    }
}
