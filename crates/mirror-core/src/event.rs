//! Change events: a set difference plus the driver that replays it

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::Result;
use crate::driver::StorageDriver;

/// What kind of change an event replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    /// Names gone from the local root; deleted at the remote root
    Removal,
    /// Names new in the local root; pushed to the remote root
    Addition,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removal => write!(f, "removal"),
            Self::Addition => write!(f, "addition"),
        }
    }
}

/// One unit of reconciliation work.
///
/// Borrows the driver it replays through; the client that produced the
/// event owns the driver.
pub struct ChangeEvent<'a> {
    kind: ChangeKind,
    names: BTreeSet<String>,
    driver: &'a dyn StorageDriver,
}

impl<'a> ChangeEvent<'a> {
    pub fn removal(names: BTreeSet<String>, driver: &'a dyn StorageDriver) -> Self {
        Self {
            kind: ChangeKind::Removal,
            names,
            driver,
        }
    }

    pub fn addition(names: BTreeSet<String>, driver: &'a dyn StorageDriver) -> Self {
        Self {
            kind: ChangeKind::Addition,
            names,
            driver,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Replay every name through the driver, returning per-name outcomes.
    ///
    /// Stops at the first name whose driver call returns `Err`; names
    /// handled before it stay handled.
    pub fn try_apply(&self) -> Result<Vec<bool>> {
        tracing::debug!(kind = %self.kind, names = ?self.names, "Handling change event");

        self.names
            .iter()
            .map(|name| match self.kind {
                ChangeKind::Removal => self.driver.delete_one(name),
                ChangeKind::Addition => self.driver.push_one(name),
            })
            .collect()
    }

    /// Replay the event, reporting success for the event as a whole.
    ///
    /// A driver returning `false` for a name does not fail the event; only an
    /// `Err` does, and then the whole event reports `false` even if earlier
    /// names were already transferred.
    pub fn apply(&self) -> bool {
        self.apply_collecting_failures().0
    }

    /// Like [`apply`](Self::apply), but also returns the names whose
    /// transfer reported `false`.
    ///
    /// When a driver call returns `Err` the event fails and no per-name
    /// outcomes are available, so the list is empty.
    pub fn apply_collecting_failures(&self) -> (bool, Vec<String>) {
        match self.try_apply() {
            Ok(results) => {
                tracing::debug!(kind = %self.kind, ?results, "Completed change event");
                let failed = self
                    .names
                    .iter()
                    .zip(results)
                    .filter(|(_, ok)| !ok)
                    .map(|(name, _)| name.clone())
                    .collect();
                (true, failed)
            }
            Err(e) => {
                tracing::error!(kind = %self.kind, error = %e, "Change event failed");
                (false, Vec::new())
            }
        }
    }
}

impl fmt::Debug for ChangeEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeEvent")
            .field("kind", &self.kind)
            .field("names", &self.names)
            .field("backend", &self.driver.kind())
            .finish()
    }
}
