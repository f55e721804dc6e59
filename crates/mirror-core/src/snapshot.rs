//! Point-in-time listings of the local mirror root

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The set of file names present in the local root at one instant.
///
/// Never mutated after capture; a new capture supersedes it.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    names: BTreeSet<String>,
    captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Capture a snapshot of `names`, stamped with the current time.
    pub fn new(names: BTreeSet<String>) -> Self {
        Self {
            names,
            captured_at: Utc::now(),
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// What changed between this (earlier) snapshot and `current`.
    pub fn difference(&self, current: &Snapshot) -> Difference {
        Difference {
            removed: self.names.difference(&current.names).cloned().collect(),
            added: current.names.difference(&self.names).cloned().collect(),
        }
    }
}

/// Asymmetric set differences between two snapshots.
///
/// `removed = previous − current`, `added = current − previous`; the two
/// sets are always disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Difference {
    pub removed: BTreeSet<String>,
    pub added: BTreeSet<String>,
}

impl Difference {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// Replay this difference on top of `previous`.
    ///
    /// For a difference computed from `previous`, this yields the names of
    /// the snapshot it was computed against.
    pub fn replay(&self, previous: &BTreeSet<String>) -> BTreeSet<String> {
        previous
            .difference(&self.removed)
            .chain(self.added.iter())
            .cloned()
            .collect()
    }
}
