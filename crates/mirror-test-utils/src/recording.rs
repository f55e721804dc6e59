//! [`RecordingDriver`]: a scripted driver that records every transfer.
//!
//! The local side is a real directory so snapshots work unchanged; the
//! remote side is an in-memory set of names.

use std::collections::BTreeSet;
use std::fs;
use std::sync::{Mutex, MutexGuard};

use mirror_core::{BackendKind, DriverRoots, Error, Result, StorageDriver};

/// One call made against a [`RecordingDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Pull(String),
    Push(String),
    Delete(String),
}

/// Driver whose per-name outcome is scripted by the test.
///
/// - names added with [`failing_on`](Self::failing_on) return `Ok(false)`
/// - names added with [`erroring_on`](Self::erroring_on) return `Err`
/// - everything else succeeds and updates the in-memory remote
pub struct RecordingDriver {
    roots: DriverRoots,
    remote: Mutex<BTreeSet<String>>,
    calls: Mutex<Vec<DriverCall>>,
    failing: BTreeSet<String>,
    erroring: BTreeSet<String>,
}

impl RecordingDriver {
    /// `local_root` must be an existing directory; the remote root is only a
    /// label.
    pub fn new(local_root: impl Into<mirror_fs::NormalizedPath>) -> Self {
        Self {
            roots: DriverRoots::new(local_root, "memory://remote"),
            remote: Mutex::default(),
            calls: Mutex::default(),
            failing: BTreeSet::new(),
            erroring: BTreeSet::new(),
        }
    }

    pub fn with_remote<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.remote).extend(names.into_iter().map(Into::into));
        self
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn erroring_on(mut self, name: &str) -> Self {
        self.erroring.insert(name.to_string());
        self
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        lock(&self.calls).clone()
    }

    pub fn remote_names(&self) -> BTreeSet<String> {
        lock(&self.remote).clone()
    }

    fn record(&self, call: DriverCall, name: &str) -> Result<bool> {
        lock(&self.calls).push(call);
        if self.erroring.contains(name) {
            return Err(Error::InvalidFileName {
                name: name.to_string(),
                reason: "rejected by recording driver",
            });
        }
        Ok(!self.failing.contains(name))
    }
}

impl StorageDriver for RecordingDriver {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn roots(&self) -> &DriverRoots {
        &self.roots
    }

    fn list_remote_names(&self) -> Result<BTreeSet<String>> {
        Ok(self.remote_names())
    }

    fn copy_from_remote(&self, name: &str) -> Result<bool> {
        let ok = self.record(DriverCall::Pull(name.to_string()), name)?;
        if ok {
            let target = self.roots.local_target(name)?;
            fs::write(target.to_native(), name)?;
        }
        Ok(ok)
    }

    fn push_one(&self, name: &str) -> Result<bool> {
        let ok = self.record(DriverCall::Push(name.to_string()), name)?;
        if ok {
            lock(&self.remote).insert(name.to_string());
        }
        Ok(ok)
    }

    fn delete_one(&self, name: &str) -> Result<bool> {
        let ok = self.record(DriverCall::Delete(name.to_string()), name)?;
        if ok {
            lock(&self.remote).remove(name);
        }
        Ok(ok)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
