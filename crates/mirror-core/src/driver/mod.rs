//! Storage driver abstraction
//!
//! A driver performs single-file transfers between the local mirror root and
//! one remote backend. Change events and the reconciliation client only ever
//! talk to [`StorageDriver`], so the same reconciliation logic runs against a
//! local directory mirror or an object-store bucket.

mod bucket;
mod local;
mod object_store;

pub use bucket::{DirectoryBucket, MemoryBucket, ObjectBucket};
pub use local::LocalFsDriver;
pub use object_store::ObjectStoreDriver;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, Side};
use mirror_fs::{NormalizedPath, io};

/// Remote backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Remote root is another directory on a local (or mounted) filesystem
    Local,
    /// Remote root is a key prefix inside an object-store bucket
    ObjectStore,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::ObjectStore => write!(f, "object-store"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "fs" => Ok(Self::Local),
            "object-store" | "cloud" | "gcs" | "bucket" => Ok(Self::ObjectStore),
            _ => Err(Error::UnknownBackend {
                value: s.to_string(),
            }),
        }
    }
}

/// The two path roots every driver is bound to.
///
/// Target paths are always `root (trailing separators stripped) + "/" + name`
/// on both sides, for every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverRoots {
    local: NormalizedPath,
    remote: NormalizedPath,
}

impl DriverRoots {
    pub fn new(local: impl Into<NormalizedPath>, remote: impl Into<NormalizedPath>) -> Self {
        Self {
            local: local.into(),
            remote: remote.into(),
        }
    }

    pub fn local(&self) -> &NormalizedPath {
        &self.local
    }

    pub fn remote(&self) -> &NormalizedPath {
        &self.remote
    }

    /// Path of `name` under the local root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFileName`] if `name` is not a single segment.
    pub fn local_target(&self, name: &str) -> Result<NormalizedPath> {
        check_name(name)?;
        Ok(self.local.child(name))
    }

    /// Path (or object key) of `name` under the remote root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFileName`] if `name` is not a single segment.
    pub fn remote_target(&self, name: &str) -> Result<NormalizedPath> {
        check_name(name)?;
        Ok(self.remote.child(name))
    }
}

fn check_name(name: &str) -> Result<()> {
    mirror_fs::validate_file_name(name).map_err(|e| match e {
        mirror_fs::Error::InvalidFileName { name, reason } => Error::InvalidFileName { name, reason },
        other => Error::Fs(other),
    })
}

/// Single-file transfer operations against one backend.
///
/// Per-file transfer failures (missing source, permission denied, bucket
/// rejects the write) are reported as `Ok(false)` and never escape the
/// driver. An `Err` from a per-file operation means the request itself was
/// malformed, e.g. a name that is not a single path segment; callers treat
/// it as an unexpected failure.
pub trait StorageDriver: Send + Sync {
    /// Which backend this driver talks to.
    fn kind(&self) -> BackendKind;

    /// The local and remote roots this driver is bound to.
    fn roots(&self) -> &DriverRoots;

    /// Enumerate the file names present at the remote root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Enumeration`] if the remote root cannot be listed.
    fn list_remote_names(&self) -> Result<BTreeSet<String>>;

    /// Copy one file from the remote root into the local root.
    fn copy_from_remote(&self, name: &str) -> Result<bool>;

    /// Copy one file from the local root to the remote root.
    fn push_one(&self, name: &str) -> Result<bool>;

    /// Remove one file at the remote root.
    fn delete_one(&self, name: &str) -> Result<bool>;

    /// Enumerate the file names present at the local root.
    ///
    /// Identical for every backend: the local side is always a directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Enumeration`] if the local root cannot be listed.
    fn list_local_names(&self) -> Result<BTreeSet<String>> {
        let root = self.roots().local();
        io::list_file_names(root).map_err(|e| {
            tracing::error!(root = %root, error = %e, "Failed to list local names");
            Error::enumeration(Side::Local, root, e)
        })
    }

    /// Copy every remote file into the local root.
    ///
    /// Returns one success flag per remote name. Individual copy failures
    /// only show up as `false` entries.
    ///
    /// # Errors
    ///
    /// Fails as a whole only when the remote names cannot be enumerated.
    fn pull_all(&self) -> Result<Vec<bool>> {
        let names = self.list_remote_names()?;

        let results: Vec<bool> = names
            .iter()
            .map(|name| {
                self.copy_from_remote(name).unwrap_or_else(|e| {
                    tracing::warn!(name = %name, error = %e, "Skipping remote entry");
                    false
                })
            })
            .collect();

        tracing::debug!(
            remote = %self.roots().remote(),
            total = results.len(),
            failed = results.iter().filter(|ok| !**ok).count(),
            "Pulled remote files"
        );
        Ok(results)
    }
}

/// Collapse the outcome of one file transfer into the driver's boolean
/// contract, logging the failure.
pub(crate) fn transfer_outcome<T, E: fmt::Display>(
    operation: &str,
    target: &NormalizedPath,
    result: std::result::Result<T, E>,
) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(operation, target = %target, error = %e, "Transfer failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_aliases() {
        assert_eq!("local".parse::<BackendKind>().unwrap(), BackendKind::Local);
        assert_eq!("FS".parse::<BackendKind>().unwrap(), BackendKind::Local);
        assert_eq!("gcs".parse::<BackendKind>().unwrap(), BackendKind::ObjectStore);
        assert_eq!(
            " object-store ".parse::<BackendKind>().unwrap(),
            BackendKind::ObjectStore
        );
    }

    #[test]
    fn backend_kind_rejects_unknown() {
        let err = "ftp".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownBackend { value } if value == "ftp"));
    }

    #[test]
    fn backend_kind_display_round_trips() {
        for kind in [BackendKind::Local, BackendKind::ObjectStore] {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }

    #[test]
    fn roots_build_targets_with_single_separator() {
        let roots = DriverRoots::new("./packages/", "bucket-prefix//");
        assert_eq!(roots.local_target("a.whl").unwrap().as_str(), "./packages/a.whl");
        assert_eq!(
            roots.remote_target("a.whl").unwrap().as_str(),
            "bucket-prefix/a.whl"
        );
    }

    #[test]
    fn roots_reject_nested_names() {
        let roots = DriverRoots::new("local", "remote");
        assert!(matches!(
            roots.remote_target("../escape.whl"),
            Err(Error::InvalidFileName { .. })
        ));
    }
}
