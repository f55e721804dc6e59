//! Directory-to-directory storage driver

use std::collections::BTreeSet;

use crate::error::{Error, Result, Side};
use mirror_fs::io;

use super::{BackendKind, DriverRoots, StorageDriver, transfer_outcome};

/// Driver whose remote root is a plain directory.
///
/// Used for development mirrors and for remote roots on mounted network
/// filesystems. Both roots must already exist; the driver never creates
/// them.
#[derive(Debug, Clone)]
pub struct LocalFsDriver {
    roots: DriverRoots,
}

impl LocalFsDriver {
    pub fn new(roots: DriverRoots) -> Self {
        Self { roots }
    }
}

impl StorageDriver for LocalFsDriver {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn roots(&self) -> &DriverRoots {
        &self.roots
    }

    fn list_remote_names(&self) -> Result<BTreeSet<String>> {
        let remote = self.roots.remote();
        let names = io::list_file_names(remote).map_err(|e| {
            tracing::error!(root = %remote, error = %e, "Failed to list remote names");
            Error::enumeration(Side::Remote, remote, e)
        })?;

        tracing::debug!(root = %remote, ?names, "Listed remote names");
        Ok(names)
    }

    fn copy_from_remote(&self, name: &str) -> Result<bool> {
        let src = self.roots.remote_target(name)?;
        let dst = self.roots.local_target(name)?;
        tracing::debug!("{} -> {}", src, dst);

        Ok(transfer_outcome("copy", &dst, io::copy_atomic(&src, &dst)))
    }

    fn push_one(&self, name: &str) -> Result<bool> {
        let src = self.roots.local_target(name)?;
        let dst = self.roots.remote_target(name)?;
        tracing::debug!("{} -> {}", src, dst);

        Ok(transfer_outcome("copy", &dst, io::copy_atomic(&src, &dst)))
    }

    fn delete_one(&self, name: &str) -> Result<bool> {
        let target = self.roots.remote_target(name)?;
        tracing::debug!("{} -> x", target);

        Ok(transfer_outcome("remove", &target, io::remove_file(&target)))
    }
}
