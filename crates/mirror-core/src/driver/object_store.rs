//! Object-store storage driver

use std::collections::BTreeSet;

use crate::error::{Error, Result, Side};

use super::{BackendKind, DriverRoots, ObjectBucket, StorageDriver, transfer_outcome};

/// Driver whose remote root is a key prefix inside a bucket.
///
/// The remote root doubles as the key prefix: `name` lives at the key
/// `prefix + "/" + name`. Listing only considers keys under `prefix + "/"`,
/// reduces each to its final segment, and drops `/`-terminated directory
/// markers, so nested keys surface under their bare file name.
#[derive(Debug)]
pub struct ObjectStoreDriver<B> {
    roots: DriverRoots,
    bucket: B,
}

impl<B: ObjectBucket> ObjectStoreDriver<B> {
    pub fn new(roots: DriverRoots, bucket: B) -> Self {
        Self { roots, bucket }
    }

    pub fn bucket(&self) -> &B {
        &self.bucket
    }

    fn list_prefix(&self) -> String {
        format!("{}/", self.roots.remote().trimmed())
    }
}

impl<B: ObjectBucket> StorageDriver for ObjectStoreDriver<B> {
    fn kind(&self) -> BackendKind {
        BackendKind::ObjectStore
    }

    fn roots(&self) -> &DriverRoots {
        &self.roots
    }

    fn list_remote_names(&self) -> Result<BTreeSet<String>> {
        let prefix = self.list_prefix();
        let keys = self.bucket.list(&prefix).map_err(|e| {
            tracing::error!(bucket = self.bucket.name(), %prefix, error = %e, "Failed to list objects");
            Error::enumeration(Side::Remote, format!("{}:{}", self.bucket.name(), prefix), e)
        })?;

        let names: BTreeSet<String> = keys
            .iter()
            .filter(|key| !key.ends_with('/'))
            .filter_map(|key| key.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        tracing::debug!(bucket = self.bucket.name(), ?names, "Listed remote names");
        Ok(names)
    }

    fn copy_from_remote(&self, name: &str) -> Result<bool> {
        let key = self.roots.remote_target(name)?;
        let target = self.roots.local_target(name)?;
        tracing::debug!("r: {} -> l: {}", key, target);

        Ok(transfer_outcome(
            "download",
            &key,
            self.bucket.download(key.as_str(), &target),
        ))
    }

    fn push_one(&self, name: &str) -> Result<bool> {
        let source = self.roots.local_target(name)?;
        let key = self.roots.remote_target(name)?;
        tracing::debug!("l: {} -> r: {}", source, key);

        Ok(transfer_outcome(
            "upload",
            &key,
            self.bucket.upload(&source, key.as_str()),
        ))
    }

    fn delete_one(&self, name: &str) -> Result<bool> {
        let key = self.roots.remote_target(name)?;
        tracing::debug!("{} -> x", key);

        Ok(transfer_outcome("delete", &key, self.bucket.delete(key.as_str())))
    }
}
