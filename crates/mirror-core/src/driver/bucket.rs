//! Object-store bucket clients
//!
//! [`ObjectBucket`] is the seam between the object-store driver and a
//! concrete bucket client. Keys are flat `/`-separated strings; a key
//! ending in `/` is a pseudo-directory marker.

use std::collections::BTreeMap;
use std::fs;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use mirror_fs::{NormalizedPath, io};

/// Raw object operations of a single bucket.
pub trait ObjectBucket: Send + Sync {
    /// Bucket identity, used in logs and errors.
    fn name(&self) -> &str;

    /// All keys starting with `prefix`, including directory markers.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Write the object at `key` to the local file `target`.
    fn download(&self, key: &str, target: &NormalizedPath) -> Result<()>;

    /// Store the local file `source` as the object at `key`.
    fn upload(&self, source: &NormalizedPath, key: &str) -> Result<()>;

    /// Delete the object at `key`.
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-process bucket backed by a sorted map.
#[derive(Debug, Default)]
pub struct MemoryBucket {
    name: String,
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Mutex::default(),
        }
    }

    /// Builder-style insert, for seeding fixtures.
    pub fn with_object(self, key: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(key, content);
        self
    }

    pub fn insert(&self, key: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.lock_objects().insert(key.into(), content.into());
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock_objects().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock_objects().keys().cloned().collect()
    }

    fn lock_objects(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObjectBucket for MemoryBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .lock_objects()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn download(&self, key: &str, target: &NormalizedPath) -> Result<()> {
        let content = self.get(key).ok_or_else(|| Error::ObjectNotFound {
            bucket: self.name.clone(),
            key: key.to_string(),
        })?;
        io::write_atomic(target, &content)?;
        Ok(())
    }

    fn upload(&self, source: &NormalizedPath, key: &str) -> Result<()> {
        let native = source.to_native();
        let content = fs::read(&native).map_err(|e| mirror_fs::Error::io(native, e))?;
        self.insert(key, content);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock_objects()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::ObjectNotFound {
                bucket: self.name.clone(),
                key: key.to_string(),
            })
    }
}

/// Bucket whose objects live as files under a directory.
///
/// A key maps to the path `root/key`; nested keys become nested
/// directories, and every directory under the root is listed as a
/// `dir/` marker key, mirroring how bucket consoles present folders.
#[derive(Debug, Clone)]
pub struct DirectoryBucket {
    name: String,
    root: NormalizedPath,
}

impl DirectoryBucket {
    /// Open the bucket rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` does not exist or is not a directory.
    pub fn open(root: impl Into<NormalizedPath>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(mirror_fs::Error::NotADirectory {
                path: root.to_native(),
            }
            .into());
        }

        let name = root.file_name().unwrap_or(root.trimmed()).to_string();
        Ok(Self { name, root })
    }

    fn object_path(&self, key: &str) -> NormalizedPath {
        self.root.join(key)
    }

    fn collect_keys(&self, dir: &NormalizedPath, key_prefix: &str, keys: &mut Vec<String>) -> Result<()> {
        let native = dir.to_native();
        let entries = fs::read_dir(&native).map_err(|e| mirror_fs::Error::io(&native, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| mirror_fs::Error::io(&native, e))?;
            let Ok(segment) = entry.file_name().into_string() else {
                continue;
            };
            let key = format!("{key_prefix}{segment}");
            let path = entry.path();

            if path.is_dir() {
                let marker = format!("{key}/");
                self.collect_keys(&dir.join(&segment), &marker, keys)?;
                keys.push(marker);
            } else if path.is_file() {
                keys.push(key);
            }
        }

        Ok(())
    }
}

impl ObjectBucket for DirectoryBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        self.collect_keys(&self.root, "", &mut keys)?;
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn download(&self, key: &str, target: &NormalizedPath) -> Result<()> {
        let source = self.object_path(key);
        if !source.is_file() {
            return Err(Error::ObjectNotFound {
                bucket: self.name.clone(),
                key: key.to_string(),
            });
        }
        io::copy_atomic(&source, target)?;
        Ok(())
    }

    fn upload(&self, source: &NormalizedPath, key: &str) -> Result<()> {
        let target = self.object_path(key);
        if let Some(parent) = target.parent() {
            let native = parent.to_native();
            fs::create_dir_all(&native).map_err(|e| mirror_fs::Error::io(native, e))?;
        }
        io::copy_atomic(source, &target)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let target = self.object_path(key);
        if !target.is_file() {
            return Err(Error::ObjectNotFound {
                bucket: self.name.clone(),
                key: key.to_string(),
            });
        }
        io::remove_file(&target)?;
        Ok(())
    }
}
