//! [`TestMirror`] fixture: a local root and a remote root in one temp dir.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mirror_core::{DriverRoots, LocalFsDriver, StorageDriver};
use tempfile::TempDir;

/// A temporary directory holding `local/` and `remote/` mirror roots.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::TestMirror;
///
/// let mirror = TestMirror::new();
/// mirror.write_remote("a-1.0.whl", "wheel");
/// mirror.assert_remote_exists("a-1.0.whl");
/// ```
pub struct TestMirror {
    temp_dir: TempDir,
    local: PathBuf,
    remote: PathBuf,
}

impl Default for TestMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl TestMirror {
    /// Create both roots, empty.
    ///
    /// # Panics
    /// Panics if the temporary directories cannot be created.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("TestMirror::new: failed to create temp dir");
        let local = temp_dir.path().join("local");
        let remote = temp_dir.path().join("remote");
        fs::create_dir_all(&local).expect("TestMirror::new: failed to create local root");
        fs::create_dir_all(&remote).expect("TestMirror::new: failed to create remote root");

        Self {
            temp_dir,
            local,
            remote,
        }
    }

    /// The temporary directory containing both roots.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn local_root(&self) -> &Path {
        &self.local
    }

    pub fn remote_root(&self) -> &Path {
        &self.remote
    }

    pub fn roots(&self) -> DriverRoots {
        DriverRoots::new(&self.local, &self.remote)
    }

    /// A directory-to-directory driver over both roots.
    pub fn local_driver(&self) -> Arc<dyn StorageDriver> {
        Arc::new(LocalFsDriver::new(self.roots()))
    }

    pub fn write_local(&self, name: &str, content: &str) {
        write(&self.local.join(name), content);
    }

    pub fn write_remote(&self, name: &str, content: &str) {
        write(&self.remote.join(name), content);
    }

    /// # Panics
    /// Panics if the file cannot be removed.
    pub fn remove_local(&self, name: &str) {
        let path = self.local.join(name);
        fs::remove_file(&path)
            .unwrap_or_else(|e| panic!("Could not remove {}: {e}", path.display()));
    }

    /// Names of regular files directly under the local root.
    pub fn local_names(&self) -> BTreeSet<String> {
        file_names(&self.local)
    }

    /// Names of regular files directly under the remote root.
    pub fn remote_names(&self) -> BTreeSet<String> {
        file_names(&self.remote)
    }

    pub fn read_local(&self, name: &str) -> String {
        read(&self.local.join(name))
    }

    pub fn read_remote(&self, name: &str) -> String {
        read(&self.remote.join(name))
    }

    pub fn assert_local_exists(&self, name: &str) {
        let path = self.local.join(name);
        assert!(path.is_file(), "Expected local file: {}", path.display());
    }

    pub fn assert_remote_exists(&self, name: &str) {
        let path = self.remote.join(name);
        assert!(path.is_file(), "Expected remote file: {}", path.display());
    }

    pub fn assert_remote_not_exists(&self, name: &str) {
        let path = self.remote.join(name);
        assert!(!path.exists(), "Expected remote file NOT to exist: {}", path.display());
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Could not create {}: {e}", parent.display()));
    }
    fs::write(path, content).unwrap_or_else(|e| panic!("Could not write {}: {e}", path.display()));
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("Could not read {}: {e}", path.display()))
}

fn file_names(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Could not list {}: {e}", dir.display()))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect()
}
