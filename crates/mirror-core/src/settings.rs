//! Mirror settings
//!
//! Settings are resolved once at startup from layered sources and passed
//! explicitly into the driver and client constructors:
//!
//! ```text
//! tier defaults  <  settings file  <  environment  <  command line
//! ```
//!
//! Each source is a [`SettingsLayer`] with every field optional; later layers
//! override earlier ones. The tier picks the defaults, so it is resolved
//! from the layers first.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::driver::{
    BackendKind, DirectoryBucket, DriverRoots, LocalFsDriver, ObjectStoreDriver, StorageDriver,
};
use crate::{Error, Result};
use mirror_fs::{ConfigStore, NormalizedPath};

/// Name of the development tier
pub const DEV_TIER: &str = "dev";

/// Environment keys read by [`SettingsLayer::from_lookup`]
pub mod env_keys {
    pub const TIER: &str = "TIER";
    pub const BACKEND: &str = "STORAGE_BACKEND";
    pub const BUCKET: &str = "BUCKET_NAME";
    pub const LOCAL_ROOT: &str = "LOCAL_PACKAGE_DIRECTORY";
    pub const REMOTE_ROOT: &str = "REMOTE_PACKAGE_DIRECTORY";
}

/// Deployment tier; anything other than `dev` is treated as hosted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tier(String);

impl Tier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn dev() -> Self {
        Self::new(DEV_TIER)
    }

    pub fn is_dev(&self) -> bool {
        self.0 == DEV_TIER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::dev()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One partial source of settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsLayer {
    pub tier: Option<Tier>,
    pub backend: Option<BackendKind>,
    pub local_root: Option<String>,
    pub remote_root: Option<String>,
    pub bucket: Option<String>,
}

impl SettingsLayer {
    /// Read a layer from a TOML, JSON or YAML file.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    /// Build a layer from a key lookup such as the process environment.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownBackend`] for an unrecognized backend value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            tier: get(env_keys::TIER).map(Tier::new),
            backend: get(env_keys::BACKEND).map(|v| v.parse()).transpose()?,
            local_root: get(env_keys::LOCAL_ROOT),
            remote_root: get(env_keys::REMOTE_ROOT),
            bucket: get(env_keys::BUCKET),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Fully resolved settings for one mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSettings {
    pub tier: Tier,
    pub backend: BackendKind,
    pub local_root: NormalizedPath,
    pub remote_root: NormalizedPath,
    pub bucket: Option<String>,
}

impl MirrorSettings {
    /// Defaults for a tier: a side-by-side directory mirror for `dev`, a
    /// bucket-backed mirror with a scratch local root otherwise.
    pub fn defaults_for(tier: Tier) -> Self {
        if tier.is_dev() {
            Self {
                tier,
                backend: BackendKind::Local,
                local_root: NormalizedPath::new("./packages"),
                remote_root: NormalizedPath::new("./.remote_packages"),
                bucket: None,
            }
        } else {
            Self {
                tier,
                backend: BackendKind::ObjectStore,
                local_root: NormalizedPath::new("/tmp"),
                remote_root: NormalizedPath::new("packages"),
                bucket: None,
            }
        }
    }

    /// Resolve settings from layers ordered lowest to highest precedence.
    pub fn resolve(layers: &[SettingsLayer]) -> Self {
        let tier = layers
            .iter()
            .rev()
            .find_map(|layer| layer.tier.clone())
            .unwrap_or_default();

        let mut settings = Self::defaults_for(tier);
        for layer in layers {
            settings.apply(layer);
        }
        settings
    }

    /// Resolve from the process environment alone.
    pub fn from_env() -> Result<Self> {
        Ok(Self::resolve(&[SettingsLayer::from_env()?]))
    }

    /// Override fields set in `layer`. The tier is not re-applied: it only
    /// selects defaults during [`resolve`](Self::resolve).
    pub fn apply(&mut self, layer: &SettingsLayer) {
        if let Some(backend) = layer.backend {
            self.backend = backend;
        }
        if let Some(local_root) = &layer.local_root {
            self.local_root = NormalizedPath::new(local_root);
        }
        if let Some(remote_root) = &layer.remote_root {
            self.remote_root = NormalizedPath::new(remote_root);
        }
        if let Some(bucket) = &layer.bucket {
            self.bucket = Some(bucket.clone());
        }
    }

    /// Check that the settings can build a driver.
    pub fn validate(&self) -> Result<()> {
        if self.local_root.trimmed().is_empty() {
            return Err(Error::settings("local root must not be empty or '/'"));
        }
        if self.remote_root.trimmed().is_empty() {
            return Err(Error::settings("remote root must not be empty or '/'"));
        }
        if self.backend == BackendKind::ObjectStore && self.bucket.is_none() {
            return Err(Error::settings(format!(
                "the {} backend requires a bucket ({})",
                BackendKind::ObjectStore,
                env_keys::BUCKET
            )));
        }
        Ok(())
    }

    pub fn roots(&self) -> DriverRoots {
        DriverRoots::new(self.local_root.clone(), self.remote_root.clone())
    }

    /// Build the configured driver.
    ///
    /// The object-store backend opens `bucket` as a [`DirectoryBucket`], so
    /// `BUCKET_NAME` must name an existing directory holding the objects.
    /// Other bucket clients are wired up by constructing an
    /// [`ObjectStoreDriver`] directly.
    pub fn build_driver(&self) -> Result<Arc<dyn StorageDriver>> {
        self.validate()?;

        let driver: Arc<dyn StorageDriver> = match self.backend {
            BackendKind::Local => Arc::new(LocalFsDriver::new(self.roots())),
            BackendKind::ObjectStore => {
                let bucket = self
                    .bucket
                    .as_deref()
                    .ok_or_else(|| Error::settings("missing bucket"))?;
                let bucket_store = DirectoryBucket::open(bucket).map_err(|e| {
                    Error::settings(format!(
                        "bucket '{bucket}' must be a directory holding the objects ({e})"
                    ))
                })?;
                Arc::new(ObjectStoreDriver::new(self.roots(), bucket_store))
            }
        };

        tracing::debug!(backend = %self.backend, "Built storage driver");
        Ok(driver)
    }

    /// Human-readable summary, logged at startup.
    pub fn describe(&self) -> String {
        format!(
            "Package mirror configured with:\n\tTier: {}\n\tBackend: {}\n\tLocal root: {}\n\tRemote root: {}\n\tBucket: {}",
            self.tier,
            self.backend,
            self.local_root,
            self.remote_root,
            self.bucket.as_deref().unwrap_or("-"),
        )
    }
}
