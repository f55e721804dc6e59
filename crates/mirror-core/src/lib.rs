//! Snapshot-diff reconciliation engine for Package Mirror
//!
//! Keeps a local package directory and a remote store eventually consistent
//! around an opaque unit of work:
//!
//! - **Storage drivers**: single-file transfers against a local directory or
//!   an object-store bucket
//! - **Snapshots**: point-in-time listings of the local root
//! - **Change events**: removal and addition sets replayed through a driver
//! - **SyncCoordinator**: the before/after protocol around each unit of work
//!
//! # Architecture
//!
//! ```text
//!              host (CLI / server)
//!                      |
//!               SyncCoordinator
//!                      |
//!            ReconciliationClient
//!                 |          |
//!            Snapshot    ChangeEvent
//!                      |
//!                StorageDriver
//!               /             \
//!        LocalFsDriver   ObjectStoreDriver<B: ObjectBucket>
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mirror_core::{DriverRoots, LocalFsDriver, Result, SyncCoordinator};
//!
//! fn example() -> Result<()> {
//!     let driver = LocalFsDriver::new(DriverRoots::new("./packages", "./.remote_packages"));
//!     let mut coordinator = SyncCoordinator::from_driver(Arc::new(driver));
//!
//!     let (_, report) = coordinator.run_unit_of_work(|| {
//!         // add or remove files under ./packages
//!     })?;
//!     assert!(report.success());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod event;
pub mod hooks;
pub mod settings;
pub mod snapshot;

pub use client::ReconciliationClient;
pub use coordinator::{CyclePhase, CycleReport, EventReport, PullSummary, SyncCoordinator};
pub use driver::{
    BackendKind, DirectoryBucket, DriverRoots, LocalFsDriver, MemoryBucket, ObjectBucket,
    ObjectStoreDriver, StorageDriver,
};
pub use error::{Error, Result, Side};
pub use event::{ChangeEvent, ChangeKind};
pub use hooks::HookPoint;
pub use settings::{MirrorSettings, SettingsLayer, Tier};
pub use snapshot::{Difference, Snapshot};
