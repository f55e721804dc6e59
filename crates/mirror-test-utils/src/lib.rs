//! Shared test utilities for the package-mirror workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not
//! each rebuild their own temporary mirrors. It is a dev-dependency only,
//! never published.
//!
//! # Modules
//!
//! - [`mirror`]: [`TestMirror`], a temporary local root and remote root
//! - [`recording`]: [`RecordingDriver`], a driver that records every call

pub mod mirror;
pub mod recording;

pub use mirror::TestMirror;
pub use recording::{DriverCall, RecordingDriver};
