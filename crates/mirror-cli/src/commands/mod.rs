//! Command implementations for the pkg-mirror CLI

pub mod describe;
pub mod pull;
pub mod run;

pub use describe::run_describe;
pub use pull::run_pull;
pub use run::run_unit_of_work;

use mirror_core::{MirrorSettings, SettingsLayer};
use mirror_fs::NormalizedPath;

use crate::cli::SettingsArgs;
use crate::error::Result;

/// Resolve settings: tier defaults, then the settings file, then flags and
/// environment (clap already gives flags precedence over environment).
pub fn load_settings(args: &SettingsArgs) -> Result<MirrorSettings> {
    let mut layers = Vec::with_capacity(2);
    if let Some(path) = &args.config {
        let path = NormalizedPath::new(path);
        tracing::debug!(path = %path, "Loading settings file");
        layers.push(SettingsLayer::load(&path)?);
    }
    layers.push(args.to_layer());

    Ok(MirrorSettings::resolve(&layers))
}
