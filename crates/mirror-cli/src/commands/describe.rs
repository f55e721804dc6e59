//! Describe command implementation

use colored::Colorize;
use mirror_core::MirrorSettings;
use serde_json::json;

use crate::error::Result;

/// Print the resolved configuration and whether it can build a driver.
pub fn run_describe(settings: &MirrorSettings, as_json: bool) -> Result<()> {
    let validation = settings.validate();

    if as_json {
        let report = json!({
            "tier": settings.tier.as_str(),
            "backend": settings.backend,
            "local_root": settings.local_root.as_str(),
            "remote_root": settings.remote_root.as_str(),
            "bucket": settings.bucket,
            "valid": validation.is_ok(),
            "error": validation.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", settings.describe());
    println!();
    match validation {
        Ok(()) => println!("{} Configuration is valid.", "OK".green().bold()),
        Err(e) => println!("{} {}", "!!".yellow().bold(), e),
    }
    Ok(())
}
