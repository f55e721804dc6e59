//! Pull command implementation

use colored::Colorize;
use mirror_core::MirrorSettings;

use crate::error::Result;

/// Copy every remote package into the local root once.
pub fn run_pull(settings: &MirrorSettings) -> Result<()> {
    let driver = settings.build_driver()?;

    println!(
        "{} Pulling {} into {} ...",
        "=>".blue().bold(),
        settings.remote_root.as_str().cyan(),
        settings.local_root.as_str().cyan()
    );

    let results = driver.pull_all()?;
    let pulled = results.iter().filter(|ok| **ok).count();
    let failed = results.len() - pulled;

    if failed == 0 {
        println!("{} Pulled {} file(s).", "OK".green().bold(), pulled);
    } else {
        println!(
            "{} Pulled {} file(s), {} failed (run with {} for details).",
            "!!".yellow().bold(),
            pulled,
            failed,
            "--verbose".cyan()
        );
    }
    Ok(())
}
