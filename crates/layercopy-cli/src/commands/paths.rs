//! `lcp paths` — Show where volumes and bundles live.

use std::process::ExitCode;

use layercopy_common::config::LayercopyConfig;
use layercopy_image::StorageLayout;

/// Executes the `paths` command.
///
/// # Errors
///
/// Returns an error if the base directory is unusable.
pub fn execute(config: &LayercopyConfig) -> anyhow::Result<ExitCode> {
    let layout = StorageLayout::open(&config.base_dir)?;
    println!("VOLUMES\t{}", layout.volumes_dir().display());
    println!("DIFFS\t{}", layout.diffs_dir().display());
    println!("OWNER\t{}", config.owner);
    Ok(ExitCode::SUCCESS)
}
