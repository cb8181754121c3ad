//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Subdirectory of the base directory holding one materialized volume per layer.
pub const VOLUMES_DIR: &str = "volumes";

/// Subdirectory of the base directory holding one bundle per container handle.
pub const DIFFS_DIR: &str = "diffs";

/// Owner uid/gid written onto every bundle entry: the largest 32-bit id minus one.
pub const SENTINEL_ID: u32 = u32::MAX - 1;

/// Permission bits for directories created by the store and the bundler.
pub const DIR_MODE: u32 = 0o755;

/// Default base directory on Linux with root access.
pub const DEFAULT_BASE_DIR: &str = "/var/lib/layercopy";

/// Environment variable overriding the base directory in the CLI.
pub const BASE_DIR_ENV: &str = "LAYERCOPY_BASE_DIR";

/// Returns the base directory, preferring `$HOME/.layercopy` for non-root
/// users and falling back to `/var/lib/layercopy`.
fn resolve_data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        let user_dir = PathBuf::from(home).join(".layercopy");
        if std::fs::create_dir_all(&user_dir).is_ok() {
            return user_dir;
        }
    }
    PathBuf::from(DEFAULT_BASE_DIR)
}

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved base directory for this session.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(resolve_data_dir)
}
