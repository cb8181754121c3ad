//! Directory creation and probes.

use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use layercopy_common::constants::DIR_MODE;
use layercopy_common::error::{LayercopyError, Result};

/// Creates `path` and any missing parents with mode `0o755`.
///
/// # Errors
///
/// Returns `LayercopyError::Io` if any component cannot be created.
pub fn ensure_dir(path: &Path) -> Result<()> {
    tracing::info!(dir = %path.display(), "creating dir");
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(path)
        .map_err(|e| LayercopyError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Returns `true` if `path` has no entries or cannot be opened.
///
/// A missing directory counts as empty. Only the first entry is read, so the
/// cost does not depend on the size of the directory.
pub fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).map_or(true, |mut entries| entries.next().is_none())
}
