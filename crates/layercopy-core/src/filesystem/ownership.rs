//! Recursive ownership rewriting for bundle trees.
//!
//! Symlinks are never chowned. Their targets get rewritten when the walk
//! reaches them directly, never through the link.

use std::path::Path;

use layercopy_common::error::{LayercopyError, Result};
use layercopy_common::types::Ownership;
use nix::unistd::{Gid, Uid, chown};
use walkdir::WalkDir;

/// Sets every non-symlink entry under `root`, `root` included, to `owner`.
///
/// The walk is depth-first and does not follow links. The first entry that
/// cannot be read or chowned aborts the walk; entries already rewritten keep
/// their new ownership.
///
/// # Errors
///
/// Returns `LayercopyError::Ownership` naming the entry that failed.
pub fn chown_recursive(root: &Path, owner: Ownership) -> Result<()> {
    tracing::info!(root = %root.display(), %owner, "rewriting ownership");
    let uid = Some(Uid::from_raw(owner.uid));
    let gid = Some(Gid::from_raw(owner.gid));

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| LayercopyError::Ownership {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e.into(),
        })?;
        if entry.path_is_symlink() {
            continue;
        }
        chown(entry.path(), uid, gid).map_err(|e| LayercopyError::Ownership {
            path: entry.path().to_path_buf(),
            source: e.into(),
        })?;
    }

    Ok(())
}

/// Rewrites ownership under `root` to the sentinel identity.
///
/// # Errors
///
/// See [`chown_recursive`].
pub fn chown_to_sentinel(root: &Path) -> Result<()> {
    chown_recursive(root, Ownership::sentinel())
}
