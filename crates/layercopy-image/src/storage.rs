//! On-disk layout of volumes and bundles.
//!
//! ```text
//! <base>/volumes/<layer-id>/...   one full volume per layer
//! <base>/diffs/<handle>/...       one bundled root per container
//! ```

use std::path::{Path, PathBuf};

use layercopy_common::constants::{DIFFS_DIR, VOLUMES_DIR};
use layercopy_common::error::{LayercopyError, Result};
use layercopy_common::types::{Handle, LayerId};

/// Derives volume and bundle paths from the base directory.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Root directory for all stored data.
    root: PathBuf,
}

impl StorageLayout {
    /// Opens the layout at the given base directory.
    ///
    /// Nothing is created here; directories appear on the first unpack or bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if the base directory is empty.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(LayercopyError::Config {
                message: "base directory must not be empty".into(),
            });
        }
        tracing::info!(path = %root.display(), "opening storage layout");
        Ok(Self { root })
    }

    /// Returns the directory holding every volume.
    #[must_use]
    pub fn volumes_dir(&self) -> PathBuf {
        self.root.join(VOLUMES_DIR)
    }

    /// Returns the directory holding every bundle.
    #[must_use]
    pub fn diffs_dir(&self) -> PathBuf {
        self.root.join(DIFFS_DIR)
    }

    /// Returns the path to a layer's volume.
    #[must_use]
    pub fn volume_path(&self, id: &LayerId) -> PathBuf {
        self.volumes_dir().join(id.as_str())
    }

    /// Returns the path to a container's bundle.
    #[must_use]
    pub fn bundle_path(&self, handle: &Handle) -> PathBuf {
        self.diffs_dir().join(handle.as_str())
    }

    /// Returns the base storage path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
