//! Per-container root filesystem bundling.
//!
//! A bundle is an independent copy of the top volume of a layer chain with
//! every non-symlink entry owned by the configured identity. The volume is
//! never modified.
//!
//! A bundle is written once. An existing non-empty `diffs/<handle>` is
//! refused rather than overlaid, since entries absent from the new top volume
//! would otherwise survive in the container root.

use std::path::PathBuf;

use layercopy_common::config::LayercopyConfig;
use layercopy_common::error::{LayercopyError, Result};
use layercopy_common::types::{Handle, LayerId, Ownership};
use layercopy_core::filesystem::{
    NativeCopier, RecursiveCopier, chown_recursive, ensure_dir, is_empty_dir,
};
use oci_spec::runtime::{RootBuilder, Spec, SpecBuilder};

use crate::lock::KeyedLocks;
use crate::storage::StorageLayout;

/// Builds container roots under `<base>/diffs` from volumes under `<base>/volumes`.
#[derive(Debug)]
pub struct Bundler<C = NativeCopier> {
    layout: StorageLayout,
    copier: C,
    owner: Ownership,
    locks: KeyedLocks,
}

impl Bundler {
    /// Opens a bundler with the native copier and the configured owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base directory is unusable.
    pub fn open(config: &LayercopyConfig) -> Result<Self> {
        config.validate()?;
        let layout = StorageLayout::open(&config.base_dir)?;
        Ok(Self::with_copier(layout, NativeCopier, config.owner))
    }
}

impl<C: RecursiveCopier> Bundler<C> {
    /// Builds a bundler from an explicit copy implementation.
    pub fn with_copier(layout: StorageLayout, copier: C, owner: Ownership) -> Self {
        Self {
            layout,
            copier,
            owner,
            locks: KeyedLocks::new(),
        }
    }

    /// Materializes the root filesystem for `handle` from the last layer of
    /// `layer_ids` and returns a runtime spec whose root points at it.
    ///
    /// Only the top layer is read; its volume already holds the content of
    /// every ancestor. All other spec fields keep their defaults for the
    /// caller to fill in.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty chain, `NotFound` if the top
    /// volume does not exist, and `AlreadyExists` if `handle` already has a
    /// non-empty bundle directory, all before anything is written. Directory
    /// creation, copy, and ownership failures are returned as they happen and
    /// leave the partial bundle on disk.
    pub fn bundle(&self, handle: &Handle, layer_ids: &[LayerId]) -> Result<Spec> {
        let top = layer_ids.last().ok_or_else(|| LayercopyError::InvalidInput {
            message: format!("layer chain for {handle} is empty"),
        })?;
        let volume = self.layout.volume_path(top);
        if !volume.is_dir() {
            return Err(LayercopyError::NotFound {
                kind: "volume",
                id: top.to_string(),
            });
        }

        let _guard = self.locks.acquire(handle.as_str());
        let dest = self.layout.bundle_path(handle);
        if !is_empty_dir(&dest) {
            tracing::warn!(handle = %handle, dest = %dest.display(), "bundle already populated");
            return Err(LayercopyError::AlreadyExists {
                kind: "bundle",
                id: handle.to_string(),
            });
        }
        tracing::info!(
            handle = %handle,
            top = %top,
            layers = layer_ids.len(),
            dest = %dest.display(),
            "bundling rootfs"
        );
        ensure_dir(&dest)?;
        self.copier.copy_tree(&volume, &dest)?;
        chown_recursive(&dest, self.owner)?;

        let root = RootBuilder::default()
            .path(dest.clone())
            .readonly(false)
            .build()?;
        let spec = SpecBuilder::default().root(root).build()?;
        tracing::info!(handle = %handle, root = %dest.display(), "rootfs bundled");
        Ok(spec)
    }

    /// Returns the path of `handle`'s bundle, whether or not it exists yet.
    #[must_use]
    pub fn bundle_path(&self, handle: &Handle) -> PathBuf {
        self.layout.bundle_path(handle)
    }

    /// Returns the identity written onto bundle entries.
    #[must_use]
    pub const fn owner(&self) -> Ownership {
        self.owner
    }
}
