//! # layercopy-image
//!
//! Layer and root filesystem management using plain copies instead of a
//! union filesystem.
//!
//! Handles:
//! - **Store**: materializes layers as full volumes (parent content plus the
//!   layer's own archive) and answers existence queries.
//! - **Bundle**: copies the top volume of a layer chain into a per-container
//!   root and normalizes its ownership.
//! - **Archive**: in-process tar decoding with transparent gzip support.
//! - **Storage**: the `volumes/` and `diffs/` layout under the base directory.
//! - **Lock**: per-identifier mutual exclusion for unpack and bundle calls.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod archive;
pub mod bundle;
pub mod lock;
pub mod storage;
pub mod store;

pub use archive::{ArchiveExtractor, TarExtractor};
pub use bundle::Bundler;
pub use storage::StorageLayout;
pub use store::LayerStore;
