//! Filesystem management for plain-copy layers.
//!
//! Provides recursive copying between layer directories, ownership
//! normalization for bundles, and directory probes.

pub mod copy;
pub mod dir;
pub mod ownership;

pub use copy::{NativeCopier, RecursiveCopier};
pub use dir::{ensure_dir, is_empty_dir};
pub use ownership::{chown_recursive, chown_to_sentinel};
