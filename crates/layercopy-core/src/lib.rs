//! # layercopy-core
//!
//! Low-level filesystem primitives for plain-copy layering.
//!
//! This crate provides:
//! - **Copy**: an in-process recursive copier that preserves modes, symlinks
//!   and special files without shelling out.
//! - **Ownership**: a depth-first ownership rewrite that never touches symlinks.
//! - **Probes**: a constant-time "is this directory empty" check.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod filesystem;
