//! Recursive directory copying.
//!
//! Copies the contents of one directory into another entirely in-process:
//! no shell, no `cp`, and so no quoting of identifiers into command lines.

use std::fs::{self, Metadata};
use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use layercopy_common::error::{LayercopyError, Result};
use walkdir::WalkDir;

/// Copies the full contents of one directory tree into another.
pub trait RecursiveCopier: Send + Sync {
    /// Copies every entry below `from` into `to`, replacing entries that
    /// already exist at the same relative path.
    ///
    /// `to` must already exist. `from` itself is not copied, only its contents.
    ///
    /// # Errors
    ///
    /// Returns `LayercopyError::Copy` on the first entry that cannot be read
    /// or written. Entries copied before the failure are left in place.
    fn copy_tree(&self, from: &Path, to: &Path) -> Result<()>;
}

/// Walks the source with `walkdir` and recreates each entry natively.
///
/// Regular files keep their permission bits, symlinks are recreated with the
/// same target and never followed, FIFOs and device nodes are recreated with
/// `mknod(2)`. Sockets are skipped. Hard links are copied as separate files.
///
/// Access and modification times are carried over for every entry, symlinks
/// included. Owner and group are carried over only when running as root;
/// otherwise copies belong to the calling user.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCopier;

impl RecursiveCopier for NativeCopier {
    fn copy_tree(&self, from: &Path, to: &Path) -> Result<()> {
        tracing::info!(from = %from.display(), to = %to.display(), "copying tree");
        copy_contents(from, to).map_err(|e| LayercopyError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        })
    }
}

fn copy_contents(from: &Path, to: &Path) -> io::Result<()> {
    let preserve_owner = nix::unistd::geteuid().is_root();
    // Directory metadata is applied last so read-only directories can still be
    // filled and their mtimes are not bumped by the entries written into them.
    let mut dirs: Vec<(PathBuf, Metadata)> = Vec::new();

    for entry in WalkDir::new(from).min_depth(1).follow_links(false) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(from).map_err(io::Error::other)?;
        let target = to.join(relative);
        let metadata = entry.metadata()?;
        let file_type = metadata.file_type();

        if file_type.is_dir() {
            match fs::symlink_metadata(&target) {
                Ok(existing) if existing.is_dir() => {}
                Ok(_) => {
                    fs::remove_file(&target)?;
                    fs::create_dir(&target)?;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir(&target)?,
                Err(e) => return Err(e),
            }
            dirs.push((target, metadata));
            continue;
        }

        clear_target(&target)?;

        if file_type.is_file() {
            let _ = fs::copy(entry.path(), &target)?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())?;
            std::os::unix::fs::symlink(&link, &target)?;
        } else if file_type.is_fifo() {
            nix::unistd::mkfifo(&target, permission_bits(metadata.mode()))?;
        } else if file_type.is_char_device() || file_type.is_block_device() {
            let kind = if file_type.is_char_device() {
                nix::sys::stat::SFlag::S_IFCHR
            } else {
                nix::sys::stat::SFlag::S_IFBLK
            };
            nix::sys::stat::mknod(
                &target,
                kind,
                permission_bits(metadata.mode()),
                metadata.rdev(),
            )?;
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping socket");
            continue;
        }

        apply_metadata(&target, &metadata, preserve_owner)?;
    }

    for (dir, metadata) in dirs.iter().rev() {
        apply_metadata(dir, metadata, preserve_owner)?;
    }

    Ok(())
}

/// Copies owner (when `preserve_owner`), permission bits and timestamps from
/// `metadata` onto `target` without following a symlink at `target`.
fn apply_metadata(target: &Path, metadata: &Metadata, preserve_owner: bool) -> io::Result<()> {
    if preserve_owner {
        std::os::unix::fs::lchown(target, Some(metadata.uid()), Some(metadata.gid()))?;
    }
    // chown may clear setuid/setgid, so the mode goes on after it.
    if !metadata.file_type().is_symlink() {
        fs::set_permissions(target, fs::Permissions::from_mode(metadata.mode() & 0o7777))?;
    }
    filetime::set_symlink_file_times(
        target,
        FileTime::from_last_access_time(metadata),
        FileTime::from_last_modification_time(metadata),
    )
}

/// Removes whatever non-directory-compatible entry occupies `target`.
fn clear_target(target: &Path) -> io::Result<()> {
    match fs::symlink_metadata(target) {
        Ok(existing) if existing.is_dir() => fs::remove_dir_all(target),
        Ok(_) => fs::remove_file(target),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn permission_bits(mode: u32) -> nix::sys::stat::Mode {
    nix::sys::stat::Mode::from_bits_truncate((mode & 0o7777) as nix::libc::mode_t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(root: &Path) {
        fs::create_dir_all(root.join("etc/conf.d")).expect("mkdir");
        fs::write(root.join("etc/hostname"), b"layer").expect("write");
        fs::write(root.join("etc/conf.d/app.conf"), b"key=value").expect("write");
        fs::write(root.join(".profile"), b"export A=1").expect("write");
        std::os::unix::fs::symlink("etc/hostname", root.join("hostname-link")).expect("symlink");
        std::os::unix::fs::symlink("/does/not/exist", root.join("dangling")).expect("symlink");
    }

    #[test]
    fn copies_nested_and_hidden_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (src, dst) = (dir.path().join("src"), dir.path().join("dst"));
        fixture(&src);
        fs::create_dir(&dst).expect("mkdir");

        NativeCopier.copy_tree(&src, &dst).expect("copy");

        assert_eq!(fs::read(dst.join("etc/hostname")).expect("read"), b"layer");
        assert_eq!(
            fs::read(dst.join("etc/conf.d/app.conf")).expect("read"),
            b"key=value"
        );
        assert_eq!(fs::read(dst.join(".profile")).expect("read"), b"export A=1");
    }

    #[test]
    fn recreates_symlinks_without_following_them() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (src, dst) = (dir.path().join("src"), dir.path().join("dst"));
        fixture(&src);
        fs::create_dir(&dst).expect("mkdir");

        NativeCopier.copy_tree(&src, &dst).expect("copy");

        let link = fs::symlink_metadata(dst.join("hostname-link")).expect("lstat");
        assert!(link.file_type().is_symlink());
        assert_eq!(
            fs::read_link(dst.join("hostname-link")).expect("readlink"),
            PathBuf::from("etc/hostname")
        );
        assert_eq!(
            fs::read_link(dst.join("dangling")).expect("readlink"),
            PathBuf::from("/does/not/exist")
        );
    }

    #[test]
    fn overwrites_existing_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (src, dst) = (dir.path().join("src"), dir.path().join("dst"));
        fs::create_dir_all(&src).expect("mkdir");
        fs::create_dir_all(dst.join("was-dir/inner")).expect("mkdir");
        fs::write(src.join("was-dir"), b"now a file").expect("write");
        fs::write(src.join("same"), b"new").expect("write");
        fs::write(dst.join("same"), b"old").expect("write");
        fs::set_permissions(dst.join("same"), fs::Permissions::from_mode(0o444)).expect("chmod");
        fs::write(dst.join("untouched"), b"keep").expect("write");

        NativeCopier.copy_tree(&src, &dst).expect("copy");

        assert_eq!(fs::read(dst.join("was-dir")).expect("read"), b"now a file");
        assert_eq!(fs::read(dst.join("same")).expect("read"), b"new");
        assert_eq!(fs::read(dst.join("untouched")).expect("read"), b"keep");
    }

    #[test]
    fn preserves_file_and_directory_modes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (src, dst) = (dir.path().join("src"), dir.path().join("dst"));
        fs::create_dir_all(src.join("locked")).expect("mkdir");
        fs::write(src.join("locked/secret"), b"s").expect("write");
        fs::write(src.join("run.sh"), b"#!/bin/sh").expect("write");
        fs::set_permissions(src.join("run.sh"), fs::Permissions::from_mode(0o750)).expect("chmod");
        fs::set_permissions(src.join("locked"), fs::Permissions::from_mode(0o555)).expect("chmod");
        fs::create_dir(&dst).expect("mkdir");

        NativeCopier.copy_tree(&src, &dst).expect("copy");

        let mode = |p: &Path| fs::metadata(p).expect("stat").permissions().mode() & 0o7777;
        assert_eq!(mode(&dst.join("run.sh")), 0o750);
        assert_eq!(mode(&dst.join("locked")), 0o555);
        assert_eq!(fs::read(dst.join("locked/secret")).expect("read"), b"s");

        for d in [&src, &dst] {
            fs::set_permissions(d.join("locked"), fs::Permissions::from_mode(0o755)).expect("chmod");
        }
    }

    #[test]
    fn preserves_modification_times() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (src, dst) = (dir.path().join("src"), dir.path().join("dst"));
        fixture(&src);
        fs::create_dir(&dst).expect("mkdir");
        let old = FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(src.join("etc/hostname"), old).expect("set mtime");
        filetime::set_symlink_file_times(src.join("hostname-link"), old, old).expect("set mtime");
        filetime::set_file_mtime(src.join("etc/conf.d"), old).expect("set mtime");
        filetime::set_file_mtime(src.join("etc"), old).expect("set mtime");

        NativeCopier.copy_tree(&src, &dst).expect("copy");

        let mtime = |p: &Path| {
            FileTime::from_last_modification_time(&fs::symlink_metadata(p).expect("lstat"))
        };
        assert_eq!(mtime(&dst.join("etc/hostname")), old);
        assert_eq!(mtime(&dst.join("hostname-link")), old);
        assert_eq!(mtime(&dst.join("etc/conf.d")), old);
        assert_eq!(mtime(&dst.join("etc")), old);
    }

    #[test]
    fn preserves_ownership_when_root() {
        if !nix::unistd::geteuid().is_root() {
            return;
        }
        let dir = tempfile::tempdir().expect("tempdir");
        let (src, dst) = (dir.path().join("src"), dir.path().join("dst"));
        fixture(&src);
        fs::create_dir(&dst).expect("mkdir");
        for rel in ["etc", "etc/hostname", "hostname-link"] {
            std::os::unix::fs::lchown(src.join(rel), Some(1234), Some(4321)).expect("lchown");
        }
        fs::set_permissions(src.join("etc/hostname"), fs::Permissions::from_mode(0o4755))
            .expect("chmod");

        NativeCopier.copy_tree(&src, &dst).expect("copy");

        for rel in ["etc", "etc/hostname", "hostname-link"] {
            let meta = fs::symlink_metadata(dst.join(rel)).expect("lstat");
            assert_eq!((meta.uid(), meta.gid()), (1234, 4321), "{rel}");
        }
        let mode = fs::metadata(dst.join("etc/hostname")).expect("stat").mode() & 0o7777;
        assert_eq!(mode, 0o4755);
    }

    #[test]
    fn recreates_fifos() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (src, dst) = (dir.path().join("src"), dir.path().join("dst"));
        fs::create_dir_all(&src).expect("mkdir");
        fs::create_dir(&dst).expect("mkdir");
        nix::unistd::mkfifo(&src.join("pipe"), nix::sys::stat::Mode::from_bits_truncate(0o644))
            .expect("mkfifo");

        NativeCopier.copy_tree(&src, &dst).expect("copy");

        let meta = fs::symlink_metadata(dst.join("pipe")).expect("lstat");
        assert!(meta.file_type().is_fifo());
    }

    #[test]
    fn missing_source_is_a_copy_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = NativeCopier.copy_tree(&dir.path().join("absent"), dir.path());
        assert!(matches!(result, Err(LayercopyError::Copy { .. })));
    }
}
