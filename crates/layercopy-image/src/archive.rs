//! Layer archive extraction.
//!
//! Layers arrive as tar streams, optionally gzip-compressed. Compression is
//! detected from the stream's magic bytes since a stream has no file name.

use std::io::{self, Cursor, Read};
use std::path::Path;

use layercopy_common::error::{LayercopyError, Result};

/// Leading bytes of every gzip member.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decodes an archive stream and materializes its entries under a directory.
pub trait ArchiveExtractor: Send + Sync {
    /// Extracts every entry of `reader` into `dest`, replacing entries that
    /// already exist at the same path.
    ///
    /// # Errors
    ///
    /// Returns `LayercopyError::Extract` if the stream is malformed or
    /// truncated, or if an entry cannot be written. Entries written before the
    /// failure are left on disk.
    fn extract(&self, reader: &mut dyn Read, dest: &Path) -> Result<()>;
}

/// Extracts plain or gzip-compressed tar streams with the `tar` crate.
#[derive(Debug, Clone, Copy)]
pub struct TarExtractor {
    preserve_ownership: bool,
}

impl TarExtractor {
    /// Creates an extractor. Archived ownership is only applied when
    /// `preserve_ownership` is set, which requires privileges.
    #[must_use]
    pub const fn new(preserve_ownership: bool) -> Self {
        Self { preserve_ownership }
    }

    fn unpack<R: Read>(&self, reader: R, dest: &Path) -> io::Result<()> {
        let mut archive = tar::Archive::new(reader);
        archive.set_overwrite(true);
        archive.set_preserve_permissions(true);
        archive.set_preserve_mtime(true);
        archive.set_preserve_ownerships(self.preserve_ownership);
        archive.set_unpack_xattrs(false);
        archive.unpack(dest)
    }
}

impl Default for TarExtractor {
    /// Preserves archived ownership only when running as root, like `tar -x`.
    fn default() -> Self {
        Self::new(nix::unistd::geteuid().is_root())
    }
}

impl ArchiveExtractor for TarExtractor {
    fn extract(&self, reader: &mut dyn Read, dest: &Path) -> Result<()> {
        let to_err = |e| LayercopyError::Extract {
            dest: dest.to_path_buf(),
            source: e,
        };

        let mut prefix = [0u8; GZIP_MAGIC.len()];
        let filled = read_prefix(reader, &mut prefix).map_err(to_err)?;
        let is_gzip = prefix[..filled] == GZIP_MAGIC;
        tracing::info!(dest = %dest.display(), gzip = is_gzip, "extracting archive");

        let stream = Cursor::new(&prefix[..filled]).chain(reader);
        let unpacked = if is_gzip {
            self.unpack(flate2::read::GzDecoder::new(stream), dest)
        } else {
            self.unpack(stream, dest)
        };
        unpacked.map_err(to_err)
    }
}

/// Fills `buf` from `reader` across short reads, stopping early only at EOF.
/// Returns the number of bytes read.
fn read_prefix(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
