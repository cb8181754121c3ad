//! Copy-based layer store.
//!
//! Each layer is materialized as a full volume: the parent volume's content
//! copied in, then the layer's own archive extracted on top. A child volume
//! therefore never needs its ancestors at read time.
//!
//! Unpacking an identifier that already has a volume is additive: the parent
//! copy and the extraction run again over the existing content. Callers check
//! [`LayerStore::exists`] first to skip redundant work.

use std::io::Read;
use std::path::PathBuf;

use layercopy_common::config::LayercopyConfig;
use layercopy_common::error::{LayercopyError, Result};
use layercopy_common::types::LayerId;
use layercopy_core::filesystem::{NativeCopier, RecursiveCopier, ensure_dir, is_empty_dir};

use crate::archive::{ArchiveExtractor, TarExtractor};
use crate::lock::KeyedLocks;
use crate::storage::StorageLayout;

/// Materializes layers under `<base>/volumes`.
#[derive(Debug)]
pub struct LayerStore<C = NativeCopier, E = TarExtractor> {
    layout: StorageLayout,
    copier: C,
    extractor: E,
    locks: KeyedLocks,
}

impl LayerStore {
    /// Opens a store with the native copier and tar extractor.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base directory is unusable.
    pub fn open(config: &LayercopyConfig) -> Result<Self> {
        config.validate()?;
        let layout = StorageLayout::open(&config.base_dir)?;
        Ok(Self::with_components(
            layout,
            NativeCopier,
            TarExtractor::default(),
        ))
    }
}

impl<C: RecursiveCopier, E: ArchiveExtractor> LayerStore<C, E> {
    /// Builds a store from explicit copy and extraction implementations.
    pub fn with_components(layout: StorageLayout, copier: C, extractor: E) -> Self {
        Self {
            layout,
            copier,
            extractor,
            locks: KeyedLocks::new(),
        }
    }

    /// Materializes layer `id` from `archive`, inheriting `parent`'s volume.
    ///
    /// A parent whose volume is missing or empty is ignored and the layer is
    /// built as a root layer. Concurrent unpacks of the same `id` run one at a
    /// time.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume directory cannot be created, if copying
    /// the parent fails, or if extraction fails. A partially written volume is
    /// left on disk.
    pub fn unpack<R: Read>(
        &self,
        id: &LayerId,
        parent: Option<&LayerId>,
        mut archive: R,
    ) -> Result<()> {
        if parent == Some(id) {
            return Err(LayercopyError::InvalidInput {
                message: format!("layer {id} cannot be its own parent"),
            });
        }

        let _guard = self.locks.acquire(id.as_str());
        let dest = self.layout.volume_path(id);
        ensure_dir(&dest)?;

        if let Some(parent) = parent {
            let parent_dir = self.layout.volume_path(parent);
            if is_empty_dir(&parent_dir) {
                tracing::debug!(
                    layer = %id,
                    parent = %parent,
                    "parent volume missing or empty, unpacking as root layer"
                );
            } else {
                tracing::info!(
                    layer = %id,
                    parent = %parent,
                    from = %parent_dir.display(),
                    to = %dest.display(),
                    "copying parent volume"
                );
                self.copier.copy_tree(&parent_dir, &dest)?;
            }
        }

        tracing::info!(layer = %id, dest = %dest.display(), "unpacking layer archive");
        self.extractor.extract(&mut archive, &dest)?;
        tracing::info!(layer = %id, "layer unpacked");
        Ok(())
    }

    /// Like [`LayerStore::unpack`], taking raw identifiers where an empty
    /// `parent_id` means "no parent".
    ///
    /// # Errors
    ///
    /// Returns `LayercopyError::InvalidIdentifier` for malformed identifiers,
    /// otherwise the errors of [`LayerStore::unpack`].
    pub fn unpack_str<R: Read>(&self, id: &str, parent_id: &str, archive: R) -> Result<()> {
        let id = LayerId::parse(id)?;
        let parent = LayerId::parse_parent(parent_id)?;
        self.unpack(&id, parent.as_ref(), archive)
    }

    /// Returns whether a volume directory exists for `id`.
    ///
    /// This is a presence check only: a volume left behind by a failed unpack
    /// also counts. Inaccessible paths count as absent.
    pub fn exists(&self, id: &LayerId) -> bool {
        let present = std::fs::metadata(self.layout.volume_path(id)).is_ok();
        tracing::debug!(layer = %id, present, "checked layer existence");
        present
    }

    /// Returns the path of `id`'s volume, whether or not it exists yet.
    #[must_use]
    pub fn volume_path(&self, id: &LayerId) -> PathBuf {
        self.layout.volume_path(id)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Records calls instead of touching the filesystem.
    #[derive(Debug, Default)]
    struct RecordingCopier {
        calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    }

    impl RecursiveCopier for RecordingCopier {
        fn copy_tree(&self, from: &Path, to: &Path) -> Result<()> {
            self.calls
                .lock()
                .expect("lock")
                .push((from.to_path_buf(), to.to_path_buf()));
            Ok(())
        }
    }

    /// Tracks how many copies overlap in time.
    #[derive(Debug, Default)]
    struct SlowCopier {
        inside: AtomicUsize,
        max_inside: AtomicUsize,
        total: AtomicUsize,
    }

    impl RecursiveCopier for SlowCopier {
        fn copy_tree(&self, _from: &Path, _to: &Path) -> Result<()> {
            let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = self.max_inside.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            let _ = self.inside.fetch_sub(1, Ordering::SeqCst);
            let _ = self.total.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails every extraction.
    #[derive(Debug)]
    struct FailingExtractor;

    impl ArchiveExtractor for FailingExtractor {
        fn extract(&self, _reader: &mut dyn Read, dest: &Path) -> Result<()> {
            Err(LayercopyError::Extract {
                dest: dest.to_path_buf(),
                source: std::io::Error::other("corrupt stream"),
            })
        }
    }

    fn empty_tar() -> Vec<u8> {
        tar::Builder::new(Vec::new())
            .into_inner()
            .expect("finish tar")
    }

    fn id(s: &str) -> LayerId {
        LayerId::parse(s).expect("layer id")
    }

    #[test]
    fn copier_is_skipped_for_root_layers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = StorageLayout::open(dir.path()).expect("open");
        let store = LayerStore::with_components(
            layout,
            RecordingCopier::default(),
            TarExtractor::new(false),
        );

        store
            .unpack(&id("base"), None, empty_tar().as_slice())
            .expect("unpack");

        assert!(store.copier.calls.lock().expect("lock").is_empty());
        assert!(store.exists(&id("base")));
    }

    #[test]
    fn copier_receives_parent_and_child_volumes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = StorageLayout::open(dir.path()).expect("open");
        let store = LayerStore::with_components(
            layout,
            RecordingCopier::default(),
            TarExtractor::new(false),
        );
        let parent_dir = store.volume_path(&id("parent"));
        std::fs::create_dir_all(&parent_dir).expect("mkdir");
        std::fs::write(parent_dir.join("a.txt"), b"a").expect("write");

        store
            .unpack(&id("child"), Some(&id("parent")), empty_tar().as_slice())
            .expect("unpack");

        let calls = store.copier.calls.lock().expect("lock");
        assert_eq!(
            calls.as_slice(),
            &[(parent_dir, store.volume_path(&id("child")))]
        );
    }

    #[test]
    fn concurrent_unpacks_of_same_layer_run_one_at_a_time() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = StorageLayout::open(dir.path()).expect("open");
        let store =
            LayerStore::with_components(layout, SlowCopier::default(), TarExtractor::new(false));
        let parent_dir = store.volume_path(&id("parent"));
        std::fs::create_dir_all(&parent_dir).expect("mkdir");
        std::fs::write(parent_dir.join("a.txt"), b"a").expect("write");
        let tar = empty_tar();

        std::thread::scope(|scope| {
            let workers: Vec<_> = (0..2)
                .map(|_| {
                    scope.spawn(|| {
                        store.unpack(&id("child"), Some(&id("parent")), tar.as_slice())
                    })
                })
                .collect();
            for worker in workers {
                worker.join().expect("worker panicked").expect("unpack");
            }
        });

        assert_eq!(store.copier.total.load(Ordering::SeqCst), 2);
        assert_eq!(store.copier.max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn extraction_failure_leaves_partial_volume() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = StorageLayout::open(dir.path()).expect("open");
        let store = LayerStore::with_components(layout, NativeCopier, FailingExtractor);

        let result = store.unpack(&id("broken"), None, &b"irrelevant"[..]);

        assert!(matches!(result, Err(LayercopyError::Extract { .. })));
        assert!(store.exists(&id("broken")));
    }

    #[test]
    fn self_parent_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LayerStore::open(&LayercopyConfig::with_base_dir(dir.path())).expect("open");
        let result = store.unpack(&id("loop"), Some(&id("loop")), empty_tar().as_slice());
        assert!(matches!(result, Err(LayercopyError::InvalidInput { .. })));
        assert!(!store.exists(&id("loop")));
    }

    #[test]
    fn unpack_str_treats_empty_parent_as_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LayerStore::open(&LayercopyConfig::with_base_dir(dir.path())).expect("open");
        store
            .unpack_str("base", "", empty_tar().as_slice())
            .expect("unpack");
        assert!(store.exists(&id("base")));
    }

    #[test]
    fn unpack_str_rejects_traversal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LayerStore::open(&LayercopyConfig::with_base_dir(dir.path())).expect("open");
        let result = store.unpack_str("..", "", empty_tar().as_slice());
        assert!(matches!(
            result,
            Err(LayercopyError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn unpack_fails_when_volume_dir_cannot_be_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("volumes"), b"not a dir").expect("write");
        let store = LayerStore::open(&LayercopyConfig::with_base_dir(dir.path())).expect("open");
        let result = store.unpack(&id("base"), None, empty_tar().as_slice());
        assert!(matches!(result, Err(LayercopyError::Io { .. })));
    }
}
