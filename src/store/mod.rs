//! store — backing-object adapter behind the page cache.
//!
//! The cache only ever talks to a [`Bucket`]: Get/Put of whole pages keyed by
//! the decimal page index, plus Destroy of the whole namespace. Stores must
//! serialise individual Get/Put calls; nothing else is assumed.
//!
//! Подмодули:
//! - mem.rs    — MemStore, общий для потоков процесса.
//! - dir.rs    — DirStore, файл на страницу + advisory lock (fs2).
//! - tiered.rs — TieredStore: горячий MemStore поверх холодного хранилища.

use anyhow::Result;
use std::sync::Arc;

pub mod dir;
pub mod mem;
pub mod tiered;

pub use dir::DirStore;
pub use mem::MemStore;
pub use tiered::TieredStore;

/// One named backing object (a vector's page namespace).
pub trait Bucket: Send + Sync {
    fn name(&self) -> &str;

    /// Read the blob under `key` into `out`.
    ///
    /// Returns `false` (and leaves `out` zeroed) if the key was never written.
    /// A shorter blob fills the head of `out`; the rest is zero.
    fn get(&self, key: &str, out: &mut [u8]) -> Result<bool>;

    /// Commit `data` under `key`. `stage` asks tiered stores to keep the blob hot.
    fn put(&self, key: &str, data: &[u8], stage: bool) -> Result<()>;

    /// Remove every key of this bucket.
    fn destroy(&self) -> Result<()>;

    /// Drop any copy this handle caches privately, so the next `get` sees
    /// what other processes committed. Stores without such copies do nothing.
    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

/// Factory of buckets; open must create the bucket if it does not exist.
pub trait BlobStore: Send + Sync {
    fn open_bucket(&self, name: &str) -> Result<Arc<dyn Bucket>>;
}

/// Copy `src` into `out`, zero-filling whatever `src` does not cover.
pub(crate) fn fill_from(src: &[u8], out: &mut [u8]) {
    let n = src.len().min(out.len());
    out[..n].copy_from_slice(&src[..n]);
    out[n..].fill(0);
}
