//! Directory blob store: one file per page, one directory per bucket.
//!
//! Layout:
//!   <root>/bkt-<xxhash64(name):016x>/NAME        — human-readable bucket name
//!   <root>/bkt-<xxhash64(name):016x>/LOCK        — advisory lock (fs2)
//!   <root>/bkt-<xxhash64(name):016x>/<key>.page  — page blob
//!
//! Get takes a shared lock, Put an exclusive one, so ranks running as separate
//! processes serialise on the same bucket. Put goes through a tmp file + rename,
//! a reader never sees a half-written page.

use anyhow::{Context, Result};
use fs2::FileExt;
use log::debug;
use std::fs::{self, File, OpenOptions};
use std::hash::Hasher;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::consts::{BUCKET_DIR_PREFIX, BUCKET_LOCK_FILE, BUCKET_NAME_FILE, PAGE_FILE_EXT};

use super::{fill_from, BlobStore, Bucket};

#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open (create) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("create store root {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that holds the pages of `name`.
    pub fn bucket_dir(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{}{:016x}", BUCKET_DIR_PREFIX, bucket_id(name)))
    }
}

/// Stable directory id of a bucket name.
fn bucket_id(name: &str) -> u64 {
    let mut h = twox_hash::XxHash64::with_seed(0x4D45_4741_5645_4331);
    h.write(name.as_bytes());
    h.finish()
}

impl BlobStore for DirStore {
    fn open_bucket(&self, name: &str) -> Result<Arc<dyn Bucket>> {
        let dir = self.bucket_dir(name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("create bucket dir {}", dir.display()))?;
        let name_path = dir.join(BUCKET_NAME_FILE);
        if !name_path.exists() {
            fs::write(&name_path, name.as_bytes())
                .with_context(|| format!("write {}", name_path.display()))?;
        }
        debug!("dir store: opened bucket '{}' at {}", name, dir.display());
        Ok(Arc::new(DirBucket {
            name: name.to_string(),
            dir,
        }))
    }
}

struct DirBucket {
    name: String,
    dir: PathBuf,
}

impl DirBucket {
    fn page_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, PAGE_FILE_EXT))
    }

    /// Lock file for writers; a destroyed bucket is recreated by its next put.
    fn lock_file(&self) -> Result<File> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create bucket dir {}", self.dir.display()))?;
        self.open_lock()
            .with_context(|| format!("open lock file {}", self.dir.join(BUCKET_LOCK_FILE).display()))
    }

    fn open_lock(&self) -> std::io::Result<File> {
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.dir.join(BUCKET_LOCK_FILE))
    }
}

impl Bucket for DirBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str, out: &mut [u8]) -> Result<bool> {
        let path = self.page_path(key);
        // Readers never create the bucket directory.
        let lock = match self.open_lock() {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                out.fill(0);
                return Ok(false);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("open lock file in {}", self.dir.display()))
            }
        };
        lock.lock_shared()
            .with_context(|| format!("lock_shared {}", self.dir.display()))?;
        let res = match File::open(&path) {
            Ok(mut f) => {
                let mut buf = Vec::with_capacity(out.len());
                f.read_to_end(&mut buf)
                    .with_context(|| format!("read page {}", path.display()))?;
                fill_from(&buf, out);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                out.fill(0);
                Ok(false)
            }
            Err(e) => Err(e).with_context(|| format!("open page {}", path.display())),
        };
        let _ = lock.unlock();
        res
    }

    fn put(&self, key: &str, data: &[u8], _stage: bool) -> Result<()> {
        let path = self.page_path(key);
        let tmp = self.dir.join(format!("{}.{}.tmp", key, PAGE_FILE_EXT));
        let lock = self.lock_file()?;
        lock.lock_exclusive()
            .with_context(|| format!("lock_exclusive {}", self.dir.display()))?;
        let res = (|| -> Result<()> {
            let mut f = File::create(&tmp)
                .with_context(|| format!("create {}", tmp.display()))?;
            f.write_all(data)
                .with_context(|| format!("write {}", tmp.display()))?;
            fs::rename(&tmp, &path)
                .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
            Ok(())
        })();
        let _ = lock.unlock();
        res
    }

    fn destroy(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                debug!("dir store: destroyed bucket '{}'", self.name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove bucket dir {}", self.dir.display())),
        }
    }
}
