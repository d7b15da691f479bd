//! Two-tier store: a hot in-memory tier in front of a durable cold store.
//!
//! - put(stage=true):  write-through to cold, keep a hot copy.
//! - put(stage=false): write to cold, drop any hot copy.
//! - get: hot first; on a cold hit the blob is promoted to hot.
//! - sync: drops this instance's hot copies of the bucket. Each process has
//!   its own hot tier, so a peer's commit to cold is only seen after sync.
//! - destroy: both tiers.

use anyhow::Result;
use log::trace;
use std::sync::Arc;

use super::{BlobStore, Bucket, MemStore};

#[derive(Clone)]
pub struct TieredStore {
    hot: MemStore,
    cold: Arc<dyn BlobStore>,
}

impl TieredStore {
    pub fn new(cold: Arc<dyn BlobStore>) -> Self {
        Self {
            hot: MemStore::new(),
            cold,
        }
    }

    /// Keys of `bucket` currently staged in the hot tier.
    pub fn hot_keys(&self, bucket: &str) -> usize {
        self.hot.key_count(bucket)
    }
}

impl BlobStore for TieredStore {
    fn open_bucket(&self, name: &str) -> Result<Arc<dyn Bucket>> {
        Ok(Arc::new(TieredBucket {
            name: name.to_string(),
            hot: self.hot.open_bucket(name)?,
            cold: self.cold.open_bucket(name)?,
            hot_store: self.hot.clone(),
        }))
    }
}

struct TieredBucket {
    name: String,
    hot: Arc<dyn Bucket>,
    cold: Arc<dyn Bucket>,
    hot_store: MemStore,
}

impl Bucket for TieredBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str, out: &mut [u8]) -> Result<bool> {
        if self.hot.get(key, out)? {
            return Ok(true);
        }
        if self.cold.get(key, out)? {
            trace!("tiered: promote {}/{}", self.name, key);
            self.hot.put(key, out, true)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn put(&self, key: &str, data: &[u8], stage: bool) -> Result<()> {
        self.cold.put(key, data, stage)?;
        if stage {
            self.hot.put(key, data, stage)?;
        } else {
            self.hot_store.remove_key(&self.name, key);
        }
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        trace!("tiered: drop hot copies of {}", self.name);
        self.hot_store.clear_bucket(&self.name);
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        self.hot.destroy()?;
        self.cold.destroy()
    }
}
