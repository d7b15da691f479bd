//! In-memory blob store shared by every thread (rank) of the process.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{fill_from, BlobStore, Bucket};

type Blobs = HashMap<String, Vec<u8>>;

/// Cheap to clone; clones share the same buckets.
#[derive(Clone, Default)]
pub struct MemStore {
    buckets: Arc<Mutex<HashMap<String, Blobs>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held by `bucket` (0 if absent).
    pub fn key_count(&self, bucket: &str) -> usize {
        self.buckets
            .lock()
            .map(|b| b.get(bucket).map(|m| m.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Drop one key; missing buckets/keys are ignored.
    pub fn remove_key(&self, bucket: &str, key: &str) {
        if let Ok(mut b) = self.buckets.lock() {
            if let Some(m) = b.get_mut(bucket) {
                m.remove(key);
            }
        }
    }

    /// Drop every key of `bucket` but keep the bucket itself.
    pub fn clear_bucket(&self, bucket: &str) {
        if let Ok(mut b) = self.buckets.lock() {
            if let Some(m) = b.get_mut(bucket) {
                m.clear();
            }
        }
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets
            .lock()
            .map(|b| b.contains_key(bucket))
            .unwrap_or(false)
    }
}

impl BlobStore for MemStore {
    fn open_bucket(&self, name: &str) -> Result<Arc<dyn Bucket>> {
        self.buckets
            .lock()
            .map_err(|_| anyhow!("mem store poisoned"))?
            .entry(name.to_string())
            .or_default();
        Ok(Arc::new(MemBucket {
            name: name.to_string(),
            buckets: self.buckets.clone(),
        }))
    }
}

struct MemBucket {
    name: String,
    buckets: Arc<Mutex<HashMap<String, Blobs>>>,
}

impl Bucket for MemBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str, out: &mut [u8]) -> Result<bool> {
        let guard = self
            .buckets
            .lock()
            .map_err(|_| anyhow!("mem store poisoned"))?;
        match guard.get(&self.name).and_then(|b| b.get(key)) {
            Some(blob) => {
                fill_from(blob, out);
                Ok(true)
            }
            None => {
                out.fill(0);
                Ok(false)
            }
        }
    }

    fn put(&self, key: &str, data: &[u8], _stage: bool) -> Result<()> {
        let mut guard = self
            .buckets
            .lock()
            .map_err(|_| anyhow!("mem store poisoned"))?;
        guard
            .entry(self.name.clone())
            .or_default()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        let mut guard = self
            .buckets
            .lock()
            .map_err(|_| anyhow!("mem store poisoned"))?;
        guard.remove(&self.name);
        Ok(())
    }
}
