//! vector — paged out-of-core vector (MegaVec) over a blob store bucket.
//!
//! Подмодули:
//! - page.rs  — резидентная страница (элементы + dirty).
//! - cache.rs — индексный доступ, fault/evict/flush, rescore-хинты, barrier.
//! - sort.rs  — Sort/IsSorted через тот же путь с page fault.
//!
//! Ownership model:
//! - A handle owns its page table outright. `clone()`, `subset()` and
//!   `offset_by()` produce full, independent copies: each copy has its own
//!   resident pages, dirty bits and eviction state. Only the backing bucket
//!   is shared.
//! - Index access is relative to the handle's offset (`off`).

use anyhow::{anyhow, Context, Result};
use log::info;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::MegaConfig;
use crate::element::Element;
use crate::flags::AccessFlags;
use crate::partition::{even_pgas, even_pgas_window, LocalRange};
use crate::store::{BlobStore, Bucket};
use crate::tx::{PageHints, RandPattern, SeqPattern, Tx};

pub(crate) mod cache;
pub(crate) mod page;
pub(crate) mod sort;

use page::Page;

/// Distributed paged vector handle.
#[derive(Clone)]
pub struct MegaVec<T: Element> {
    pub(crate) store: Arc<dyn BlobStore>,
    pub(crate) bucket: Option<Arc<dyn Bucket>>,
    pub(crate) cfg: MegaConfig,
    pub(crate) key: String,

    // ----- page table -----
    pub(crate) slots: Vec<Option<Page<T>>>,
    pub(crate) table: BTreeMap<u64, usize>,
    pub(crate) free_slots: Vec<usize>,
    /// Most recently touched slot (single-slot fast path).
    pub(crate) cur_slot: Option<usize>,
    /// Resident pages a transaction marked as no longer needed.
    pub(crate) cold: BTreeSet<u64>,

    // ----- geometry -----
    pub(crate) off: u64,
    pub(crate) size: u64,
    pub(crate) max_size: u64,
    pub(crate) elmt_size: usize,
    pub(crate) elmts_per_page: u64,
    pub(crate) page_bytes: usize,

    // ----- memory accounting -----
    pub(crate) window: usize,
    pub(crate) cur_memory: usize,
    pub(crate) peak_memory: usize,
    pub(crate) min_page: Option<u64>,
    pub(crate) max_page: Option<u64>,

    pub(crate) flags: AccessFlags,
    pub(crate) local: LocalRange,
}

impl<T: Element> MegaVec<T> {
    /// Uninitialised handle over `store`, configured from env.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self::with_config(store, MegaConfig::from_env())
    }

    /// Uninitialised handle with an explicit configuration.
    pub fn with_config(store: Arc<dyn BlobStore>, cfg: MegaConfig) -> Self {
        Self {
            store,
            bucket: None,
            cfg,
            key: String::new(),
            slots: Vec::new(),
            table: BTreeMap::new(),
            free_slots: Vec::new(),
            cur_slot: None,
            cold: BTreeSet::new(),
            off: 0,
            size: 0,
            max_size: 0,
            elmt_size: 0,
            elmts_per_page: 0,
            page_bytes: 0,
            window: 0,
            cur_memory: 0,
            peak_memory: 0,
            min_page: None,
            max_page: None,
            flags: AccessFlags::empty(),
            local: LocalRange::default(),
        }
    }

    /// Create and initialise in one step.
    pub fn open(
        store: Arc<dyn BlobStore>,
        key: &str,
        count: u64,
        flags: AccessFlags,
    ) -> Result<Self> {
        let mut v = Self::new(store);
        v.init(key, count, flags)?;
        Ok(v)
    }

    /// Open the named backing object; elements use their natural width.
    pub fn init(&mut self, key: &str, count: u64, flags: AccessFlags) -> Result<()> {
        self.init_sized(key, count, T::SIZE, flags)
    }

    /// Open the named backing object with an explicit element stride.
    ///
    /// A second call on an initialised handle is a no-op.
    pub fn init_sized(
        &mut self,
        key: &str,
        count: u64,
        elem_size: usize,
        flags: AccessFlags,
    ) -> Result<()> {
        if self.bucket.is_some() {
            return Ok(());
        }
        self.cfg.validate()?;
        if elem_size < T::SIZE {
            return Err(anyhow!(
                "element size {} is smaller than the encoded width {}",
                elem_size,
                T::SIZE
            ));
        }
        let bucket = self
            .store
            .open_bucket(key)
            .with_context(|| format!("open backing object '{}'", key))?;

        self.elmts_per_page = ((self.cfg.page_bytes / elem_size) as u64).max(1);
        self.page_bytes = self.elmts_per_page as usize * elem_size;
        self.elmt_size = elem_size;
        self.key = key.to_string();
        self.bucket = Some(bucket);
        self.off = 0;
        self.max_size = count;
        self.size = if flags.contains(AccessFlags::APPEND_ONLY) { 0 } else { count };
        self.window = self.cfg.window_bytes;
        self.flags = flags;
        info!(
            "megavec: init '{}' count={} elmts_per_page={} page_bytes={} flags={:?}",
            key, count, self.elmts_per_page, self.page_bytes, flags
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.bucket.is_some()
    }

    /// Soft memory budget in bytes; 0 disables eviction. Does not evict by itself.
    pub fn bound_memory(&mut self, window: usize) {
        self.window = window;
    }

    /// OR additional access-mode flags into the handle.
    pub fn hint(&mut self, flags: AccessFlags) {
        self.flags |= flags;
    }

    // ----- accessors -----

    pub fn key(&self) -> &str { &self.key }
    pub fn flags(&self) -> AccessFlags { self.flags }
    pub fn len(&self) -> u64 { self.size }
    pub fn is_empty(&self) -> bool { self.size == 0 }
    pub fn max_size(&self) -> u64 { self.max_size }
    pub fn offset(&self) -> u64 { self.off }
    pub fn elem_size(&self) -> usize { self.elmt_size }
    pub fn elmts_per_page(&self) -> u64 { self.elmts_per_page }
    pub fn page_bytes(&self) -> usize { self.page_bytes }
    pub fn window(&self) -> usize { self.window }
    pub fn config(&self) -> &MegaConfig { &self.cfg }

    pub fn resident_pages(&self) -> usize { self.table.len() }
    pub fn resident_bytes(&self) -> usize { self.cur_memory }
    pub fn peak_resident_bytes(&self) -> usize { self.peak_memory }

    pub fn is_resident(&self, page_idx: u64) -> bool {
        self.table.contains_key(&page_idx)
    }

    /// Resident page indices in ascending order.
    pub fn resident_page_ids(&self) -> Vec<u64> {
        self.table.keys().copied().collect()
    }

    /// Number of pages the backing vector spans.
    pub fn page_count(&self) -> u64 {
        if self.elmts_per_page == 0 {
            return 0;
        }
        self.max_size.div_ceil(self.elmts_per_page)
    }

    // ----- subsets / offsets -----

    /// Independent copy viewing `[off, off + size)` of the backing vector.
    pub fn subset(&self, off: u64, size: u64) -> Self {
        let mut v = self.clone();
        v.off = off;
        v.size = size;
        v
    }

    /// Copy shifted forward by `n` elements.
    pub fn offset_by(&self, n: u64) -> Self {
        self.subset(self.off + n, self.size.saturating_sub(n))
    }

    /// Shift this handle forward by `n` elements.
    pub fn advance(&mut self, n: u64) {
        self.off += n;
        self.size = self.size.saturating_sub(n);
    }

    /// Shift this handle back by `n` elements.
    pub fn rewind(&mut self, n: u64) {
        self.off = self.off.saturating_sub(n);
        self.size += n;
    }

    // ----- PGAS -----

    /// Record this rank's even share of `[0, total)`.
    pub fn even_pgas(&mut self, rank: usize, nprocs: usize, total: u64) -> LocalRange {
        self.local = even_pgas(rank, nprocs, total);
        self.local
    }

    /// Even share of the domain plus an even share of `window_total` as budget.
    pub fn even_pgas_window(
        &mut self,
        rank: usize,
        nprocs: usize,
        total: u64,
        window_total: usize,
    ) -> LocalRange {
        let (range, window) = even_pgas_window(rank, nprocs, total, window_total, self.page_bytes);
        self.local = range;
        self.bound_memory(window);
        range
    }

    pub fn local_range(&self) -> LocalRange { self.local }
    pub fn local_off(&self) -> u64 { self.local.off }
    pub fn local_size(&self) -> u64 { self.local.size }
    pub fn local_last(&self) -> u64 { self.local.last() }

    // ----- append -----

    /// Write `v` at the logical end and grow the vector by one.
    pub fn push(&mut self, v: T) -> Result<()> {
        let i = self.size;
        self.set(i, v)?;
        self.size += 1;
        if self.off + self.size > self.max_size {
            self.max_size = self.off + self.size;
        }
        Ok(())
    }

    // ----- transactions -----

    /// Sequential transaction over `[off, off + size)`.
    pub fn seq_tx(&mut self, off: u64, size: u64, flags: AccessFlags) -> Tx<'_, Self, SeqPattern> {
        Tx::new(self, SeqPattern::new(off, size, flags))
    }

    /// Seeded random transaction: `size` positions drawn from `[left, left + range)`.
    pub fn rand_tx(
        &mut self,
        seed: u64,
        left: u64,
        range: u64,
        size: u64,
        flags: AccessFlags,
    ) -> Tx<'_, Self, RandPattern> {
        let geo = self.geometry();
        Tx::new(self, RandPattern::new(&geo, seed, left, range, size, flags))
    }

    // ----- lifecycle -----

    /// Delete the backing object; the handle is unusable afterwards.
    pub fn destroy(&mut self) -> Result<()> {
        self.drop_resident();
        if let Some(bucket) = self.bucket.take() {
            bucket
                .destroy()
                .with_context(|| format!("destroy backing object '{}'", self.key))?;
            info!("megavec: destroyed '{}'", self.key);
        }
        Ok(())
    }
}
