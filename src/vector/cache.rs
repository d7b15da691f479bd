//! vector/cache — движок кэша страниц.
//!
//! - at/get/set: индекс -> (page_idx, page_off); single-slot fast path, затем
//!   таблица, затем fault. Любой доступ (и чтение тоже) помечает страницу dirty.
//! - fault: если после загрузки память превысит window - page, сначала evict.
//!   Чтение из хранилища только если режим разрешает чтение.
//! - evict: flush всех dirty, затем удаление сначала "холодных" (rescore 0),
//!   потом по возрастанию page_idx, пока cur_memory + 2 pages > window.
//! - flush: запись dirty-страниц [min, max] под ключом page_idx (не в READ_ONLY).
//! - barrier: flush + сброс всех резидентных страниц, sync хранилища
//!   (сброс приватных копий), коллективный барьер, OR флагов.

use anyhow::{anyhow, Context, Result};
use log::{debug, trace};
use std::sync::Arc;

use crate::comm::Communicator;
use crate::consts::page_key;
use crate::element::Element;
use crate::flags::AccessFlags;
use crate::metrics::{
    record_barrier, record_eviction, record_fast_path_hit, record_fault, record_flush,
    record_hinted_eviction, record_prefetch, record_table_hit,
};
use crate::store::Bucket;
use crate::tx::{PageGeometry, PageHints};

use super::page::Page;
use super::MegaVec;

impl<T: Element> MegaVec<T> {
    /// Mutable reference to element `i` (relative to the handle offset).
    pub fn at(&mut self, i: u64) -> Result<&mut T> {
        if self.elmts_per_page == 0 {
            return Err(anyhow!("vector '{}' is not initialized", self.key));
        }
        let abs = self.off + i;
        let page_idx = abs / self.elmts_per_page;
        let page_off = (abs % self.elmts_per_page) as usize;
        let slot = self.slot_of(page_idx)?;
        self.cur_slot = Some(slot);
        let page = self.slots[slot]
            .as_mut()
            .ok_or_else(|| anyhow!("page {} lost its slot {}", page_idx, slot))?;
        page.dirty = true;
        Ok(&mut page.elmts[page_off])
    }

    /// Copy of element `i`. Marks the page dirty like any other access.
    pub fn get(&mut self, i: u64) -> Result<T> {
        Ok(*self.at(i)?)
    }

    pub fn set(&mut self, i: u64, v: T) -> Result<()> {
        *self.at(i)? = v;
        Ok(())
    }

    fn slot_of(&mut self, page_idx: u64) -> Result<usize> {
        if let Some(s) = self.cur_slot {
            if matches!(&self.slots[s], Some(p) if p.id == page_idx) {
                record_fast_path_hit();
                if !self.cold.is_empty() {
                    self.cold.remove(&page_idx);
                }
                return Ok(s);
            }
        }
        if let Some(&s) = self.table.get(&page_idx) {
            record_table_hit();
            self.cold.remove(&page_idx);
            return Ok(s);
        }
        self.fault(page_idx)
    }

    fn bucket(&self) -> Result<Arc<dyn Bucket>> {
        self.bucket
            .clone()
            .ok_or_else(|| anyhow!("vector '{}' has no backing object (not initialized or destroyed)", self.key))
    }

    /// Bring `page_idx` into the table; returns its slot.
    pub(crate) fn fault(&mut self, page_idx: u64) -> Result<usize> {
        let bucket = self.bucket()?;
        if self.window > 0
            && self.cur_memory + self.page_bytes > self.window.saturating_sub(self.page_bytes)
        {
            self.evict()?;
        }

        let mut page = Page::zeroed(page_idx, self.elmts_per_page as usize);
        let read = self.flags.reads_on_fault();
        if read {
            let mut buf = vec![0u8; self.page_bytes];
            let found = bucket
                .get(&page_key(page_idx), &mut buf)
                .with_context(|| format!("fetch page {} of '{}'", page_idx, self.key))?;
            if found {
                page.load(&buf, self.elmt_size);
            }
        }
        record_fault(read);
        trace!("megavec '{}': fault page {} (read={})", self.key, page_idx, read);
        Ok(self.insert_page(page))
    }

    fn insert_page(&mut self, page: Page<T>) -> usize {
        let page_idx = page.id;
        let slot = match self.free_slots.pop() {
            Some(s) => {
                self.slots[s] = Some(page);
                s
            }
            None => {
                self.slots.push(Some(page));
                self.slots.len() - 1
            }
        };
        self.table.insert(page_idx, slot);
        self.cur_memory += self.page_bytes;
        self.peak_memory = self.peak_memory.max(self.cur_memory);
        self.min_page = Some(self.min_page.map_or(page_idx, |m| m.min(page_idx)));
        self.max_page = Some(self.max_page.map_or(page_idx, |m| m.max(page_idx)));
        slot
    }

    #[inline]
    fn under_evict_target(&self) -> bool {
        self.cur_memory + 2 * self.page_bytes <= self.window
    }

    /// Flush, then drop pages until resident memory is two pages below the window.
    pub(crate) fn evict(&mut self) -> Result<()> {
        self.flush()?;
        let before = self.table.len();

        while !self.under_evict_target() {
            let Some(page_idx) = self.cold.pop_first() else { break };
            if self.table.contains_key(&page_idx) {
                self.remove_page(page_idx);
                record_hinted_eviction();
            }
        }

        while !self.under_evict_target() {
            let Some(page_idx) = self.table.keys().next().copied() else { break };
            self.remove_page(page_idx);
        }

        debug!(
            "megavec '{}': evicted {} page(s), resident={} bytes={} window={}",
            self.key,
            before - self.table.len(),
            self.table.len(),
            self.cur_memory,
            self.window
        );
        Ok(())
    }

    fn remove_page(&mut self, page_idx: u64) {
        if let Some(slot) = self.table.remove(&page_idx) {
            self.slots[slot] = None;
            self.free_slots.push(slot);
            if self.cur_slot == Some(slot) {
                self.cur_slot = None;
            }
            self.cur_memory = self.cur_memory.saturating_sub(self.page_bytes);
            record_eviction();
        }
        self.cold.remove(&page_idx);
        self.min_page = self.table.keys().next().copied();
        self.max_page = self.table.keys().next_back().copied();
    }

    /// Drop every resident page without writing anything back.
    pub(crate) fn drop_resident(&mut self) {
        for _ in 0..self.table.len() {
            record_eviction();
        }
        self.slots.clear();
        self.table.clear();
        self.free_slots.clear();
        self.cold.clear();
        self.cur_slot = None;
        self.cur_memory = 0;
        self.min_page = None;
        self.max_page = None;
    }

    /// Write every dirty resident page back to the backing object.
    ///
    /// No-op for READ_ONLY handles.
    pub fn flush(&mut self) -> Result<()> {
        if !self.flags.writes_back() {
            return Ok(());
        }
        let (lo, hi) = match (self.min_page, self.max_page) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => return Ok(()),
        };
        let bucket = self.bucket()?;
        let stage = self.cfg.stage_on_flush || self.flags.contains(AccessFlags::STAGE);
        let stride = self.elmt_size;
        let mut buf = vec![0u8; self.page_bytes];
        let mut flushed = 0usize;

        for (&page_idx, &slot) in self.table.range(lo..=hi) {
            let Some(page) = self.slots[slot].as_mut() else { continue };
            if !page.dirty {
                continue;
            }
            page.store(stride, &mut buf);
            bucket
                .put(&page_key(page_idx), &buf, stage)
                .with_context(|| format!("flush page {} of '{}'", page_idx, self.key))?;
            page.dirty = false;
            record_flush(buf.len());
            flushed += 1;
        }
        if flushed > 0 {
            trace!("megavec '{}': flushed {} page(s)", self.key, flushed);
        }
        Ok(())
    }

    /// Relevance hint for a page sub-range.
    ///
    /// - score <= 0: the page becomes a preferred eviction candidate.
    /// - score > 0: the page is faulted ahead of need if the window has room.
    ///
    /// Hints the cache cannot act on are dropped.
    pub fn rescore(
        &mut self,
        page_idx: u64,
        sub_off: u64,
        sub_len: u64,
        score: f32,
        flags: AccessFlags,
    ) -> Result<()> {
        if score <= 0.0 {
            if self.table.contains_key(&page_idx) {
                self.cold.insert(page_idx);
                trace!(
                    "megavec '{}': page {} cold ({}+{})",
                    self.key, page_idx, sub_off, sub_len
                );
            }
            return Ok(());
        }

        self.cold.remove(&page_idx);
        if self.table.contains_key(&page_idx) || page_idx >= self.page_count() {
            return Ok(());
        }
        // Producers gain nothing from fetching zero pages early.
        if flags.is_producer() || !self.flags.reads_on_fault() {
            return Ok(());
        }
        if self.window > 0 && self.cur_memory + 2 * self.page_bytes > self.window {
            record_prefetch(false);
            return Ok(());
        }
        self.fault(page_idx)?;
        record_prefetch(true);
        trace!(
            "megavec '{}': prefetched page {} ({}+{})",
            self.key, page_idx, sub_off, sub_len
        );
        Ok(())
    }

    /// Flush and drop all resident pages, synchronise with `comm`, then OR `flags`.
    ///
    /// After a barrier every fault observes writes flushed by any rank before it.
    pub fn barrier(&mut self, flags: AccessFlags, comm: &dyn Communicator) -> Result<()> {
        self.flush()?;
        self.drop_resident();
        if let Some(bucket) = self.bucket.as_ref() {
            bucket
                .sync()
                .with_context(|| format!("sync backing object '{}'", self.key))?;
        }
        comm.barrier()
            .with_context(|| format!("barrier on '{}' (rank {})", self.key, comm.rank()))?;
        self.flags |= flags;
        record_barrier();
        debug!(
            "megavec '{}': barrier rank={}/{} flags={:?}",
            self.key,
            comm.rank(),
            comm.size(),
            self.flags
        );
        Ok(())
    }
}

impl<T: Element> PageHints for MegaVec<T> {
    fn geometry(&self) -> PageGeometry {
        PageGeometry {
            view_off: self.off,
            elmts_per_page: self.elmts_per_page.max(1),
            page_bytes: self.page_bytes,
        }
    }

    fn prefetch_budget(&self) -> u64 {
        if !self.flags.reads_on_fault() || self.page_bytes == 0 {
            return 0;
        }
        let cap = self.cfg.max_prefetch_pages;
        if self.window == 0 {
            return cap;
        }
        // A prefetch must leave room for one more page.
        let free = self.window.saturating_sub(self.cur_memory) / self.page_bytes;
        (free.saturating_sub(1) as u64).min(cap)
    }

    fn rescore(
        &mut self,
        page_idx: u64,
        sub_off: u64,
        sub_len: u64,
        score: f32,
        flags: AccessFlags,
    ) -> Result<()> {
        MegaVec::rescore(self, page_idx, sub_off, sub_len, score, flags)
    }
}
