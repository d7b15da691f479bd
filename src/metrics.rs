//! Lightweight global metrics for MegaVec.
//!
//! Атомарные счётчики процесса для подсистем:
//! - Page cache (fault / hit / evict / flush)
//! - Transaction hints (rescore evict / prefetch)
//! - Collective barriers

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- Page cache -----
static PAGE_FAULTS: AtomicU64 = AtomicU64::new(0);
static PAGE_READS: AtomicU64 = AtomicU64::new(0);
static FAST_PATH_HITS: AtomicU64 = AtomicU64::new(0);
static TABLE_HITS: AtomicU64 = AtomicU64::new(0);
static EVICTIONS: AtomicU64 = AtomicU64::new(0);
static FLUSHED_PAGES: AtomicU64 = AtomicU64::new(0);
static FLUSHED_BYTES: AtomicU64 = AtomicU64::new(0);

// ----- Hints -----
static HINTED_EVICTIONS: AtomicU64 = AtomicU64::new(0);
static PREFETCH_ISSUED: AtomicU64 = AtomicU64::new(0);
static PREFETCH_SKIPPED: AtomicU64 = AtomicU64::new(0);

// ----- Collectives -----
static BARRIERS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    // Page cache
    pub page_faults: u64,
    pub page_reads: u64,
    pub fast_path_hits: u64,
    pub table_hits: u64,
    pub evictions: u64,
    pub flushed_pages: u64,
    pub flushed_bytes: u64,

    // Hints
    pub hinted_evictions: u64,
    pub prefetch_issued: u64,
    pub prefetch_skipped: u64,

    // Collectives
    pub barriers: u64,
}

impl MetricsSnapshot {
    /// Share of accesses served by the single-slot fast path.
    pub fn fast_path_ratio(&self) -> f64 {
        let total = self.fast_path_hits + self.table_hits + self.page_faults;
        if total == 0 {
            0.0
        } else {
            self.fast_path_hits as f64 / total as f64
        }
    }
}

// ----- Recorders (Page cache) -----
pub fn record_fault(read_from_store: bool) {
    PAGE_FAULTS.fetch_add(1, Ordering::Relaxed);
    if read_from_store {
        PAGE_READS.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_fast_path_hit() {
    FAST_PATH_HITS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_table_hit() {
    TABLE_HITS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_eviction() {
    EVICTIONS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_flush(bytes: usize) {
    FLUSHED_PAGES.fetch_add(1, Ordering::Relaxed);
    FLUSHED_BYTES.fetch_add(bytes as u64, Ordering::Relaxed);
}

// ----- Recorders (Hints) -----
pub fn record_hinted_eviction() {
    HINTED_EVICTIONS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_prefetch(issued: bool) {
    if issued {
        PREFETCH_ISSUED.fetch_add(1, Ordering::Relaxed);
    } else {
        PREFETCH_SKIPPED.fetch_add(1, Ordering::Relaxed);
    }
}

// ----- Recorders (Collectives) -----
pub fn record_barrier() {
    BARRIERS.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        page_faults: PAGE_FAULTS.load(Ordering::Relaxed),
        page_reads: PAGE_READS.load(Ordering::Relaxed),
        fast_path_hits: FAST_PATH_HITS.load(Ordering::Relaxed),
        table_hits: TABLE_HITS.load(Ordering::Relaxed),
        evictions: EVICTIONS.load(Ordering::Relaxed),
        flushed_pages: FLUSHED_PAGES.load(Ordering::Relaxed),
        flushed_bytes: FLUSHED_BYTES.load(Ordering::Relaxed),

        hinted_evictions: HINTED_EVICTIONS.load(Ordering::Relaxed),
        prefetch_issued: PREFETCH_ISSUED.load(Ordering::Relaxed),
        prefetch_skipped: PREFETCH_SKIPPED.load(Ordering::Relaxed),

        barriers: BARRIERS.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    PAGE_FAULTS.store(0, Ordering::Relaxed);
    PAGE_READS.store(0, Ordering::Relaxed);
    FAST_PATH_HITS.store(0, Ordering::Relaxed);
    TABLE_HITS.store(0, Ordering::Relaxed);
    EVICTIONS.store(0, Ordering::Relaxed);
    FLUSHED_PAGES.store(0, Ordering::Relaxed);
    FLUSHED_BYTES.store(0, Ordering::Relaxed);

    HINTED_EVICTIONS.store(0, Ordering::Relaxed);
    PREFETCH_ISSUED.store(0, Ordering::Relaxed);
    PREFETCH_SKIPPED.store(0, Ordering::Relaxed);

    BARRIERS.store(0, Ordering::Relaxed);
}
