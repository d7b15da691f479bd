//! Seeded random transaction: `size` positions from `[left, left + range)`.
//!
//! Each draw of the live stream picks a page (the page of the drawn
//! position); the transaction then walks the part of that page the range
//! covers before drawing again. Two forks of the live stream answer the
//! log queries without any recorded trace:
//! - `log`      replays visited pages, in order, to score them 0;
//! - `prefetch` runs ahead of the live stream to score upcoming pages 1.
//!
//! The first and last page of the range may be only partially covered;
//! `page_span` restricts both the walk and the hinted sub-range to the
//! covered part.

use anyhow::Result;
use log::debug;

use crate::flags::AccessFlags;

use super::stream::DrawStream;
use super::{num_prefetch_pages, PageGeometry, PageHints, Step, TxPattern};

#[derive(Debug, Clone)]
pub struct RandPattern {
    live: DrawStream,
    log: DrawStream,
    prefetch: DrawStream,
    size: u64,
    flags: AccessFlags,
    epp: u64,
    view_off: u64,

    first_page_idx: u64,
    first_page_shift: u64,
    last_page_idx: u64,
    last_page_size: u64,

    // current page walk
    base: u64,
    page_len: u64,
    page_pos: u64,

    /// Pages started since the last log pass.
    num_pages: u64,
    /// Pages started in total (== live stream position).
    net_num_pages: u64,
    /// Prefetch stream position.
    prefetched: u64,
}

impl RandPattern {
    pub fn new(
        geo: &PageGeometry,
        seed: u64,
        left: u64,
        range: u64,
        size: u64,
        flags: AccessFlags,
    ) -> Self {
        let epp = geo.elmts_per_page.max(1);
        let left_abs = geo.view_off + left;
        let end_abs = left_abs + range;
        let live = DrawStream::new(seed, left_abs, range);
        Self {
            log: live.fork(),
            prefetch: live.fork(),
            live,
            size,
            flags,
            epp,
            view_off: geo.view_off,
            first_page_idx: left_abs / epp,
            first_page_shift: left_abs % epp,
            last_page_idx: end_abs / epp,
            last_page_size: end_abs % epp,
            base: 0,
            page_len: 0,
            page_pos: 0,
            num_pages: 0,
            net_num_pages: 0,
            prefetched: 0,
        }
    }

    pub fn first_page_idx(&self) -> u64 {
        self.first_page_idx
    }

    pub fn last_page_idx(&self) -> u64 {
        self.last_page_idx
    }

    /// Pages drawn so far by the live stream.
    pub fn pages_drawn(&self) -> u64 {
        self.net_num_pages
    }

    /// Covered part of page `p`: (offset in page, length), in elements.
    fn page_span(&self, p: u64) -> (u64, u64) {
        let first = p == self.first_page_idx;
        let last = p == self.last_page_idx;
        match (first, last) {
            (true, true) => (
                self.first_page_shift,
                self.last_page_size.saturating_sub(self.first_page_shift),
            ),
            (true, false) => (self.first_page_shift, self.epp - self.first_page_shift),
            (false, true) => (0, self.last_page_size),
            (false, false) => (0, self.epp),
        }
    }

    fn hint_page(&self, hints: &mut dyn PageHints, p: u64, score: f32) -> Result<()> {
        let (sub_off, sub_len) = self.page_span(p);
        hints.rescore(p, sub_off, sub_len, score, self.flags)
    }
}

impl TxPattern for RandPattern {
    fn step(&mut self, _pos: u64, _geo: &PageGeometry) -> Step {
        let mut new_page = false;
        if self.page_pos >= self.page_len {
            let p = self.live.draw() / self.epp;
            let (sub_off, len) = self.page_span(p);
            self.base = p * self.epp + sub_off;
            self.page_len = len;
            self.page_pos = 0;
            self.num_pages += 1;
            self.net_num_pages += 1;
            new_page = true;
        }
        let index = self.base + self.page_pos - self.view_off;
        self.page_pos += 1;
        Step { index, new_page }
    }

    fn process_log(
        &mut self,
        hints: &mut dyn PageHints,
        _head: u64,
        tail: u64,
        end: bool,
    ) -> Result<()> {
        // The page being walked stays out of the log until the end.
        let mut n = self.num_pages;
        if !end && n <= 1 {
            return Ok(());
        }
        if !end {
            n -= 1;
        }

        // Evict processed pages
        for _ in 0..n {
            let p = self.log.draw() / self.epp;
            self.hint_page(hints, p, 0.0)?;
        }
        self.num_pages -= n;
        if end {
            debug!("rand tx: closed after {} page(s)", self.net_num_pages);
            return Ok(());
        }

        // Prefetch future pages
        let count = num_prefetch_pages(&*hints, self.size.saturating_sub(tail));
        if self.prefetched < self.net_num_pages {
            self.prefetch.skip(self.net_num_pages - self.prefetched);
            self.prefetched = self.net_num_pages;
        }
        let target = self.net_num_pages + count;
        while self.prefetched < target {
            let p = self.prefetch.draw() / self.epp;
            self.hint_page(hints, p, 1.0)?;
            self.prefetched += 1;
        }
        debug!(
            "rand tx: evict-hinted {} page(s), prefetch stream at {} (live at {})",
            n, self.prefetched, self.net_num_pages
        );
        Ok(())
    }
}
