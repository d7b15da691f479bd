//! Sequential transaction over `[off, off + size)` of the handle's view.
//!
//! Log pass:
//! - pages between the last processed boundary and the current page are
//!   scored 0 (the first one only from where the previous pass stopped);
//! - unless closing, up to `num_prefetch_pages` pages after the current one
//!   are scored 1; the last page of the range is scored only over the part
//!   the range covers.

use anyhow::Result;
use log::debug;

use crate::flags::AccessFlags;

use super::{num_prefetch_pages, PageGeometry, PageHints, Step, TxPattern};

#[derive(Debug, Clone)]
pub struct SeqPattern {
    off: u64,
    size: u64,
    flags: AccessFlags,
    /// Next page not yet hinted for prefetch.
    last_prefetch: u64,
}

impl SeqPattern {
    pub fn new(off: u64, size: u64, flags: AccessFlags) -> Self {
        Self {
            off,
            size,
            flags,
            last_prefetch: 0,
        }
    }

    pub fn off(&self) -> u64 {
        self.off
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl TxPattern for SeqPattern {
    fn step(&mut self, pos: u64, geo: &PageGeometry) -> Step {
        let abs = geo.view_off + self.off + pos;
        Step {
            index: self.off + pos,
            new_page: pos == 0 || abs % geo.elmts_per_page == 0,
        }
    }

    fn process_log(
        &mut self,
        hints: &mut dyn PageHints,
        head: u64,
        tail: u64,
        end: bool,
    ) -> Result<()> {
        let geo = hints.geometry();
        let epp = geo.elmts_per_page;
        let start = geo.view_off + self.off;
        let first_page = (start + head) / epp;
        let last_page = if end {
            (start + tail).div_ceil(epp)
        } else {
            (start + tail) / epp
        };
        debug!(
            "seq tx: processing log head={} tail={} pages {}..{} end={}",
            head, tail, first_page, last_page, end
        );
        if first_page >= last_page {
            return Ok(());
        }

        // Evict pages we no longer need
        let first_mod = (start + head) % epp;
        hints.rescore(first_page, first_mod, epp - first_mod, 0.0, self.flags)?;
        for p in first_page + 1..last_page {
            hints.rescore(p, 0, epp, 0.0, self.flags)?;
        }
        if end {
            return Ok(());
        }

        // Prefetch future pages
        let count = num_prefetch_pages(&*hints, self.size.saturating_sub(tail));
        if count == 0 {
            return Ok(());
        }
        if self.last_prefetch <= last_page {
            self.last_prefetch = last_page + 1;
        }
        let range_end = start + self.size;
        let end_page = range_end.div_ceil(epp);
        let mut issued = 0;
        while issued < count && self.last_prefetch < end_page {
            let p = self.last_prefetch;
            let sub_len = if (p + 1) * epp > range_end { range_end - p * epp } else { epp };
            hints.rescore(p, 0, sub_len, 1.0, self.flags)?;
            self.last_prefetch += 1;
            issued += 1;
        }
        debug!(
            "seq tx: prefetch hinted {} page(s), next={}",
            issued, self.last_prefetch
        );
        Ok(())
    }
}
