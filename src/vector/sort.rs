//! Sort/IsSorted over a sub-range, going through the faulting index path.
//!
//! In-place heapsort: O(1) extra memory, so a range far larger than the
//! window can be sorted with only the pages under the two cursors resident.

use anyhow::Result;

use crate::element::Element;

use super::MegaVec;

impl<T: Element + PartialOrd> MegaVec<T> {
    /// Sort `[off, off + size)` (relative to the handle offset) ascending.
    pub fn sort(&mut self, off: u64, size: u64) -> Result<()> {
        if size < 2 {
            return Ok(());
        }
        for root in (0..size / 2).rev() {
            self.sift_down(off, root, size)?;
        }
        for end in (1..size).rev() {
            self.swap(off, off + end)?;
            self.sift_down(off, 0, end)?;
        }
        Ok(())
    }

    /// Whether `[off, off + size)` is in ascending order.
    pub fn is_sorted(&mut self, off: u64, size: u64) -> Result<bool> {
        if size < 2 {
            return Ok(true);
        }
        let mut prev = self.get(off)?;
        for i in 1..size {
            let cur = self.get(off + i)?;
            if cur < prev {
                return Ok(false);
            }
            prev = cur;
        }
        Ok(true)
    }

    pub fn swap(&mut self, a: u64, b: u64) -> Result<()> {
        if a == b {
            return Ok(());
        }
        let va = self.get(a)?;
        let vb = self.get(b)?;
        self.set(a, vb)?;
        self.set(b, va)
    }

    fn sift_down(&mut self, base: u64, mut root: u64, end: u64) -> Result<()> {
        loop {
            let mut child = 2 * root + 1;
            if child >= end {
                return Ok(());
            }
            if child + 1 < end && self.get(base + child)? < self.get(base + child + 1)? {
                child += 1;
            }
            if self.get(base + root)? < self.get(base + child)? {
                self.swap(base + root, base + child)?;
                root = child;
            } else {
                return Ok(());
            }
        }
    }
}
