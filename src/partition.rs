//! Even (PGAS) partitioning of a global domain across ranks.
//!
//! Pure functions: no state, no I/O, no communication. The first
//! `total % nprocs` ranks receive one extra element.

/// A contiguous local slice of a global domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalRange {
    pub off: u64,
    pub size: u64,
}

impl LocalRange {
    /// One past the last owned index.
    #[inline]
    pub fn last(&self) -> u64 {
        self.off + self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn contains(&self, idx: u64) -> bool {
        idx >= self.off && idx < self.last()
    }
}

/// Split `[0, total)` evenly across `nprocs` ranks and return the range of `rank`.
///
/// Ranks past the end of a short domain get an empty range at `total`.
pub fn even_pgas(rank: usize, nprocs: usize, total: u64) -> LocalRange {
    if nprocs == 0 {
        return LocalRange { off: total, size: 0 };
    }
    let n = nprocs as u64;
    let r = rank as u64;
    let base = total / n;
    let rem = total % n;
    let size = if r < rem { base + 1 } else { base };
    let off = if r < rem { r * (base + 1) } else { rem * (base + 1) + (r - rem) * base };
    if off >= total {
        return LocalRange { off: total, size: 0 };
    }
    LocalRange { off, size }
}

/// Same split as [`even_pgas`], plus this rank's share of a global memory window.
///
/// The window share never drops below `min_window` (typically one page).
pub fn even_pgas_window(
    rank: usize,
    nprocs: usize,
    total: u64,
    window_total: usize,
    min_window: usize,
) -> (LocalRange, usize) {
    let range = even_pgas(rank, nprocs, total);
    let share = window_total / nprocs.max(1);
    (range, share.max(min_window))
}

/// A contiguous group of ranks `[off, off + n)` inside a parent group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcRange {
    pub off: usize,
    pub n: usize,
}

impl ProcRange {
    #[inline]
    pub fn contains(&self, rank: usize) -> bool {
        rank >= self.off && rank < self.off + self.n
    }
}

/// Halve a group of ranks for recursive subdivision (left gets the floor half).
///
/// A single rank is kept on both sides so each side always has an owner.
pub fn bisect(group: ProcRange) -> (ProcRange, ProcRange) {
    let mut left = ProcRange { off: group.off, n: group.n / 2 };
    let mut right = ProcRange { off: group.off + left.n, n: group.n - left.n };
    if right.n < 1 {
        right = ProcRange { off: group.off, n: 1 };
    }
    if left.n < 1 {
        left = ProcRange { off: group.off, n: 1 };
    }
    (left, right)
}
