//! Access-mode flags of a vector handle and of a transaction.
//!
//! Flags are only ever OR-ed in (Hint/Barrier); nothing clears them.
//! - READ_ONLY   suppresses flush (dirty pages are dropped on evict).
//! - WRITE_ONLY  / APPEND_ONLY suppress the read-on-fault path.
//! - APPEND_ONLY also starts the logical size at 0.
//! - STAGE       asks the store to stage pages between tiers.

use bitflags::bitflags;

bitflags! {
    /// Access mode of a handle or transaction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessFlags: u32 {
        const READ_ONLY   = 1 << 0;
        const WRITE_ONLY  = 1 << 1;
        const READ_WRITE  = 1 << 2;
        const APPEND_ONLY = 1 << 3;
        const STAGE       = 1 << 4;
    }
}

impl AccessFlags {
    /// Whether a fault should fetch the page from the backing object.
    #[inline]
    pub fn reads_on_fault(self) -> bool {
        self.intersects(AccessFlags::READ_ONLY | AccessFlags::READ_WRITE)
    }

    /// Whether dirty pages are written back.
    #[inline]
    pub fn writes_back(self) -> bool {
        !self.contains(AccessFlags::READ_ONLY)
    }

    /// Producer-only modes: nothing useful to prefetch.
    #[inline]
    pub fn is_producer(self) -> bool {
        self.intersects(AccessFlags::WRITE_ONLY | AccessFlags::APPEND_ONLY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_only_then_read_only_hint_reads_and_stops_flushing() {
        let mut f = AccessFlags::WRITE_ONLY;
        assert!(!f.reads_on_fault());
        assert!(f.writes_back());
        f |= AccessFlags::READ_ONLY;
        assert!(f.reads_on_fault());
        assert!(!f.writes_back());
    }

    #[test]
    fn append_only_never_reads() {
        let f = AccessFlags::APPEND_ONLY | AccessFlags::STAGE;
        assert!(!f.reads_on_fault());
        assert!(f.is_producer());
    }
}
