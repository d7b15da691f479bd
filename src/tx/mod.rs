//! tx — access-pattern transactions that steer the page cache.
//!
//! A transaction turns "what the application is about to touch" into
//! rescore hints: score 0 for pages already consumed (evict first), score 1
//! for pages expected soon (prefetch). The cache itself keeps no history.
//!
//! Lifecycle: open (head = tail = 0) -> next_index() advances tail; when the
//! resolved position enters a new page the pattern's log is processed ->
//! close() processes the log one last time with end = true (no prefetch).
//!
//! Подмодули:
//! - stream.rs — DrawStream: сидированный ГПСЧ, который можно форкать.
//! - seq.rs    — последовательный диапазон [off, off + size).
//! - random.rs — size случайных позиций из [left, left + range).
//!
//! Positions past the declared size are not checked.

use anyhow::Result;
use log::warn;

use crate::element::Element;
use crate::flags::AccessFlags;
use crate::vector::MegaVec;

pub mod random;
pub mod seq;
pub mod stream;

pub use random::RandPattern;
pub use seq::SeqPattern;
pub use stream::DrawStream;

/// Page layout a pattern needs to map positions to pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    /// Offset of the handle's view into the backing vector (elements).
    pub view_off: u64,
    pub elmts_per_page: u64,
    pub page_bytes: usize,
}

/// What a transaction can ask of the cache it is bound to.
pub trait PageHints {
    fn geometry(&self) -> PageGeometry;

    /// Pages that could be prefetched right now without forcing an eviction.
    fn prefetch_budget(&self) -> u64;

    /// Hint the relevance of `[sub_off, sub_off + sub_len)` of `page_idx`.
    fn rescore(
        &mut self,
        page_idx: u64,
        sub_off: u64,
        sub_len: u64,
        score: f32,
        flags: AccessFlags,
    ) -> Result<()>;
}

/// One resolved position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Index relative to the handle's view.
    pub index: u64,
    /// This position is the first one on a newly resolved page.
    pub new_page: bool,
}

/// A declared access pattern.
pub trait TxPattern {
    /// Resolve logical position `pos` (== tail) to a physical index.
    fn step(&mut self, pos: u64, geo: &PageGeometry) -> Step;

    /// Turn progress since the last call into rescore hints.
    fn process_log(
        &mut self,
        hints: &mut dyn PageHints,
        head: u64,
        tail: u64,
        end: bool,
    ) -> Result<()>;
}

/// Pages to prefetch: what the cache can hold, clamped to what is left.
pub(crate) fn num_prefetch_pages(hints: &dyn PageHints, remaining: u64) -> u64 {
    let epp = hints.geometry().elmts_per_page.max(1);
    hints.prefetch_budget().min(remaining.div_ceil(epp))
}

/// A transaction bound to one cache for one access episode.
pub struct Tx<'a, V: PageHints, P: TxPattern> {
    vec: &'a mut V,
    pattern: P,
    head: u64,
    tail: u64,
    closed: bool,
}

impl<'a, V: PageHints, P: TxPattern> Tx<'a, V, P> {
    pub fn new(vec: &'a mut V, pattern: P) -> Self {
        Self {
            vec,
            pattern,
            head: 0,
            tail: 0,
            closed: false,
        }
    }

    /// Positions already scored.
    pub fn head(&self) -> u64 {
        self.head
    }

    /// Positions produced so far.
    pub fn tail(&self) -> u64 {
        self.tail
    }

    pub fn pattern(&self) -> &P {
        &self.pattern
    }

    /// The cache this transaction is bound to.
    pub fn vec(&mut self) -> &mut V {
        &mut *self.vec
    }

    /// Resolve the next logical position to a physical index and advance.
    pub fn next_index(&mut self) -> Result<u64> {
        let pos = self.tail;
        let geo = self.vec.geometry();
        let step = self.pattern.step(pos, &geo);
        if step.new_page && pos > 0 {
            self.pattern.process_log(&mut *self.vec, self.head, pos, false)?;
            self.head = pos;
        }
        self.tail = pos + 1;
        Ok(step.index)
    }

    /// Final log pass: everything outstanding is scored for eviction.
    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.pattern.process_log(&mut *self.vec, self.head, self.tail, true)?;
        self.head = self.tail;
        Ok(())
    }
}

impl<'a, T: Element, P: TxPattern> Tx<'a, MegaVec<T>, P> {
    /// Next element of the pattern, by reference.
    pub fn next_mut(&mut self) -> Result<&mut T> {
        let i = self.next_index()?;
        self.vec.at(i)
    }

    pub fn next_value(&mut self) -> Result<T> {
        Ok(*self.next_mut()?)
    }

    pub fn put_next(&mut self, v: T) -> Result<()> {
        *self.next_mut()? = v;
        Ok(())
    }
}

impl<'a, V: PageHints, P: TxPattern> Drop for Tx<'a, V, P> {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                "transaction dropped without close (head={}, tail={}); final log not processed",
                self.head, self.tail
            );
        }
    }
}
