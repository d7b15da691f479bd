//! Resident page: a fixed-capacity run of elements plus its dirty bit.

use crate::element::{decode_page, encode_page, Element};

#[derive(Clone, Debug)]
pub(crate) struct Page<T: Element> {
    pub(crate) id: u64,
    pub(crate) elmts: Vec<T>,
    /// Holds a write not yet flushed to the backing object.
    pub(crate) dirty: bool,
}

impl<T: Element> Page<T> {
    pub(crate) fn zeroed(id: u64, elmts_per_page: usize) -> Self {
        Self {
            id,
            elmts: vec![T::default(); elmts_per_page],
            dirty: false,
        }
    }

    pub(crate) fn load(&mut self, buf: &[u8], stride: usize) {
        decode_page(buf, stride, &mut self.elmts);
    }

    pub(crate) fn store(&self, stride: usize, out: &mut [u8]) {
        encode_page(&self.elmts, stride, out);
    }
}
