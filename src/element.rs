//! Fixed-width element codec used to move pages in and out of the store.
//!
//! Every element is stored little-endian in `SIZE` bytes; a handle may use a
//! larger stride, the tail of each slot is zero.

use byteorder::{ByteOrder, LittleEndian};

/// A plain value that can live in a paged vector.
pub trait Element: Copy + Default + Send + 'static {
    /// Encoded width in bytes.
    const SIZE: usize;

    fn write_le(&self, out: &mut [u8]);
    fn read_le(buf: &[u8]) -> Self;
}

impl Element for u8 {
    const SIZE: usize = 1;
    #[inline]
    fn write_le(&self, out: &mut [u8]) {
        out[0] = *self;
    }
    #[inline]
    fn read_le(buf: &[u8]) -> Self {
        buf[0]
    }
}

impl Element for i8 {
    const SIZE: usize = 1;
    #[inline]
    fn write_le(&self, out: &mut [u8]) {
        out[0] = *self as u8;
    }
    #[inline]
    fn read_le(buf: &[u8]) -> Self {
        buf[0] as i8
    }
}

macro_rules! impl_element {
    ($t:ty, $size:expr, $write:ident, $read:ident) => {
        impl Element for $t {
            const SIZE: usize = $size;
            #[inline]
            fn write_le(&self, out: &mut [u8]) {
                LittleEndian::$write(&mut out[..$size], *self);
            }
            #[inline]
            fn read_le(buf: &[u8]) -> Self {
                LittleEndian::$read(&buf[..$size])
            }
        }
    };
}

impl_element!(u16, 2, write_u16, read_u16);
impl_element!(i16, 2, write_i16, read_i16);
impl_element!(u32, 4, write_u32, read_u32);
impl_element!(i32, 4, write_i32, read_i32);
impl_element!(u64, 8, write_u64, read_u64);
impl_element!(i64, 8, write_i64, read_i64);
impl_element!(f32, 4, write_f32, read_f32);
impl_element!(f64, 8, write_f64, read_f64);

impl Element for usize {
    const SIZE: usize = 8;
    #[inline]
    fn write_le(&self, out: &mut [u8]) {
        LittleEndian::write_u64(&mut out[..8], *self as u64);
    }
    #[inline]
    fn read_le(buf: &[u8]) -> Self {
        LittleEndian::read_u64(&buf[..8]) as usize
    }
}

/// Encode `elmts` into `out` with the given stride.
pub(crate) fn encode_page<T: Element>(elmts: &[T], stride: usize, out: &mut [u8]) {
    for (i, e) in elmts.iter().enumerate() {
        let slot = &mut out[i * stride..(i + 1) * stride];
        e.write_le(slot);
        slot[T::SIZE..].fill(0);
    }
}

/// Decode `out.len()` elements from `buf` with the given stride.
pub(crate) fn decode_page<T: Element>(buf: &[u8], stride: usize, out: &mut [T]) {
    for (i, e) in out.iter_mut().enumerate() {
        *e = T::read_le(&buf[i * stride..i * stride + T::SIZE]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_stride_keeps_values_and_zeroes_tail() {
        let vals = [1.5f64, -2.25, 1e300];
        let stride = 12;
        let mut buf = vec![0xFFu8; vals.len() * stride];
        encode_page(&vals, stride, &mut buf);
        assert!(buf[8..12].iter().all(|&b| b == 0));

        let mut back = [0f64; 3];
        decode_page(&buf, stride, &mut back);
        assert_eq!(back, vals);
    }

    #[test]
    fn signed_values_survive() {
        let mut buf = [0u8; 8];
        (-7i64).write_le(&mut buf);
        assert_eq!(i64::read_le(&buf), -7);
        (-3i8).write_le(&mut buf);
        assert_eq!(i8::read_le(&buf), -3);
    }
}
