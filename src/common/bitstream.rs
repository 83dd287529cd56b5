use std::fmt::Display;

use num_traits::PrimInt;

// Bit stream
//------------------------------------------------------------------------------

/// Bits packed most significant first into bytes, within a fixed bit budget.
/// Iterating reads the bits back from the start without dropping them.
#[derive(Debug, Clone)]
pub struct BitStream {
    bytes: Vec<u8>,
    bit_len: usize,
    bit_cap: usize,
    read_pos: usize,
}

impl BitStream {
    pub fn new(capacity: usize) -> Self {
        let bytes = Vec::with_capacity(capacity.div_ceil(8));
        Self { bytes, bit_len: 0, bit_cap: capacity, read_pos: 0 }
    }

    // Whole codewords, filled to capacity
    pub fn from(codewords: &[u8]) -> Self {
        let bit_len = codewords.len() * 8;
        Self { bytes: codewords.to_vec(), bit_len, bit_cap: bit_len, read_pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.bit_len
    }

    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    pub fn capacity(&self) -> usize {
        self.bit_cap
    }

    pub fn remaining(&self) -> usize {
        self.bit_cap - self.bit_len
    }

    // Written bytes, the last one zero filled past the final bit
    pub fn data(&self) -> &[u8] {
        &self.bytes
    }
}

// Writing
//------------------------------------------------------------------------------

impl BitStream {
    /// Appends the low `size` bits of `bits`, most significant first.
    pub fn push_bits<T>(&mut self, bits: T, size: usize)
    where
        T: PrimInt + Display,
    {
        let width = T::zero().count_zeros() as usize;
        debug_assert!(size <= width, "Size {size} is wider than the value type");
        debug_assert!(
            size == width || bits >> size == T::zero(),
            "Value doesn't fit the bit count: Value {bits}, Size {size}"
        );
        debug_assert!(
            size <= self.remaining(),
            "Bit stream overflow: Capacity {}, Needed {}",
            self.bit_cap,
            self.bit_len + size
        );

        for shift in (0..size).rev() {
            self.push((bits >> shift) & T::one() == T::one());
        }
    }

    pub fn push(&mut self, bit: bool) {
        debug_assert!(self.bit_len < self.bit_cap, "Bit stream full: Capacity {}", self.bit_cap);

        let (byte, offset) = (self.bit_len / 8, self.bit_len % 8);
        if offset == 0 {
            self.bytes.push(0);
        }
        self.bytes[byte] |= (bit as u8) << (7 - offset);
        self.bit_len += 1;
    }

    /// Appends whole bytes onto a byte aligned stream.
    pub fn extend(&mut self, bytes: &[u8]) {
        debug_assert_eq!(self.bit_len % 8, 0, "Unaligned byte extend: Bit length {}", self.bit_len);
        debug_assert!(
            bytes.len() * 8 <= self.remaining(),
            "Bit stream overflow: Capacity {}, Needed {}",
            self.bit_cap,
            self.bit_len + bytes.len() * 8
        );

        self.bytes.extend_from_slice(bytes);
        self.bit_len += bytes.len() * 8;
    }
}


// Reading
//------------------------------------------------------------------------------

impl Iterator for BitStream {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.read_pos >= self.bit_len {
            return None;
        }
        let byte = self.bytes[self.read_pos / 8];
        let bit = (byte >> (7 - self.read_pos % 8)) & 1 == 1;
        self.read_pos += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.bit_len - self.read_pos;
        (left, Some(left))
    }
}

#[cfg(test)]
mod bit_stream_read_tests {
    use super::BitStream;

    #[test]
    fn test_read_codewords() {
        let mut bs = BitStream::from(&[0b1011_0000, 0xFF]);
        let head = bs.by_ref().take(5).collect::<Vec<_>>();
        assert_eq!(head, [true, false, true, true, false]);
        assert_eq!(bs.size_hint(), (11, Some(11)));
        assert_eq!(bs.by_ref().filter(|&b| b).count(), 8);
        assert_eq!(bs.next(), None);
    }

    #[test]
    fn test_read_stops_at_bit_len() {
        let mut bs = BitStream::new(8);
        bs.push_bits(0b101u8, 3);
        assert_eq!(bs.collect::<Vec<_>>(), [true, false, true]);
    }
}
