use super::MAX_BLOCK_SIZE;

// Reed-Solomon block: data codewords followed by their error correction codewords
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Block {
    pub(super) data: [u8; MAX_BLOCK_SIZE],
    // Block length
    pub(super) len: usize,
    // Data length
    pub(super) dlen: usize,
}

impl Block {
    pub fn new(raw: &[u8], ec_len: usize) -> Self {
        let dlen = raw.len();
        let len = dlen + ec_len;
        debug_assert!(len <= MAX_BLOCK_SIZE, "Block exceeds max size: Len {len}");

        let mut data = [0u8; MAX_BLOCK_SIZE];
        data[..dlen].copy_from_slice(raw);
        let mut block = Self { data, len, dlen };
        block.compute_ecc();
        block
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn ec_len(&self) -> usize {
        self.len - self.dlen
    }

    pub fn data_len(&self) -> usize {
        self.dlen
    }

    pub fn full(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlen]
    }

    pub fn ecc(&self) -> &[u8] {
        &self.data[self.dlen..self.len]
    }
}
