mod encoder;

mod block;
mod galois;

pub(crate) use block::*;
pub(crate) use encoder::*;

// Longest block is 123 data + 30 ec codewords
pub const MAX_BLOCK_SIZE: usize = 256;
