use std::mem;

/// Every block size and payload pointer is a multiple of this.
pub const ALIGNMENT: usize = 8;

/// One metadata word. The same width is used for free-block footers.
pub const HEADER_SIZE: usize = mem::size_of::<usize>();

/// Smallest block worth carving out of a split: a header, plus enough room
/// for the footer slot once the block is freed.
pub const MIN_BLOCK_SIZE: usize = HEADER_SIZE + ALIGNMENT;
