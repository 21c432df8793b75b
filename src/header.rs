use crate::constants::ALIGNMENT;

const ALLOCATED_BIT: usize = 0b01;
const PREV_ALLOCATED_BIT: usize = 0b10;
const SIZE_MASK: usize = !(ALLOCATED_BIT | PREV_ALLOCATED_BIT);

/// Reserved header word terminating the block chain. Decodes to size zero,
/// so no real block can ever collide with it.
pub const END_MARK: usize = ALLOCATED_BIT;

/// Decoded block metadata. The packed form is a single word: the size in the
/// upper bits (sizes are multiples of 8, so the low bits are always clear)
/// and the two status flags in bits 0 and 1.
///
/// All allocator logic works on this record; packing and unpacking happen
/// only at the region's raw-word boundary.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockHeader {
    pub size: usize,
    pub allocated: bool,
    pub prev_allocated: bool,
}

impl BlockHeader {
    pub fn encode(self) -> usize {
        debug_assert!(self.size % ALIGNMENT == 0);

        let mut word = self.size;

        if self.allocated {
            word |= ALLOCATED_BIT;
        }

        if self.prev_allocated {
            word |= PREV_ALLOCATED_BIT;
        }

        word
    }

    pub fn decode(word: usize) -> BlockHeader {
        BlockHeader {
            size: word & SIZE_MASK,
            allocated: word & ALLOCATED_BIT != 0,
            prev_allocated: word & PREV_ALLOCATED_BIT != 0,
        }
    }

    pub fn is_end_mark(word: usize) -> bool {
        word == END_MARK
    }
}
