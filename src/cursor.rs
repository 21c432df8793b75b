use crate::constants::{HEADER_SIZE, MIN_BLOCK_SIZE};
use crate::header::BlockHeader;
use crate::region::Region;

/// A position in the block chain: the byte offset of a block header within
/// the region. All chain stepping goes through here, so the allocator logic
/// never does raw offset arithmetic itself.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Cursor {
    offset: usize,
}

impl Cursor {
    pub fn first() -> Cursor {
        Cursor { offset: 0 }
    }

    pub fn at(offset: usize) -> Cursor {
        Cursor { offset }
    }

    pub fn offset(self) -> usize {
        self.offset
    }

    /// Offset of the payload this block hands out: just past the header.
    pub fn payload_offset(self) -> usize {
        self.offset + HEADER_SIZE
    }

    pub fn header(self, region: &Region) -> BlockHeader {
        BlockHeader::decode(region.read_word(self.offset))
    }

    pub fn is_sentinel(self, region: &Region) -> bool {
        BlockHeader::is_end_mark(region.read_word(self.offset))
    }

    /// The block immediately after this one; may be the sentinel.
    pub fn next(self, region: &Region) -> Cursor {
        Cursor {
            offset: self.offset + self.header(region).size,
        }
    }

    /// The block immediately before this one, located through its footer.
    /// Only valid when that predecessor is free (an allocated block's footer
    /// slot holds payload bytes); `None` for the first block in the region.
    pub fn prev_via_footer(self, region: &Region) -> Option<Cursor> {
        if self.offset == 0 {
            return None;
        }

        let prev_size = region.read_word(self.offset - HEADER_SIZE);
        debug_assert!(prev_size >= MIN_BLOCK_SIZE);
        debug_assert!(prev_size <= self.offset);

        Some(Cursor {
            offset: self.offset - prev_size,
        })
    }

    pub fn write_header(self, region: &mut Region, header: BlockHeader) {
        region.write_word(self.offset, header.encode());
    }

    /// The footer occupies the last word of the block and records the bare
    /// size, status bits excluded.
    pub fn write_footer(self, region: &mut Region, size: usize) {
        region.write_word(self.offset + size - HEADER_SIZE, size);
    }
}

/// Address-ordered traversal of every real block, stopping at the sentinel.
pub struct Blocks<'a> {
    region: &'a Region,
    cursor: Cursor,
}

impl<'a> Blocks<'a> {
    pub fn new(region: &'a Region) -> Blocks<'a> {
        Blocks {
            region,
            cursor: Cursor::first(),
        }
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = (Cursor, BlockHeader);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.is_sentinel(self.region) {
            return None;
        }

        let header = self.cursor.header(self.region);

        // A zero size here means trampled metadata; stop rather than loop.
        if header.size == 0 {
            return None;
        }

        let item = (self.cursor, header);
        self.cursor = Cursor::at(self.cursor.offset() + header.size);

        Some(item)
    }
}
