use std::fmt;
use std::ptr::NonNull;

use crate::constants::{ALIGNMENT, HEADER_SIZE, MIN_BLOCK_SIZE};
use crate::cursor::{Blocks, Cursor};
use crate::error::{FreeError, InitError};
use crate::header::{BlockHeader, END_MARK};
use crate::region::Region;

/// A heap over one fixed region: best-fit placement, block splitting, and
/// eager coalescing of free neighbors.
///
/// The region is acquired by [`init`](Heap::init) exactly once per heap and
/// held until the heap is dropped. Between init and drop the region is carved
/// into an implicit chain of blocks walked by size offsets, terminated by an
/// immutable sentinel word.
pub struct Heap {
    pub(crate) region: Option<Region>,
}

/// Snapshot of one block produced by [`Heap::dump_blocks`], in address
/// order. Diagnostic only; taking one never mutates the heap.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockReport {
    /// 1-based position in the chain.
    pub index: usize,
    pub allocated: bool,
    pub prev_allocated: bool,
    /// Address of the block's first byte, where its header starts.
    pub start: usize,
    /// Address of the block's last byte.
    pub end: usize,
    pub size: usize,
}

impl Heap {
    /// An empty heap holding no region yet.
    pub fn new() -> Heap {
        Heap { region: None }
    }

    /// `new` followed by `init`, for callers that have no use for the
    /// two-phase setup.
    pub fn with_capacity(region_size: usize) -> Result<Heap, InitError> {
        let mut heap = Heap::new();
        heap.init(region_size)?;

        Ok(heap)
    }

    /// Acquires the backing region and installs the initial chain: one free
    /// block spanning the usable region, then the sentinel.
    ///
    /// May be called once per heap. A second call is a hard error and leaves
    /// the existing region untouched.
    pub fn init(&mut self, region_size: usize) -> Result<(), InitError> {
        if self.region.is_some() {
            return Err(InitError::AlreadyInitialized);
        }

        let mut region = Region::new(region_size)?;
        let usable = region.usable_size();

        // The first block has no real predecessor, so its p-flag starts set
        // and stays that way.
        let first = Cursor::first();
        first.write_header(
            &mut region,
            BlockHeader {
                size: usable,
                allocated: false,
                prev_allocated: true,
            },
        );
        first.write_footer(&mut region, usable);
        region.write_word(usable, END_MARK);

        self.region = Some(region);

        Ok(())
    }

    /// Total bytes available for blocks, i.e. the page-rounded region minus
    /// the sentinel word. Zero for an uninitialized heap.
    pub fn capacity(&self) -> usize {
        self.region.as_ref().map_or(0, Region::usable_size)
    }

    /// Allocates `payload_size` usable bytes and returns the payload
    /// pointer, 8-byte aligned. `None` for a zero-size request or when no
    /// free block is large enough; the heap is untouched on failure.
    pub fn alloc(&mut self, payload_size: usize) -> Option<NonNull<u8>> {
        let region = self.region.as_mut()?;

        if payload_size == 0 {
            return None;
        }

        let needed = block_size_for(payload_size)?;
        let chosen = find_best_fit(region, needed)?;
        let header = chosen.header(region);
        let remainder = header.size - needed;

        if remainder >= MIN_BLOCK_SIZE {
            // Split: the chosen block shrinks to the request and the tail
            // becomes a new free block whose predecessor is now allocated.
            chosen.write_header(
                region,
                BlockHeader {
                    size: needed,
                    allocated: true,
                    prev_allocated: header.prev_allocated,
                },
            );

            let rest = Cursor::at(chosen.offset() + needed);
            rest.write_header(
                region,
                BlockHeader {
                    size: remainder,
                    allocated: false,
                    prev_allocated: true,
                },
            );
            rest.write_footer(region, remainder);
        } else {
            // The tail is too small to stand alone; the whole block is
            // handed out and the slack becomes internal fragmentation.
            chosen.write_header(
                region,
                BlockHeader {
                    allocated: true,
                    ..header
                },
            );

            let next = Cursor::at(chosen.offset() + header.size);
            set_prev_allocated(region, next, true);
        }

        let payload = unsafe { region.base().add(chosen.payload_offset()) };

        NonNull::new(payload)
    }

    /// Frees the block designated by a payload pointer previously returned
    /// from [`alloc`](Heap::alloc), coalescing it with free neighbors.
    ///
    /// Null, misaligned, out-of-region, and already-free pointers are all
    /// rejected with [`FreeError::InvalidFree`], and every rejection leaves
    /// the heap exactly as it was.
    pub fn free(&mut self, ptr: *const u8) -> Result<(), FreeError> {
        let region = self.region.as_mut().ok_or(FreeError::InvalidFree)?;

        if ptr.is_null() || ptr as usize % ALIGNMENT != 0 {
            return Err(FreeError::InvalidFree);
        }

        let payload_offset = region.offset_of(ptr).ok_or(FreeError::InvalidFree)?;
        if payload_offset < HEADER_SIZE || payload_offset > region.usable_size() {
            return Err(FreeError::InvalidFree);
        }

        let cursor = Cursor::at(payload_offset - HEADER_SIZE);
        if cursor.is_sentinel(region) {
            return Err(FreeError::InvalidFree);
        }

        let header = cursor.header(region);
        if !header.allocated || header.size == 0 {
            return Err(FreeError::InvalidFree);
        }

        cursor.write_header(
            region,
            BlockHeader {
                allocated: false,
                ..header
            },
        );
        cursor.write_footer(region, header.size);

        let merged = coalesce(region, cursor);

        // Whatever now follows the free run has a free predecessor.
        let next = merged.next(region);
        set_prev_allocated(region, next, false);

        Ok(())
    }

    /// Read-only snapshot of the whole block chain. Empty for an
    /// uninitialized heap.
    pub fn dump_blocks(&self) -> Vec<BlockReport> {
        let Some(region) = self.region.as_ref() else {
            return Vec::new();
        };
        let base = region.base() as usize;

        Blocks::new(region)
            .enumerate()
            .map(|(index, (cursor, header))| BlockReport {
                index: index + 1,
                allocated: header.allocated,
                prev_allocated: header.prev_allocated,
                start: base + cursor.offset(),
                end: base + cursor.offset() + header.size - 1,
                size: header.size,
            })
            .collect()
    }
}

impl Default for Heap {
    fn default() -> Heap {
        Heap::new()
    }
}

/// Renders the block chain as a table, one row per block, followed by
/// used/free totals.
impl fmt::Display for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut used = 0;
        let mut free = 0;

        writeln!(f, "No.\tStatus\tPrev\tBegin\t\tEnd\t\tSize")?;

        for report in self.dump_blocks() {
            let status = if report.allocated { "alloc" } else { "FREE " };
            let prev = if report.prev_allocated { "alloc" } else { "FREE " };

            if report.allocated {
                used += report.size;
            } else {
                free += report.size;
            }

            writeln!(
                f,
                "{}\t{}\t{}\t{:#010x}\t{:#010x}\t{:>6}",
                report.index, status, prev, report.start, report.end, report.size
            )?;
        }

        writeln!(f, "Total used size = {}", used)?;
        writeln!(f, "Total free size = {}", free)?;
        write!(f, "Total size      = {}", used + free)
    }
}

/// Block size needed to serve a payload: header plus payload, rounded up to
/// the alignment unit. `None` on arithmetic overflow.
fn block_size_for(payload_size: usize) -> Option<usize> {
    let needed = payload_size.checked_add(HEADER_SIZE + ALIGNMENT - 1)? & !(ALIGNMENT - 1);

    Some(needed)
}

/// Scans the whole chain for the smallest free block of at least `needed`
/// bytes. Ties keep the earlier block, and an exact match does not cut the
/// scan short: a smaller candidate may still appear later in the chain.
fn find_best_fit(region: &Region, needed: usize) -> Option<Cursor> {
    let mut fit: Option<(Cursor, usize)> = None;

    for (cursor, header) in Blocks::new(region) {
        if header.allocated || header.size < needed {
            continue;
        }

        match fit {
            Some((_, best)) if header.size >= best => {}
            _ => fit = Some((cursor, header.size)),
        }
    }

    fit.map(|(cursor, _)| cursor)
}

/// Merges the free block at `cursor` with its free neighbors and returns the
/// cursor of the merged block. Each direction is checked exactly once: the
/// chain never holds two adjacent free blocks before a free begins, so the
/// neighbors are already maximal runs.
fn coalesce(region: &mut Region, cursor: Cursor) -> Cursor {
    let mut cursor = cursor;
    let mut header = cursor.header(region);

    // Predecessor first. The p-flag is authoritative: only a free
    // predecessor has a readable footer under this block's header.
    if !header.prev_allocated {
        if let Some(prev) = cursor.prev_via_footer(region) {
            let prev_header = prev.header(region);
            debug_assert!(!prev_header.allocated);

            header = BlockHeader {
                size: prev_header.size + header.size,
                allocated: false,
                prev_allocated: prev_header.prev_allocated,
            };
            prev.write_header(region, header);
            prev.write_footer(region, header.size);
            cursor = prev;
        }
    }

    // Then the successor, unless the chain ends here.
    let next = cursor.next(region);
    if !next.is_sentinel(region) {
        let next_header = next.header(region);

        if !next_header.allocated {
            header = BlockHeader {
                size: header.size + next_header.size,
                allocated: false,
                prev_allocated: header.prev_allocated,
            };
            cursor.write_header(region, header);
            cursor.write_footer(region, header.size);
        }
    }

    cursor
}

/// Rewrites a block's p-flag. The sentinel is immutable and is skipped: it
/// always reports the reserved end mark, never neighbor state.
fn set_prev_allocated(region: &mut Region, cursor: Cursor, prev_allocated: bool) {
    if cursor.is_sentinel(region) {
        return;
    }

    let header = cursor.header(region);
    cursor.write_header(
        region,
        BlockHeader {
            prev_allocated,
            ..header
        },
    );
}
