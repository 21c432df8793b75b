//! A user-space heap allocator over a single fixed-size region.
//!
//! A [`Heap`] owns one contiguous, page-rounded byte region acquired from the
//! environment exactly once. Allocation uses a best-fit scan over an implicit
//! block chain, freed blocks are eagerly coalesced with free neighbors, and
//! block metadata lives in a single header word per block (free blocks also
//! carry a trailing footer so a successor can find their start).
//! ```rust
//! use bestfit::Heap;
//!
//! let mut heap = Heap::with_capacity(4096).unwrap();
//!
//! let ptr = heap.alloc(128).unwrap();
//! heap.free(ptr.as_ptr()).unwrap();
//! ```
//! The heap is single-threaded by design: it is `Send` but not `Sync`, and
//! callers running it from more than one context must serialize access
//! themselves. Allocation failure is not fatal; `alloc` returns `None` and
//! the heap is left untouched, so the caller may free memory and retry.
//! ```rust
//! use bestfit::{Heap, FreeError};
//!
//! let mut heap = Heap::with_capacity(4096).unwrap();
//!
//! // The whole region is one free block, so an oversized request fails.
//! assert!(heap.alloc(1 << 20).is_none());
//!
//! // Freeing a pointer the heap never handed out is reported, not UB.
//! let foreign = 0x1000 as *const u8;
//! assert_eq!(heap.free(foreign), Err(FreeError::InvalidFree));
//! ```

mod constants;
mod cursor;
mod error;
mod header;
mod heap;
mod region;

pub use error::{FreeError, InitError};
pub use heap::{BlockReport, Heap};
