use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

use crate::constants::{ALIGNMENT, HEADER_SIZE};
use crate::error::InitError;

/// One fixed-size buffer acquired from the environment. The requested size is
/// rounded up to the next multiple of the page size, the bytes arrive zeroed,
/// and the buffer is neither resized nor released until the region is
/// dropped.
#[derive(Debug)]
pub struct Region {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Region {
    pub fn new(region_size: usize) -> Result<Region, InitError> {
        if region_size == 0 {
            return Err(InitError::InvalidSize);
        }

        let padded = round_to_page(region_size).ok_or(InitError::InvalidSize)?;
        let layout =
            Layout::from_size_align(padded, ALIGNMENT).map_err(|_| InitError::RegionUnavailable)?;
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(InitError::RegionUnavailable)?;

        Ok(Region { ptr, layout })
    }

    /// Bytes available for blocks: everything but the trailing sentinel word.
    pub fn usable_size(&self) -> usize {
        self.layout.size() - HEADER_SIZE
    }

    pub fn base(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Byte offset of `ptr` within the region, or `None` if it points
    /// outside.
    pub fn offset_of(&self, ptr: *const u8) -> Option<usize> {
        let base = self.ptr.as_ptr() as usize;
        let addr = ptr as usize;

        if addr < base || addr >= base + self.layout.size() {
            return None;
        }

        Some(addr - base)
    }

    pub fn read_word(&self, offset: usize) -> usize {
        debug_assert!(offset % ALIGNMENT == 0);
        debug_assert!(offset + HEADER_SIZE <= self.layout.size());

        unsafe { self.ptr.as_ptr().add(offset).cast::<usize>().read() }
    }

    pub fn write_word(&mut self, offset: usize, word: usize) {
        debug_assert!(offset % ALIGNMENT == 0);
        debug_assert!(offset + HEADER_SIZE <= self.layout.size());

        unsafe { self.ptr.as_ptr().add(offset).cast::<usize>().write(word) }
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

// The buffer is uniquely owned and only reachable through &mut methods.
unsafe impl Send for Region {}

pub fn page_size() -> usize {
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

    if raw > 0 {
        raw as usize
    } else {
        4096
    }
}

fn round_to_page(size: usize) -> Option<usize> {
    let page = page_size();
    let padded = size.checked_add(page - 1)? / page * page;

    Some(padded)
}
