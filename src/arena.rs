use super::error::BuildError;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::{self, NonNull};
use std::slice;

/// The fixed region of bytes every block header and payload lives in.
///
/// The region is obtained zeroed from the global allocator and never moves or
/// grows, so payload pointers handed out by the heap stay valid for as long as
/// the arena is alive.
pub struct Arena {
    ptr: NonNull<u8>,
    layout: Layout,
}

// The arena exclusively owns its allocation.
unsafe impl Send for Arena {}

impl Arena {
    pub fn new(capacity: usize) -> Result<Arena, BuildError> {
        let layout = Layout::from_size_align(capacity, std::mem::align_of::<u64>())
            .map_err(|_| BuildError::CapacityTooLarge { capacity })?;

        Ok(Arena {
            ptr: Self::alloc_region(layout)?,
            layout,
        })
    }

    pub fn capacity(&self) -> usize {
        self.layout.size()
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn at_offset(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset < self.capacity());

        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) }
    }

    /// Translates an address into an offset from the start of the arena, if
    /// the address lies inside it.
    pub fn offset_of(&self, addr: *const u8) -> Option<usize> {
        let base = self.ptr.as_ptr() as usize;
        let addr = addr as usize;

        if addr >= base && addr < base + self.capacity() {
            Some(addr - base)
        } else {
            None
        }
    }

    pub fn read<const N: usize>(&self, offset: usize) -> [u8; N] {
        assert!(offset + N <= self.capacity(), "read past the end of the arena");

        let mut buf = [0u8; N];

        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr().add(offset), buf.as_mut_ptr(), N);
        }

        buf
    }

    pub fn write(&mut self, offset: usize, bytes: &[u8]) {
        assert!(
            offset + bytes.len() <= self.capacity(),
            "write past the end of the arena"
        );

        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.ptr.as_ptr().add(offset), bytes.len());
        }
    }

    pub fn bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.capacity()) }
    }

    fn alloc_region(layout: Layout) -> Result<NonNull<u8>, BuildError> {
        unsafe {
            let ptr = alloc_zeroed(layout);

            NonNull::new(ptr).ok_or(BuildError::OutOfMemory {
                capacity: layout.size(),
            })
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}
