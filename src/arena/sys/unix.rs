#![cfg(unix)]

use core::ptr::{self, NonNull};

use libc::{c_void, mmap, munmap, MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE};

/// Maps `size` bytes of zeroed read-write anonymous memory.
pub(crate) unsafe fn map_region(size: usize) -> Option<NonNull<u8>> {
    let ptr = mmap(
        ptr::null_mut(),
        size,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
    );

    if ptr == MAP_FAILED {
        None
    } else {
        NonNull::new(ptr.cast::<u8>())
    }
}

/// Returns a region obtained from [`map_region`] to the kernel.
pub(crate) unsafe fn unmap_region(ptr: NonNull<u8>, size: usize) {
    munmap(ptr.as_ptr().cast::<c_void>(), size);
}
