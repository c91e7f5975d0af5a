#![cfg(windows)]

use core::ptr::{self, NonNull};

use windows_sys::Win32::System::Memory::{
    VirtualAlloc, VirtualFree, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE,
};

/// Maps `size` bytes of zeroed read-write anonymous memory.
pub(crate) unsafe fn map_region(size: usize) -> Option<NonNull<u8>> {
    let ptr = VirtualAlloc(ptr::null_mut(), size, MEM_COMMIT | MEM_RESERVE, PAGE_READWRITE);
    NonNull::new(ptr.cast::<u8>())
}

/// Returns a region obtained from [`map_region`] to the kernel.
///
/// `MEM_RELEASE` frees the whole reservation, so the size argument to
/// `VirtualFree` must be zero.
pub(crate) unsafe fn unmap_region(ptr: NonNull<u8>, _size: usize) {
    VirtualFree(ptr.as_ptr().cast(), 0, MEM_RELEASE);
}
