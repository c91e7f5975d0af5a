//! Anonymous page mappings for [`Backing::MemoryMap`](crate::Backing).

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub(crate) use unix::{map_region, unmap_region};

#[cfg(windows)]
pub(crate) use windows::{map_region, unmap_region};
