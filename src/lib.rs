//! # `strata` - Generational Region Allocators
//!
//! Bump arenas that group many small allocations into a few large blocks
//! and reclaim them only in bulk, plus a typed free-list layered on top.
//!
//! ## Key Features
//!
//! - **Contiguous spans**: every allocation is one contiguous run inside a
//!   single block, never split across blocks
//! - **Two-generation freeze/thaw**: detach the current generation, build
//!   the next one, then drop the old generation in a single step
//! - **Self-contained hosting**: an arena can live inside the first block
//!   it allocates, owning every byte of its own representation
//! - **Typed reuse**: [`FixedArena`] recycles fixed-size cells in LIFO
//!   order without ever returning storage to the arena
//!
//! ## Example
//!
//! ```rust
//! use strata::MemArena;
//!
//! let mut arena = MemArena::with_capacity(256);
//!
//! let greeting = arena.alloc_copy(b"hello");
//! assert!(arena.contains(greeting.as_ptr()));
//! assert_eq!(unsafe { greeting.as_slice() }, b"hello");
//!
//! // Retire this wave of allocations while the next one builds.
//! arena.freeze(0);
//! assert_eq!(arena.size(), 0);
//! let fresh = arena.alloc_copy(unsafe { greeting.as_slice() });
//! arena.thaw();
//! assert_eq!(unsafe { fresh.as_slice() }, b"hello");
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod arena;
pub mod span;

pub use arena::{AllocError, Backing, FixedArena, MemArena, STANDARD_ALIGN};
pub use span::ByteSpan;

// Compile-time assertions for the layout the allocator is built around
const _: () = {
    use core::mem;

    // Spans are two words and copy freely.
    assert!(mem::size_of::<ByteSpan>() == mem::size_of::<usize>() * 2);

    // The standard alignment covers every scalar the platform has.
    assert!(STANDARD_ALIGN >= mem::align_of::<u128>());
    assert!(STANDARD_ALIGN.is_power_of_two());

    // An arena instance must fit a block's data region alignment so a block
    // can host it (`MemArena::self_contained`).
    assert!(mem::align_of::<MemArena>() <= STANDARD_ALIGN);
};
