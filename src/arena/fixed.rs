//! A typed slab with an embedded free-list, layered on a [`MemArena`].

use core::cell::Cell;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

use super::mem::MemArena;
use super::STANDARD_ALIGN;

/// A vacated cell; the link lives where the `T` used to be.
struct FreeCell {
    next: Option<NonNull<FreeCell>>,
}

/// A fixed-size object allocator over a [`MemArena`].
///
/// [`make`](FixedArena::make) pops the most recently destroyed cell, or
/// carves a fresh one from the backing arena when the free list is empty.
/// Cells never go back to the arena: they persist, vacant or occupied,
/// until the arena itself reclaims their block.
///
/// Holding a `FixedArena` borrows the arena, so generation control
/// (`freeze`, `thaw`, `clear` — all `&mut`) is unavailable while cells are
/// being managed.
pub struct FixedArena<'a, T> {
    arena: &'a MemArena,
    free: Cell<Option<NonNull<FreeCell>>>,
    _marker: PhantomData<T>,
}

impl<'a, T> FixedArena<'a, T> {
    /// Cell size: room for a `T` or a free-list link, whichever is larger.
    const CELL: usize = if mem::size_of::<T>() > mem::size_of::<FreeCell>() {
        mem::size_of::<T>()
    } else {
        mem::size_of::<FreeCell>()
    };

    const FITS: () = assert!(
        mem::align_of::<T>() <= STANDARD_ALIGN,
        "type alignment exceeds the arena's standard alignment"
    );

    /// Creates an empty fixed arena over `arena`.
    #[must_use]
    pub fn new(arena: &'a MemArena) -> Self {
        Self {
            arena,
            free: Cell::new(None),
            _marker: PhantomData,
        }
    }

    /// Moves `value` into a cell and returns a pointer to it.
    ///
    /// Reuses the most recently destroyed cell when one exists.
    pub fn make(&self, value: T) -> NonNull<T> {
        let () = Self::FITS;
        let cell = match self.free.get() {
            Some(head) => {
                // SAFETY: list heads are vacated cells holding a live link.
                self.free.set(unsafe { head.as_ref().next });
                head.cast::<u8>()
            }
            None => self.arena.alloc(Self::CELL).as_non_null(),
        };
        let ptr = cell.cast::<T>();
        // SAFETY: the cell is vacant, cell-aligned, and `CELL` bytes cover a `T`.
        unsafe {
            ptr.as_ptr().write(value);
        }
        ptr
    }

    /// Drops the value and pushes its cell onto the free list for reuse.
    ///
    /// # Safety
    /// `ptr` must come from [`make`](FixedArena::make) on this fixed arena
    /// and must not have been destroyed already.
    pub unsafe fn destroy(&self, ptr: NonNull<T>) {
        ptr::drop_in_place(ptr.as_ptr());
        let cell = ptr.cast::<FreeCell>();
        cell.as_ptr().write(FreeCell {
            next: self.free.get(),
        });
        self.free.set(Some(cell));
    }

    /// The backing arena.
    #[must_use]
    pub fn arena(&self) -> &'a MemArena {
        self.arena
    }
}
