//! The generational bump arena.

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};
use std::alloc::{handle_alloc_error, Layout};

use super::block::Block;
use super::{checked_align_up, AllocError, Backing, STANDARD_ALIGN};
use crate::span::ByteSpan;

/// Usable bytes in the first block when no capacity is requested.
const DEFAULT_INITIAL: usize = 128;

/// Cap on the doubling growth policy. Freeze hints and oversized requests
/// bypass it.
const GROWTH_CAP: usize = 1 << 20;

/// A region allocator over internally managed generations of blocks.
///
/// Allocations bump a cursor through the newest block of the *current*
/// generation; when it runs out, a geometrically larger block is chained in
/// front of it. [`freeze`](MemArena::freeze) detaches the whole current
/// generation into a read-only side slot and [`thaw`](MemArena::thaw)
/// destroys it, so a caller can retire one wave of allocations while the
/// next is already being built.
///
/// The arena is sequential: allocation takes `&self` (so handles like
/// [`FixedArena`](super::FixedArena) can share it), generation control takes
/// `&mut self`, and callers sharing an arena across threads must serialize
/// every call themselves.
///
/// Individual allocations are never reclaimed. Spans stay valid until the
/// block holding them is destroyed by `thaw`, [`clear`](MemArena::clear), or
/// drop; [`contains`](MemArena::contains) is the only safe probe for that.
pub struct MemArena {
    current: Cell<Option<NonNull<Block>>>,
    frozen: Cell<Option<NonNull<Block>>>,
    /// Bytes carved out of current-generation blocks.
    current_size: Cell<usize>,
    frozen_size: Cell<usize>,
    /// Sum of current-generation block capacities.
    current_reserved: Cell<usize>,
    frozen_reserved: Cell<usize>,
    /// Capacity target for the next block.
    next_capacity: Cell<usize>,
    initial_capacity: usize,
    backing: Backing,
    /// Whether the arena instance lives inside its own first block.
    hosted: bool,
}

/// Footprint of the arena instance inside a hosting block.
const HOST_FOOTPRINT: usize =
    (mem::size_of::<MemArena>() + STANDARD_ALIGN - 1) & !(STANDARD_ALIGN - 1);

const _: () = {
    assert!(mem::align_of::<MemArena>() <= STANDARD_ALIGN);
    assert!(HOST_FOOTPRINT % STANDARD_ALIGN == 0);
};

/// Post-monomorphization check that `T` fits the standard alignment.
struct AlignFit<T>(PhantomData<T>);

impl<T> AlignFit<T> {
    const OK: () = assert!(
        mem::align_of::<T>() <= STANDARD_ALIGN,
        "type alignment exceeds the arena's standard alignment"
    );
}

impl MemArena {
    /// Creates an empty arena. No block is reserved until first need.
    #[must_use]
    pub fn new() -> Self {
        Self::bare(Backing::System, DEFAULT_INITIAL)
    }

    /// Creates an arena with at least `initial` bytes of free space already
    /// reserved.
    #[must_use]
    pub fn with_capacity(initial: usize) -> Self {
        Self::with_backing(Backing::System, initial)
    }

    /// Creates an arena drawing its blocks from `backing`, with at least
    /// `initial` bytes of free space already reserved.
    #[must_use]
    pub fn with_backing(backing: Backing, initial: usize) -> Self {
        let arena = Self::bare(backing, initial);
        if initial > 0 {
            arena.require(initial);
        }
        arena
    }

    fn bare(backing: Backing, initial: usize) -> Self {
        let initial = if initial == 0 { DEFAULT_INITIAL } else { initial };
        Self {
            current: Cell::new(None),
            frozen: Cell::new(None),
            current_size: Cell::new(0),
            frozen_size: Cell::new(0),
            current_reserved: Cell::new(0),
            frozen_reserved: Cell::new(0),
            next_capacity: Cell::new(initial),
            initial_capacity: initial,
            backing,
            hosted: false,
        }
    }

    /// Creates an arena hosted inside the first block it allocates.
    ///
    /// The returned pointer refers to the in-block instance; its own storage
    /// outlives nothing but itself. A hosted arena supports allocation and
    /// queries but not generation control or moves, and must be torn down
    /// with [`MemArena::destroy`] rather than dropped.
    #[must_use]
    pub fn self_contained(initial: usize) -> NonNull<MemArena> {
        let initial = if initial == 0 { DEFAULT_INITIAL } else { initial };
        let capacity = match checked_align_up(initial).and_then(|n| n.checked_add(HOST_FOOTPRINT)) {
            Some(capacity) => capacity,
            None => Self::oom(initial),
        };
        let block = match Block::create(capacity, Backing::System) {
            Ok(block) => block,
            Err(AllocError) => Self::oom(capacity),
        };

        // SAFETY: the block is fresh and exclusively ours; the hosting carve
        // is aligned and `HOST_FOOTPRINT` covers the instance.
        unsafe {
            let host = (*block.as_ptr()).carve(HOST_FOOTPRINT).cast::<MemArena>();
            host.as_ptr().write(MemArena {
                current: Cell::new(Some(block)),
                frozen: Cell::new(None),
                current_size: Cell::new(HOST_FOOTPRINT),
                frozen_size: Cell::new(0),
                current_reserved: Cell::new(capacity),
                frozen_reserved: Cell::new(0),
                next_capacity: Cell::new(capacity.saturating_mul(2).min(GROWTH_CAP)),
                initial_capacity: initial,
                backing: Backing::System,
                hosted: true,
            });
            host
        }
    }

    /// Tears down an arena created by [`MemArena::self_contained`].
    ///
    /// Every other block is released first; the hosting block goes last,
    /// from a local copy of its pointer, so no field of the arena is read
    /// after its storage is gone.
    ///
    /// # Safety
    /// `this` must come from [`MemArena::self_contained`] and must not be
    /// used afterwards.
    pub unsafe fn destroy(this: NonNull<MemArena>) {
        let arena = this.as_ref();
        debug_assert!(arena.hosted, "destroy is only for self-contained arenas");
        let backing = arena.backing;
        let frozen = arena.frozen.get();
        let current = arena.current.get();
        // The instance lives in the oldest block, the tail of the current
        // list: releasing front to back frees the hosting region last, and
        // nothing reads through `this` past this point.
        Block::release_list(frozen, backing);
        Block::release_list(current, backing);
    }

    /// Bytes allocated from the current generation.
    #[inline]
    pub fn size(&self) -> usize {
        self.current_size.get()
    }

    /// Bytes allocated across both generations.
    #[inline]
    pub fn allocated_size(&self) -> usize {
        self.current_size.get() + self.frozen_size.get()
    }

    /// Sum of block capacities across both generations.
    #[inline]
    pub fn reserved_size(&self) -> usize {
        self.current_reserved.get() + self.frozen_reserved.get()
    }

    /// Bytes still free in the block serving the next allocation.
    #[inline]
    pub fn remaining(&self) -> usize {
        // SAFETY: list heads always point at live blocks.
        self.current
            .get()
            .map_or(0, |block| unsafe { block.as_ref() }.remaining())
    }

    /// Whether `p` points into any block of either generation.
    pub fn contains(&self, p: *const u8) -> bool {
        Self::list_contains(self.current.get(), p) || Self::list_contains(self.frozen.get(), p)
    }

    fn list_contains(head: Option<NonNull<Block>>, p: *const u8) -> bool {
        let mut cursor = head;
        while let Some(block) = cursor {
            // SAFETY: list links always point at live blocks.
            let block = unsafe { block.as_ref() };
            if block.contains(p) {
                return true;
            }
            cursor = block.next;
        }
        false
    }

    /// Allocates `n` contiguous bytes.
    ///
    /// Zero-length requests return an empty span without reserving a block.
    /// A refused block is fatal; see [`try_alloc`](MemArena::try_alloc).
    #[inline]
    pub fn alloc(&self, n: usize) -> ByteSpan {
        match self.try_alloc(n) {
            Ok(span) => span,
            Err(AllocError) => Self::oom(n),
        }
    }

    /// Allocates `n` contiguous bytes, reporting block-source failure.
    ///
    /// # Errors
    /// Returns [`AllocError`] if the backing refuses a block.
    pub fn try_alloc(&self, n: usize) -> Result<ByteSpan, AllocError> {
        if n == 0 {
            return Ok(ByteSpan::empty());
        }
        let rounded = checked_align_up(n).ok_or(AllocError)?;
        let block = self.ensure(rounded)?;
        // SAFETY: `ensure` leaves at least `rounded` bytes in the head block.
        let ptr = unsafe { (*block.as_ptr()).carve(rounded) };
        self.current_size.set(self.current_size.get() + rounded);
        Ok(ByteSpan::new(ptr, n))
    }

    /// Ensures the current block has at least `n` bytes of remaining space
    /// without carving any of it.
    #[inline]
    pub fn require(&self, n: usize) {
        if self.try_require(n).is_err() {
            Self::oom(n);
        }
    }

    /// Fallible form of [`require`](MemArena::require).
    ///
    /// # Errors
    /// Returns [`AllocError`] if the backing refuses a block.
    pub fn try_require(&self, n: usize) -> Result<(), AllocError> {
        if n == 0 {
            return Ok(());
        }
        let rounded = checked_align_up(n).ok_or(AllocError)?;
        self.ensure(rounded).map(|_| ())
    }

    /// The free tail of the current block.
    ///
    /// The caller may write into the span; none of it counts as allocated
    /// until a later [`alloc`](MemArena::alloc) carves part of it. Pair with
    /// [`require`](MemArena::require) to size the remnant first.
    #[inline]
    pub fn remnant(&self) -> ByteSpan {
        match self.current.get() {
            Some(block) => {
                // SAFETY: the head block is live.
                let block = unsafe { block.as_ref() };
                ByteSpan::new(block.remnant_ptr(), block.remaining())
            }
            None => ByteSpan::empty(),
        }
    }

    /// Moves `value` into the arena and returns a pointer to it.
    ///
    /// The arena never runs `T`'s destructor: either keep to trivially
    /// droppable payloads or `drop_in_place` the pointer before the storage
    /// vanishes. `T`'s alignment must fit [`STANDARD_ALIGN`]; this is
    /// checked at compile time.
    pub fn make<T>(&self, value: T) -> NonNull<T> {
        let () = AlignFit::<T>::OK;
        if mem::size_of::<T>() == 0 {
            mem::forget(value);
            return NonNull::dangling();
        }
        let span = self.alloc(mem::size_of::<T>());
        let ptr = span.as_non_null().cast::<T>();
        // SAFETY: freshly carved, aligned, uninitialized storage of the
        // right size.
        unsafe {
            ptr.as_ptr().write(value);
        }
        ptr
    }

    /// Copies `bytes` into the arena.
    ///
    /// This is the localization helper: copy data out of a frozen
    /// generation into the current one before a thaw invalidates it.
    pub fn alloc_copy(&self, bytes: &[u8]) -> ByteSpan {
        let span = self.alloc(bytes.len());
        if !bytes.is_empty() {
            // SAFETY: the span is freshly carved and disjoint from `bytes`.
            unsafe {
                ptr::copy_nonoverlapping(bytes.as_ptr(), span.as_ptr(), bytes.len());
            }
        }
        span
    }

    /// Detaches the current generation into the frozen slot.
    ///
    /// Afterwards `size()` is zero and the next block to be created has
    /// capacity at least `max(hint, reserved bytes of the frozen
    /// generation)`, so the next wave of allocations lands in one block.
    ///
    /// The frozen slot must be empty: debug builds assert, release builds
    /// leak the previously frozen blocks.
    pub fn freeze(&mut self, hint: usize) {
        debug_assert!(!self.hosted, "a self-contained arena cannot freeze its own storage");
        debug_assert!(
            self.frozen.get().is_none(),
            "freeze while a frozen generation exists"
        );
        self.frozen.set(self.current.take());
        self.frozen_size.set(self.current_size.replace(0));
        self.frozen_reserved.set(self.current_reserved.replace(0));

        let mut target = hint.max(self.frozen_reserved.get());
        if target == 0 {
            target = self.initial_capacity;
        }
        self.next_capacity.set(target);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            frozen = self.frozen_size.get(),
            next_capacity = target,
            "froze current generation"
        );
    }

    /// Destroys the frozen generation. No-op when nothing is frozen.
    ///
    /// Spans into frozen blocks dangle afterwards; copy anything worth
    /// keeping with [`alloc_copy`](MemArena::alloc_copy) first.
    pub fn thaw(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::trace!(released = self.frozen_reserved.get(), "thawed frozen generation");

        // SAFETY: frozen blocks came from `Block::create` with our backing
        // and nothing else owns them.
        unsafe {
            Block::release_list(self.frozen.take(), self.backing);
        }
        self.frozen_size.set(0);
        self.frozen_reserved.set(0);
    }

    /// Destroys every block in both generations and resets the growth
    /// policy to the initial capacity.
    pub fn clear(&mut self) {
        debug_assert!(!self.hosted, "a self-contained arena cannot clear its own storage");

        #[cfg(feature = "tracing")]
        tracing::trace!(released = self.reserved_size(), "cleared arena");

        // SAFETY: all blocks came from `Block::create` with our backing.
        unsafe {
            Block::release_list(self.current.take(), self.backing);
            Block::release_list(self.frozen.take(), self.backing);
        }
        self.current_size.set(0);
        self.frozen_size.set(0);
        self.current_reserved.set(0);
        self.frozen_reserved.set(0);
        self.next_capacity.set(self.initial_capacity);
    }

    /// Head block with at least `rounded` free bytes, growing if needed.
    fn ensure(&self, rounded: usize) -> Result<NonNull<Block>, AllocError> {
        match self.current.get() {
            // SAFETY: the head block is live.
            Some(block) if unsafe { block.as_ref() }.remaining() >= rounded => Ok(block),
            _ => self.grow(rounded),
        }
    }

    /// Chains a new block of capacity `max(rounded, hint)` onto the current
    /// generation and advances the growth target.
    fn grow(&self, rounded: usize) -> Result<NonNull<Block>, AllocError> {
        let capacity = rounded.max(self.next_capacity.get());
        let mut block = Block::create(capacity, self.backing)?;
        // SAFETY: the block is fresh; linking it cannot alias anything.
        unsafe {
            block.as_mut().next = self.current.get();
        }
        self.current.set(Some(block));
        self.current_reserved.set(self.current_reserved.get() + capacity);
        self.next_capacity
            .set(capacity.saturating_mul(2).min(GROWTH_CAP));

        #[cfg(feature = "tracing")]
        tracing::trace!(capacity, reserved = self.reserved_size(), "reserved arena block");

        Ok(block)
    }

    fn oom(n: usize) -> ! {
        let layout = Layout::from_size_align(n.max(STANDARD_ALIGN), STANDARD_ALIGN)
            .unwrap_or(Layout::new::<u128>());
        handle_alloc_error(layout)
    }
}

impl Default for MemArena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemArena")
            .field("size", &self.size())
            .field("allocated_size", &self.allocated_size())
            .field("reserved_size", &self.reserved_size())
            .field("backing", &self.backing)
            .field("hosted", &self.hosted)
            .finish_non_exhaustive()
    }
}

impl Drop for MemArena {
    fn drop(&mut self) {
        // Hosted instances are torn down via `destroy`, never by value.
        // SAFETY: all blocks came from `Block::create` with our backing.
        unsafe {
            Block::release_list(self.current.take(), self.backing);
            Block::release_list(self.frozen.take(), self.backing);
        }
    }
}

// SAFETY: the arena exclusively owns its blocks; moving it between threads
// moves that ownership wholesale.
unsafe impl Send for MemArena {}
// Not Sync: interior mutability without synchronization.
