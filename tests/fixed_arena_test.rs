use std::cell::Cell;
use std::rc::Rc;

use strata::{FixedArena, MemArena};

#[test]
fn destroyed_cell_is_reused_first() {
    let arena = MemArena::new();
    let cells: FixedArena<'_, u64> = FixedArena::new(&arena);

    let p = cells.make(0);
    unsafe { cells.destroy(p) };

    let q = cells.make(0);
    assert_eq!(q, p);
    unsafe { assert_eq!(*q.as_ref(), 0) };
}

#[test]
fn reuse_is_lifo_under_any_destroy_order() {
    let arena = MemArena::new();
    let cells: FixedArena<'_, u32> = FixedArena::new(&arena);

    let ptrs: Vec<_> = (0..8u32).map(|i| cells.make(i)).collect();

    // Scrambled destroy order; the last destroyed must come back first.
    for &i in &[3usize, 0, 6, 1, 7, 2, 5] {
        unsafe { cells.destroy(ptrs[i]) };
    }
    assert_eq!(cells.make(99), ptrs[5]);
    assert_eq!(cells.make(98), ptrs[2]);
    assert_eq!(cells.make(97), ptrs[7]);
}

#[test]
fn destroy_runs_the_destructor_once() {
    struct Tracked {
        drops: Rc<Cell<u32>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    let arena = MemArena::new();
    let cells: FixedArena<'_, Tracked> = FixedArena::new(&arena);
    let drops = Rc::new(Cell::new(0));

    let p = cells.make(Tracked { drops: Rc::clone(&drops) });
    assert_eq!(drops.get(), 0);

    unsafe { cells.destroy(p) };
    assert_eq!(drops.get(), 1);

    // The vacated cell is reconstructed, not resurrected.
    let q = cells.make(Tracked { drops: Rc::clone(&drops) });
    assert_eq!(q, p);
    assert_eq!(drops.get(), 1);
    unsafe { cells.destroy(q) };
    assert_eq!(drops.get(), 2);
}

#[test]
fn fresh_cells_come_from_the_backing_arena() {
    let arena = MemArena::new();
    let cells: FixedArena<'_, [u64; 4]> = FixedArena::new(&arena);

    let before = arena.size();
    let p = cells.make([1, 2, 3, 4]);
    assert!(arena.size() > before);
    assert!(arena.contains(p.as_ptr().cast()));

    // Reuse leaves the arena untouched.
    let after = arena.size();
    unsafe { cells.destroy(p) };
    let q = cells.make([5, 6, 7, 8]);
    assert_eq!(q, p);
    assert_eq!(arena.size(), after);
}

#[test]
fn many_cells_stay_distinct() {
    let arena = MemArena::new();
    let cells: FixedArena<'_, u128> = FixedArena::new(&arena);

    let ptrs: Vec<_> = (0..256u128).map(|i| cells.make(i)).collect();
    for (i, p) in ptrs.iter().enumerate() {
        unsafe { assert_eq!(*p.as_ref(), i as u128) };
    }

    let mut addrs: Vec<_> = ptrs.iter().map(|p| p.as_ptr() as usize).collect();
    addrs.sort_unstable();
    addrs.dedup();
    assert_eq!(addrs.len(), 256);
}
