//! An index-based arena for AST nodes (spec.md §5, §9).
//!
//! The donor crate's `Arena<T>` hands back `&T` references borrowed from a
//! `bumpalo::Bump`. That is fine when the arena outlives every reference
//! into it for the whole program, but spec.md §5 requires a `CALDocument`
//! whose nodes can be held by a caller after the token vector (and, for us,
//! the backing bump allocator) could otherwise be dropped, and §9 asks for
//! "child indices" rather than reference-counted or borrowed trees. So this
//! arena still bump-allocates for O(1) bulk deallocation, but returns a
//! stable `NodeId` (a plain integer) instead of a reference, and nodes are
//! looked up by index through `&Arena<T>` rather than held directly.

use bumpalo::Bump;
use std::cell::RefCell;
use std::marker::PhantomData;

/// An opaque, copyable reference to a node inside an `Arena<T>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> NodeId<T> {
    fn new(index: u32) -> Self {
        NodeId {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// One arena per document, as spec.md §5 specifies. Backed by a `Bump` so
/// the whole tree is freed in one shot when the arena is dropped; lookups go
/// through a side table of raw pointers so callers only ever see `NodeId`s.
pub struct Arena<T> {
    bump: Bump,
    slots: RefCell<Vec<*const T>>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena {
            bump: Bump::new(),
            slots: RefCell::new(Vec::new()),
        }
    }

    /// Allocates `value` into the arena and returns a stable id for it.
    pub fn alloc(&self, value: T) -> NodeId<T> {
        let ptr: &T = self.bump.alloc(value);
        let mut slots = self.slots.borrow_mut();
        let index = slots.len() as u32;
        slots.push(ptr as *const T);
        NodeId::new(index)
    }

    /// Looks up a previously allocated node. `id` must have come from this
    /// same arena — `NodeId`s are not portable across arenas.
    pub fn get(&self, id: NodeId<T>) -> &T {
        let slots = self.slots.borrow();
        // SAFETY: the pointer was produced by `self.bump.alloc` above and the
        // backing `Bump` is never reset or dropped while `self` is alive, so
        // the pointee remains valid for the arena's lifetime.
        unsafe { &*slots[id.index()] }
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_stable_id() {
        let arena: Arena<i32> = Arena::new();
        let id1 = arena.alloc(42);
        let id2 = arena.alloc(100);
        assert_eq!(*arena.get(id1), 42);
        assert_eq!(*arena.get(id2), 100);
    }

    #[test]
    fn ids_remain_valid_after_many_allocations() {
        let arena: Arena<i32> = Arena::new();
        let ids: Vec<_> = (0..10_000).map(|i| arena.alloc(i)).collect();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(*arena.get(*id), i as i32);
        }
    }

    #[test]
    fn works_with_structs() {
        #[derive(Debug, PartialEq)]
        struct Point {
            x: i32,
            y: i32,
        }

        let arena: Arena<Point> = Arena::new();
        let p1 = arena.alloc(Point { x: 1, y: 2 });
        let p2 = arena.alloc(Point { x: 3, y: 4 });
        assert_eq!(arena.get(p1), &Point { x: 1, y: 2 });
        assert_eq!(arena.get(p2), &Point { x: 3, y: 4 });
    }

    #[test]
    fn len_tracks_allocation_count() {
        let arena: Arena<i32> = Arena::new();
        assert!(arena.is_empty());
        arena.alloc(1);
        arena.alloc(2);
        assert_eq!(arena.len(), 2);
    }
}
