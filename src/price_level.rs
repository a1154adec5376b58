//! Price Level - arrival-ordered queue of the orders resting at one price.
//!
//! The queue is a doubly linked list threaded through the arena by handle,
//! giving O(1) append, O(1) pop of the oldest order and O(1) unlink of any
//! order given its handle.

use crate::arena::{Arena, OrderHandle, NULL_HANDLE};

/// All live orders at one price on one side, oldest first.
#[derive(Clone, Copy, Debug)]
pub struct PriceLevel {
    /// Oldest order (first to fill)
    head: OrderHandle,
    /// Newest order
    tail: OrderHandle,
    /// Sum of remaining quantity across the level
    total_qty: u64,
    count: u32,
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceLevel {
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: NULL_HANDLE,
            tail: NULL_HANDLE,
            total_qty: 0,
            count: 0,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.count
    }

    #[inline]
    pub const fn total_qty(&self) -> u64 {
        self.total_qty
    }

    /// Oldest order at this level, if any
    #[inline]
    pub fn front(&self) -> Option<OrderHandle> {
        (self.head != NULL_HANDLE).then_some(self.head)
    }

    /// Newest order at this level, if any
    #[inline]
    pub fn back(&self) -> Option<OrderHandle> {
        (self.tail != NULL_HANDLE).then_some(self.tail)
    }

    /// Append an order behind every order already queued here.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn push_back(&mut self, arena: &mut Arena, handle: OrderHandle) {
        let qty = arena.get(handle).qty;

        if self.tail == NULL_HANDLE {
            debug_assert!(self.head == NULL_HANDLE);
            self.head = handle;
        } else {
            arena.get_mut(self.tail).next = handle;
        }

        let node = arena.get_mut(handle);
        node.prev = self.tail;
        node.next = NULL_HANDLE;
        self.tail = handle;

        self.count += 1;
        self.total_qty += qty as u64;
    }

    /// Detach and return the oldest order.
    ///
    /// The node stays allocated; the caller releases it.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn pop_front(&mut self, arena: &mut Arena) -> Option<OrderHandle> {
        let handle = self.front()?;
        self.unlink(arena, handle);
        Some(handle)
    }

    /// Detach an order from anywhere in the queue.
    ///
    /// Returns `true` if the level is now empty. The node stays allocated;
    /// the caller releases it.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn unlink(&mut self, arena: &mut Arena, handle: OrderHandle) -> bool {
        let node = arena.get(handle);
        let (prev, next, qty) = (node.prev, node.next, node.qty);

        if prev == NULL_HANDLE {
            debug_assert!(self.head == handle);
            self.head = next;
        } else {
            arena.get_mut(prev).next = next;
        }

        if next == NULL_HANDLE {
            debug_assert!(self.tail == handle);
            self.tail = prev;
        } else {
            arena.get_mut(next).prev = prev;
        }

        let node = arena.get_mut(handle);
        node.prev = NULL_HANDLE;
        node.next = NULL_HANDLE;

        self.count -= 1;
        self.total_qty -= qty as u64;

        self.count == 0
    }

    /// Account for a partial fill applied directly to a node's `qty`.
    #[inline]
    pub fn subtract_qty(&mut self, qty: u32) {
        debug_assert!(self.total_qty >= qty as u64);
        self.total_qty -= qty as u64;
    }

    /// Walk the queue oldest to newest.
    pub fn handles<'a>(&self, arena: &'a Arena) -> LevelIter<'a> {
        LevelIter {
            arena,
            cursor: self.head,
        }
    }
}

/// Iterator over the handles queued at one level
pub struct LevelIter<'a> {
    arena: &'a Arena,
    cursor: OrderHandle,
}

impl Iterator for LevelIter<'_> {
    type Item = OrderHandle;

    fn next(&mut self) -> Option<OrderHandle> {
        if self.cursor == NULL_HANDLE {
            return None;
        }
        let handle = self.cursor;
        self.cursor = self.arena.get(handle).next;
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::OrderNode;
    use crate::command::Order;

    fn setup(arena: &mut Arena, level: &mut PriceLevel, count: u64) -> Vec<OrderHandle> {
        (0..count)
            .map(|i| {
                let h = arena
                    .insert(OrderNode::from_order(&Order::buy(i, 10_000, 100), i))
                    .unwrap();
                level.push_back(arena, h);
                h
            })
            .collect()
    }

    fn ids(level: &PriceLevel, arena: &Arena) -> Vec<u64> {
        level.handles(arena).map(|h| arena.get(h).order_id).collect()
    }

    #[test]
    fn test_empty_level() {
        let level = PriceLevel::new();
        assert!(level.is_empty());
        assert_eq!(level.len(), 0);
        assert_eq!(level.total_qty(), 0);
        assert_eq!(level.front(), None);
        assert_eq!(level.back(), None);
    }

    #[test]
    fn test_push_keeps_arrival_order() {
        let mut arena = Arena::with_capacity(10);
        let mut level = PriceLevel::new();
        let handles = setup(&mut arena, &mut level, 3);

        assert_eq!(level.len(), 3);
        assert_eq!(level.total_qty(), 300);
        assert_eq!(level.front(), Some(handles[0]));
        assert_eq!(level.back(), Some(handles[2]));
        assert_eq!(ids(&level, &arena), vec![0, 1, 2]);

        assert_eq!(arena.get(handles[1]).prev, handles[0]);
        assert_eq!(arena.get(handles[1]).next, handles[2]);
    }

    #[test]
    fn test_pop_front() {
        let mut arena = Arena::with_capacity(10);
        let mut level = PriceLevel::new();
        let handles = setup(&mut arena, &mut level, 3);

        assert_eq!(level.pop_front(&mut arena), Some(handles[0]));
        assert_eq!(level.front(), Some(handles[1]));
        assert_eq!(arena.get(handles[1]).prev, NULL_HANDLE);

        assert_eq!(level.pop_front(&mut arena), Some(handles[1]));
        assert_eq!(level.pop_front(&mut arena), Some(handles[2]));
        assert!(level.is_empty());
        assert_eq!(level.total_qty(), 0);
        assert!(level.pop_front(&mut arena).is_none());
    }

    #[test]
    fn test_unlink_only_node() {
        let mut arena = Arena::with_capacity(10);
        let mut level = PriceLevel::new();
        let handles = setup(&mut arena, &mut level, 1);

        assert!(level.unlink(&mut arena, handles[0]));
        assert_eq!(level.front(), None);
        assert_eq!(level.back(), None);
    }

    #[test]
    fn test_unlink_head() {
        let mut arena = Arena::with_capacity(10);
        let mut level = PriceLevel::new();
        let handles = setup(&mut arena, &mut level, 3);

        assert!(!level.unlink(&mut arena, handles[0]));
        assert_eq!(level.front(), Some(handles[1]));
        assert_eq!(ids(&level, &arena), vec![1, 2]);
    }

    #[test]
    fn test_unlink_tail() {
        let mut arena = Arena::with_capacity(10);
        let mut level = PriceLevel::new();
        let handles = setup(&mut arena, &mut level, 3);

        assert!(!level.unlink(&mut arena, handles[2]));
        assert_eq!(level.back(), Some(handles[1]));
        assert_eq!(arena.get(handles[1]).next, NULL_HANDLE);
    }

    #[test]
    fn test_unlink_middle() {
        let mut arena = Arena::with_capacity(10);
        let mut level = PriceLevel::new();
        let handles = setup(&mut arena, &mut level, 3);

        assert!(!level.unlink(&mut arena, handles[1]));
        assert_eq!(level.len(), 2);
        assert_eq!(level.total_qty(), 200);
        assert_eq!(arena.get(handles[0]).next, handles[2]);
        assert_eq!(arena.get(handles[2]).prev, handles[0]);
    }

    #[test]
    fn test_push_after_unlink_goes_to_back() {
        let mut arena = Arena::with_capacity(10);
        let mut level = PriceLevel::new();
        let handles = setup(&mut arena, &mut level, 2);

        level.unlink(&mut arena, handles[1]);
        let h = arena
            .insert(OrderNode::from_order(&Order::buy(9, 10_000, 5), 9))
            .unwrap();
        level.push_back(&mut arena, h);

        assert_eq!(ids(&level, &arena), vec![0, 9]);
        assert_eq!(level.total_qty(), 105);
    }

    #[test]
    fn test_subtract_qty() {
        let mut arena = Arena::with_capacity(10);
        let mut level = PriceLevel::new();
        setup(&mut arena, &mut level, 5);

        level.subtract_qty(100);
        assert_eq!(level.total_qty(), 400);
    }
}
