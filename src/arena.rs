//! Order Arena - slab storage for resting orders.
//!
//! Orders live by value in one contiguous `Vec` and are addressed by a
//! 32-bit handle. Handles stay valid while the order is live no matter how
//! price levels are restructured, so the order index and the price levels
//! never hold addresses into each other. Freed slots are recycled through a
//! free list threaded through the `next` field; when the free list is empty
//! the arena grows.

use std::fmt;

use crate::command::{Order, Side};

/// Sentinel value representing "no node"
pub const NULL_HANDLE: u32 = u32::MAX;

/// Stable index of an order node inside the arena
pub type OrderHandle = u32;

/// A single resting order - exactly 64 bytes (one cache line).
///
/// # Memory Layout
///
/// | Field      | Type    | Offset | Size |
/// |------------|---------|--------|------|
/// | price      | u64     | 0      | 8    |
/// | qty        | u32     | 8      | 4    |
/// | side       | Side    | 12     | 1    |
/// | (padding)  | -       | 13     | 3    |
/// | order_id   | u64     | 16     | 8    |
/// | seq        | u64     | 24     | 8    |
/// | next       | u32     | 32     | 4    |
/// | prev       | u32     | 36     | 4    |
/// | _reserved  | [u8;24] | 40     | 24   |
/// | **Total**  |         |        | 64   |
#[repr(C)]
#[repr(align(64))]
#[derive(Clone, Copy)]
pub struct OrderNode {
    /// Limit price
    pub price: u64,

    /// Remaining quantity
    pub qty: u32,

    pub side: Side,

    /// Caller-assigned order ID
    pub order_id: u64,

    /// Arrival sequence number (lower = rested earlier)
    pub seq: u64,

    /// Next (younger) order at the same price level
    pub next: OrderHandle,

    /// Previous (older) order at the same price level
    pub prev: OrderHandle,

    pub _reserved: [u8; 24],
}

const _: () = assert!(
    std::mem::size_of::<OrderNode>() == 64,
    "OrderNode must be exactly 64 bytes (one cache line)"
);

const _: () = assert!(
    std::mem::align_of::<OrderNode>() == 64,
    "OrderNode must be 64-byte aligned"
);

impl OrderNode {
    /// Build an unlinked node for `order`, stamped with arrival `seq`
    #[inline]
    pub fn from_order(order: &Order, seq: u64) -> Self {
        Self {
            price: order.price,
            qty: order.qty,
            side: order.side,
            order_id: order.id,
            seq,
            next: NULL_HANDLE,
            prev: NULL_HANDLE,
            _reserved: [0u8; 24],
        }
    }

    #[inline]
    pub const fn vacant() -> Self {
        Self {
            price: 0,
            qty: 0,
            side: Side::Buy,
            order_id: 0,
            seq: 0,
            next: NULL_HANDLE,
            prev: NULL_HANDLE,
            _reserved: [0u8; 24],
        }
    }

    /// The order as seen by callers (with its current remaining quantity)
    #[inline]
    pub fn order(&self) -> Order {
        Order::new(self.order_id, self.side, self.price, self.qty)
    }
}

impl fmt::Debug for OrderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderNode")
            .field("order_id", &self.order_id)
            .field("side", &self.side)
            .field("price", &self.price)
            .field("qty", &self.qty)
            .field("seq", &self.seq)
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish()
    }
}

/// Growable pool of order nodes with O(1) insert and release.
pub struct Arena {
    nodes: Vec<OrderNode>,

    /// Head of the free list
    free_head: OrderHandle,

    live: u32,
}

impl Arena {
    /// Create an arena with `capacity` pre-allocated slots.
    ///
    /// The arena grows past `capacity` on demand; pre-allocating only keeps
    /// growth out of the hot path.
    pub fn with_capacity(capacity: u32) -> Self {
        let capacity = capacity.min(NULL_HANDLE - 1);
        let mut nodes = vec![OrderNode::vacant(); capacity as usize];

        for (i, node) in nodes.iter_mut().enumerate() {
            node.next = if i + 1 < capacity as usize {
                (i + 1) as OrderHandle
            } else {
                NULL_HANDLE
            };
        }

        Self {
            nodes,
            free_head: if capacity > 0 { 0 } else { NULL_HANDLE },
            live: 0,
        }
    }

    /// Store `node` and return its handle.
    ///
    /// Returns `None` only once every addressable handle is in use.
    ///
    /// # Complexity
    /// O(1) amortized
    #[inline]
    pub fn insert(&mut self, node: OrderNode) -> Option<OrderHandle> {
        let handle = if self.free_head != NULL_HANDLE {
            let handle = self.free_head;
            self.free_head = self.nodes[handle as usize].next;
            self.nodes[handle as usize] = node;
            handle
        } else {
            let handle = self.nodes.len();
            if handle >= (NULL_HANDLE - 1) as usize {
                return None;
            }
            self.nodes.push(node);
            handle as OrderHandle
        };

        let slot = &mut self.nodes[handle as usize];
        slot.next = NULL_HANDLE;
        slot.prev = NULL_HANDLE;
        self.live += 1;

        Some(handle)
    }

    /// Return a slot to the free list.
    ///
    /// The caller must have unlinked the node from its price level and must
    /// not release the same handle twice.
    #[inline]
    pub fn release(&mut self, handle: OrderHandle) {
        debug_assert!((handle as usize) < self.nodes.len(), "Handle out of bounds");
        debug_assert!(self.live > 0, "Double release detected");

        let slot = &mut self.nodes[handle as usize];
        *slot = OrderNode::vacant();
        slot.next = self.free_head;
        self.free_head = handle;
        self.live -= 1;
    }

    #[inline]
    pub fn get(&self, handle: OrderHandle) -> &OrderNode {
        debug_assert!((handle as usize) < self.nodes.len(), "Handle out of bounds");
        &self.nodes[handle as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, handle: OrderHandle) -> &mut OrderNode {
        debug_assert!((handle as usize) < self.nodes.len(), "Handle out of bounds");
        &mut self.nodes[handle as usize]
    }

    /// Number of live nodes
    #[inline]
    pub fn live(&self) -> u32 {
        self.live
    }

    /// Number of slots currently backed by memory
    #[inline]
    pub fn slots(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Pre-fault all memory pages.
    ///
    /// Touches every node so the OS maps the pages before the hot loop
    /// starts.
    pub fn warm_up(&mut self) {
        for node in &mut self.nodes {
            // SAFETY: `node` is a valid, exclusive reference into the vec.
            unsafe {
                std::ptr::write_volatile(&mut node._reserved[0], 0);
            }
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("slots", &self.nodes.len())
            .field("live", &self.live)
            .field("free_head", &self.free_head)
            .finish()
    }
}
