//! Order Index - order ID to book location.
//!
//! The index owns nothing but coordinates: the order itself lives in the
//! arena, and the location records which side and price level hold it.

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

use crate::arena::OrderHandle;
use crate::command::Side;

/// Where a live order sits in the book
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderLocation {
    /// Slot in the arena
    pub handle: OrderHandle,
    /// Book side (selects the ladder)
    pub side: Side,
    /// Price (selects the level)
    pub price: u64,
}

/// Hash index from order ID to location.
///
/// An ID is present if and only if the order is live in the book.
#[derive(Debug, Default)]
pub struct OrderIndex {
    entries: FxHashMap<u64, OrderLocation>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(orders: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(orders, Default::default()),
        }
    }

    /// Register a location.
    ///
    /// Returns `false` and leaves the existing entry untouched if `order_id`
    /// is already present.
    #[inline]
    pub fn insert(&mut self, order_id: u64, location: OrderLocation) -> bool {
        match self.entries.entry(order_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(location);
                true
            }
        }
    }

    #[inline]
    pub fn get(&self, order_id: u64) -> Option<&OrderLocation> {
        self.entries.get(&order_id)
    }

    #[inline]
    pub fn remove(&mut self, order_id: u64) -> Option<OrderLocation> {
        self.entries.remove(&order_id)
    }

    #[inline]
    pub fn contains(&self, order_id: u64) -> bool {
        self.entries.contains_key(&order_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All (ID, location) pairs in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &OrderLocation)> + '_ {
        self.entries.iter().map(|(&id, loc)| (id, loc))
    }
}
