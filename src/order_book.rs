//! Order Book - the two-sided price ladder.
//!
//! Each side is an ordered map from price to [`PriceLevel`]. The bid side is
//! read from its highest key, the ask side from its lowest. A level exists in
//! the map only while it holds at least one order.

use std::collections::BTreeMap;

use crate::arena::{Arena, OrderHandle};
use crate::command::Side;
use crate::order_index::{OrderIndex, OrderLocation};
use crate::price_level::PriceLevel;

/// Price ladder for both sides plus the ID index.
pub struct OrderBook {
    /// Bid price levels (buy orders)
    bids: BTreeMap<u64, PriceLevel>,
    /// Ask price levels (sell orders)
    asks: BTreeMap<u64, PriceLevel>,
    /// Order lookup: ID -> location
    index: OrderIndex,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: OrderIndex::new(),
        }
    }

    /// Create a book whose index is pre-sized for `orders` live orders
    pub fn with_capacity(orders: usize) -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: OrderIndex::with_capacity(orders),
        }
    }

    // ========================================================================
    // Best Price Access
    // ========================================================================

    /// Highest bid price
    #[inline]
    pub fn best_bid(&self) -> Option<u64> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest ask price
    #[inline]
    pub fn best_ask(&self) -> Option<u64> {
        self.asks.keys().next().copied()
    }

    /// Best bid and best ask when the book is crossed (bid >= ask)
    #[inline]
    pub fn crossed_prices(&self) -> Option<(u64, u64)> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if bid >= ask => Some((bid, ask)),
            _ => None,
        }
    }

    // ========================================================================
    // Level Access
    // ========================================================================

    #[inline]
    fn side_map(&self, side: Side) -> &BTreeMap<u64, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    #[inline]
    fn side_map_mut(&mut self, side: Side) -> &mut BTreeMap<u64, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    #[inline]
    pub fn level(&self, side: Side, price: u64) -> Option<&PriceLevel> {
        self.side_map(side).get(&price)
    }

    #[inline]
    pub fn level_mut(&mut self, side: Side, price: u64) -> Option<&mut PriceLevel> {
        self.side_map_mut(side).get_mut(&price)
    }

    /// Levels of one side, best price first
    pub fn levels(&self, side: Side) -> Box<dyn Iterator<Item = (u64, &PriceLevel)> + '_> {
        match side {
            Side::Buy => Box::new(self.bids.iter().rev().map(|(&p, l)| (p, l))),
            Side::Sell => Box::new(self.asks.iter().map(|(&p, l)| (p, l))),
        }
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Queue the arena node at `handle` at the back of its price level.
    ///
    /// Side, price and ID are read from the node. Returns `false` without
    /// touching the book if the ID is already live.
    pub fn add_order(&mut self, arena: &mut Arena, handle: OrderHandle) -> bool {
        let node = arena.get(handle);
        let (order_id, side, price) = (node.order_id, node.side, node.price);

        if !self.index.insert(order_id, OrderLocation { handle, side, price }) {
            return false;
        }

        self.side_map_mut(side)
            .entry(price)
            .or_default()
            .push_back(arena, handle);

        true
    }

    /// Unlink an order from its level and drop it from the index.
    ///
    /// Removes the level if it is now empty. The arena node stays allocated;
    /// the caller releases it. Returns `None` for unknown IDs.
    pub fn remove_order(&mut self, arena: &mut Arena, order_id: u64) -> Option<OrderLocation> {
        let location = self.index.remove(order_id)?;

        let levels = self.side_map_mut(location.side);
        if let Some(level) = levels.get_mut(&location.price) {
            if level.unlink(arena, location.handle) {
                levels.remove(&location.price);
            }
        }

        Some(location)
    }

    #[inline]
    pub fn get_order(&self, order_id: u64) -> Option<&OrderLocation> {
        self.index.get(order_id)
    }

    #[inline]
    pub fn contains_order(&self, order_id: u64) -> bool {
        self.index.contains(order_id)
    }

    pub fn index(&self) -> &OrderIndex {
        &self.index
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    /// Number of live orders
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Calculate spread (best_ask - best_bid)
    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if ask > bid => Some(ask - bid),
            _ => None,
        }
    }

    /// (total quantity, order count) resting at a price
    pub fn depth_at(&self, side: Side, price: u64) -> (u64, u32) {
        self.level(side, price)
            .map(|l| (l.total_qty(), l.len()))
            .unwrap_or((0, 0))
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("order_count", &self.index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::OrderNode;
    use crate::command::Order;

    fn rest(book: &mut OrderBook, arena: &mut Arena, order: Order) -> OrderHandle {
        let handle = arena.insert(OrderNode::from_order(&order, order.id)).unwrap();
        assert!(book.add_order(arena, handle));
        handle
    }

    #[test]
    fn test_empty_book() {
        let book = OrderBook::new();
        assert!(book.is_empty());
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.spread(), None);
        assert_eq!(book.crossed_prices(), None);
    }

    #[test]
    fn test_best_prices() {
        let mut arena = Arena::with_capacity(16);
        let mut book = OrderBook::new();

        rest(&mut book, &mut arena, Order::buy(1, 10_000, 100));
        rest(&mut book, &mut arena, Order::buy(2, 10_050, 100));
        rest(&mut book, &mut arena, Order::buy(3, 9_950, 100));
        assert_eq!(book.best_bid(), Some(10_050));

        rest(&mut book, &mut arena, Order::sell(4, 10_100, 100));
        rest(&mut book, &mut arena, Order::sell(5, 10_080, 100));
        assert_eq!(book.best_ask(), Some(10_080));

        assert_eq!(book.spread(), Some(30));
    }

    #[test]
    fn test_crossed_prices() {
        let mut arena = Arena::with_capacity(4);
        let mut book = OrderBook::new();

        rest(&mut book, &mut arena, Order::buy(1, 100, 1));
        rest(&mut book, &mut arena, Order::sell(2, 101, 1));
        assert_eq!(book.crossed_prices(), None);

        rest(&mut book, &mut arena, Order::sell(3, 100, 1));
        assert_eq!(book.crossed_prices(), Some((100, 100)));
    }

    #[test]
    fn test_duplicate_order_id() {
        let mut arena = Arena::with_capacity(4);
        let mut book = OrderBook::new();

        rest(&mut book, &mut arena, Order::buy(1, 10_000, 100));
        let dup = arena
            .insert(OrderNode::from_order(&Order::buy(1, 10_050, 100), 2))
            .unwrap();

        assert!(!book.add_order(&mut arena, dup));
        assert_eq!(book.order_count(), 1);
        assert_eq!(book.bid_levels(), 1);
        assert_eq!(book.best_bid(), Some(10_000));
    }

    #[test]
    fn test_remove_order_drops_empty_level() {
        let mut arena = Arena::with_capacity(4);
        let mut book = OrderBook::new();

        let handle = rest(&mut book, &mut arena, Order::buy(1, 10_000, 100));
        let location = book.remove_order(&mut arena, 1).unwrap();

        assert_eq!(location.handle, handle);
        assert_eq!(location.side, Side::Buy);
        assert_eq!(location.price, 10_000);
        assert!(book.is_empty());
        assert_eq!(book.bid_levels(), 0);
        assert!(book.remove_order(&mut arena, 1).is_none());
    }

    #[test]
    fn test_remove_best_reveals_next_level() {
        let mut arena = Arena::with_capacity(8);
        let mut book = OrderBook::new();

        rest(&mut book, &mut arena, Order::buy(1, 10_050, 100));
        rest(&mut book, &mut arena, Order::buy(2, 10_000, 100));
        rest(&mut book, &mut arena, Order::buy(3, 9_950, 100));

        book.remove_order(&mut arena, 1);
        assert_eq!(book.best_bid(), Some(10_000));
        book.remove_order(&mut arena, 2);
        assert_eq!(book.best_bid(), Some(9_950));
        book.remove_order(&mut arena, 3);
        assert_eq!(book.best_bid(), None);
    }

    #[test]
    fn test_multiple_orders_same_level() {
        let mut arena = Arena::with_capacity(8);
        let mut book = OrderBook::new();

        rest(&mut book, &mut arena, Order::buy(1, 10_000, 100));
        rest(&mut book, &mut arena, Order::buy(2, 10_000, 200));
        rest(&mut book, &mut arena, Order::buy(3, 10_000, 300));

        assert_eq!(book.bid_levels(), 1);
        assert_eq!(book.depth_at(Side::Buy, 10_000), (600, 3));

        book.remove_order(&mut arena, 2);
        assert_eq!(book.depth_at(Side::Buy, 10_000), (400, 2));
        assert_eq!(book.bid_levels(), 1);
    }

    #[test]
    fn test_levels_best_first() {
        let mut arena = Arena::with_capacity(8);
        let mut book = OrderBook::new();

        for (id, price) in [(1, 99), (2, 101), (3, 100)] {
            rest(&mut book, &mut arena, Order::buy(id, price, 1));
            rest(&mut book, &mut arena, Order::sell(id + 10, price + 10, 1));
        }

        let bids: Vec<u64> = book.levels(Side::Buy).map(|(p, _)| p).collect();
        let asks: Vec<u64> = book.levels(Side::Sell).map(|(p, _)| p).collect();
        assert_eq!(bids, vec![101, 100, 99]);
        assert_eq!(asks, vec![109, 110, 111]);
    }

    #[test]
    fn test_index_points_at_holding_level() {
        let mut arena = Arena::with_capacity(8);
        let mut book = OrderBook::new();

        let handle = rest(&mut book, &mut arena, Order::sell(7, 250, 4));
        let location = *book.get_order(7).unwrap();

        let level = book.level(location.side, location.price).unwrap();
        assert!(level.handles(&arena).any(|h| h == handle));
        assert_eq!(location.handle, handle);
    }
}
