//! Matching Engine - insertion, cancellation and the crossing step.
//!
//! Every accepted order is first rested at the back of its price level.
//! The crossing step then runs while the best bid is at or above the best
//! ask, filling the oldest order of each best level against each other.
//! Filled orders leave the book immediately and emptied levels are dropped.

use tracing::{debug, trace, warn};

use crate::arena::{Arena, OrderHandle, OrderNode};
use crate::command::{BookStats, Order, RejectReason, Side, TradeReport};
use crate::config::{EngineConfig, TradePricing};
use crate::order_book::OrderBook;
use crate::trade_log::TradeLog;

/// The matching engine core. Single-threaded; owns all book state.
pub struct MatchingEngine {
    /// Storage for resting orders
    pub arena: Arena,
    /// The price ladder and ID index
    pub book: OrderBook,
    trades: TradeLog,
    pricing: TradePricing,
    /// Arrival counter stamped on each accepted order
    next_seq: u64,
}

impl MatchingEngine {
    /// Create an engine with `capacity` pre-allocated order slots and the
    /// default trade log size and pricing rule.
    pub fn new(capacity: u32) -> Self {
        Self::with_config(&EngineConfig {
            order_capacity: capacity,
            ..EngineConfig::default()
        })
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            arena: Arena::with_capacity(config.order_capacity),
            book: OrderBook::with_capacity(config.order_capacity as usize),
            trades: TradeLog::with_capacity(config.trade_log_capacity),
            pricing: config.pricing,
            next_seq: 0,
        }
    }

    /// Rest an order at the back of its level, then cross the book.
    ///
    /// # Returns
    /// The number of trades the crossing step executed, or the reason the
    /// order was turned away. A rejected order leaves the book untouched.
    pub fn add_order(&mut self, order: Order) -> Result<usize, RejectReason> {
        if order.qty == 0 {
            warn!(order_id = order.id, "rejecting zero-quantity order");
            return Err(RejectReason::ZeroQuantity);
        }

        if self.book.contains_order(order.id) {
            warn!(order_id = order.id, "rejecting duplicate order id");
            return Err(RejectReason::DuplicateOrderId);
        }

        let seq = self.next_seq;
        let handle = match self.arena.insert(OrderNode::from_order(&order, seq)) {
            Some(handle) => handle,
            None => {
                warn!(order_id = order.id, "order arena exhausted");
                return Err(RejectReason::CapacityExhausted);
            }
        };
        self.next_seq += 1;

        let added = self.book.add_order(&mut self.arena, handle);
        debug_assert!(added, "ID was checked above");

        debug!(
            order_id = order.id,
            side = ?order.side,
            price = order.price,
            qty = order.qty,
            "order added"
        );

        Ok(self.cross())
    }

    /// Remove a live order.
    ///
    /// Returns `false` (and does nothing) for unknown, filled or already
    /// canceled IDs.
    pub fn cancel_order(&mut self, order_id: u64) -> bool {
        let Some(location) = self.book.remove_order(&mut self.arena, order_id) else {
            trace!(order_id, "cancel ignored: order not live");
            return false;
        };

        let canceled_qty = self.arena.get(location.handle).qty;
        self.arena.release(location.handle);

        debug!(order_id, canceled_qty, price = location.price, "order canceled");
        true
    }

    /// Match the best bid level against the best ask level until the book
    /// is no longer crossed.
    ///
    /// # Returns
    /// Number of trades executed
    fn cross(&mut self) -> usize {
        let mut executed = 0;

        while let Some((bid_price, ask_price)) = self.book.crossed_prices() {
            executed += self.match_levels(bid_price, ask_price);
        }

        executed
    }

    /// Fill head orders of the two given levels until one level empties.
    fn match_levels(&mut self, bid_price: u64, ask_price: u64) -> usize {
        let mut executed = 0;

        loop {
            let bid_head = self.book.level(Side::Buy, bid_price).and_then(|l| l.front());
            let ask_head = self.book.level(Side::Sell, ask_price).and_then(|l| l.front());
            let (Some(bid_handle), Some(ask_handle)) = (bid_head, ask_head) else {
                break;
            };

            let bid = *self.arena.get(bid_handle);
            let ask = *self.arena.get(ask_handle);

            let qty = bid.qty.min(ask.qty);
            let price = self.trade_price(&bid, &ask);

            let report = TradeReport {
                bid_id: bid.order_id,
                ask_id: ask.order_id,
                qty,
                price,
            };
            if let Some(evicted) = self.trades.push(report) {
                if self.trades.overwritten() == 1 {
                    warn!(capacity = self.trades.capacity(), "trade log full, overwriting oldest reports");
                }
                trace!(?evicted, "trade report overwritten");
            }
            debug!(bid_id = bid.order_id, ask_id = ask.order_id, qty, price, "trade");
            executed += 1;

            let bid_done = self.fill(Side::Buy, bid_price, bid_handle, qty);
            let ask_done = self.fill(Side::Sell, ask_price, ask_handle, qty);
            if bid_done || ask_done {
                break;
            }
        }

        executed
    }

    /// Reduce a resting order by `qty`, removing it once fully filled.
    ///
    /// Returns `true` if the order's level no longer exists.
    fn fill(&mut self, side: Side, price: u64, handle: OrderHandle, qty: u32) -> bool {
        let node = self.arena.get_mut(handle);
        node.qty -= qty;
        let (order_id, remaining) = (node.order_id, node.qty);

        if let Some(level) = self.book.level_mut(side, price) {
            level.subtract_qty(qty);
        }

        if remaining == 0 {
            self.book.remove_order(&mut self.arena, order_id);
            self.arena.release(handle);
        }

        self.book.level(side, price).is_none()
    }

    #[inline]
    fn trade_price(&self, bid: &OrderNode, ask: &OrderNode) -> u64 {
        match self.pricing {
            TradePricing::AskPrice => ask.price,
            TradePricing::Passive if bid.seq < ask.seq => bid.price,
            TradePricing::Passive => ask.price,
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    #[inline]
    pub fn best_bid(&self) -> Option<u64> {
        self.book.best_bid()
    }

    #[inline]
    pub fn best_ask(&self) -> Option<u64> {
        self.book.best_ask()
    }

    #[inline]
    pub fn spread(&self) -> Option<u64> {
        self.book.spread()
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.book.order_count()
    }

    /// Level counts per side and number of live orders
    pub fn stats(&self) -> BookStats {
        BookStats {
            bid_levels: self.book.bid_levels(),
            ask_levels: self.book.ask_levels(),
            live_orders: self.book.order_count(),
        }
    }

    /// A live order with its current remaining quantity
    pub fn order(&self, order_id: u64) -> Option<Order> {
        self.book
            .get_order(order_id)
            .map(|location| self.arena.get(location.handle).order())
    }

    /// Orders resting at one price, oldest first
    pub fn level_orders(&self, side: Side, price: u64) -> Vec<Order> {
        self.book
            .level(side, price)
            .map(|level| {
                level
                    .handles(&self.arena)
                    .map(|h| self.arena.get(h).order())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total remaining quantity and order count at one price
    #[inline]
    pub fn depth_at(&self, side: Side, price: u64) -> (u64, u32) {
        self.book.depth_at(side, price)
    }

    /// Remaining quantity resting on one side
    pub fn resting_qty(&self, side: Side) -> u64 {
        self.book.levels(side).map(|(_, l)| l.total_qty()).sum()
    }

    pub fn trades(&self) -> &TradeLog {
        &self.trades
    }

    /// Pre-fault arena pages
    pub fn warm_up(&mut self) {
        self.arena.warm_up();
    }

    /// Hash of the full book contents and trade count (for determinism testing)
    pub fn state_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        for side in [Side::Buy, Side::Sell] {
            for (price, level) in self.book.levels(side) {
                price.hash(&mut hasher);
                for handle in level.handles(&self.arena) {
                    self.arena.get(handle).order().hash(&mut hasher);
                }
            }
        }

        self.trades.total_recorded().hash(&mut hasher);
        self.arena.live().hash(&mut hasher);

        hasher.finish()
    }
}
