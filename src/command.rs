//! Command and report types for the matching engine.
//!
//! Commands flow from the producer thread through the channel.
//! Trade reports are recorded by the engine for later inspection.

use thiserror::Error;

/// Order side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Buy = 0,
    /// Sell side (asks)
    Sell = 1,
}

/// A simple limit order.
///
/// `qty` is the remaining quantity; the engine mutates it in place as the
/// order fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Order {
    /// Caller-assigned order ID, unique among live orders
    pub id: u64,
    /// Order side
    pub side: Side,
    /// Limit price in integer ticks
    pub price: u64,
    /// Remaining quantity
    pub qty: u32,
}

impl Order {
    #[inline]
    pub const fn new(id: u64, side: Side, price: u64, qty: u32) -> Self {
        Self { id, side, price, qty }
    }

    #[inline]
    pub const fn buy(id: u64, price: u64, qty: u32) -> Self {
        Self::new(id, Side::Buy, price, qty)
    }

    #[inline]
    pub const fn sell(id: u64, price: u64, qty: u32) -> Self {
        Self::new(id, Side::Sell, price, qty)
    }
}

// ============================================================================
// Input Commands
// ============================================================================

/// Commands carried from the producer to the engine thread
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Rest a new limit order and cross the book
    AddOrder(Order),
    /// Cancel a live order by ID (unknown IDs are ignored)
    CancelOrder(u64),
}

// ============================================================================
// Output Records
// ============================================================================

/// An executed trade between one bid and one ask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TradeReport {
    /// Buy order ID
    pub bid_id: u64,
    /// Sell order ID
    pub ask_id: u64,
    /// Executed quantity
    pub qty: u32,
    /// Execution price
    pub price: u64,
}

/// Read-only snapshot of book occupancy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BookStats {
    pub bid_levels: usize,
    pub ask_levels: usize,
    pub live_orders: usize,
}

/// Reasons an `AddOrder` is turned away at the boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[repr(u8)]
pub enum RejectReason {
    /// An order with this ID is already live
    #[error("order id already live")]
    DuplicateOrderId = 0,
    /// Quantity must be positive
    #[error("order quantity is zero")]
    ZeroQuantity = 1,
    /// The order arena ran out of addressable slots
    #[error("order storage exhausted")]
    CapacityExhausted = 2,
}

/// What the engine did with a single command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Order accepted; `trades` is how many trades the crossing step produced
    Added { trades: usize },
    /// Order turned away
    Rejected(RejectReason),
    /// Cancel applied to a live order
    Canceled,
    /// Cancel of an unknown or already-removed order
    CancelIgnored,
}
