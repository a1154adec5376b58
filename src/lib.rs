//! # Tandem-LOB
//!
//! An in-memory limit order book with price-time priority, fed by a
//! lock-free single-producer/single-consumer command channel.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: One thread owns the order book exclusively (no locks)
//! - **Stable Handles**: Orders live in an arena; levels and the ID index
//!   refer to them by handle, never by address
//! - **O(1) Cancel**: ID index lookup plus an intrusive doubly linked level
//! - **Non-blocking Handoff**: The channel never blocks either side
//!
//! ## Architecture
//!
//! ```text
//! [Producer Thread] --> [SPSC Channel] --> [Engine Thread]
//!                                                |
//!                                          [Trade Log]
//! ```

pub mod arena;
pub mod channel;
pub mod command;
pub mod config;
pub mod engine;
pub mod matching;
pub mod order_book;
pub mod order_index;
pub mod price_level;
pub mod trade_log;

// Re-exports for convenience
pub use arena::{Arena, OrderHandle, OrderNode, NULL_HANDLE};
pub use channel::{channel, Consumer, Producer};
pub use command::{BookStats, Command, CommandOutcome, Order, RejectReason, Side, TradeReport};
pub use config::{ConfigError, EngineConfig, TradePricing};
pub use engine::{Engine, RunSummary};
pub use matching::MatchingEngine;
pub use order_book::OrderBook;
pub use order_index::{OrderIndex, OrderLocation};
pub use price_level::PriceLevel;
pub use trade_log::TradeLog;
