//! Engine configuration.

use thiserror::Error;

use crate::command::Command;

/// Which order's price a trade prints at
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TradePricing {
    /// Always the ask's price
    #[default]
    AskPrice,
    /// The price of whichever order rested first
    Passive,
}

/// Sizing and behaviour knobs for an engine and its command channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Commands the channel can hold at once
    pub channel_capacity: usize,
    /// Trade reports retained before the oldest are overwritten
    pub trade_log_capacity: usize,
    /// Order slots pre-allocated in the arena and index
    pub order_capacity: u32,
    pub pricing: TradePricing,
    /// Pin the consumer thread to the last CPU core
    pub pin_to_core: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 2048,
            trade_log_capacity: 2048,
            order_capacity: 65_536,
            pricing: TradePricing::AskPrice,
            pin_to_core: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("channel capacity must be at least 1")]
    ZeroChannelCapacity,
    #[error("channel capacity {0} is too large")]
    ChannelCapacityOverflow(usize),
    #[error("trade log capacity must be at least 1")]
    ZeroTradeLogCapacity,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }
        // One slot is kept empty, so the backing store is capacity + 1
        // commands and must fit in isize::MAX bytes.
        let max_slots = isize::MAX as usize / std::mem::size_of::<Command>();
        if self.channel_capacity >= max_slots {
            return Err(ConfigError::ChannelCapacityOverflow(self.channel_capacity));
        }
        if self.trade_log_capacity == 0 {
            return Err(ConfigError::ZeroTradeLogCapacity);
        }
        Ok(())
    }
}
