//! Engine - command dispatch and the consumer event loop.
//!
//! Wraps the matching engine with the channel that feeds it. All book
//! mutation happens on the thread that calls [`Engine::run`].

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::channel::Consumer;
use crate::command::{BookStats, Command, CommandOutcome};
use crate::config::EngineConfig;
use crate::matching::MatchingEngine;
use crate::trade_log::TradeLog;

/// Counters reported when the event loop exits
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Commands popped and applied
    pub commands: u64,
    pub added: u64,
    pub rejected: u64,
    pub canceled: u64,
    pub cancels_ignored: u64,
    /// Trades executed during the run
    pub trades: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Mean wall time per command, in nanoseconds
    pub fn avg_latency_ns(&self) -> Option<u128> {
        (self.commands > 0).then(|| self.elapsed.as_nanos() / self.commands as u128)
    }

    /// Commands per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.commands as f64 / secs
        } else {
            0.0
        }
    }

    fn record(&mut self, outcome: CommandOutcome) {
        self.commands += 1;
        match outcome {
            CommandOutcome::Added { trades } => {
                self.added += 1;
                self.trades += trades as u64;
            }
            CommandOutcome::Rejected(_) => self.rejected += 1,
            CommandOutcome::Canceled => self.canceled += 1,
            CommandOutcome::CancelIgnored => self.cancels_ignored += 1,
        }
    }
}

/// The engine that consumes commands from the channel.
pub struct Engine {
    /// The underlying matching engine
    pub matcher: MatchingEngine,
    pin_to_core: bool,
}

impl Engine {
    /// Create an engine with `capacity` pre-allocated order slots.
    pub fn new(capacity: u32) -> Self {
        Self::with_config(&EngineConfig {
            order_capacity: capacity,
            ..EngineConfig::default()
        })
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            matcher: MatchingEngine::with_config(config),
            pin_to_core: config.pin_to_core,
        }
    }

    /// Run the consumer loop until the channel is closed and empty.
    ///
    /// Never blocks: when no command is queued the thread yields and polls
    /// again. Commands pushed before the producer closed are all applied.
    pub fn run(&mut self, input: &mut Consumer<Command>) -> RunSummary {
        if self.pin_to_core {
            self.pin_to_core();
        }
        self.warm_up();

        info!(capacity = input.capacity(), "engine loop started");

        let mut summary = RunSummary::default();
        let start = Instant::now();

        while !input.is_drained() {
            match input.pop() {
                Some(cmd) => summary.record(self.process_command(cmd)),
                None => std::thread::yield_now(),
            }
        }

        summary.elapsed = start.elapsed();

        info!(
            commands = summary.commands,
            trades = summary.trades,
            elapsed_us = summary.elapsed.as_micros() as u64,
            avg_ns = summary.avg_latency_ns().unwrap_or(0) as u64,
            "engine loop finished"
        );

        summary
    }

    /// Apply a single command.
    ///
    /// This is the entry point for synchronous usage (testing, benchmarks).
    #[inline]
    pub fn process_command(&mut self, cmd: Command) -> CommandOutcome {
        match cmd {
            Command::AddOrder(order) => match self.matcher.add_order(order) {
                Ok(trades) => CommandOutcome::Added { trades },
                Err(reason) => CommandOutcome::Rejected(reason),
            },
            Command::CancelOrder(order_id) => {
                if self.matcher.cancel_order(order_id) {
                    CommandOutcome::Canceled
                } else {
                    CommandOutcome::CancelIgnored
                }
            }
        }
    }

    /// Pin the current thread to the last available CPU core.
    pub fn pin_to_core(&self) {
        let pinned = core_affinity::get_core_ids()
            .and_then(|ids| ids.last().copied())
            .map(core_affinity::set_for_current)
            .unwrap_or(false);

        if !pinned {
            warn!("could not pin engine thread to a core");
        }
    }

    /// Pre-fault arena memory.
    pub fn warm_up(&mut self) {
        self.matcher.warm_up();
    }

    #[inline]
    pub fn best_bid(&self) -> Option<u64> {
        self.matcher.best_bid()
    }

    #[inline]
    pub fn best_ask(&self) -> Option<u64> {
        self.matcher.best_ask()
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.matcher.order_count()
    }

    #[inline]
    pub fn stats(&self) -> BookStats {
        self.matcher.stats()
    }

    #[inline]
    pub fn trades(&self) -> &TradeLog {
        self.matcher.trades()
    }

    #[inline]
    pub fn state_hash(&self) -> u64 {
        self.matcher.state_hash()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_config(&EngineConfig::default())
    }
}
