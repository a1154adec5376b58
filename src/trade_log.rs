//! Trade Log - bounded audit ring of executed trades.
//!
//! Storage is allocated once. When the ring is full a new report overwrites
//! the oldest one; recording a trade never fails and never blocks matching.

use crate::command::TradeReport;

/// Fixed-capacity ring of [`TradeReport`]s, oldest evicted first.
#[derive(Debug, Clone)]
pub struct TradeLog {
    slots: Box<[TradeReport]>,
    /// Index of the oldest report
    head: usize,
    len: usize,
    /// Reports ever pushed
    recorded: u64,
    /// Reports displaced by a newer one
    evicted: u64,
}

const EMPTY_REPORT: TradeReport = TradeReport {
    bid_id: 0,
    ask_id: 0,
    qty: 0,
    price: 0,
};

impl TradeLog {
    /// Create a log holding at most `capacity` reports.
    ///
    /// A zero capacity log records nothing but still counts pushes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![EMPTY_REPORT; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
            recorded: 0,
            evicted: 0,
        }
    }

    /// Append a report, returning the evicted report when the log was full.
    #[inline]
    pub fn push(&mut self, report: TradeReport) -> Option<TradeReport> {
        self.recorded += 1;

        let capacity = self.slots.len();
        if capacity == 0 {
            self.evicted += 1;
            return Some(report);
        }

        if self.len < capacity {
            let tail = (self.head + self.len) % capacity;
            self.slots[tail] = report;
            self.len += 1;
            None
        } else {
            let evicted = std::mem::replace(&mut self.slots[self.head], report);
            self.head = (self.head + 1) % capacity;
            self.evicted += 1;
            Some(evicted)
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Reports ever pushed, including overwritten ones
    #[inline]
    pub fn total_recorded(&self) -> u64 {
        self.recorded
    }

    /// Reports dropped to make room for newer ones. Cleared reports are
    /// not counted.
    #[inline]
    pub fn overwritten(&self) -> u64 {
        self.evicted
    }

    /// Most recent report
    pub fn last(&self) -> Option<&TradeReport> {
        if self.len == 0 {
            return None;
        }
        Some(&self.slots[(self.head + self.len - 1) % self.slots.len()])
    }

    /// Retained reports, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TradeReport> + ExactSizeIterator + '_ {
        let capacity = self.slots.len();
        (0..self.len).map(move |i| &self.slots[(self.head + i) % capacity])
    }

    /// Forget retained reports. The lifetime counters are kept.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}
