//! Bounded SPSC channel - lock-free handoff from one producer thread to one
//! consumer thread.
//!
//! The channel is a circular buffer of `capacity + 1` slots indexed by a head
//! (next slot to read) and a tail (next slot to write). One slot is always
//! left empty so that `head == tail` means empty and `next(tail) == head`
//! means full, with no shared length counter.
//!
//! # Memory ordering
//!
//! The producer writes a slot, then publishes it with a release store to
//! `tail`; the consumer acquires `tail` before reading the slot. The consumer
//! frees a slot with a release store to `head`; the producer acquires `head`
//! before reusing it.
//!
//! # Contract
//!
//! Exactly one thread pushes and exactly one thread pops. [`channel`] hands
//! out one [`Producer`] and one [`Consumer`]; neither is `Clone` and both take
//! `&mut self`, so the compiler enforces the single-producer, single-consumer
//! contract. Neither end ever blocks: a full push hands the value back and an
//! empty pop returns `None`. Callers that want to wait spin or yield.
//!
//! Shutdown is an explicit signal: the producer calls [`Producer::close`]
//! (or is dropped) and the consumer keeps popping until
//! [`Consumer::is_drained`], so nothing pushed before the close is lost.

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam::utils::CachePadded;

struct Shared<T> {
    /// Next slot the consumer reads
    head: CachePadded<AtomicUsize>,
    /// Next slot the producer writes
    tail: CachePadded<AtomicUsize>,
    closed: AtomicBool,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// SAFETY: a slot is only ever accessed by the producer (between its tail
// load and release store) or by the consumer (between its head load and
// release store), never both; values of `T` move across threads.
unsafe impl<T: Send> Sync for Shared<T> {}
unsafe impl<T: Send> Send for Shared<T> {}

impl<T> Shared<T> {
    #[inline]
    fn next(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.slots.len() {
            0
        } else {
            next
        }
    }

    #[inline]
    fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        if tail >= head {
            tail - head
        } else {
            tail + self.slots.len() - head
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len() - 1
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        let mut head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        while head != tail {
            // SAFETY: slots in [head, tail) hold initialized values that were
            // never popped, and both ends are gone.
            unsafe { self.slots[head].get_mut().assume_init_drop() };
            head = self.next(head);
        }
    }
}

/// Create a channel holding up to `capacity` values.
///
/// # Panics
/// Panics if `capacity` is zero or `capacity + 1` overflows `usize`.
pub fn channel<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(capacity > 0, "Channel capacity must be greater than 0");
    let slot_count = capacity
        .checked_add(1)
        .expect("Channel capacity overflows usize");

    let slots = (0..slot_count)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let shared = Arc::new(Shared {
        head: CachePadded::new(AtomicUsize::new(0)),
        tail: CachePadded::new(AtomicUsize::new(0)),
        closed: AtomicBool::new(false),
        slots,
    });

    (
        Producer {
            shared: Arc::clone(&shared),
            cached_head: 0,
        },
        Consumer {
            shared,
            cached_tail: 0,
        },
    )
}

/// Writing end of the channel.
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
    /// Last observed head; refreshed only when the buffer looks full
    cached_head: usize,
}

impl<T> Producer<T> {
    /// Enqueue a value without blocking.
    ///
    /// # Returns
    /// `Err(value)` if the channel is full; nothing is modified in that case.
    #[inline]
    pub fn push(&mut self, value: T) -> Result<(), T> {
        let shared = &*self.shared;
        let tail = shared.tail.load(Ordering::Relaxed);
        let next = shared.next(tail);

        if next == self.cached_head {
            self.cached_head = shared.head.load(Ordering::Acquire);
            if next == self.cached_head {
                return Err(value);
            }
        }

        // SAFETY: `tail` is not in [head, tail), so the consumer cannot be
        // reading it, and only this producer writes slots.
        unsafe { (*shared.slots[tail].get()).write(value) };
        shared.tail.store(next, Ordering::Release);

        Ok(())
    }

    /// Push, yielding the thread between attempts until a slot frees up.
    ///
    /// Only returns once the consumer has made room; never use it when the
    /// consumer may have stopped popping.
    pub fn push_spin(&mut self, mut value: T) {
        while let Err(back) = self.push(value) {
            value = back;
            std::thread::yield_now();
        }
    }

    /// Signal that nothing more will be pushed.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.shared.len() == self.shared.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.len() == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Reading end of the channel.
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
    /// Last observed tail; refreshed only when the buffer looks empty
    cached_tail: usize,
}

impl<T> Consumer<T> {
    /// Dequeue the oldest value without blocking.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let shared = &*self.shared;
        let head = shared.head.load(Ordering::Relaxed);

        if head == self.cached_tail {
            self.cached_tail = shared.tail.load(Ordering::Acquire);
            if head == self.cached_tail {
                return None;
            }
        }

        // SAFETY: `head` is in [head, tail), so the producer published an
        // initialized value there and will not touch it until head advances.
        let value = unsafe { (*shared.slots[head].get()).assume_init_read() };
        shared.head.store(shared.next(head), Ordering::Release);

        Some(value)
    }

    /// Snapshot check; may be stale by the time the caller acts on it.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shared.len() == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Whether the producer has closed (or dropped) its end
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Closed and nothing left to pop.
    ///
    /// Checks the close flag before emptiness: every push made before the
    /// close is visible once the flag is observed.
    #[inline]
    pub fn is_drained(&self) -> bool {
        self.is_closed() && self.is_empty()
    }
}

impl<T> Iterator for Consumer<T> {
    type Item = T;

    /// Non-blocking: yields whatever is currently queued, then `None`.
    fn next(&mut self) -> Option<T> {
        self.pop()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("closed", &self.is_closed())
            .finish()
    }
}
