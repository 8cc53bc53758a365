//! Fixed-capacity flow-control FIFOs.
//!
//! Two byte FIFOs sit between the host transport and the engine, one per
//! direction. Neither ever blocks: a push into a full FIFO drops the item and
//! bumps an overrun counter, and a pop from an empty FIFO returns `None`.
//!
//! The same type, with `T = u8` sequence numbers, backs the ARQ ack queue.

use heapless::Deque;

use crate::error::FifoError;

/// Bounded FIFO with overrun accounting.
#[derive(Debug)]
pub struct Fifo<T, const N: usize> {
    items: Deque<T, N>,
    overruns: u32,
}

/// Byte FIFO used for host traffic.
pub type ByteFifo<const N: usize> = Fifo<u8, N>;

impl<T, const N: usize> Default for Fifo<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Fifo<T, N> {
    /// Creates an empty FIFO.
    pub const fn new() -> Self {
        Self {
            items: Deque::new(),
            overruns: 0,
        }
    }

    /// Appends `item`, or drops it and counts an overrun when full.
    pub fn push(&mut self, item: T) -> Result<(), FifoError> {
        match self.items.push_back(item) {
            Ok(()) => Ok(()),
            Err(_) => {
                self.overruns = self.overruns.saturating_add(1);
                Err(FifoError::Overrun)
            }
        }
    }

    /// Removes the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// The oldest item, without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the next push would overrun.
    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    /// Room left before the FIFO overruns.
    pub fn free(&self) -> usize {
        N - self.items.len()
    }

    /// Fixed capacity.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Items dropped because the FIFO was full.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Counts `count` items dropped without being offered to the FIFO.
    pub fn record_overruns(&mut self, count: u32) {
        self.overruns = self.overruns.saturating_add(count);
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Drops every queued item. The overrun counter is kept.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: PartialEq, const N: usize> Fifo<T, N> {
    /// Whether `item` is queued.
    pub fn contains(&self, item: &T) -> bool {
        self.items.iter().any(|queued| queued == item)
    }
}
