//! Receive notification.
//!
//! The transceiver raises an edge when a packet lands in its FIFO. The
//! interrupt handler only calls [`RxNotifier::signal`]; all radio work happens
//! later in [`Tnc::tick`](crate::tnc::Tnc::tick).
//!
//! While the radio is being accessed the notifier is masked, so the edges the
//! transceiver itself produces during a transmission are not mistaken for a
//! received packet.
//!
//! ```rust
//! use kiss_tnc::notify::RxNotifier;
//!
//! static RX_NOTIFIER: RxNotifier = RxNotifier::new();
//!
//! // #[interrupt] fn EXTI0() {
//! RX_NOTIFIER.signal();
//! // }
//!
//! assert!(RX_NOTIFIER.take());
//! assert!(!RX_NOTIFIER.take());
//! ```

use core::cell::Cell;

use critical_section::Mutex;
use embedded_hal::digital::InputPin;

#[derive(Debug, Clone, Copy)]
struct Flags {
    pending: bool,
    masked: bool,
}

/// Single-producer / single-consumer "packet waiting" flag.
#[derive(Debug)]
pub struct RxNotifier {
    flags: Mutex<Cell<Flags>>,
}

impl Default for RxNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RxNotifier {
    /// Unmasked, nothing pending.
    pub const fn new() -> Self {
        Self {
            flags: Mutex::new(Cell::new(Flags {
                pending: false,
                masked: false,
            })),
        }
    }

    /// Called from the edge interrupt. Ignored while masked.
    pub fn signal(&self) {
        critical_section::with(|cs| {
            let cell = self.flags.borrow(cs);
            let mut flags = cell.get();
            if !flags.masked {
                flags.pending = true;
                cell.set(flags);
            }
        });
    }

    /// Clears and returns the pending flag.
    pub fn take(&self) -> bool {
        critical_section::with(|cs| {
            let cell = self.flags.borrow(cs);
            let mut flags = cell.get();
            let pending = flags.pending;
            flags.pending = false;
            cell.set(flags);
            pending
        })
    }

    /// Whether a packet is waiting, without clearing the flag.
    pub fn is_pending(&self) -> bool {
        critical_section::with(|cs| self.flags.borrow(cs).get().pending)
    }

    /// Whether signals are currently ignored.
    pub fn is_masked(&self) -> bool {
        critical_section::with(|cs| self.flags.borrow(cs).get().masked)
    }

    fn set_masked(&self, masked: bool) {
        critical_section::with(|cs| {
            let cell = self.flags.borrow(cs);
            let mut flags = cell.get();
            flags.masked = masked;
            cell.set(flags);
        });
    }

    /// Runs `f` with signals masked, unmasking afterwards.
    ///
    /// `f` itself runs outside any critical section.
    pub fn masked<T>(&self, f: impl FnOnce() -> T) -> T {
        self.set_masked(true);
        let result = f();
        self.set_masked(false);
        result
    }
}

/// Polls a transceiver status line and signals on each falling edge.
///
/// For boards where the line cannot be routed to an interrupt; call
/// [`poll`](Self::poll) often enough not to miss a pulse.
#[derive(Debug)]
pub struct EdgeDetector<P: InputPin> {
    /// The status line (e.g. CC1101 GDO0).
    pub pin: P,
    last_high: bool,
}

impl<P: InputPin> EdgeDetector<P> {
    /// Wraps `pin`, assuming it idles low.
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            last_high: false,
        }
    }

    /// Samples the pin once; returns `true` if a falling edge was signalled.
    pub fn poll(&mut self, notifier: &RxNotifier) -> Result<bool, P::Error> {
        let high = self.pin.is_high()?;
        let falling = self.last_high && !high;
        self.last_high = high;
        if falling {
            notifier.signal();
        }
        Ok(falling)
    }
}
