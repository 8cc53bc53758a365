//! Error types for every fallible operation in the crate.
//!
//! None of these are fatal: each one leaves the component that raised it in a
//! defined recovery state (frame scan for the KISS decoder, an unchanged
//! buffer for the FIFOs, an untouched slot for the ARQ engine).

use thiserror::Error;

/// Errors raised by the KISS host codec.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum KissError {
    /// A DATA frame grew past the capture buffer; the frame was discarded.
    #[error("KISS frame exceeds capture buffer")]
    Overflow,
    /// An escape byte was followed by something other than `TFEND`/`TFESC`.
    #[error("invalid KISS escape sequence: {0:#04x}")]
    InvalidEscape(u8),
    /// The command nibble is not a known KISS command.
    #[error("unknown KISS command: {0:#04x}")]
    UnknownCommand(u8),
    /// The output buffer cannot hold the encoded frame.
    #[error("output buffer too small for encoded KISS frame")]
    BufferFull,
}

/// Errors raised while building or parsing link frames.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum FrameError {
    /// Fewer than the two header bytes were present.
    #[error("link frame shorter than its header ({0} bytes)")]
    TooShort(usize),
    /// The payload does not fit a single radio packet.
    #[error("link payload of {0} bytes exceeds the frame limit")]
    PayloadTooLong(usize),
}

/// Error returned when pushing into a full FIFO.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum FifoError {
    /// The FIFO was full and the item was dropped.
    #[error("buffer overrun")]
    Overrun,
}

/// Errors raised by the ARQ engine when offered a new payload.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ArqError {
    /// A reliable frame is still waiting for its acknowledgment.
    #[error("outgoing slot is busy")]
    SlotBusy,
    /// Nothing to send.
    #[error("empty payload")]
    EmptyPayload,
    /// The payload could not be framed.
    #[error(transparent)]
    Frame(#[from] FrameError),
}
