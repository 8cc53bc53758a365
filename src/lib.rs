//! # kiss-tnc
//!
//! A portable, no_std core for a packet radio Terminal Node Controller (TNC):
//! it bridges a host speaking KISS (or raw bytes) over a serial-style link to a
//! sub-GHz packet transceiver such as the CC1101, with optional acknowledged
//! delivery on the air.
//!
//! The crate implements:
//! - a byte-at-a-time KISS codec for the host side
//! - HDLC-derived link frames (Information / Supervisory / Unnumbered, modulo-8
//!   sequence numbers) for the air side
//! - a stop-and-wait ARQ engine with exponential backoff and retry exhaustion
//! - fixed-capacity, non-blocking flow-control FIFOs
//! - a cooperative scheduler driven by a receive notification flag set from an
//!   edge interrupt
//!
//! ## Crate features
//! | Feature      | Description |
//! |--------------|-------------|
//! | `std`        | Disables `#![no_std]`, enables `std` in `thiserror` and `critical-section` |
//! | `delay-loop` | Provides `timer::run_tnc_loop` driven by `embedded_hal::delay::DelayNs` |
//! | `defmt-0-3`  | Uses `defmt` logging |
//! | `log`        | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kiss_tnc::notify::RxNotifier;
//! use kiss_tnc::tnc::{Tnc, TncConfig};
//!
//! static RX_NOTIFIER: RxNotifier = RxNotifier::new();
//!
//! #[interrupt]
//! fn EXTI0() {
//!     RX_NOTIFIER.signal(); // and nothing else
//! }
//!
//! let mut tnc = Tnc::new(radio, uart, || millis(), &RX_NOTIFIER, TncConfig::default());
//! loop {
//!     tnc.tick();
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - The transceiver and host port are reached through the [`radio::Radio`]
//!   and [`radio::HostPort`] traits; register setup and RF configuration stay
//!   in the board crate.
//! - Only one outgoing data frame is ever unacknowledged (window size 1).
//! - AX.25 addressing inside payloads is passed through untouched.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

pub use critical_section;
pub use heapless;

#[macro_use]
mod fmt;

pub mod arq;
pub mod consts;
pub mod error;
pub mod fifo;
pub mod frame;
pub mod kiss;
pub mod notify;
pub mod radio;
pub mod timer;
pub mod tnc;
