//! Constants used across the TNC protocol implementation.
//!
//! This module defines the wire-level constants of both links the TNC sits
//! between, plus the buffer capacities and timing defaults of the engine.
//!
//! ## Key Concepts
//!
//! - **KISS bytes**: delimiter, escape and the two transposed escape codes.
//! - **KISS commands**: low nibble of the byte following a frame delimiter.
//! - **Link frames**: `[address, control, payload...]`, bounded by the radio FIFO.
//! - **Control byte**: bit fields shared by Information, Supervisory and
//!   Unnumbered frames.
//! - **Buffer sizing**: fixed capacities, so the engine never allocates.

/// KISS frame end / start delimiter.
pub const FEND: u8 = 0xC0;

/// KISS escape byte.
pub const FESC: u8 = 0xDB;

/// Transposed frame end: `FESC TFEND` stands for a literal [`FEND`].
pub const TFEND: u8 = 0xDC;

/// Transposed frame escape: `FESC TFESC` stands for a literal [`FESC`].
pub const TFESC: u8 = 0xDD;

/// KISS `DATA` command code.
pub const CMD_DATA: u8 = 0x00;
/// KISS `TXDELAY` command code.
pub const CMD_TXDELAY: u8 = 0x01;
/// KISS `P` (persistence) command code.
pub const CMD_P: u8 = 0x02;
/// KISS `SLOTTIME` command code.
pub const CMD_SLOTTIME: u8 = 0x03;
/// KISS `TXTAIL` command code.
pub const CMD_TXTAIL: u8 = 0x04;
/// KISS `FULLDUPLEX` command code.
pub const CMD_FULLDUPLEX: u8 = 0x05;
/// KISS `SETHARDWARE` command code.
pub const CMD_SETHARDWARE: u8 = 0x06;
/// KISS `RETURN` command; the whole byte is `0xFF`, not a port/command pair.
pub const CMD_RETURN: u8 = 0xFF;

/// Largest host frame the KISS decoder will capture (a maximum AX.25 frame).
pub const KISS_MAX_FRAME_LEN: usize = 330;

/// Largest packet (address + control + payload) the radio carries.
pub const LINK_MAX_FRAME_LEN: usize = 64;

/// Length of the link frame header (`address`, `control`).
pub const LINK_HEADER_LEN: usize = 2;

/// Largest payload a single link frame carries.
pub const LINK_MAX_PAYLOAD_LEN: usize = LINK_MAX_FRAME_LEN - LINK_HEADER_LEN;

/// The address every link frame is sent to.
pub const BROADCAST_ADDRESS: u8 = u8::MAX;

/// Sequence numbers wrap modulo this value.
pub const SEQ_MODULUS: u8 = 8;

/// Mask selecting the frame type bits of the control byte.
pub const CTRL_TYPE_MASK: u8 = 0x03;
/// Type bits of an Information frame (only bit 0 is significant).
pub const CTRL_TYPE_I: u8 = 0x00;
/// Type bits of a Supervisory frame.
pub const CTRL_TYPE_S: u8 = 0x01;
/// Type bits of an Unnumbered frame.
pub const CTRL_TYPE_U: u8 = 0x03;
/// Poll / Final bit.
pub const CTRL_POLL_FINAL: u8 = 0x10;
/// Shift of the Supervisory subtype field (bits 2-3).
pub const CTRL_S_KIND_SHIFT: u8 = 2;
/// Shift of the receive-sequence field (bits 5-7).
pub const CTRL_RECV_SEQ_SHIFT: u8 = 5;
/// Shift of the send-sequence field (bits 1-3, Information frames only).
pub const CTRL_SEND_SEQ_SHIFT: u8 = 1;
/// Unnumbered modifier bits (everything but type and poll/final).
pub const CTRL_U_MODIFIER_MASK: u8 = 0xEC;

/// Supervisory subtype: Receive-Ready.
pub const S_KIND_RR: u8 = 0x00;
/// Supervisory subtype: Reject.
pub const S_KIND_REJ: u8 = 0x01;

/// Capacity of the host-to-engine byte FIFO.
pub const HOST_RX_BUF_LEN: usize = 400;

/// Capacity of the engine-to-host byte FIFO.
pub const HOST_TX_BUF_LEN: usize = 100;

/// Capacity of the pending acknowledgment queue.
pub const ACK_QUEUE_LEN: usize = 8;

/// Default fixed part of the ack-wait timeout, in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u32 = 1_000;

/// Default exponential part of the ack-wait timeout, in milliseconds.
pub const DEFAULT_BACKOFF_FACTOR_MS: u32 = 100;

/// Default number of retransmissions before a frame is given up.
pub const DEFAULT_MAX_RETRIES: u8 = 7;

/// Default minimum spacing between two transmissions, in milliseconds.
pub const DEFAULT_TX_INTERVAL_MS: u32 = 20;

/// Default number of host bytes read per tick.
pub const DEFAULT_HOST_READ_BUDGET: usize = 64;
