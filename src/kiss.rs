//! KISS host framing.
//!
//! The host talks to the TNC with KISS: every frame is bracketed by [`FEND`]
//! bytes, starts with a command byte (high nibble = port, low nibble = command)
//! and escapes literal `FEND`/`FESC` bytes inside the payload:
//!
//! | Literal  | On the wire      |
//! |----------|------------------|
//! | `0xC0`   | `0xDB 0xDC`      |
//! | `0xDB`   | `0xDB 0xDD`      |
//!
//! [`KissDecoder`] is a byte-at-a-time state machine suitable for feeding from
//! a FIFO; [`encode`] is its inverse.
//!
//! ## Limitations
//!
//! - Only `DATA` frames carry a payload out of the decoder. Parameter commands
//!   (`TXDELAY`, `P`, ...) are recognised but their argument bytes are skipped.
//! - A frame longer than [`KISS_MAX_FRAME_LEN`] is dropped as a whole.

use heapless::Vec;

use crate::consts::{
    CMD_DATA, CMD_FULLDUPLEX, CMD_P, CMD_RETURN, CMD_SETHARDWARE, CMD_SLOTTIME, CMD_TXDELAY,
    CMD_TXTAIL, FEND, FESC, KISS_MAX_FRAME_LEN, TFEND, TFESC,
};
use crate::error::KissError;

/// A KISS command, taken from the low nibble of the command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Command {
    /// Payload to be transmitted.
    Data,
    /// Keyup delay, in 10 ms units.
    TxDelay,
    /// Persistence parameter.
    Persistence,
    /// Slot interval, in 10 ms units.
    SlotTime,
    /// Time to hold the transmitter after a frame (obsolete).
    TxTail,
    /// Full or half duplex.
    FullDuplex,
    /// Hardware specific.
    SetHardware,
    /// Leave KISS mode (the whole command byte is `0xFF`).
    Return,
}

impl Command {
    /// Parses a full command byte, returning `(port, command)`.
    pub fn parse(byte: u8) -> Result<(u8, Command), KissError> {
        if byte == CMD_RETURN {
            return Ok((0, Command::Return));
        }
        let port = byte >> 4;
        let command = match byte & 0x0F {
            CMD_DATA => Command::Data,
            CMD_TXDELAY => Command::TxDelay,
            CMD_P => Command::Persistence,
            CMD_SLOTTIME => Command::SlotTime,
            CMD_TXTAIL => Command::TxTail,
            CMD_FULLDUPLEX => Command::FullDuplex,
            CMD_SETHARDWARE => Command::SetHardware,
            other => return Err(KissError::UnknownCommand(other)),
        };
        Ok((port, command))
    }

    /// Low-nibble command code.
    pub fn code(self) -> u8 {
        match self {
            Command::Data => CMD_DATA,
            Command::TxDelay => CMD_TXDELAY,
            Command::Persistence => CMD_P,
            Command::SlotTime => CMD_SLOTTIME,
            Command::TxTail => CMD_TXTAIL,
            Command::FullDuplex => CMD_FULLDUPLEX,
            Command::SetHardware => CMD_SETHARDWARE,
            Command::Return => CMD_RETURN,
        }
    }

    /// Builds the command byte for `port`.
    pub fn to_byte(self, port: u8) -> u8 {
        match self {
            Command::Return => CMD_RETURN,
            other => ((port & 0x0F) << 4) | other.code(),
        }
    }
}

/// A complete frame decoded from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFrame {
    /// KISS port (high nibble of the command byte).
    pub port: u8,
    /// Always [`Command::Data`] for frames emitted by [`KissDecoder`].
    pub command: Command,
    /// Unescaped payload.
    pub payload: Vec<u8, KISS_MAX_FRAME_LEN>,
}

/// Per-stream decoder context.
#[derive(Debug, Default)]
pub struct KissDecoder {
    in_frame: bool,
    in_escape: bool,
    command: Option<Command>,
    port: u8,
    buffer: Vec<u8, KISS_MAX_FRAME_LEN>,
}

impl KissDecoder {
    /// Creates a decoder scanning for the first delimiter.
    pub const fn new() -> Self {
        Self {
            in_frame: false,
            in_escape: false,
            command: None,
            port: 0,
            buffer: Vec::new(),
        }
    }

    /// Whether the decoder is inside a frame.
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Number of payload bytes captured so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether no payload bytes have been captured.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn start_frame(&mut self) {
        self.in_frame = true;
        self.in_escape = false;
        self.command = None;
        self.port = 0;
        self.buffer.clear();
    }

    fn abort_frame(&mut self) {
        self.in_frame = false;
        self.in_escape = false;
        self.command = None;
        self.buffer.clear();
    }

    /// Feeds one byte.
    ///
    /// Returns `Ok(Some(frame))` when a DATA frame is closed, `Ok(None)` while
    /// a frame is in progress or the byte was ignored, and `Err` when the
    /// current frame was discarded. After an error the decoder ignores bytes
    /// until the next delimiter.
    pub fn decode_byte(&mut self, byte: u8) -> Result<Option<HostFrame>, KissError> {
        if byte == FEND {
            if self.in_frame && self.command == Some(Command::Data) {
                let frame = HostFrame {
                    port: self.port,
                    command: Command::Data,
                    payload: core::mem::take(&mut self.buffer),
                };
                // The closing delimiter may double as the next opening one.
                self.start_frame();
                return Ok(Some(frame));
            }
            self.start_frame();
            return Ok(None);
        }

        if !self.in_frame {
            return Ok(None);
        }

        let command = match self.command {
            Some(command) => command,
            None => match Command::parse(byte) {
                Ok((port, command)) => {
                    self.port = port;
                    self.command = Some(command);
                    return Ok(None);
                }
                Err(e) => {
                    self.abort_frame();
                    return Err(e);
                }
            },
        };

        if command != Command::Data {
            return Ok(None);
        }

        let literal = if self.in_escape {
            self.in_escape = false;
            match byte {
                TFEND => FEND,
                TFESC => FESC,
                other => {
                    self.abort_frame();
                    return Err(KissError::InvalidEscape(other));
                }
            }
        } else if byte == FESC {
            self.in_escape = true;
            return Ok(None);
        } else {
            byte
        };

        if self.buffer.push(literal).is_err() {
            self.abort_frame();
            return Err(KissError::Overflow);
        }
        Ok(None)
    }
}

/// Number of bytes [`encode`] produces for `payload`.
pub fn encoded_len(payload: &[u8]) -> usize {
    payload
        .iter()
        .map(|&b| if b == FEND || b == FESC { 2 } else { 1 })
        .sum::<usize>()
        + 3
}

/// Appends the KISS encoding of one frame to `out`.
///
/// On [`KissError::BufferFull`] `out` is left unchanged.
pub fn encode<const N: usize>(
    port: u8,
    command: Command,
    payload: &[u8],
    out: &mut Vec<u8, N>,
) -> Result<(), KissError> {
    if out.capacity() - out.len() < encoded_len(payload) {
        return Err(KissError::BufferFull);
    }
    encode_with(port, command, payload, |b| {
        // Capacity was checked above.
        let _ = out.push(b);
    });
    Ok(())
}

/// Streams the KISS encoding of one frame into `sink`, byte by byte.
pub fn encode_with<F: FnMut(u8)>(port: u8, command: Command, payload: &[u8], mut sink: F) {
    sink(FEND);
    sink(command.to_byte(port));
    for &b in payload {
        match b {
            FEND => {
                sink(FESC);
                sink(TFEND);
            }
            FESC => {
                sink(FESC);
                sink(TFESC);
            }
            _ => sink(b),
        }
    }
    sink(FEND);
}
