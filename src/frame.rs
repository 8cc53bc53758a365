//! HDLC-derived link frames.
//!
//! Every radio packet is a [`LinkFrame`]: `[address, control, payload...]`.
//! The control byte is bit-packed:
//!
//! ```text
//!            7   6   5   4   3   2   1   0
//! I-frame  | N(R)      | P | N(S)      | 0 |
//! S-frame  | N(R)      |P/F| kind  | 0 | 1 |
//! U-frame  | M   M   M |P/F| M   M | 1 | 1 |
//! ```
//!
//! [`Control`] is the tagged form of that byte; [`Control::from_byte`] and
//! [`Control::to_byte`] convert losslessly. Sequence numbers are modulo 8.

use heapless::Vec;

use crate::consts::{
    BROADCAST_ADDRESS, CTRL_POLL_FINAL, CTRL_RECV_SEQ_SHIFT, CTRL_S_KIND_SHIFT,
    CTRL_SEND_SEQ_SHIFT, CTRL_TYPE_MASK, CTRL_TYPE_S, CTRL_TYPE_U, CTRL_U_MODIFIER_MASK,
    LINK_HEADER_LEN, LINK_MAX_FRAME_LEN, LINK_MAX_PAYLOAD_LEN, S_KIND_REJ, S_KIND_RR,
    SEQ_MODULUS,
};
use crate::error::FrameError;

/// Frame class, from the two low-order control bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum FrameKind {
    /// Sequenced data.
    Information,
    /// Acknowledgment traffic.
    Supervisory,
    /// Unsequenced frames, including Unnumbered-Information.
    Unnumbered,
}

/// Supervisory frame subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SupervisoryKind {
    /// Positive acknowledgment.
    ReceiveReady,
    /// Negative acknowledgment.
    Reject,
    /// Subtype codes 2 and 3, unused by this link.
    Reserved(u8),
}

impl SupervisoryKind {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            S_KIND_RR => SupervisoryKind::ReceiveReady,
            S_KIND_REJ => SupervisoryKind::Reject,
            other => SupervisoryKind::Reserved(other),
        }
    }

    fn bits(self) -> u8 {
        match self {
            SupervisoryKind::ReceiveReady => S_KIND_RR,
            SupervisoryKind::Reject => S_KIND_REJ,
            SupervisoryKind::Reserved(bits) => bits & 0x03,
        }
    }
}

/// Tagged view of a control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Control {
    /// Information frame.
    Information {
        /// N(S).
        send_seq: u8,
        /// N(R), piggybacked acknowledgment.
        recv_seq: u8,
        /// Poll bit.
        poll: bool,
    },
    /// Supervisory frame.
    Supervisory {
        /// RR / REJ.
        kind: SupervisoryKind,
        /// N(R).
        recv_seq: u8,
        /// Poll / Final bit.
        poll_final: bool,
    },
    /// Unnumbered frame.
    Unnumbered {
        /// The five modifier bits, in place (mask `0xEC`).
        modifier: u8,
        /// Poll / Final bit.
        poll_final: bool,
    },
}

impl Control {
    /// Decodes a control byte.
    pub fn from_byte(control: u8) -> Self {
        let poll_final = control & CTRL_POLL_FINAL != 0;
        let recv_seq = (control >> CTRL_RECV_SEQ_SHIFT) & 0x07;
        match classify(control) {
            FrameKind::Information => Control::Information {
                send_seq: (control >> CTRL_SEND_SEQ_SHIFT) & 0x07,
                recv_seq,
                poll: poll_final,
            },
            FrameKind::Supervisory => Control::Supervisory {
                kind: SupervisoryKind::from_bits(control >> CTRL_S_KIND_SHIFT),
                recv_seq,
                poll_final,
            },
            FrameKind::Unnumbered => Control::Unnumbered {
                modifier: control & CTRL_U_MODIFIER_MASK,
                poll_final,
            },
        }
    }

    /// Encodes to the wire byte.
    pub fn to_byte(self) -> u8 {
        let pf = |set: bool| if set { CTRL_POLL_FINAL } else { 0 };
        match self {
            Control::Information {
                send_seq,
                recv_seq,
                poll,
            } => {
                ((recv_seq & 0x07) << CTRL_RECV_SEQ_SHIFT)
                    | pf(poll)
                    | ((send_seq & 0x07) << CTRL_SEND_SEQ_SHIFT)
            }
            Control::Supervisory {
                kind,
                recv_seq,
                poll_final,
            } => {
                ((recv_seq & 0x07) << CTRL_RECV_SEQ_SHIFT)
                    | pf(poll_final)
                    | (kind.bits() << CTRL_S_KIND_SHIFT)
                    | CTRL_TYPE_S
            }
            Control::Unnumbered {
                modifier,
                poll_final,
            } => (modifier & CTRL_U_MODIFIER_MASK) | pf(poll_final) | CTRL_TYPE_U,
        }
    }

    /// Frame class of this control field.
    pub fn kind(self) -> FrameKind {
        match self {
            Control::Information { .. } => FrameKind::Information,
            Control::Supervisory { .. } => FrameKind::Supervisory,
            Control::Unnumbered { .. } => FrameKind::Unnumbered,
        }
    }
}

/// Classifies a control byte by its two low-order bits.
///
/// Bit 0 clear is always Information, since bit 1 belongs to N(S) there.
pub fn classify(control: u8) -> FrameKind {
    match control & CTRL_TYPE_MASK {
        CTRL_TYPE_U => FrameKind::Unnumbered,
        CTRL_TYPE_S => FrameKind::Supervisory,
        _ => FrameKind::Information,
    }
}

/// Advances a sequence number modulo 8.
pub fn next_seq(seq: u8) -> u8 {
    (seq + 1) % SEQ_MODULUS
}

/// Monotonic modulo-8 send-sequence counter.
#[derive(Debug, Default, Clone)]
pub struct SequenceCounter {
    next: u8,
}

impl SequenceCounter {
    /// Starts at sequence 0.
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// The value the next call to [`advance`](Self::advance) returns.
    pub fn peek(&self) -> u8 {
        self.next
    }

    /// Returns the current value and steps the counter.
    pub fn advance(&mut self) -> u8 {
        let seq = self.next;
        self.next = next_seq(seq);
        seq
    }
}

/// A link frame as carried over the air.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFrame {
    /// Destination address; always [`BROADCAST_ADDRESS`] when built locally.
    pub address: u8,
    /// Raw control byte.
    pub control: u8,
    /// Frame payload.
    pub payload: Vec<u8, LINK_MAX_PAYLOAD_LEN>,
}

impl LinkFrame {
    fn with_control(control: Control, payload: &[u8]) -> Result<Self, FrameError> {
        let payload =
            Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLong(payload.len()))?;
        Ok(Self {
            address: BROADCAST_ADDRESS,
            control: control.to_byte(),
            payload,
        })
    }

    /// Receive-Ready acknowledging up to (but excluding) `seq`.
    pub fn new_ack(seq: u8) -> Self {
        Self {
            address: BROADCAST_ADDRESS,
            control: Control::Supervisory {
                kind: SupervisoryKind::ReceiveReady,
                recv_seq: seq % SEQ_MODULUS,
                poll_final: true,
            }
            .to_byte(),
            payload: Vec::new(),
        }
    }

    /// Reject asking for a retransmission of `seq`.
    pub fn new_nack(seq: u8) -> Self {
        Self {
            address: BROADCAST_ADDRESS,
            control: Control::Supervisory {
                kind: SupervisoryKind::Reject,
                recv_seq: seq % SEQ_MODULUS,
                poll_final: true,
            }
            .to_byte(),
            payload: Vec::new(),
        }
    }

    /// Information frame with the Poll bit set, numbered from `counter`.
    ///
    /// The counter only advances when the payload fits.
    pub fn new_data(payload: &[u8], counter: &mut SequenceCounter) -> Result<Self, FrameError> {
        if payload.len() > LINK_MAX_PAYLOAD_LEN {
            return Err(FrameError::PayloadTooLong(payload.len()));
        }
        Self::with_control(
            Control::Information {
                send_seq: counter.advance(),
                recv_seq: 0,
                poll: true,
            },
            payload,
        )
    }

    /// Unnumbered-Information frame; never acknowledged.
    pub fn new_unnumbered_info(payload: &[u8]) -> Result<Self, FrameError> {
        Self::with_control(
            Control::Unnumbered {
                modifier: 0,
                poll_final: false,
            },
            payload,
        )
    }

    /// Frame class.
    pub fn kind(&self) -> FrameKind {
        classify(self.control)
    }

    /// Tagged control field.
    pub fn control(&self) -> Control {
        Control::from_byte(self.control)
    }

    /// N(S) of an Information frame.
    pub fn send_seq(&self) -> Option<u8> {
        match self.control() {
            Control::Information { send_seq, .. } => Some(send_seq),
            _ => None,
        }
    }

    /// N(R) of a Supervisory or Information frame.
    pub fn recv_seq(&self) -> Option<u8> {
        match self.control() {
            Control::Information { recv_seq, .. } | Control::Supervisory { recv_seq, .. } => {
                Some(recv_seq)
            }
            Control::Unnumbered { .. } => None,
        }
    }

    /// Whether this is an Unnumbered-Information frame.
    pub fn is_unnumbered_info(&self) -> bool {
        matches!(self.control(), Control::Unnumbered { modifier: 0, .. })
    }

    /// Serialises to `[address, control, payload...]`.
    pub fn to_wire(&self) -> Vec<u8, LINK_MAX_FRAME_LEN> {
        let mut wire = Vec::new();
        // Payload is bounded by LINK_MAX_PAYLOAD_LEN, so the header always fits.
        let _ = wire.push(self.address);
        let _ = wire.push(self.control);
        let _ = wire.extend_from_slice(&self.payload);
        wire
    }

    /// Parses a radio packet.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < LINK_HEADER_LEN {
            return Err(FrameError::TooShort(bytes.len()));
        }
        let body = &bytes[LINK_HEADER_LEN..];
        let payload =
            Vec::from_slice(body).map_err(|_| FrameError::PayloadTooLong(body.len()))?;
        Ok(Self {
            address: bytes[0],
            control: bytes[1],
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_covers_every_byte() {
        for control in 0..=u8::MAX {
            let expected = match control & 0x03 {
                0x03 => FrameKind::Unnumbered,
                0x01 => FrameKind::Supervisory,
                _ => FrameKind::Information,
            };
            assert_eq!(classify(control), expected);
            assert_eq!(Control::from_byte(control).kind(), expected);
        }
    }

    #[test]
    fn test_control_byte_is_lossless() {
        for control in 0..=u8::MAX {
            assert_eq!(Control::from_byte(control).to_byte(), control);
        }
    }

    #[test]
    fn test_ack_frame_layout() {
        let ack = LinkFrame::new_ack(5);
        assert_eq!(ack.address, BROADCAST_ADDRESS);
        assert_eq!(ack.control, 0b1011_0001);
        assert!(ack.payload.is_empty());
        assert_eq!(
            ack.control(),
            Control::Supervisory {
                kind: SupervisoryKind::ReceiveReady,
                recv_seq: 5,
                poll_final: true,
            }
        );
    }

    #[test]
    fn test_nack_frame_classifies_as_reject() {
        let nack = LinkFrame::new_nack(2);
        assert_eq!(nack.kind(), FrameKind::Supervisory);
        assert_eq!(nack.control & 0x0C, 0x04);
        assert_eq!(nack.recv_seq(), Some(2));
    }

    #[test]
    fn test_data_frames_count_modulo_eight() {
        let mut counter = SequenceCounter::new();
        let mut prev = LinkFrame::new_data(b"x", &mut counter).unwrap().send_seq().unwrap();
        assert_eq!(prev, 0);
        for _ in 0..20 {
            let frame = LinkFrame::new_data(b"x", &mut counter).unwrap();
            assert_eq!(frame.kind(), FrameKind::Information);
            assert_ne!(frame.control & CTRL_POLL_FINAL, 0);
            let seq = frame.send_seq().unwrap();
            assert_eq!(seq, (prev + 1) % 8);
            prev = seq;
        }
    }

    #[test]
    fn test_oversized_data_keeps_counter() {
        let mut counter = SequenceCounter::new();
        let big = [0u8; LINK_MAX_PAYLOAD_LEN + 1];
        assert_eq!(
            LinkFrame::new_data(&big, &mut counter),
            Err(FrameError::PayloadTooLong(LINK_MAX_PAYLOAD_LEN + 1))
        );
        assert_eq!(counter.peek(), 0);
    }

    #[test]
    fn test_unnumbered_info() {
        let ui = LinkFrame::new_unnumbered_info(b"beacon").unwrap();
        assert_eq!(ui.control, 0x03);
        assert!(ui.is_unnumbered_info());
        assert_eq!(ui.send_seq(), None);
        assert_eq!(ui.recv_seq(), None);
    }

    #[test]
    fn test_wire_round_trip() {
        let mut counter = SequenceCounter::new();
        let frame = LinkFrame::new_data(b"AT", &mut counter).unwrap();
        let wire = frame.to_wire();
        assert_eq!(&wire[..], &[0xFF, 0x10, b'A', b'T']);
        assert_eq!(LinkFrame::from_wire(&wire), Ok(frame));
    }

    #[test]
    fn test_from_wire_too_short() {
        assert_eq!(LinkFrame::from_wire(&[0xFF]), Err(FrameError::TooShort(1)));
        assert_eq!(LinkFrame::from_wire(&[]), Err(FrameError::TooShort(0)));
    }
}
