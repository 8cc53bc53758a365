//! Contracts with the hardware the TNC sits between.
//!
//! The engine does not program the transceiver or the host UART; it only needs
//! a non-blocking way to move bytes through them. Both traits follow the `nb`
//! convention: `Err(nb::Error::WouldBlock)` means "nothing right now".
//!
//! Signal quality helpers are provided for CC1101-style status bytes and are
//! used for logging only.

use heapless::Vec;

use crate::consts::LINK_MAX_FRAME_LEN;

/// A packet handed up by the transceiver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RadioPacket {
    /// Packet bytes, without length or status bytes.
    pub data: Vec<u8, LINK_MAX_FRAME_LEN>,
    /// Whether the transceiver's CRC check passed.
    pub crc_ok: bool,
    /// Raw RSSI status byte.
    pub rssi: u8,
    /// Raw LQI status byte (CRC flag stripped).
    pub lqi: u8,
}

impl RadioPacket {
    /// A CRC-valid packet with neutral status bytes.
    pub fn new(data: &[u8]) -> Option<Self> {
        Some(Self {
            data: Vec::from_slice(data).ok()?,
            crc_ok: true,
            rssi: 0,
            lqi: 0,
        })
    }
}

/// A packet transceiver.
pub trait Radio {
    /// Transceiver error.
    type Error: core::fmt::Debug;

    /// Queues `payload` for transmission.
    fn send(&mut self, payload: &[u8]) -> Result<(), Self::Error>;

    /// Takes the packet the transceiver received, if any.
    fn receive(&mut self) -> nb::Result<RadioPacket, Self::Error>;
}

/// A byte-oriented host link (UART, I2C slave, USB CDC...).
pub trait HostPort {
    /// Transport error.
    type Error: core::fmt::Debug;

    /// Reads one byte.
    fn read(&mut self) -> nb::Result<u8, Self::Error>;

    /// Writes one byte.
    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error>;
}

/// RSSI in dBm from the raw status byte.
///
/// `offset` depends on data rate and band; 74 fits 38.4 kbps at 433 MHz.
pub fn rssi_dbm(raw: u8, offset: i16) -> i16 {
    let value = i16::from(raw as i8);
    value / 2 - offset
}

/// Link quality indicator; higher is better.
pub fn lqi(raw: u8) -> u8 {
    0x3F_u8.saturating_sub(raw & 0x7F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rssi_positive_and_negative() {
        assert_eq!(rssi_dbm(0x20, 74), 16 - 74);
        assert_eq!(rssi_dbm(0xE0, 74), -16 - 74);
    }

    #[test]
    fn test_lqi_inverts_raw() {
        assert_eq!(lqi(0x00), 0x3F);
        assert_eq!(lqi(0x3F), 0);
        assert_eq!(lqi(0x80 | 0x10), 0x2F);
    }

    #[test]
    fn test_packet_too_long() {
        assert!(RadioPacket::new(&[0u8; LINK_MAX_FRAME_LEN + 1]).is_none());
        assert!(RadioPacket::new(&[0xFF, 0x03]).unwrap().crc_ok);
    }
}
