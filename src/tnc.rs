//! The TNC scheduler.
//!
//! [`Tnc`] is the single context object of the firmware: it owns the radio,
//! the host port, the clock, both flow-control FIFOs, the KISS decoder and the
//! ARQ engine. Nothing is global except the [`RxNotifier`] shared with the
//! edge interrupt.
//!
//! Call [`tick()`](Tnc::tick) from the main loop as often as possible. Each
//! tick samples the clock once and then, in order:
//!
//! 1. pulls available host bytes into the host-to-engine FIFO,
//! 2. if the notifier fired, receives and dispatches one radio packet,
//! 3. moves host bytes into the outgoing payload accumulator,
//! 4. on a transmit-gated tick, sends one frame: a pending Receive-Ready first,
//!    then a retransmission, then a new data frame,
//! 5. drains the engine-to-host FIFO into the host port.
//!
//! ## Example
//!
//! ```rust,ignore
//! static RX_NOTIFIER: RxNotifier = RxNotifier::new();
//!
//! let mut tnc = Tnc::new(cc1101, uart, || millis(), &RX_NOTIFIER, TncConfig::default());
//! loop {
//!     let report = tnc.tick();
//!     if let Some(Delivery::Failed(seq)) = report.delivery {
//!         // tell the operator
//!     }
//! }
//! ```

use heapless::Vec;

use crate::arq::{ArqConfig, ArqEngine, DeliveryMode, Dispatch, Poll};
use crate::consts::{
    DEFAULT_HOST_READ_BUDGET, DEFAULT_TX_INTERVAL_MS, HOST_RX_BUF_LEN, HOST_TX_BUF_LEN,
    KISS_MAX_FRAME_LEN, LINK_MAX_PAYLOAD_LEN,
};
use crate::fifo::ByteFifo;
use crate::frame::{FrameKind, LinkFrame};
use crate::kiss::{Command, KissDecoder, encode_with, encoded_len};
use crate::notify::RxNotifier;
use crate::radio::{HostPort, Radio, lqi, rssi_dbm};
use crate::timer::{Clock, elapsed_ms};

/// RSSI offset used when logging received packets (38.4 kbps, 433 MHz).
const RSSI_OFFSET_DBM: i16 = 74;

/// How bytes on the host port are framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum HostFraming {
    /// Bytes pass through untouched in both directions.
    #[default]
    Raw,
    /// KISS frames in both directions.
    Kiss,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TncConfig {
    /// ARQ tuning.
    pub arq: ArqConfig,
    /// Minimum spacing between two transmissions, in milliseconds.
    pub tx_interval_ms: u32,
    /// Host port framing.
    pub host_framing: HostFraming,
    /// KISS port written on frames sent to the host.
    pub kiss_port: u8,
    /// Maximum host bytes read per tick.
    pub host_read_budget: usize,
}

impl Default for TncConfig {
    fn default() -> Self {
        Self {
            arq: ArqConfig::default(),
            tx_interval_ms: DEFAULT_TX_INTERVAL_MS,
            host_framing: HostFraming::Raw,
            kiss_port: 0,
            host_read_budget: DEFAULT_HOST_READ_BUDGET,
        }
    }
}

/// A frame put on the air during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Transmission {
    /// Receive-Ready carrying this N(R).
    Ack(u8),
    /// New Information frame with this N(S).
    Data(u8),
    /// New Unnumbered-Information frame.
    UnnumberedInfo,
    /// Retransmission of the Information frame with this N(S).
    Retransmit(u8),
}

/// Fate of an outgoing reliable frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Delivery {
    /// The peer acknowledged the frame with this N(S).
    Acked(u8),
    /// The frame with this N(S) ran out of retries; its payload is lost.
    Failed(u8),
}

/// What happened during one [`Tnc::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TickReport {
    /// Class of the radio frame accepted this tick.
    pub received: Option<FrameKind>,
    /// Frame transmitted this tick.
    pub transmitted: Option<Transmission>,
    /// Acknowledgment or failure of the outgoing frame.
    pub delivery: Option<Delivery>,
}

/// Error and overrun counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TncStats {
    /// Host bytes dropped because the host-to-engine FIFO was full.
    pub host_rx_overruns: u32,
    /// Bytes dropped because the engine-to-host FIFO was full.
    pub host_tx_overruns: u32,
    /// Radio packets discarded for a failed CRC or zero length.
    pub bad_packets: u32,
    /// Radio packets that were not valid link frames.
    pub frame_errors: u32,
    /// Transceiver errors.
    pub radio_errors: u32,
    /// Host port errors.
    pub host_errors: u32,
    /// Host KISS frames discarded as malformed.
    pub kiss_errors: u32,
}

/// Packet radio TNC: host port on one side, transceiver on the other.
#[derive(Debug)]
pub struct Tnc<'n, R, H, C> {
    radio: R,
    host: H,
    clock: C,
    notifier: &'n RxNotifier,
    config: TncConfig,
    arq: ArqEngine,
    decoder: KissDecoder,
    host_rx: ByteFifo<HOST_RX_BUF_LEN>,
    host_tx: ByteFifo<HOST_TX_BUF_LEN>,
    pending: Vec<u8, KISS_MAX_FRAME_LEN>,
    pending_pos: usize,
    outgoing: Vec<u8, LINK_MAX_PAYLOAD_LEN>,
    outgoing_sealed: bool,
    last_tx: Option<u32>,
    stats: TncStats,
}

impl<'n, R, H, C> Tnc<'n, R, H, C>
where
    R: Radio,
    H: HostPort,
    C: Clock,
{
    /// Builds a TNC around its collaborators.
    ///
    /// # Arguments
    /// - `radio`: The packet transceiver, already configured for the channel.
    /// - `host`: The byte link to the host computer.
    /// - `clock`: Millisecond time source; may wrap at `u32::MAX`.
    /// - `notifier`: The flag set by the transceiver's receive interrupt.
    /// - `config`: ARQ tuning, transmit pacing and host framing.
    ///
    /// # Returns
    /// An idle TNC with empty buffers. Nothing is sent or read until the first
    /// [`tick()`](Self::tick).
    pub fn new(radio: R, host: H, clock: C, notifier: &'n RxNotifier, config: TncConfig) -> Self {
        Self {
            radio,
            host,
            clock,
            notifier,
            config,
            arq: ArqEngine::new(config.arq),
            decoder: KissDecoder::new(),
            host_rx: ByteFifo::new(),
            host_tx: ByteFifo::new(),
            pending: Vec::new(),
            pending_pos: 0,
            outgoing: Vec::new(),
            outgoing_sealed: false,
            last_tx: None,
            stats: TncStats::default(),
        }
    }

    /// The transceiver, e.g. to read its status between ticks.
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// The transceiver, mutably.
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// The host port.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host port, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The ARQ engine.
    pub fn arq(&self) -> &ArqEngine {
        &self.arq
    }

    /// Active configuration.
    pub fn config(&self) -> &TncConfig {
        &self.config
    }

    /// Switches between reliable and best-effort delivery for new payloads.
    pub fn set_delivery_mode(&mut self, mode: DeliveryMode) {
        self.config.arq.mode = mode;
        self.arq.set_mode(mode);
    }

    /// Bytes waiting in the outgoing payload accumulator.
    pub fn pending_payload(&self) -> &[u8] {
        &self.outgoing
    }

    /// Counters, including FIFO overruns.
    pub fn stats(&self) -> TncStats {
        TncStats {
            host_rx_overruns: self.host_rx.overruns(),
            host_tx_overruns: self.host_tx.overruns(),
            ..self.stats
        }
    }

    /// Runs one scheduler pass.
    ///
    /// Samples the clock once, then moves host input into the engine, handles
    /// at most one received radio packet, and, if at least `tx_interval_ms`
    /// has passed since the previous transmission, sends at most one frame.
    /// Finally it drains buffered output to the host until the port blocks.
    ///
    /// # Returns
    /// A [`TickReport`] naming the frame received, the frame transmitted and
    /// any acknowledgment or retry failure of the outgoing frame. Overruns and
    /// I/O errors are not reported here; see [`stats()`](Self::stats).
    ///
    /// # Example
    /// ```rust,ignore
    /// let report = tnc.tick();
    /// if let Some(Delivery::Failed(seq)) = report.delivery {
    ///     // frame `seq` was dropped after exhausting its retries
    /// }
    /// ```
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        let mut report = TickReport::default();

        self.read_host();
        self.service_radio(&mut report);
        self.fill_outgoing();
        self.service_transmit(now, &mut report);
        self.write_host();

        report
    }

    fn read_host(&mut self) {
        for _ in 0..self.config.host_read_budget {
            match self.host.read() {
                Ok(byte) => {
                    if self.host_rx.push(byte).is_err() {
                        warn!("tnc: host input overrun");
                    }
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    self.stats.host_errors = self.stats.host_errors.wrapping_add(1);
                    warn!("tnc: host read error");
                    break;
                }
            }
        }
    }

    fn service_radio(&mut self, report: &mut TickReport) {
        if !self.notifier.take() {
            return;
        }
        let notifier = self.notifier;
        let radio = &mut self.radio;
        let packet = match notifier.masked(|| radio.receive()) {
            Ok(packet) => packet,
            Err(nb::Error::WouldBlock) => {
                trace!("tnc: notification without packet");
                return;
            }
            Err(nb::Error::Other(_)) => {
                self.stats.radio_errors = self.stats.radio_errors.wrapping_add(1);
                warn!("tnc: radio receive error");
                return;
            }
        };

        if !packet.crc_ok || packet.data.is_empty() {
            self.stats.bad_packets = self.stats.bad_packets.wrapping_add(1);
            debug!(
                "tnc: dropped packet, crc_ok {}, len {}",
                packet.crc_ok,
                packet.data.len()
            );
            return;
        }

        let frame = match LinkFrame::from_wire(&packet.data) {
            Ok(frame) => frame,
            Err(_) => {
                self.stats.frame_errors = self.stats.frame_errors.wrapping_add(1);
                debug!("tnc: packet is not a link frame");
                return;
            }
        };
        debug!(
            "tnc: rx control {}, {} bytes, rssi {} dBm, lqi {}",
            frame.control,
            frame.payload.len(),
            rssi_dbm(packet.rssi, RSSI_OFFSET_DBM),
            lqi(packet.lqi)
        );

        report.received = Some(frame.kind());
        match self.arq.on_frame(&frame) {
            Dispatch::Deliver { payload, .. } => self.deliver(payload),
            Dispatch::Acked(seq) => report.delivery = Some(Delivery::Acked(seq)),
            Dispatch::Rejected(_) | Dispatch::Duplicate(_) | Dispatch::Ignored => {}
        }
    }

    fn deliver(&mut self, payload: &[u8]) {
        match self.config.host_framing {
            HostFraming::Raw => {
                let mut dropped = 0u32;
                for &b in payload {
                    if self.host_tx.push(b).is_err() {
                        dropped += 1;
                    }
                }
                if dropped > 0 {
                    warn!("tnc: host output overrun, {} bytes dropped", dropped);
                }
            }
            HostFraming::Kiss => {
                let len = encoded_len(payload);
                if self.host_tx.free() < len {
                    // A partial KISS frame would desync the host; drop it whole.
                    self.host_tx.record_overruns(len as u32);
                    warn!("tnc: host output overrun, {} byte frame dropped", len);
                    return;
                }
                let port = self.config.kiss_port;
                let host_tx = &mut self.host_tx;
                encode_with(port, Command::Data, payload, |b| {
                    // Room for the whole frame was checked above.
                    let _ = host_tx.push(b);
                });
            }
        }
    }

    fn fill_outgoing(&mut self) {
        while !self.outgoing_sealed && !self.outgoing.is_full() {
            match self.config.host_framing {
                HostFraming::Raw => match self.host_rx.pop() {
                    Some(byte) => {
                        let _ = self.outgoing.push(byte);
                    }
                    None => break,
                },
                HostFraming::Kiss => {
                    if self.pending_pos < self.pending.len() {
                        let _ = self.outgoing.push(self.pending[self.pending_pos]);
                        self.pending_pos += 1;
                        if self.pending_pos == self.pending.len() {
                            // Chunks never span two host frames.
                            self.pending.clear();
                            self.pending_pos = 0;
                            self.outgoing_sealed = true;
                        }
                        continue;
                    }
                    let Some(byte) = self.host_rx.pop() else {
                        break;
                    };
                    match self.decoder.decode_byte(byte) {
                        Ok(Some(frame)) => {
                            trace!("tnc: host frame, {} bytes", frame.payload.len());
                            self.pending = frame.payload;
                            self.pending_pos = 0;
                        }
                        Ok(None) => {}
                        Err(_) => {
                            self.stats.kiss_errors = self.stats.kiss_errors.wrapping_add(1);
                            warn!("tnc: malformed KISS frame dropped");
                        }
                    }
                }
            }
        }
    }

    fn service_transmit(&mut self, now: u32, report: &mut TickReport) {
        if let Some(last) = self.last_tx {
            if elapsed_ms(now, last) < self.config.tx_interval_ms {
                return;
            }
        }

        if let Some(ack) = self.arq.next_ack() {
            self.send_wire(&ack.to_wire(), now);
            report.transmitted = ack.recv_seq().map(Transmission::Ack);
            return;
        }

        match self.arq.poll(now) {
            Poll::Waiting => return,
            Poll::Retransmit(seq) => {
                if let Some(wire) = self.arq.outgoing().map(LinkFrame::to_wire) {
                    self.send_wire(&wire, now);
                    report.transmitted = Some(Transmission::Retransmit(seq));
                }
                return;
            }
            Poll::Failed(seq) => report.delivery = Some(Delivery::Failed(seq)),
            Poll::Ready => {}
        }

        if self.outgoing.is_empty() {
            return;
        }
        let (wire, transmission) = match self.arq.submit(&self.outgoing, now) {
            Ok(frame) => (
                frame.to_wire(),
                match frame.send_seq() {
                    Some(seq) => Transmission::Data(seq),
                    None => Transmission::UnnumberedInfo,
                },
            ),
            Err(_) => {
                warn!("tnc: outgoing payload rejected");
                self.outgoing.clear();
                self.outgoing_sealed = false;
                return;
            }
        };
        self.outgoing.clear();
        self.outgoing_sealed = false;
        self.send_wire(&wire, now);
        report.transmitted = Some(transmission);
    }

    fn send_wire(&mut self, wire: &[u8], now: u32) {
        let notifier = self.notifier;
        let radio = &mut self.radio;
        if notifier.masked(|| radio.send(wire)).is_err() {
            self.stats.radio_errors = self.stats.radio_errors.wrapping_add(1);
            warn!("tnc: radio send error");
        }
        self.last_tx = Some(now);
    }

    fn write_host(&mut self) {
        while let Some(&byte) = self.host_tx.peek() {
            match self.host.write(byte) {
                Ok(()) => {
                    let _ = self.host_tx.pop();
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    self.stats.host_errors = self.stats.host_errors.wrapping_add(1);
                    warn!("tnc: host write error");
                    break;
                }
            }
        }
    }
}
