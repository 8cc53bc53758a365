//! Stop-and-wait ARQ engine.
//!
//! [`ArqEngine`] owns the single outgoing frame slot, the send-sequence counter
//! and the queue of sequence numbers still owed a Receive-Ready. It never talks
//! to the radio itself: every method hands back the frame the caller should
//! transmit, which keeps radio access (and its notification bracket) in one
//! place, the scheduler.
//!
//! ## Outgoing slot
//!
//! ```text
//!            submit(reliable)            RR(N(S)+1)
//!   Idle ───────────────────▶ AwaitingAck ─────────▶ Acked
//!    │                          │   ▲  │
//!    │ submit(best effort)      │   └──┘ timeout / REJ, retries left: retransmit
//!    └──────────▶ Acked         └──────▶ Failed      timeout / REJ, no retries left
//! ```
//!
//! Idle, Acked and Failed all accept a new payload.
//!
//! ## Timing
//!
//! A frame becomes retry-due once `now - sent_at > backoff(retries)` where
//! `backoff(n) = base_delay + factor * 2^n` and `retries` counts the
//! retransmissions already made. All arithmetic on timestamps wraps.

use crate::consts::{
    ACK_QUEUE_LEN, DEFAULT_BACKOFF_FACTOR_MS, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_RETRIES,
};
use crate::error::ArqError;
use crate::fifo::Fifo;
use crate::frame::{Control, LinkFrame, SequenceCounter, SupervisoryKind, next_seq};
use crate::timer::has_elapsed;

/// How outgoing payloads are framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DeliveryMode {
    /// Information frames, acknowledged and retried.
    #[default]
    Reliable,
    /// Unnumbered-Information frames, fire and forget.
    BestEffort,
}

/// ARQ tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ArqConfig {
    /// Fixed part of the ack-wait timeout, in milliseconds.
    pub base_delay_ms: u32,
    /// Multiplier of the exponential part, in milliseconds.
    pub backoff_factor_ms: u32,
    /// Retransmissions allowed before the frame is dropped.
    pub max_retries: u8,
    /// Reliable or best-effort delivery for new payloads.
    pub mode: DeliveryMode,
    /// Skip re-delivering an Information frame whose N(S) matches the last
    /// one delivered (the peer missed our RR and retransmitted).
    ///
    /// Off by default: every station shares the broadcast address, so a
    /// restarted peer or a second station reusing that N(S) would otherwise
    /// lose its payload.
    pub drop_duplicates: bool,
}

impl Default for ArqConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            backoff_factor_ms: DEFAULT_BACKOFF_FACTOR_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            mode: DeliveryMode::Reliable,
            drop_duplicates: false,
        }
    }
}

impl ArqConfig {
    /// Ack-wait timeout after `retries` retransmissions.
    pub fn backoff(&self, retries: u8) -> u32 {
        let scale = 1u32.checked_shl(u32::from(retries)).unwrap_or(u32::MAX);
        self.base_delay_ms
            .saturating_add(self.backoff_factor_ms.saturating_mul(scale))
    }
}

/// State of the outgoing slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SlotState {
    /// Nothing sent yet.
    #[default]
    Idle,
    /// A reliable frame is on the air, waiting for its RR.
    AwaitingAck,
    /// The last frame was acknowledged (or needed no acknowledgment).
    Acked,
    /// The last frame ran out of retries.
    Failed,
}

impl SlotState {
    /// Whether a new payload may be submitted.
    pub fn accepts_payload(self) -> bool {
        !matches!(self, SlotState::AwaitingAck)
    }
}

/// The frame occupying the outgoing slot plus its bookkeeping.
#[derive(Debug, Clone)]
pub struct OutgoingSlot {
    frame: Option<LinkFrame>,
    state: SlotState,
    retries: u8,
    sent_at: u32,
    retry_due: bool,
}

impl OutgoingSlot {
    const fn new() -> Self {
        Self {
            frame: None,
            state: SlotState::Idle,
            retries: 0,
            sent_at: 0,
            retry_due: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> SlotState {
        self.state
    }

    /// The frame last placed in the slot.
    pub fn frame(&self) -> Option<&LinkFrame> {
        self.frame.as_ref()
    }

    /// Retransmissions made for the current frame.
    pub fn retries(&self) -> u8 {
        self.retries
    }

    /// Time of the last (re)transmission.
    pub fn sent_at(&self) -> u32 {
        self.sent_at
    }

    fn awaiting_seq(&self) -> Option<u8> {
        match self.state {
            SlotState::AwaitingAck => self.frame.as_ref().and_then(LinkFrame::send_seq),
            _ => None,
        }
    }
}

/// What an incoming frame meant to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch<'a> {
    /// Payload to forward to the host.
    Deliver {
        /// Frame payload.
        payload: &'a [u8],
        /// N(S) for Information frames, `None` for Unnumbered-Information.
        seq: Option<u8>,
    },
    /// A retransmitted Information frame; acknowledged again, not delivered.
    Duplicate(u8),
    /// The outstanding frame with this N(S) was acknowledged.
    Acked(u8),
    /// The peer rejected the outstanding frame; it is now retry-due.
    Rejected(u8),
    /// Nothing to do (stale ack, unsupported frame, ...).
    Ignored,
}

/// Result of [`ArqEngine::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Poll {
    /// The slot accepts a new payload.
    Ready,
    /// Still inside the ack-wait window.
    Waiting,
    /// The outstanding frame must be sent again; see [`ArqEngine::outgoing`].
    Retransmit(u8),
    /// The outstanding frame with this N(S) ran out of retries and was dropped.
    Failed(u8),
}

/// Engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ArqStats {
    /// New frames put in the slot.
    pub frames_sent: u32,
    /// Retransmissions.
    pub retransmissions: u32,
    /// Frames dropped after exhausting retries.
    pub failures: u32,
    /// RR frames received that acknowledged the slot.
    pub acks_received: u32,
    /// REJ frames received that matched the slot.
    pub rejects_received: u32,
    /// RR frames built from the ack queue.
    pub acks_sent: u32,
    /// Payloads handed to the host.
    pub frames_delivered: u32,
    /// Retransmitted Information frames not re-delivered.
    pub duplicates: u32,
    /// Sequence numbers dropped because the ack queue was full.
    pub ack_overruns: u32,
}

/// Stop-and-wait (window 1) ARQ state machine.
#[derive(Debug)]
pub struct ArqEngine {
    config: ArqConfig,
    counter: SequenceCounter,
    slot: OutgoingSlot,
    acks: Fifo<u8, ACK_QUEUE_LEN>,
    last_delivered: Option<u8>,
    stats: ArqStats,
}

impl ArqEngine {
    /// Creates an idle engine.
    pub const fn new(config: ArqConfig) -> Self {
        Self {
            config,
            counter: SequenceCounter::new(),
            slot: OutgoingSlot::new(),
            acks: Fifo::new(),
            last_delivered: None,
            stats: ArqStats {
                frames_sent: 0,
                retransmissions: 0,
                failures: 0,
                acks_received: 0,
                rejects_received: 0,
                acks_sent: 0,
                frames_delivered: 0,
                duplicates: 0,
                ack_overruns: 0,
            },
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ArqConfig {
        &self.config
    }

    /// Changes the delivery mode used for the next payload.
    pub fn set_mode(&mut self, mode: DeliveryMode) {
        self.config.mode = mode;
    }

    /// The outgoing slot.
    pub fn slot(&self) -> &OutgoingSlot {
        &self.slot
    }

    /// The frame currently in the slot.
    pub fn outgoing(&self) -> Option<&LinkFrame> {
        self.slot.frame()
    }

    /// Whether [`submit`](Self::submit) would accept a payload.
    pub fn is_ready(&self) -> bool {
        self.slot.state.accepts_payload()
    }

    /// Engine counters since construction.
    pub fn stats(&self) -> &ArqStats {
        &self.stats
    }

    /// Number of sequence numbers waiting for an RR.
    pub fn pending_acks(&self) -> usize {
        self.acks.len()
    }

    /// Frames a new payload and records it as sent at `now`.
    ///
    /// # Arguments
    /// - `payload`: Bytes to carry, at most `LINK_MAX_PAYLOAD_LEN`.
    /// - `now`: Current time in milliseconds; starts the ack-wait timer.
    ///
    /// # Returns
    /// The frame to put on the air: an Information frame in
    /// [`DeliveryMode::Reliable`] (the slot then awaits its RR), an
    /// Unnumbered-Information frame in [`DeliveryMode::BestEffort`].
    ///
    /// # Errors
    /// - [`ArqError::SlotBusy`] while a reliable frame is still unacknowledged.
    /// - [`ArqError::EmptyPayload`] for an empty `payload`.
    /// - [`ArqError::Frame`] when `payload` does not fit in one link frame.
    ///
    /// # Example
    /// ```rust
    /// use kiss_tnc::arq::{ArqConfig, ArqEngine, SlotState};
    ///
    /// let mut arq = ArqEngine::new(ArqConfig::default());
    /// let frame = arq.submit(b"AT", 0).unwrap();
    /// assert_eq!(frame.send_seq(), Some(0));
    /// assert_eq!(arq.slot().state(), SlotState::AwaitingAck);
    /// ```
    pub fn submit(&mut self, payload: &[u8], now: u32) -> Result<&LinkFrame, ArqError> {
        if !self.is_ready() {
            return Err(ArqError::SlotBusy);
        }
        if payload.is_empty() {
            return Err(ArqError::EmptyPayload);
        }
        let (frame, state) = match self.config.mode {
            DeliveryMode::Reliable => (
                LinkFrame::new_data(payload, &mut self.counter)?,
                SlotState::AwaitingAck,
            ),
            DeliveryMode::BestEffort => {
                (LinkFrame::new_unnumbered_info(payload)?, SlotState::Acked)
            }
        };
        debug!(
            "arq: new frame, {} bytes, control {}",
            payload.len(),
            frame.control
        );
        self.slot.state = state;
        self.slot.retries = 0;
        self.slot.sent_at = now;
        self.slot.retry_due = false;
        self.stats.frames_sent = self.stats.frames_sent.wrapping_add(1);
        Ok(&*self.slot.frame.insert(frame))
    }

    /// Whether the outstanding frame is due for retransmission at `now`.
    pub fn retry_due(&self, now: u32) -> bool {
        self.slot.state == SlotState::AwaitingAck
            && (self.slot.retry_due
                || has_elapsed(now, self.slot.sent_at, self.config.backoff(self.slot.retries)))
    }

    /// Advances the retry timer.
    ///
    /// # Arguments
    /// - `now`: Current time in milliseconds.
    ///
    /// # Returns
    /// - [`Poll::Ready`] when nothing is outstanding.
    /// - [`Poll::Waiting`] inside the ack-wait window.
    /// - [`Poll::Retransmit`] once the window has passed (or a REJ arrived) and
    ///   retries remain. The slot has already been stamped with `now`; the
    ///   caller must send [`outgoing`](Self::outgoing) again.
    /// - [`Poll::Failed`] once retries are exhausted. The frame is gone and the
    ///   slot accepts new payload; this is reported once per frame.
    pub fn poll(&mut self, now: u32) -> Poll {
        let Some(seq) = self.slot.awaiting_seq() else {
            return Poll::Ready;
        };
        if !self.retry_due(now) {
            return Poll::Waiting;
        }
        if self.slot.retries < self.config.max_retries {
            self.slot.retries += 1;
            self.slot.sent_at = now;
            self.slot.retry_due = false;
            self.stats.retransmissions = self.stats.retransmissions.wrapping_add(1);
            debug!("arq: retransmit seq {} (retry {})", seq, self.slot.retries);
            Poll::Retransmit(seq)
        } else {
            self.slot.state = SlotState::Failed;
            self.slot.retry_due = false;
            self.slot.frame = None;
            self.stats.failures = self.stats.failures.wrapping_add(1);
            warn!("arq: seq {} dropped after {} retries", seq, self.slot.retries);
            Poll::Failed(seq)
        }
    }

    /// Classifies an incoming frame and updates the slot and ack queue.
    ///
    /// # Arguments
    /// - `frame`: A frame decoded from a CRC-valid radio packet.
    ///
    /// # Returns
    /// What the frame meant. Information frames always queue an RR for their
    /// N(S) and normally yield [`Dispatch::Deliver`]; Unnumbered-Information
    /// frames are delivered without an RR. A Receive-Ready whose N(R) is one
    /// past the outstanding N(S) yields [`Dispatch::Acked`], a Reject naming the
    /// outstanding N(S) yields [`Dispatch::Rejected`]. Everything else is
    /// [`Dispatch::Ignored`].
    pub fn on_frame<'a>(&mut self, frame: &'a LinkFrame) -> Dispatch<'a> {
        match frame.control() {
            Control::Information { send_seq, .. } => {
                self.queue_ack(send_seq);
                if self.config.drop_duplicates && self.last_delivered == Some(send_seq) {
                    self.stats.duplicates = self.stats.duplicates.wrapping_add(1);
                    debug!("arq: duplicate seq {}", send_seq);
                    return Dispatch::Duplicate(send_seq);
                }
                self.last_delivered = Some(send_seq);
                self.stats.frames_delivered = self.stats.frames_delivered.wrapping_add(1);
                Dispatch::Deliver {
                    payload: &frame.payload,
                    seq: Some(send_seq),
                }
            }
            Control::Supervisory { kind, recv_seq, .. } => {
                let Some(seq) = self.slot.awaiting_seq() else {
                    trace!("arq: supervisory frame with nothing outstanding");
                    return Dispatch::Ignored;
                };
                match kind {
                    SupervisoryKind::ReceiveReady if recv_seq == next_seq(seq) => {
                        self.slot.state = SlotState::Acked;
                        self.slot.retry_due = false;
                        self.stats.acks_received = self.stats.acks_received.wrapping_add(1);
                        debug!("arq: seq {} acked", seq);
                        Dispatch::Acked(seq)
                    }
                    SupervisoryKind::Reject if recv_seq == seq => {
                        self.slot.retry_due = true;
                        self.stats.rejects_received = self.stats.rejects_received.wrapping_add(1);
                        debug!("arq: seq {} rejected", seq);
                        Dispatch::Rejected(seq)
                    }
                    _ => {
                        trace!("arq: stale supervisory frame, N(R) {}", recv_seq);
                        Dispatch::Ignored
                    }
                }
            }
            Control::Unnumbered { modifier: 0, .. } => {
                self.stats.frames_delivered = self.stats.frames_delivered.wrapping_add(1);
                Dispatch::Deliver {
                    payload: &frame.payload,
                    seq: None,
                }
            }
            Control::Unnumbered { modifier, .. } => {
                trace!("arq: unsupported unnumbered frame {}", modifier);
                Dispatch::Ignored
            }
        }
    }

    fn queue_ack(&mut self, seq: u8) {
        if self.acks.contains(&seq) {
            return;
        }
        if self.acks.push(seq).is_err() {
            self.stats.ack_overruns = self.stats.ack_overruns.wrapping_add(1);
            warn!("arq: ack queue full, seq {} not acknowledged", seq);
        }
    }

    /// Pops the oldest owed acknowledgment as a Receive-Ready frame.
    pub fn next_ack(&mut self) -> Option<LinkFrame> {
        let seq = self.acks.pop()?;
        self.stats.acks_sent = self.stats.acks_sent.wrapping_add(1);
        trace!("arq: RR for seq {}", seq);
        Some(LinkFrame::new_ack(next_seq(seq)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameKind;
    use heapless::Vec;

    fn engine() -> ArqEngine {
        ArqEngine::new(ArqConfig::default())
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let config = ArqConfig::default();
        assert_eq!(config.backoff(0), 1_100);
        assert_eq!(config.backoff(1), 1_200);
        assert_eq!(config.backoff(3), 1_800);
        assert_eq!(config.backoff(40), u32::MAX);
    }

    #[test]
    fn test_submit_reliable_waits_for_ack() {
        let mut arq = engine();
        let frame = arq.submit(b"AT", 0).unwrap();
        assert_eq!(frame.kind(), FrameKind::Information);
        assert_eq!(frame.send_seq(), Some(0));
        assert_eq!(arq.slot().state(), SlotState::AwaitingAck);
        assert_eq!(arq.submit(b"more", 1), Err(ArqError::SlotBusy));
    }

    #[test]
    fn test_submit_best_effort_is_acked_immediately() {
        let mut arq = engine();
        arq.set_mode(DeliveryMode::BestEffort);
        let frame = arq.submit(b"beacon", 0).unwrap();
        assert!(frame.is_unnumbered_info());
        assert_eq!(arq.slot().state(), SlotState::Acked);
        assert!(arq.is_ready());
        assert_eq!(arq.poll(100_000), Poll::Ready);
    }

    #[test]
    fn test_submit_empty_payload() {
        let mut arq = engine();
        assert_eq!(arq.submit(&[], 0), Err(ArqError::EmptyPayload));
        assert_eq!(arq.slot().state(), SlotState::Idle);
    }

    #[test]
    fn test_matching_rr_acks() {
        let mut arq = engine();
        let _ = arq.submit(b"AT", 0).unwrap();
        let ack = LinkFrame::new_ack(1);
        assert_eq!(arq.on_frame(&ack), Dispatch::Acked(0));
        assert_eq!(arq.slot().state(), SlotState::Acked);
        assert!(arq.is_ready());
        assert_eq!(arq.submit(b"next", 10).unwrap().send_seq(), Some(1));
    }

    #[test]
    fn test_non_matching_rr_is_ignored() {
        let mut arq = engine();
        let _ = arq.submit(b"AT", 0).unwrap();
        assert_eq!(arq.on_frame(&LinkFrame::new_ack(0)), Dispatch::Ignored);
        assert_eq!(arq.slot().state(), SlotState::AwaitingAck);
    }

    #[test]
    fn test_rr_with_nothing_outstanding() {
        let mut arq = engine();
        assert_eq!(arq.on_frame(&LinkFrame::new_ack(1)), Dispatch::Ignored);
        assert_eq!(arq.pending_acks(), 0);
    }

    #[test]
    fn test_retry_not_due_before_backoff() {
        let mut arq = engine();
        let t0 = 5_000;
        let _ = arq.submit(b"AT", t0).unwrap();
        let backoff = arq.config().backoff(0);
        assert!(!arq.retry_due(t0));
        assert!(!arq.retry_due(t0 + backoff - 1));
        assert!(!arq.retry_due(t0 + backoff));
        assert!(arq.retry_due(t0 + backoff + 1));
        assert_eq!(arq.poll(t0 + backoff), Poll::Waiting);
        assert_eq!(arq.poll(t0 + backoff + 1), Poll::Retransmit(0));
        assert_eq!(arq.slot().retries(), 1);
        assert_eq!(arq.slot().sent_at(), t0 + backoff + 1);
    }

    #[test]
    fn test_timeout_survives_clock_wraparound() {
        let mut arq = engine();
        let t0 = u32::MAX - 100;
        let _ = arq.submit(b"AT", t0).unwrap();
        let backoff = arq.config().backoff(0);
        assert!(!arq.retry_due(t0.wrapping_add(backoff)));
        assert!(arq.retry_due(t0.wrapping_add(backoff + 1)));
    }

    #[test]
    fn test_reject_forces_immediate_retry() {
        let mut arq = engine();
        let _ = arq.submit(b"AT", 0).unwrap();
        assert_eq!(arq.on_frame(&LinkFrame::new_nack(0)), Dispatch::Rejected(0));
        assert!(arq.retry_due(1));
        assert_eq!(arq.poll(1), Poll::Retransmit(0));
        assert_eq!(arq.poll(2), Poll::Waiting);
    }

    #[test]
    fn test_retry_exhaustion_fails_once() {
        let mut arq = engine();
        let mut now = 0;
        let original = arq.submit(b"AT", now).unwrap().clone();
        let mut timeouts = 0;
        let mut retransmits = 0;
        loop {
            now += arq.config().backoff(arq.slot().retries()) + 1;
            timeouts += 1;
            match arq.poll(now) {
                Poll::Retransmit(seq) => {
                    assert_eq!(seq, 0);
                    assert_eq!(arq.outgoing(), Some(&original));
                    retransmits += 1;
                }
                Poll::Failed(seq) => {
                    assert_eq!(seq, 0);
                    break;
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(timeouts, 8);
        assert_eq!(retransmits, 7);
        assert_eq!(arq.slot().state(), SlotState::Failed);
        assert_eq!(arq.stats().failures, 1);
        // Reported once, then the slot is free.
        assert_eq!(arq.poll(now + 1_000_000), Poll::Ready);
        assert_eq!(arq.stats().failures, 1);
        assert_eq!(arq.submit(b"next", now).unwrap().send_seq(), Some(1));
    }

    #[test]
    fn test_information_frame_is_delivered_and_queued() {
        let mut arq = engine();
        let mut peer = SequenceCounter::new();
        for _ in 0..3 {
            let _ = peer.advance();
        }
        let frame = LinkFrame::new_data(b"hello", &mut peer).unwrap();
        assert_eq!(
            arq.on_frame(&frame),
            Dispatch::Deliver {
                payload: b"hello",
                seq: Some(3)
            }
        );
        assert_eq!(arq.pending_acks(), 1);
        let ack = arq.next_ack().unwrap();
        assert_eq!(ack.recv_seq(), Some(4));
        assert_eq!(
            ack.control(),
            Control::Supervisory {
                kind: SupervisoryKind::ReceiveReady,
                recv_seq: 4,
                poll_final: true
            }
        );
        assert!(arq.next_ack().is_none());
    }

    #[test]
    fn test_repeated_seq_is_delivered_by_default() {
        let mut arq = engine();
        let first = LinkFrame::new_data(b"from A", &mut SequenceCounter::new()).unwrap();
        let second = LinkFrame::new_data(b"from B", &mut SequenceCounter::new()).unwrap();
        assert_eq!(
            arq.on_frame(&first),
            Dispatch::Deliver {
                payload: b"from A",
                seq: Some(0)
            }
        );
        assert_eq!(
            arq.on_frame(&second),
            Dispatch::Deliver {
                payload: b"from B",
                seq: Some(0)
            }
        );
        assert_eq!(arq.stats().duplicates, 0);
        assert_eq!(arq.stats().frames_delivered, 2);
    }

    #[test]
    fn test_duplicate_is_acked_not_delivered() {
        let mut arq = ArqEngine::new(ArqConfig {
            drop_duplicates: true,
            ..ArqConfig::default()
        });
        let mut peer = SequenceCounter::new();
        let frame = LinkFrame::new_data(b"x", &mut peer).unwrap();
        assert!(matches!(arq.on_frame(&frame), Dispatch::Deliver { .. }));
        assert!(arq.next_ack().is_some());
        assert_eq!(arq.on_frame(&frame), Dispatch::Duplicate(0));
        assert_eq!(arq.pending_acks(), 1);
        assert_eq!(arq.stats().duplicates, 1);
    }

    #[test]
    fn test_ack_queue_deduplicates() {
        let mut arq = engine();
        let mut peer = SequenceCounter::new();
        let frame = LinkFrame::new_data(b"x", &mut peer).unwrap();
        assert!(matches!(arq.on_frame(&frame), Dispatch::Deliver { .. }));
        assert!(matches!(arq.on_frame(&frame), Dispatch::Deliver { .. }));
        assert_eq!(arq.pending_acks(), 1);
    }

    #[test]
    fn test_ack_queue_holds_every_sequence_number() {
        let mut arq = engine();
        let mut peer = SequenceCounter::new();
        for seq in 0..8u8 {
            let frame = LinkFrame::new_data(&[seq], &mut peer).unwrap();
            assert_eq!(frame.send_seq(), Some(seq));
            let _ = arq.on_frame(&frame);
        }
        assert_eq!(arq.pending_acks(), 8);
        // A ninth frame can only repeat a waiting N(S), which is folded in.
        let again = LinkFrame::new_data(b"again", &mut SequenceCounter::new()).unwrap();
        let _ = arq.on_frame(&again);
        assert_eq!(arq.pending_acks(), 8);
        assert_eq!(arq.stats().ack_overruns, 0);
        let owed: Vec<u8, 8> = core::iter::from_fn(|| arq.next_ack())
            .filter_map(|ack| ack.recv_seq())
            .collect();
        assert_eq!(&owed[..], &[1, 2, 3, 4, 5, 6, 7, 0]);
    }

    #[test]
    fn test_unnumbered_info_delivered_without_ack() {
        let mut arq = engine();
        let ui = LinkFrame::new_unnumbered_info(b"cq").unwrap();
        assert_eq!(
            arq.on_frame(&ui),
            Dispatch::Deliver {
                payload: b"cq",
                seq: None
            }
        );
        assert_eq!(arq.pending_acks(), 0);
    }

    #[test]
    fn test_supervisory_never_queues_ack() {
        let mut arq = engine();
        let _ = arq.submit(b"AT", 0).unwrap();
        let _ = arq.on_frame(&LinkFrame::new_ack(1));
        let _ = arq.on_frame(&LinkFrame::new_nack(3));
        assert_eq!(arq.pending_acks(), 0);
    }
}
