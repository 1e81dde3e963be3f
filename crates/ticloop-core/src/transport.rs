//! The transport collaborator contract.
//!
//! The scheduler pushes locally produced commands out through
//! [`Transport::send`] and pulls remote batches in through
//! [`Transport::try_recv`] / [`Transport::recv_timeout`]. Deliveries are
//! applied to the ring on the scheduler's own thread, so the ring is never
//! shared with the transport.

use std::time::Duration;

use smallvec::SmallVec;

use crate::command::{RemoteBatch, TicCmd};
use crate::fixed::Fixed;
use crate::id::{ParticipantId, TicIndex};

/// Locally produced commands offered for transmission.
///
/// Covers the tics `start..start + commands.len()`. Besides the tics that
/// have never been sent, the packet may repeat a few already-sent tics
/// so a lost packet can be recovered from the next one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundPacket {
    /// The producing participant.
    pub from: ParticipantId,
    /// Tic index of `commands[0]`.
    pub start: TicIndex,
    /// Consecutive local commands.
    pub commands: SmallVec<[TicCmd; 4]>,
}

impl OutboundPacket {
    /// One past the last tic carried by this packet.
    pub fn end(&self) -> TicIndex {
        TicIndex(self.start.0 + self.commands.len() as u64)
    }
}

/// Something the transport hands to the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Remote commands for the next unreceived tic.
    Batch(RemoteBatch),
    /// The connection dropped. Carries no tic data.
    Disconnected,
    /// New clock-skew offset in 16.16 fixed-point milliseconds.
    ClockOffset(Fixed),
}

/// Ordered, reliable delivery of command batches.
pub trait Transport {
    /// Queue locally produced commands for transmission.
    fn send(&mut self, packet: OutboundPacket);

    /// Take the next delivery if one is ready, without blocking.
    fn try_recv(&mut self) -> Option<Delivery>;

    /// Take the next delivery, waiting at most `timeout` for one.
    fn recv_timeout(&mut self, timeout: Duration) -> Option<Delivery>;

    /// Whether remote peers supply commands for this session.
    ///
    /// When `false`, availability is governed by local production alone.
    fn is_networked(&self) -> bool;
}
