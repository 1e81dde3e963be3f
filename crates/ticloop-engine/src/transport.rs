//! Transport implementations.
//!
//! [`LocalTransport`] is the single-machine case: nothing goes out and
//! nothing comes in. [`ChannelTransport`] connects the scheduler to a
//! network thread over crossbeam channels; the network side holds the
//! matching [`RemoteEndpoint`]. Deliveries are drained by the scheduler
//! on its own thread, so the command ring is never shared.
//!
//! ```text
//!   scheduler thread                      network thread
//!   ────────────────                      ──────────────
//!   ChannelTransport::send ──[outbound]──> RemoteEndpoint::recv_packet
//!   ChannelTransport::recv <──[inbound]─── RemoteEndpoint::deliver
//! ```

use std::error::Error;
use std::fmt;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use log::{debug, warn};
use ticloop_core::{Delivery, Fixed, OutboundPacket, RemoteBatch, Transport};

// ── LocalTransport ─────────────────────────────────────────────────

/// Transport for sessions with no remote peers.
///
/// Waiting sleeps for the requested slice so a blocked frame still lets
/// wall-clock time pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalTransport;

impl Transport for LocalTransport {
    fn send(&mut self, _packet: OutboundPacket) {}

    fn try_recv(&mut self) -> Option<Delivery> {
        None
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Option<Delivery> {
        thread::sleep(timeout);
        None
    }

    fn is_networked(&self) -> bool {
        false
    }
}

// ── ChannelTransport ───────────────────────────────────────────────

/// Create a connected transport / endpoint pair.
///
/// `capacity` bounds each direction. A full outbound queue drops the
/// packet; the next packet repeats the dropped tics when the session's
/// extra-tics hint allows it.
pub fn channel_transport(capacity: usize) -> (ChannelTransport, RemoteEndpoint) {
    let (out_tx, out_rx) = crossbeam_channel::bounded(capacity);
    let (in_tx, in_rx) = crossbeam_channel::bounded(capacity);
    (
        ChannelTransport {
            outbound: out_tx,
            inbound: in_rx,
            hung_up: false,
        },
        RemoteEndpoint {
            outbound: out_rx,
            inbound: in_tx,
        },
    )
}

/// Scheduler-side half of a channel pair.
#[derive(Debug)]
pub struct ChannelTransport {
    outbound: Sender<OutboundPacket>,
    inbound: Receiver<Delivery>,
    hung_up: bool,
}

impl ChannelTransport {
    /// A dropped endpoint is reported once, as a disconnect.
    fn hang_up(&mut self) -> Option<Delivery> {
        if self.hung_up {
            return None;
        }
        self.hung_up = true;
        warn!("remote endpoint dropped");
        Some(Delivery::Disconnected)
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, packet: OutboundPacket) {
        match self.outbound.try_send(packet) {
            Ok(()) => {}
            Err(TrySendError::Full(p)) => {
                debug!("outbound queue full, dropping tics {}..{}", p.start, p.end());
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    fn try_recv(&mut self) -> Option<Delivery> {
        match self.inbound.try_recv() {
            Ok(d) => Some(d),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => self.hang_up(),
        }
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Option<Delivery> {
        if self.hung_up {
            thread::sleep(timeout);
            return None;
        }
        match self.inbound.recv_timeout(timeout) {
            Ok(d) => Some(d),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => self.hang_up(),
        }
    }

    fn is_networked(&self) -> bool {
        true
    }
}

// ── RemoteEndpoint ─────────────────────────────────────────────────

/// The scheduler side of a channel pair has been dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointClosed;

impl fmt::Display for EndpointClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scheduler side of the transport has been dropped")
    }
}

impl Error for EndpointClosed {}

/// Network-side half of a channel pair.
///
/// `Clone` so that a receive loop and a relay can share it.
#[derive(Clone, Debug)]
pub struct RemoteEndpoint {
    outbound: Receiver<OutboundPacket>,
    inbound: Sender<Delivery>,
}

impl RemoteEndpoint {
    fn push(&self, delivery: Delivery) -> Result<(), EndpointClosed> {
        self.inbound.send(delivery).map_err(|_| EndpointClosed)
    }

    /// Deliver remote commands for the next tic. Blocks while the
    /// inbound queue is full.
    pub fn deliver(&self, batch: RemoteBatch) -> Result<(), EndpointClosed> {
        self.push(Delivery::Batch(batch))
    }

    /// Tell the scheduler the connection is gone.
    pub fn disconnect(&self) -> Result<(), EndpointClosed> {
        self.push(Delivery::Disconnected)
    }

    /// Adjust the scheduler's clock-skew offset.
    pub fn adjust_clock(&self, offset: Fixed) -> Result<(), EndpointClosed> {
        self.push(Delivery::ClockOffset(offset))
    }

    /// Next outbound packet, if one is queued.
    pub fn try_recv_packet(&self) -> Option<OutboundPacket> {
        self.outbound.try_recv().ok()
    }

    /// Next outbound packet, waiting at most `timeout`.
    ///
    /// `Err` means the scheduler side is gone and no more packets will
    /// arrive; `Ok(None)` is a plain timeout.
    pub fn recv_packet_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<OutboundPacket>, EndpointClosed> {
        match self.outbound.recv_timeout(timeout) {
            Ok(p) => Ok(Some(p)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EndpointClosed),
        }
    }
}
