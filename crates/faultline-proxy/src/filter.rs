//! The filter contract and the downstream send capability.
//!
//! A filter consumes one packet at a time and forwards zero or more packets
//! to its [`PacketSink`] — the next stage of the chain, or the transport
//! write for the last stage. Calls to `send` are the only externally
//! observable behavior of a filter.

use std::future::Future;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::event::Event;

/// An opaque packet traveling through a chain.
pub type Packet = Bytes;

#[derive(Debug, Error)]
pub enum FilterError {
    /// Rejected configuration, reported at construction. Never clamped.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The next stage (or the transport) is gone.
    #[error("downstream stage closed")]
    DownstreamClosed,
}

/// Downstream send capability handed to every filter at construction.
///
/// A thin wrapper over a bounded channel sender, so `send` suspends under
/// backpressure instead of buffering without limit. Clonable: a filter may
/// hand a copy to a helper task (the transposer's flush timer does).
#[derive(Clone)]
pub struct PacketSink {
    tx: mpsc::Sender<Packet>,
}

impl PacketSink {
    pub fn new(tx: mpsc::Sender<Packet>) -> Self {
        Self { tx }
    }

    /// Create a sink plus the receiver that drains it. The harness uses this
    /// for the transport end of a chain; tests use it to collect output.
    pub fn stage(capacity: usize) -> (Self, mpsc::Receiver<Packet>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub async fn send(&self, packet: Packet) -> Result<(), FilterError> {
        self.tx
            .send(packet)
            .await
            .map_err(|_| FilterError::DownstreamClosed)
    }
}

/// The event-receiving side of a filter.
///
/// Implemented by every filter; the default is to ignore events. The
/// dispatcher holds filters through this trait, so `handle_event` must stay
/// a synchronous state update — filters never forward packets from here.
pub trait EventHandler: Send {
    fn handle_event(&mut self, _event: &Event) {}
}

/// A stage in a fault-injection chain.
///
/// `process` may suspend (timer wait, downstream backpressure) and never
/// errors on unrecognized input: packets that don't decode to anything
/// relevant pass through or fall outside the fault's scope. A downstream
/// send failure propagates to the caller.
pub trait Filter: EventHandler + Send + 'static {
    /// Diagnostic label, used only for logging.
    fn name(&self) -> &str;

    fn process(
        &mut self,
        packet: Packet,
    ) -> impl Future<Output = Result<(), FilterError>> + Send;
}
