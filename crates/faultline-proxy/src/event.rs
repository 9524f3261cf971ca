//! Protocol milestones observed on the wire.
//!
//! Events are published by the [`crate::event_filter::EventFilter`] onto a
//! shared FIFO queue and consumed by the [`crate::dispatcher::EventDispatcher`],
//! which relays them to every filter in the chain. They are the only
//! coordination channel between filters — no filter reads another's state.

use faultline_chunk::ChunkDescriptor;
use tokio::sync::mpsc;

/// The protocol milestones that drive stateful fault behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// A transfer session is being opened.
    TransferStart,
    /// The receiver extended the current window.
    ParametersContinue,
    /// The receiver requested retransmission from an offset.
    ParametersRetransmit,
}

/// One observed milestone, carrying the chunk that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub event_type: EventType,
    pub chunk: ChunkDescriptor,
}

impl Event {
    pub fn new(event_type: EventType, chunk: ChunkDescriptor) -> Self {
        Self { event_type, chunk }
    }
}

/// Publishing end of the event queue. Clonable: both directions of a proxy
/// feed one queue.
pub type EventSender = mpsc::UnboundedSender<Event>;

/// Consuming end, owned by the dispatcher.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Create the shared event queue. Unbounded so publication never blocks the
/// packet path; ordering is publish order.
pub fn event_queue() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
