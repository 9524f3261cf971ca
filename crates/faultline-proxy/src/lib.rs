//! Faultline proxy core: composable fault-injection filters for
//! reliable-transfer protocol testing.
//!
//! A chain of filters sits on the wire between a device and a host and
//! perturbs the packet stream — reordering, dropping, delaying, throttling —
//! while an event filter watches for protocol milestones (transfer start,
//! retransmission request, window continuation) and a dispatcher fans those
//! events out to the other filters so stateful faults stay synchronized with
//! the protocol's own flow control.
//!
//! The transport itself is out of scope: packets arrive as opaque
//! [`bytes::Bytes`], chunk decoding is behind the
//! [`faultline_chunk::ChunkClassifier`] capability, and the last filter of a
//! chain sends into whatever sink the surrounding harness supplies.

pub mod chain;
pub mod dispatcher;
pub mod dropper;
pub mod event;
pub mod event_filter;
pub mod filter;
pub mod keep_drop;
pub mod rate_limiter;
pub mod rng;
pub mod server_failure;
pub mod transposer;
pub mod window_dropper;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export key types for convenience.
pub use chain::Chain;
pub use dispatcher::EventDispatcher;
pub use dropper::DataDropper;
pub use event::{Event, EventReceiver, EventSender, EventType, event_queue};
pub use event_filter::EventFilter;
pub use filter::{EventHandler, Filter, FilterError, Packet, PacketSink};
pub use keep_drop::KeepDropQueue;
pub use rate_limiter::RateLimiter;
pub use rng::{SeededRng, UniformSource};
pub use server_failure::ServerFailure;
pub use transposer::DataTransposer;
pub use window_dropper::WindowPacketDropper;
