//! Watches the stream for protocol milestones and publishes events.

use std::sync::Arc;

use tracing::{debug, warn};

use faultline_chunk::{ChunkClassifier, ChunkType};

use crate::event::{Event, EventSender, EventType};
use crate::filter::{EventHandler, Filter, FilterError, Packet, PacketSink};

/// Classifies every packet and publishes an [`Event`] for transfer starts
/// and window-control chunks, without touching the stream itself: every
/// input packet — decodable or not — is forwarded unchanged and
/// immediately.
pub struct EventFilter {
    name: String,
    sink: PacketSink,
    events: EventSender,
    classifier: Arc<dyn ChunkClassifier>,
}

impl EventFilter {
    pub fn new(
        sink: PacketSink,
        name: impl Into<String>,
        events: EventSender,
        classifier: Arc<dyn ChunkClassifier>,
    ) -> Self {
        Self {
            name: name.into(),
            sink,
            events,
            classifier,
        }
    }
}

impl EventHandler for EventFilter {}

impl Filter for EventFilter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&mut self, packet: Packet) -> Result<(), FilterError> {
        if let Some(chunk) = self.classifier.classify(&packet) {
            let event_type = match chunk.chunk_type {
                ChunkType::Start => Some(EventType::TransferStart),
                ChunkType::ParametersContinue => Some(EventType::ParametersContinue),
                ChunkType::ParametersRetransmit => Some(EventType::ParametersRetransmit),
                _ => None,
            };
            if let Some(event_type) = event_type {
                debug!("{}: observed {:?}", self.name, event_type);
                if self.events.send(Event::new(event_type, chunk)).is_err() {
                    // Dispatcher is gone (shutdown); the stream still flows.
                    warn!("{}: event queue closed, {:?} lost", self.name, event_type);
                }
            }
        }
        self.sink.send(packet).await
    }
}
