//! Positional packet loss inside each transfer window.

use std::sync::Arc;

use tracing::debug;

use faultline_chunk::ChunkClassifier;

use crate::event::{Event, EventType};
use crate::filter::{EventHandler, Filter, FilterError, Packet, PacketSink};

/// Drops the data chunk at a fixed position within every transfer window.
///
/// The window-position counter resets whenever the receiver moves the window
/// (`ParametersContinue` or `ParametersRetransmit`). After a retransmit, the
/// sender typically still has one copy of the boundary chunk in flight; the
/// first data chunk whose offset matches the retransmit offset is forwarded
/// without counting, so the duplicate doesn't shift the positions of the
/// fresh window.
pub struct WindowPacketDropper {
    name: String,
    sink: PacketSink,
    classifier: Arc<dyn ChunkClassifier>,
    /// 0-based position to drop in each window.
    drop_position: u64,
    position: u64,
    /// Offset of the most recent retransmit request, armed until its
    /// duplicate passes through.
    boundary_offset: Option<u64>,
}

impl WindowPacketDropper {
    pub fn new(
        sink: PacketSink,
        name: impl Into<String>,
        drop_position: u64,
        classifier: Arc<dyn ChunkClassifier>,
    ) -> Self {
        Self {
            name: name.into(),
            sink,
            classifier,
            drop_position,
            position: 0,
            boundary_offset: None,
        }
    }
}

impl EventHandler for WindowPacketDropper {
    fn handle_event(&mut self, event: &Event) {
        match event.event_type {
            EventType::ParametersContinue => {
                self.position = 0;
            }
            EventType::ParametersRetransmit => {
                self.position = 0;
                self.boundary_offset = event.chunk.offset;
            }
            EventType::TransferStart => {}
        }
    }
}

impl Filter for WindowPacketDropper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&mut self, packet: Packet) -> Result<(), FilterError> {
        let chunk = match self.classifier.classify(&packet) {
            Some(chunk) if chunk.is_data() => chunk,
            // Only data chunks occupy window positions.
            _ => return self.sink.send(packet).await,
        };

        if self.boundary_offset.is_some() && chunk.offset == self.boundary_offset {
            self.boundary_offset = None;
            return self.sink.send(packet).await;
        }

        let position = self.position;
        self.position += 1;
        if position == self.drop_position {
            debug!(
                "{}: dropping chunk at window position {} (offset {:?})",
                self.name, position, chunk.offset
            );
            Ok(())
        } else {
            self.sink.send(packet).await
        }
    }
}
