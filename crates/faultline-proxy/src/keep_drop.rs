//! Deterministic cyclic keep/drop gating.

use std::sync::Arc;

use tracing::debug;

use faultline_chunk::ChunkClassifier;

use crate::filter::{EventHandler, Filter, FilterError, Packet, PacketSink};

/// One element of the keep/drop pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Finite(u64),
    Forever,
}

impl Segment {
    fn budget(self) -> Option<u64> {
        match self {
            Segment::Finite(n) => Some(n),
            Segment::Forever => None,
        }
    }
}

/// Forwards and discards packets in a fixed repeating pattern.
///
/// The pattern alternates KEEP/DROP segments starting with KEEP: `[2, 1, 3]`
/// keeps 2, drops 1, keeps 3, and keeps alternating as it wraps (so the
/// second cycle *drops* 2, keeps 1, drops 3). A negative element is the
/// terminal sentinel: its segment's mode applies forever and the cursor
/// never advances past it. With `transfer_chunks_only`, packets that don't
/// classify as transfer chunks pass through without consuming any count.
pub struct KeepDropQueue {
    name: String,
    sink: PacketSink,
    pattern: Vec<Segment>,
    cursor: usize,
    /// Capacity left in the current segment; `None` for the sentinel.
    remaining: Option<u64>,
    keep: bool,
    classifier: Option<Arc<dyn ChunkClassifier>>,
}

impl KeepDropQueue {
    pub fn new(
        sink: PacketSink,
        name: impl Into<String>,
        pattern: &[i64],
    ) -> Result<Self, FilterError> {
        Self::build(sink, name, pattern, None)
    }

    /// Scope the gate to transfer chunks; everything else passes uncounted.
    pub fn transfer_chunks_only(
        sink: PacketSink,
        name: impl Into<String>,
        pattern: &[i64],
        classifier: Arc<dyn ChunkClassifier>,
    ) -> Result<Self, FilterError> {
        Self::build(sink, name, pattern, Some(classifier))
    }

    fn build(
        sink: PacketSink,
        name: impl Into<String>,
        pattern: &[i64],
        classifier: Option<Arc<dyn ChunkClassifier>>,
    ) -> Result<Self, FilterError> {
        if pattern.is_empty() {
            return Err(FilterError::Config("keep/drop pattern is empty".into()));
        }
        let pattern: Vec<Segment> = pattern
            .iter()
            .map(|&n| {
                if n < 0 {
                    Segment::Forever
                } else {
                    Segment::Finite(n as u64)
                }
            })
            .collect();
        if pattern.iter().all(|&s| s == Segment::Finite(0)) {
            return Err(FilterError::Config(
                "keep/drop pattern has no usable segment".into(),
            ));
        }
        let remaining = pattern[0].budget();
        Ok(Self {
            name: name.into(),
            sink,
            pattern,
            cursor: 0,
            remaining,
            keep: true,
            classifier,
        })
    }
}

impl EventHandler for KeepDropQueue {}

impl Filter for KeepDropQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&mut self, packet: Packet) -> Result<(), FilterError> {
        if let Some(classifier) = &self.classifier {
            if classifier.classify(&packet).is_none() {
                return self.sink.send(packet).await;
            }
        }

        // Advance over exhausted (and zero-length) segments. The sentinel
        // reports no budget limit, so it can never be advanced past.
        while self.remaining == Some(0) {
            self.cursor = (self.cursor + 1) % self.pattern.len();
            self.remaining = self.pattern[self.cursor].budget();
            self.keep = !self.keep;
        }
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }

        if self.keep {
            self.sink.send(packet).await
        } else {
            debug!("{}: dropping {} byte packet", self.name, packet.len());
            Ok(())
        }
    }
}
