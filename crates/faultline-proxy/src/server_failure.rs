//! Simulated server outages synchronized with transfer starts.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use faultline_chunk::ChunkClassifier;

use crate::event::{Event, EventType};
use crate::filter::{EventHandler, Filter, FilterError, Packet, PacketSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureState {
    /// Counts exhausted: forward everything unconditionally.
    Open,
    /// Forwarding, with this many packets left before the outage.
    Forwarding(u64),
    /// Simulated outage: drop everything in scope.
    Failed,
}

/// Forwards a fixed number of packets after each transfer start, then goes
/// dark until the next one.
///
/// Each `TransferStart` event pops the next count off the configured list
/// and opens a forwarding window of that many packets; when the list runs
/// out the filter stays open for good. Without `start_immediately` the
/// filter begins in the failed state, waiting for the first transfer.
pub struct ServerFailure {
    name: String,
    sink: PacketSink,
    counts: VecDeque<u64>,
    state: FailureState,
    classifier: Option<Arc<dyn ChunkClassifier>>,
}

impl ServerFailure {
    pub fn new(
        sink: PacketSink,
        name: impl Into<String>,
        fail_after_counts: &[u64],
        start_immediately: bool,
    ) -> Result<Self, FilterError> {
        Self::build(sink, name, fail_after_counts, start_immediately, None)
    }

    /// Scope the outage to transfer chunks; everything else always forwards.
    pub fn transfer_chunks_only(
        sink: PacketSink,
        name: impl Into<String>,
        fail_after_counts: &[u64],
        start_immediately: bool,
        classifier: Arc<dyn ChunkClassifier>,
    ) -> Result<Self, FilterError> {
        Self::build(
            sink,
            name,
            fail_after_counts,
            start_immediately,
            Some(classifier),
        )
    }

    fn build(
        sink: PacketSink,
        name: impl Into<String>,
        fail_after_counts: &[u64],
        start_immediately: bool,
        classifier: Option<Arc<dyn ChunkClassifier>>,
    ) -> Result<Self, FilterError> {
        if fail_after_counts.contains(&0) {
            return Err(FilterError::Config(
                "packets-before-failure counts must be positive".into(),
            ));
        }
        let mut counts: VecDeque<u64> = fail_after_counts.iter().copied().collect();
        let state = if start_immediately {
            match counts.pop_front() {
                Some(count) => FailureState::Forwarding(count),
                None => FailureState::Open,
            }
        } else {
            FailureState::Failed
        };
        Ok(Self {
            name: name.into(),
            sink,
            counts,
            state,
            classifier,
        })
    }
}

impl EventHandler for ServerFailure {
    fn handle_event(&mut self, event: &Event) {
        if event.event_type != EventType::TransferStart {
            return;
        }
        self.state = match self.counts.pop_front() {
            Some(count) => {
                debug!(
                    "{}: transfer started, failing after {} packets",
                    self.name, count
                );
                FailureState::Forwarding(count)
            }
            None => {
                debug!("{}: failure counts exhausted, staying open", self.name);
                FailureState::Open
            }
        };
    }
}

impl Filter for ServerFailure {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&mut self, packet: Packet) -> Result<(), FilterError> {
        if let Some(classifier) = &self.classifier {
            if classifier.classify(&packet).is_none() {
                return self.sink.send(packet).await;
            }
        }
        match self.state {
            FailureState::Open => self.sink.send(packet).await,
            FailureState::Forwarding(remaining) => {
                self.state = if remaining == 1 {
                    debug!("{}: window exhausted, starting outage", self.name);
                    FailureState::Failed
                } else {
                    FailureState::Forwarding(remaining - 1)
                };
                self.sink.send(packet).await
            }
            FailureState::Failed => {
                debug!(
                    "{}: dropping {} byte packet (simulated outage)",
                    self.name,
                    packet.len()
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{data_chunk, drain, sink};
    use faultline_chunk::{ChunkDescriptor, ChunkType};

    fn start_event() -> Event {
        Event::new(
            EventType::TransferStart,
            ChunkDescriptor::new(ChunkType::Start),
        )
    }

    #[tokio::test]
    async fn windows_shrink_then_stay_open() {
        let (out, mut rx) = sink();
        let mut counts = vec![1, 2, 3];
        let mut filter = ServerFailure::new(out, "test", &counts, true).unwrap();

        // The filter copied the list; this must not add a fourth window.
        counts.push(5);

        for &expected in &[1usize, 2, 3] {
            for n in 0..5u8 {
                filter.process(Packet::from(vec![n])).await.unwrap();
            }
            assert_eq!(drain(&mut rx).len(), expected);
            filter.handle_event(&start_event());
        }

        // Counts exhausted: the last event left the filter open for good.
        for n in 0..5u8 {
            filter.process(Packet::from(vec![n])).await.unwrap();
        }
        assert_eq!(drain(&mut rx).len(), 5);
    }

    #[tokio::test]
    async fn waits_for_first_transfer_when_not_started_immediately() {
        let (out, mut rx) = sink();
        let mut filter = ServerFailure::new(out, "test", &[2], false).unwrap();

        filter.process(Packet::from_static(b"early")).await.unwrap();
        assert!(drain(&mut rx).is_empty());

        filter.handle_event(&start_event());
        for n in 0..4u8 {
            filter.process(Packet::from(vec![n])).await.unwrap();
        }
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[tokio::test]
    async fn outage_scoped_to_transfer_chunks() {
        let (out, mut rx) = sink();
        let mut filter = ServerFailure::transfer_chunks_only(
            out,
            "test",
            &[2],
            true,
            crate::testutil::TestClassifier::shared(),
        )
        .unwrap();

        let inputs = vec![
            Packet::from_static(b"1"),
            Packet::from_static(b"2"),
            data_chunk(0), // 1
            Packet::from_static(b"3"),
            data_chunk(1), // 2
            Packet::from_static(b"4"),
            Packet::from_static(b"5"),
            data_chunk(2), // outage: transfer chunks dropped from here
            data_chunk(3),
            Packet::from_static(b"6"),
            Packet::from_static(b"7"),
            data_chunk(4),
        ];
        let expected = vec![
            Packet::from_static(b"1"),
            Packet::from_static(b"2"),
            data_chunk(0),
            Packet::from_static(b"3"),
            data_chunk(1),
            Packet::from_static(b"4"),
            Packet::from_static(b"5"),
            Packet::from_static(b"6"),
            Packet::from_static(b"7"),
        ];

        for packet in inputs {
            filter.process(packet).await.unwrap();
        }
        assert_eq!(drain(&mut rx), expected);
    }

    #[tokio::test]
    async fn rejects_zero_counts() {
        let (out, _rx) = sink();
        assert!(matches!(
            ServerFailure::new(out, "test", &[1, 0, 3], true),
            Err(FilterError::Config(_))
        ));
    }
}
