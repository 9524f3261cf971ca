//! Shared fixtures for the filter unit tests: a collector sink and a
//! synthetic chunk encoding, since the real codec lives with the harness.

use std::sync::Arc;

use tokio::sync::mpsc;

use faultline_chunk::{ChunkClassifier, ChunkDescriptor, ChunkType};

use crate::filter::{Packet, PacketSink};

/// Synthetic chunk packet layout, 15 bytes:
/// `[MAGIC][type][flags][offset u64 BE][session u32 BE]`
/// where flags bit 0 = offset present, bit 1 = session present.
const CHUNK_MAGIC: u8 = 0xC4;
const CHUNK_LEN: usize = 15;

pub(crate) fn sink() -> (PacketSink, mpsc::Receiver<Packet>) {
    PacketSink::stage(64)
}

/// Collect everything forwarded so far without blocking.
pub(crate) fn drain(rx: &mut mpsc::Receiver<Packet>) -> Vec<Packet> {
    let mut out = Vec::new();
    while let Ok(packet) = rx.try_recv() {
        out.push(packet);
    }
    out
}

pub(crate) fn encode_chunk(
    chunk_type: ChunkType,
    offset: Option<u64>,
    session_id: Option<u32>,
) -> Packet {
    let type_byte = match chunk_type {
        ChunkType::Start => 1,
        ChunkType::StartAck => 2,
        ChunkType::StartAckConfirmation => 3,
        ChunkType::Data => 4,
        ChunkType::ParametersRetransmit => 5,
        ChunkType::ParametersContinue => 6,
        ChunkType::Completion => 7,
        ChunkType::CompletionAck => 8,
    };
    let mut buf = vec![0u8; CHUNK_LEN];
    buf[0] = CHUNK_MAGIC;
    buf[1] = type_byte;
    if let Some(offset) = offset {
        buf[2] |= 1;
        buf[3..11].copy_from_slice(&offset.to_be_bytes());
    }
    if let Some(session_id) = session_id {
        buf[2] |= 2;
        buf[11..15].copy_from_slice(&session_id.to_be_bytes());
    }
    Packet::from(buf)
}

pub(crate) fn data_chunk(offset: u64) -> Packet {
    encode_chunk(ChunkType::Data, Some(offset), Some(1))
}

pub(crate) fn start_chunk(session_id: u32) -> Packet {
    encode_chunk(ChunkType::Start, None, Some(session_id))
}

pub(crate) fn retransmit_chunk(offset: u64) -> Packet {
    encode_chunk(ChunkType::ParametersRetransmit, Some(offset), Some(1))
}

pub(crate) fn continue_chunk(offset: u64) -> Packet {
    encode_chunk(ChunkType::ParametersContinue, Some(offset), Some(1))
}

/// Classifier for the synthetic encoding. Anything that is not exactly a
/// well-formed 15-byte chunk is "not a transfer chunk".
pub(crate) struct TestClassifier;

impl TestClassifier {
    pub(crate) fn shared() -> Arc<dyn ChunkClassifier> {
        Arc::new(TestClassifier)
    }
}

impl ChunkClassifier for TestClassifier {
    fn classify(&self, packet: &[u8]) -> Option<ChunkDescriptor> {
        if packet.len() != CHUNK_LEN || packet[0] != CHUNK_MAGIC {
            return None;
        }
        let chunk_type = match packet[1] {
            1 => ChunkType::Start,
            2 => ChunkType::StartAck,
            3 => ChunkType::StartAckConfirmation,
            4 => ChunkType::Data,
            5 => ChunkType::ParametersRetransmit,
            6 => ChunkType::ParametersContinue,
            7 => ChunkType::Completion,
            8 => ChunkType::CompletionAck,
            _ => return None,
        };
        let mut chunk = ChunkDescriptor::new(chunk_type);
        if packet[2] & 1 != 0 {
            chunk.offset = Some(u64::from_be_bytes(packet[3..11].try_into().unwrap()));
        }
        if packet[2] & 2 != 0 {
            chunk.session_id = Some(u32::from_be_bytes(packet[11..15].try_into().unwrap()));
        }
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_roundtrips_synthetic_chunks() {
        let classifier = TestClassifier;
        let chunk = classifier.classify(&data_chunk(96)).unwrap();
        assert_eq!(chunk.chunk_type, ChunkType::Data);
        assert_eq!(chunk.offset, Some(96));
        assert_eq!(chunk.session_id, Some(1));

        let chunk = classifier.classify(&start_chunk(3)).unwrap();
        assert_eq!(chunk.chunk_type, ChunkType::Start);
        assert_eq!(chunk.offset, None);
        assert_eq!(chunk.session_id, Some(3));
    }

    #[test]
    fn classifier_rejects_arbitrary_bytes() {
        let classifier = TestClassifier;
        assert!(classifier.classify(b"not a chunk").is_none());
        assert!(classifier.classify(&[]).is_none());
        assert!(classifier.classify(&[CHUNK_MAGIC; 15][..14]).is_none());
    }
}
