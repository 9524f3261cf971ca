//! Transfer-chunk vocabulary for the fault-injection proxy.
//!
//! The proxy never decodes the wire format itself — frame delimiting,
//! escaping, and the chunk schema live with the transport harness. This
//! crate defines what a decoded chunk looks like to the fault filters and
//! the [`ChunkClassifier`] capability the harness plugs in.

/// Chunk types of the reliable-transfer protocol.
///
/// Only `Start`, `Data`, and the two `Parameters*` types drive fault
/// policy; the remaining types exist so a real decoder can classify every
/// protocol chunk instead of reporting "not a chunk" for half of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    /// Opens a transfer session.
    Start,
    /// Acknowledges a `Start`.
    StartAck,
    /// Confirms a `StartAck`, completing the opening handshake.
    StartAckConfirmation,
    /// Carries a slice of the transferred resource.
    Data,
    /// Flow control: resume transmission from a given offset.
    ParametersRetransmit,
    /// Flow control: extend the current window without rewinding.
    ParametersContinue,
    /// Closes a transfer session.
    Completion,
    /// Acknowledges a `Completion`.
    CompletionAck,
}

/// What the classifier saw inside one packet.
///
/// Produced transiently per packet and never persisted. Offsets and session
/// ids are optional because not every chunk type carries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub chunk_type: ChunkType,
    pub offset: Option<u64>,
    pub session_id: Option<u32>,
}

impl ChunkDescriptor {
    pub fn new(chunk_type: ChunkType) -> Self {
        Self {
            chunk_type,
            offset: None,
            session_id: None,
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_session_id(mut self, session_id: u32) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// True for chunks that carry resource bytes.
    pub fn is_data(&self) -> bool {
        self.chunk_type == ChunkType::Data
    }

    /// True for the window-control chunk types.
    pub fn is_flow_control(&self) -> bool {
        matches!(
            self.chunk_type,
            ChunkType::ParametersRetransmit | ChunkType::ParametersContinue
        )
    }
}

/// Decoder capability consumed by the fault filters.
///
/// Implementations unwrap the transport framing and the RPC packet around a
/// transfer chunk. `None` means "not a transfer chunk" — malformed or
/// unrelated packets are classified, never errors, so implementations must
/// not panic on arbitrary bytes.
pub trait ChunkClassifier: Send + Sync {
    fn classify(&self, packet: &[u8]) -> Option<ChunkDescriptor>;
}
