use bytes::Bytes;

use crate::error::DecodeError;
use crate::segment::SeqId;

/// An entry as returned by segment storage, before decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEntry {
    /// Physical position of the entry within its segment, starting at 0.
    pub index: u64,
    pub payload: Bytes,
}

impl RawEntry {
    pub fn new(index: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            index,
            payload: payload.into(),
        }
    }
}

/// Sequence id assigned by a remote region.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionSeqId {
    pub region: String,
    pub seq_id: SeqId,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MessageSeqId {
    /// Sequence id within this region's topic log.
    pub local: Option<SeqId>,
    pub remote: Vec<RegionSeqId>,
}

/// A published message as persisted in a segment.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Message {
    pub msg_id: MessageSeqId,
    pub src_region: Option<String>,
    pub body: Option<Vec<u8>>,
}

impl Message {
    pub fn new(seq_id: SeqId, body: impl Into<Vec<u8>>) -> Self {
        Self {
            msg_id: MessageSeqId {
                local: Some(seq_id),
                remote: vec![],
            },
            src_region: None,
            body: Some(body.into()),
        }
    }

    /// The local sequence id, or 0 when the message carries none.
    pub fn seq_id(&self) -> SeqId {
        self.msg_id.local.unwrap_or(0)
    }

    pub fn encode(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(bincode::deserialize(payload)?)
    }
}

/// A validated entry handed to the output sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedEntry {
    pub index: u64,
    pub seq_id: SeqId,
    pub message: Message,
}

impl DecodedEntry {
    pub fn decode(raw: &RawEntry) -> Result<Self, DecodeError> {
        let message = Message::decode(&raw.payload)?;
        Ok(Self {
            index: raw.index,
            seq_id: message.seq_id(),
            message,
        })
    }
}
