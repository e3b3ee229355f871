use thiserror::Error;

use crate::segment::{SegmentId, SeqId};

pub type Result<T> = std::result::Result<T, ReaderError>;

/// Failures reported by the metadata and segment storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("segment {segment} is unavailable")]
    SegmentUnavailable { segment: SegmentId },
    #[error("reading entries [{from} ~ {to}] of segment {segment} failed: {reason}")]
    Read {
        segment: SegmentId,
        from: u64,
        to: u64,
        reason: String,
    },
    #[error("invalid entry key {key:?} in segment {segment}")]
    InvalidKey { segment: SegmentId, key: Vec<u8> },
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// A payload that could not be decoded into a message.
#[derive(Debug, Error)]
#[error("malformed entry: {0}")]
pub struct DecodeError(#[from] pub bincode::Error);

/// Conditions that abort a read of a topic.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("segment {segment} of topic {topic} is open but is not the last segment for the topic")]
    MetadataInconsistency { topic: String, segment: SegmentId },
    #[error("segment {segment} of topic {topic} ends at {end}, before the segment preceding it ends at {previous_end}")]
    SegmentOverlap {
        topic: String,
        segment: SegmentId,
        previous_end: SeqId,
        end: SeqId,
    },
    #[error("segment {segment} of topic {topic} follows a segment ending at the last possible message id")]
    SequenceExhausted { topic: String, segment: SegmentId },
    #[error(
        "message ids are out of order in segment {segment} of topic {topic}: expected entry index {expected_index}, entry index {entry_index}, msg seq id {seq_id}"
    )]
    OrderingViolation {
        topic: String,
        segment: SegmentId,
        expected_index: u64,
        entry_index: u64,
        seq_id: SeqId,
    },
    #[error("segment {segment} of topic {topic} may be corrupted, since reading messages [{from} ~ {to}] failed: {source}")]
    CorruptSegment {
        topic: String,
        segment: SegmentId,
        from: SeqId,
        to: SeqId,
        #[source]
        source: StoreError,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("could not write entry: {0}")]
    Sink(#[source] std::io::Error),
    #[error("could not read operator response: {0}")]
    Prompt(#[source] std::io::Error),
}
