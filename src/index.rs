use std::collections::BTreeMap;

use crate::error::{ReaderError, Result};
use crate::segment::{Bound, Segment, SegmentDescriptor, SeqId};

/// Segments of a single topic, keyed by upper bound so that iteration runs in sequence-id order.
///
/// Segments are contiguous: the first starts at sequence id 1 and each later one starts right
/// after its predecessor's end. At most one segment is open and it is always the last.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SegmentIndex {
    segments: BTreeMap<Bound, Segment>,
}

impl SegmentIndex {
    /// Builds the index from descriptors in the metadata store's order. Returns `Ok(None)` when
    /// the topic has no segments yet.
    ///
    /// A closed segment ending before its predecessor, an open segment that is not last, or any
    /// segment after one ending at `SeqId::MAX` is rejected. A closed segment ending exactly where
    /// its predecessor does holds no messages and is left out.
    #[tracing::instrument(skip(descriptors))]
    pub fn build(topic: &str, descriptors: &[SegmentDescriptor]) -> Result<Option<Self>> {
        if descriptors.is_empty() {
            return Ok(None);
        }

        let mut segments = BTreeMap::new();
        let mut next_start: Option<SeqId> = Some(1);
        let last = descriptors.len() - 1;
        for (i, descriptor) in descriptors.iter().enumerate() {
            let start = next_start.ok_or_else(|| ReaderError::SequenceExhausted {
                topic: topic.to_string(),
                segment: descriptor.id,
            })?;
            match descriptor.end {
                Some(end) if end < start - 1 => {
                    return Err(ReaderError::SegmentOverlap {
                        topic: topic.to_string(),
                        segment: descriptor.id,
                        previous_end: start - 1,
                        end,
                    });
                }
                Some(end) if end < start => {
                    tracing::debug!(segment = %descriptor.id, end, "skipping empty segment");
                }
                Some(end) => {
                    segments.insert(
                        Bound::Closed(end),
                        Segment {
                            id: descriptor.id,
                            start,
                            end: Bound::Closed(end),
                        },
                    );
                    next_start = end.checked_add(1);
                }
                None if i != last => {
                    return Err(ReaderError::MetadataInconsistency {
                        topic: topic.to_string(),
                        segment: descriptor.id,
                    });
                }
                None => {
                    segments.insert(
                        Bound::Open,
                        Segment {
                            id: descriptor.id,
                            start,
                            end: Bound::Open,
                        },
                    );
                }
            }
        }

        tracing::debug!(segments = segments.len(), "built segment index");
        Ok(Some(Self { segments }))
    }

    /// The first segment whose bound covers `seq_id`. Segments entirely below `seq_id` are never
    /// returned.
    pub fn first_covering(&self, seq_id: SeqId) -> Option<&Segment> {
        self.segments
            .range(Bound::Closed(seq_id)..)
            .next()
            .map(|(_, segment)| segment)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
