use std::fmt;

use derive_more::Display;

/// A per-topic, monotonically increasing message identifier. The first message of a topic is 1.
pub type SeqId = u64;

/// Identifies a segment within the storage backend.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub struct SegmentId(pub u64);

/// Upper bound of a segment. `Open` sorts after every closed bound, so a segment index ordered by
/// bound keeps the open segment last.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bound {
    Closed(SeqId),
    Open,
}

impl Bound {
    pub fn from_end(end: Option<SeqId>) -> Self {
        end.map_or(Bound::Open, Bound::Closed)
    }

    pub fn end(&self) -> Option<SeqId> {
        match self {
            Bound::Closed(end) => Some(*end),
            Bound::Open => None,
        }
    }

    /// Whether `seq_id` lies at or below this bound.
    pub fn covers(&self, seq_id: SeqId) -> bool {
        match self {
            Bound::Closed(end) => seq_id <= *end,
            Bound::Open => true,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Closed(end) => write!(f, "{}", end),
            Bound::Open => Ok(()),
        }
    }
}

/// Segment metadata as stored for a topic. A missing `end` marks the open segment, which writers
/// may still be appending to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentDescriptor {
    pub id: SegmentId,
    pub end: Option<SeqId>,
}

impl SegmentDescriptor {
    pub fn closed(id: u64, end: SeqId) -> Self {
        Self {
            id: SegmentId(id),
            end: Some(end),
        }
    }

    pub fn open(id: u64) -> Self {
        Self {
            id: SegmentId(id),
            end: None,
        }
    }
}

/// A segment placed in the topic's sequence space. `start` is derived from the previous segment's
/// end and is never stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub id: SegmentId,
    pub start: SeqId,
    pub end: Bound,
}

impl Segment {
    pub fn is_open(&self) -> bool {
        self.end == Bound::Open
    }

    /// Physical index of `seq_id` within this segment.
    pub fn entry_index(&self, seq_id: SeqId) -> u64 {
        seq_id - self.start
    }

    /// Sequence id stored at physical index `index`, saturating at `SeqId::MAX`.
    pub fn seq_id(&self, index: u64) -> SeqId {
        self.start.saturating_add(index)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment {} [ {} ~ {} ]", self.id, self.start, self.end)
    }
}
