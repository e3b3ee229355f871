//! Collaborators that supply topic metadata and segment contents. The reader only ever reads
//! through these traits; it never writes, fences or repairs anything.

use std::collections::HashMap;

use crate::entry::RawEntry;
use crate::error::StoreError;
use crate::resume::SubscriberState;
use crate::segment::{SegmentDescriptor, SegmentId};

pub mod db;
#[cfg(test)]
pub mod memory;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Topic metadata: which topics exist, where their messages are stored, and how far each
/// subscriber has consumed.
pub trait Metadata {
    fn topic_exists(&self, topic: &str) -> Result<bool>;

    /// Segment descriptors in the order they were created. An empty list is valid.
    fn segments(&self, topic: &str) -> Result<Vec<SegmentDescriptor>>;

    /// Consumption markers keyed by subscriber id. An empty map is valid.
    fn subscribers(&self, topic: &str) -> Result<HashMap<String, SubscriberState>>;
}

/// An opened segment.
pub trait SegmentHandle {
    fn id(&self) -> SegmentId;

    /// Physical index of the last entry confirmed when the segment was opened, if it has any.
    fn last_entry(&self) -> Option<u64>;
}

pub trait Storage {
    type Handle: SegmentHandle;

    /// Opens a segment read-only, without recovery: the segment is never fenced or repaired. Fails
    /// with [`StoreError::SegmentUnavailable`] if the segment no longer exists.
    fn open_no_recovery(&self, segment: SegmentId) -> Result<Self::Handle>;

    /// Entries with physical indices in `from..=to`, in physical order. Fails with
    /// [`StoreError::Read`] if the range reaches beyond the last confirmed entry.
    fn read_entries(&self, handle: &Self::Handle, from: u64, to: u64) -> Result<Vec<RawEntry>>;
}
