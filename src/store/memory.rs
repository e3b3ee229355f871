//! In-memory metadata and segment storage for unit tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};

use bytes::Bytes;

use crate::entry::{Message, RawEntry};
use crate::error::StoreError;
use crate::resume::SubscriberState;
use crate::segment::{SegmentDescriptor, SegmentId, SeqId};
use crate::store::{Metadata, Result, SegmentHandle, Storage};

#[derive(Debug, Default)]
struct TopicState {
    segments: Vec<SegmentDescriptor>,
    subscribers: HashMap<String, SubscriberState>,
}

/// A store held entirely in memory. Every `open_no_recovery` and `read_entries` call is recorded,
/// and reads can be made to fail at chosen entries.
#[derive(Debug, Default)]
pub struct MemoryStore {
    topics: HashMap<String, TopicState>,
    segments: HashMap<SegmentId, BTreeMap<u64, Bytes>>,
    failing: HashSet<(SegmentId, u64)>,
    opened: RefCell<Vec<SegmentId>>,
    reads: RefCell<Vec<(SegmentId, u64, u64)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topic(mut self, topic: &str) -> Self {
        self.topics.entry(topic.to_string()).or_default();
        self
    }

    /// Adds a segment descriptor to `topic` together with the segment's entries.
    pub fn with_segment(mut self, topic: &str, descriptor: SegmentDescriptor, entries: Vec<RawEntry>) -> Self {
        let id = descriptor.id;
        self.topics
            .entry(topic.to_string())
            .or_default()
            .segments
            .push(descriptor);
        self.segments
            .entry(id)
            .or_default()
            .extend(entries.into_iter().map(|e| (e.index, e.payload)));
        self
    }

    /// Adds a segment descriptor whose contents have already been reclaimed.
    pub fn with_reclaimed_segment(mut self, topic: &str, descriptor: SegmentDescriptor) -> Self {
        self.topics
            .entry(topic.to_string())
            .or_default()
            .segments
            .push(descriptor);
        self
    }

    pub fn with_subscriber(mut self, topic: &str, subscriber: &str, consumed: Option<SeqId>) -> Self {
        self.topics
            .entry(topic.to_string())
            .or_default()
            .subscribers
            .insert(subscriber.to_string(), SubscriberState { consumed });
        self
    }

    /// Any read whose range includes `index` of `segment` fails.
    pub fn fail_reads_at(mut self, segment: SegmentId, index: u64) -> Self {
        self.failing.insert((segment, index));
        self
    }

    pub fn opened(&self) -> Vec<SegmentId> {
        self.opened.borrow().clone()
    }

    pub fn reads(&self) -> Vec<(SegmentId, u64, u64)> {
        self.reads.borrow().clone()
    }
}

/// `count` well-formed entries for a segment starting at `start`, carrying sequence ids
/// `start..start + count`.
pub fn contiguous_entries(start: SeqId, count: u64) -> Vec<RawEntry> {
    (0..count)
        .map(|i| {
            let message = Message::new(start + i, format!("message {}", start + i));
            RawEntry::new(i, message.encode().unwrap())
        })
        .collect()
}

impl Metadata for MemoryStore {
    fn topic_exists(&self, topic: &str) -> Result<bool> {
        Ok(self.topics.contains_key(topic))
    }

    fn segments(&self, topic: &str) -> Result<Vec<SegmentDescriptor>> {
        Ok(self
            .topics
            .get(topic)
            .map(|t| t.segments.clone())
            .unwrap_or_default())
    }

    fn subscribers(&self, topic: &str) -> Result<HashMap<String, SubscriberState>> {
        Ok(self
            .topics
            .get(topic)
            .map(|t| t.subscribers.clone())
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MemorySegment {
    id: SegmentId,
    last_entry: Option<u64>,
}

impl SegmentHandle for MemorySegment {
    fn id(&self) -> SegmentId {
        self.id
    }

    fn last_entry(&self) -> Option<u64> {
        self.last_entry
    }
}

impl Storage for MemoryStore {
    type Handle = MemorySegment;

    fn open_no_recovery(&self, segment: SegmentId) -> Result<MemorySegment> {
        self.opened.borrow_mut().push(segment);
        let entries = self
            .segments
            .get(&segment)
            .ok_or(StoreError::SegmentUnavailable { segment })?;
        Ok(MemorySegment {
            id: segment,
            last_entry: entries.keys().next_back().copied(),
        })
    }

    fn read_entries(&self, handle: &MemorySegment, from: u64, to: u64) -> Result<Vec<RawEntry>> {
        self.reads.borrow_mut().push((handle.id, from, to));
        let read_error = |reason: String| StoreError::Read {
            segment: handle.id,
            from,
            to,
            reason,
        };

        match handle.last_entry {
            Some(last) if to <= last => {}
            _ => return Err(read_error(format!("last confirmed entry is {:?}", handle.last_entry))),
        }
        if let Some((_, index)) = self
            .failing
            .iter()
            .find(|(segment, index)| *segment == handle.id && (from..=to).contains(index))
        {
            return Err(read_error(format!("entry {} is unreadable", index)));
        }

        let entries = self
            .segments
            .get(&handle.id)
            .ok_or(StoreError::SegmentUnavailable { segment: handle.id })?;
        Ok(entries
            .range(from..=to)
            .map(|(index, payload)| RawEntry::new(*index, payload.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls() {
        let store = MemoryStore::new().with_segment("t", SegmentDescriptor::closed(1, 5), contiguous_entries(1, 5));
        let handle = store.open_no_recovery(SegmentId(1)).unwrap();
        assert_eq!(handle.last_entry(), Some(4));
        assert_eq!(store.read_entries(&handle, 0, 4).unwrap().len(), 5);
        assert_eq!(store.opened(), vec![SegmentId(1)]);
        assert_eq!(store.reads(), vec![(SegmentId(1), 0, 4)]);
    }

    #[test]
    fn injected_failure() {
        let store = MemoryStore::new()
            .with_segment("t", SegmentDescriptor::closed(1, 5), contiguous_entries(1, 5))
            .fail_reads_at(SegmentId(1), 3);
        let handle = store.open_no_recovery(SegmentId(1)).unwrap();
        assert!(store.read_entries(&handle, 0, 2).is_ok());
        assert!(matches!(store.read_entries(&handle, 2, 4), Err(StoreError::Read { .. })));
    }

    #[test]
    fn reclaimed_segment() {
        let store = MemoryStore::new().with_reclaimed_segment("t", SegmentDescriptor::closed(1, 5));
        assert_eq!(store.segments("t").unwrap().len(), 1);
        assert!(matches!(
            store.open_no_recovery(SegmentId(1)),
            Err(StoreError::SegmentUnavailable { .. })
        ));
    }
}
