use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter};
use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{Db, Tree};

use crate::entry::RawEntry;
use crate::error::StoreError;
use crate::resume::SubscriberState;
use crate::segment::{SegmentDescriptor, SegmentId};
use crate::store::{Metadata, Result, SegmentHandle, Storage};

/// Topic metadata and segment contents kept in a sled database.
///
/// Metadata lives in the default tree as bincode values under `topics`, `<topic>:segments` and
/// `<topic>:subscribers`. Each segment is a separate tree named `segment:<id>`, keyed by the
/// big-endian physical index of the entry.
#[derive(Clone)]
pub struct SledStore {
    db: Db,
}

impl Debug for SledStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SledStore {{}}")
    }
}

impl SledStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Self::new(sled::open(path)?))
    }

    #[tracing::instrument]
    pub fn create_topic(&self, topic: &str) -> Result<()> {
        tracing::debug!("create topic");
        let mut topics = self.topics()?;
        topics.insert(topic.to_string());
        self.insert("topics", &topics)
    }

    /// Records a new segment for `topic`. Segments must be added in creation order.
    #[tracing::instrument]
    pub fn add_segment(&self, topic: &str, descriptor: SegmentDescriptor) -> Result<()> {
        tracing::debug!("add segment");
        let mut segments = self.segments(topic)?;
        segments.push(descriptor);
        self.insert(segments_key(topic), &segments)
    }

    pub fn set_subscriber(&self, topic: &str, subscriber: &str, state: SubscriberState) -> Result<()> {
        let mut subscribers = self.subscribers(topic)?;
        subscribers.insert(subscriber.to_string(), state);
        self.insert(subscribers_key(topic), &subscribers)
    }

    pub fn append_entry(&self, segment: SegmentId, index: u64, payload: &[u8]) -> Result<()> {
        self.db
            .open_tree(tree_name(segment))?
            .insert(entry_key(index), payload)?;
        Ok(())
    }

    /// Drops a segment's contents, as happens once every subscriber has consumed it.
    pub fn reclaim_segment(&self, segment: SegmentId) -> Result<bool> {
        Ok(self.db.drop_tree(tree_name(segment))?)
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn topics(&self) -> Result<HashSet<String>> {
        Ok(self.get("topics")?.unwrap_or_default())
    }

    fn get<T: DeserializeOwned, K: AsRef<[u8]>>(&self, key: K) -> Result<Option<T>> {
        self.db
            .get(key.as_ref())?
            .map(|x| bincode::deserialize(&x).map_err(StoreError::from))
            .transpose()
    }

    fn insert<T: Serialize, K: AsRef<[u8]>>(&self, key: K, value: &T) -> Result<()> {
        self.db.insert(key.as_ref(), bincode::serialize(value)?)?;
        Ok(())
    }
}

impl Metadata for SledStore {
    fn topic_exists(&self, topic: &str) -> Result<bool> {
        Ok(self.topics()?.contains(topic))
    }

    fn segments(&self, topic: &str) -> Result<Vec<SegmentDescriptor>> {
        Ok(self.get(segments_key(topic))?.unwrap_or_default())
    }

    fn subscribers(&self, topic: &str) -> Result<HashMap<String, SubscriberState>> {
        Ok(self.get(subscribers_key(topic))?.unwrap_or_default())
    }
}

#[derive(Debug)]
pub struct SledSegment {
    id: SegmentId,
    tree: Tree,
    last_entry: Option<u64>,
}

impl SegmentHandle for SledSegment {
    fn id(&self) -> SegmentId {
        self.id
    }

    fn last_entry(&self) -> Option<u64> {
        self.last_entry
    }
}

impl Storage for SledStore {
    type Handle = SledSegment;

    fn open_no_recovery(&self, segment: SegmentId) -> Result<SledSegment> {
        let name = tree_name(segment);
        // open_tree would create the tree, so check that it exists first
        let exists = self.db.tree_names().iter().any(|n| &n[..] == name.as_bytes());
        if !exists {
            return Err(StoreError::SegmentUnavailable { segment });
        }

        let tree = self.db.open_tree(name)?;
        let last_entry = tree
            .last()?
            .map(|(key, _)| decode_key(segment, &key))
            .transpose()?;

        Ok(SledSegment {
            id: segment,
            tree,
            last_entry,
        })
    }

    fn read_entries(&self, handle: &SledSegment, from: u64, to: u64) -> Result<Vec<RawEntry>> {
        match handle.last_entry {
            Some(last) if to <= last => {}
            _ => {
                return Err(StoreError::Read {
                    segment: handle.id,
                    from,
                    to,
                    reason: format!("last confirmed entry is {:?}", handle.last_entry),
                })
            }
        }

        handle
            .tree
            .range(entry_key(from)..=entry_key(to))
            .map(|res| -> Result<RawEntry> {
                let (key, value) = res?;
                Ok(RawEntry::new(
                    decode_key(handle.id, &key)?,
                    Bytes::copy_from_slice(&value),
                ))
            })
            .collect()
    }
}

fn segments_key(topic: &str) -> String {
    format!("{}:segments", topic)
}

fn subscribers_key(topic: &str) -> String {
    format!("{}:subscribers", topic)
}

fn tree_name(segment: SegmentId) -> String {
    format!("segment:{}", segment)
}

fn entry_key(index: u64) -> [u8; 8] {
    index.to_be_bytes()
}

fn decode_key(segment: SegmentId, key: &[u8]) -> Result<u64> {
    Cursor::new(key)
        .read_u64::<BigEndian>()
        .map_err(|_| StoreError::InvalidKey {
            segment,
            key: key.to_vec(),
        })
}
