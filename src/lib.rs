//! Reads the messages of a topic whose log is split over a sequence of segments, starting at the
//! first message not yet consumed by every subscriber.

#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod entry;
pub mod error;
pub mod format;
pub mod index;
pub mod logger;
pub mod prompt;
pub mod reader;
pub mod resume;
pub mod segment;
pub mod store;
pub mod walker;

use crate::config::ReaderConfig;
use crate::error::Result;
use crate::prompt::ContinuePrompt;
use crate::reader::{ReadOutcome, TopicReader};
use crate::segment::SeqId;
use crate::store::db::SledStore;
use crate::walker::Sink;

/// Reads `topic` from the database configured in `config`.
pub fn read_topic<K: Sink, P: ContinuePrompt>(
    config: &ReaderConfig,
    topic: &str,
    requested_start: SeqId,
    sink: &mut K,
    prompt: &mut P,
) -> Result<ReadOutcome> {
    let store = SledStore::open(&config.data_directory)?;
    TopicReader::new(&store, &store)
        .batch_size(config.batch_size)
        .interactive(config.interactive)
        .read(topic, requested_start, sink, prompt)
}
