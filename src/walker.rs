//! Walks a topic's segments in sequence-id order, delivering every entry at or after a resume
//! point.
//!
//! Segments are read one at a time, in bounded batches, and every entry is checked against the
//! position it should occupy: its physical index within the segment and its sequence id must both
//! continue the run started at the resume point. A gap, duplicate or reordering aborts the walk.
//! Reclaimed segments and undecodable entries are only warned about and skipped.
//!
//! All progress is carried in a [`WalkState`] that is passed into and returned from each
//! [`StreamWalker::step`], so a walk can be paused and inspected between segments.

use std::io;

use crate::entry::DecodedEntry;
use crate::error::{ReaderError, Result, StoreError};
use crate::index::SegmentIndex;
use crate::prompt::ContinuePrompt;
use crate::segment::{Bound, Segment, SeqId};
use crate::store::{SegmentHandle, Storage};

pub const DEFAULT_BATCH_SIZE: u64 = 15;

/// Receives entries in ascending sequence-id order.
pub trait Sink {
    /// Called when the walk reaches a segment, before it is opened. Reclaimed segments are
    /// announced too.
    fn begin_segment(&mut self, _segment: &Segment) -> io::Result<()> {
        Ok(())
    }

    fn deliver(&mut self, entry: DecodedEntry) -> io::Result<()>;
}

impl<F> Sink for F
where
    F: FnMut(DecodedEntry) -> io::Result<()>,
{
    fn deliver(&mut self, entry: DecodedEntry) -> io::Result<()> {
        self(entry)
    }
}

/// Counters kept over a walk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Entries handed to the sink.
    pub entries: u64,
    /// Entries skipped because their payload could not be decoded.
    pub malformed: u64,
    /// Segments skipped because they could not be opened.
    pub unavailable_segments: u64,
    pub batches: u64,
}

/// Everything that changes while walking.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WalkState {
    /// Next sequence id to deliver.
    pub cursor: SeqId,
    /// The segment being read, if any.
    pub segment: Option<Segment>,
    pub summary: WalkSummary,
}

impl WalkState {
    pub fn new(resume: SeqId) -> Self {
        Self {
            cursor: resume,
            segment: None,
            summary: WalkSummary::default(),
        }
    }

    /// Moves past a closed segment ending at `end`. Nothing follows a segment ending at
    /// `SeqId::MAX`.
    fn next_segment(mut self, end: SeqId) -> Step {
        self.segment = None;
        match end.checked_add(1) {
            Some(cursor) => {
                self.cursor = cursor;
                Step::Continue(self)
            }
            None => Step::Done(WalkOutcome::Completed, self),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WalkOutcome {
    /// The index was exhausted, or the open segment's tail was reached.
    Completed,
    /// The operator declined to continue.
    StoppedByOperator,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Continue(WalkState),
    Done(WalkOutcome, WalkState),
}

pub struct StreamWalker<'a, S> {
    topic: &'a str,
    index: &'a SegmentIndex,
    storage: &'a S,
    batch_size: u64,
    interactive: bool,
}

impl<'a, S: Storage> StreamWalker<'a, S> {
    pub fn new(topic: &'a str, index: &'a SegmentIndex, storage: &'a S) -> Self {
        Self {
            topic,
            index,
            storage,
            batch_size: DEFAULT_BATCH_SIZE,
            interactive: false,
        }
    }

    /// Number of entries requested per read. Values below 1 are raised to 1.
    pub fn batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Whether to consult the continue prompt after every batch.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Runs steps until the walk is done.
    #[tracing::instrument(skip(self, sink, prompt), fields(topic = %self.topic))]
    pub fn walk<K: Sink, P: ContinuePrompt>(
        &self,
        resume: SeqId,
        sink: &mut K,
        prompt: &mut P,
    ) -> Result<(WalkOutcome, WalkState)> {
        let mut state = WalkState::new(resume);
        loop {
            match self.step(state, sink, prompt)? {
                Step::Continue(next) => state = next,
                Step::Done(outcome, state) => {
                    tracing::info!(?outcome, ?state.summary, "walk finished");
                    return Ok((outcome, state));
                }
            }
        }
    }

    /// Reads the first segment that still holds entries at or after `state.cursor`. Segments
    /// entirely below the cursor are never opened.
    pub fn step<K: Sink, P: ContinuePrompt>(
        &self,
        mut state: WalkState,
        sink: &mut K,
        prompt: &mut P,
    ) -> Result<Step> {
        let segment = match self.index.first_covering(state.cursor) {
            Some(segment) => *segment,
            None => {
                state.segment = None;
                return Ok(Step::Done(WalkOutcome::Completed, state));
            }
        };
        state.cursor = state.cursor.max(segment.start);
        state.segment = Some(segment);
        sink.begin_segment(&segment).map_err(ReaderError::Sink)?;

        let handle = match self.storage.open_no_recovery(segment.id) {
            Ok(handle) => handle,
            Err(StoreError::SegmentUnavailable { .. }) => {
                tracing::warn!(
                    topic = %self.topic,
                    segment = %segment.id,
                    "no segment found, it may have been garbage collected after its messages were consumed"
                );
                state.summary.unavailable_segments += 1;
                return Ok(match segment.end {
                    Bound::Closed(end) => state.next_segment(end),
                    Bound::Open => Step::Done(WalkOutcome::Completed, state),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let tail = match segment.end {
            Bound::Closed(end) => end,
            Bound::Open => match handle.last_entry() {
                Some(last) => segment.seq_id(last),
                None => {
                    tracing::debug!(segment = %segment.id, "open segment is empty");
                    return Ok(Step::Done(WalkOutcome::Completed, state));
                }
            },
        };
        tracing::debug!(%segment, tail, cursor = state.cursor, "reading segment");

        let mut expected = segment.entry_index(state.cursor);
        while state.cursor <= tail {
            let batch_end = state.cursor.saturating_add(self.batch_size - 1).min(tail);
            let entries = match self.storage.read_entries(
                &handle,
                segment.entry_index(state.cursor),
                segment.entry_index(batch_end),
            ) {
                Ok(entries) => entries,
                Err(err) if segment.is_open() => {
                    tracing::debug!(segment = %segment.id, %err, "reached the tail of the open segment");
                    return Ok(Step::Done(WalkOutcome::Completed, state));
                }
                Err(source) => {
                    return Err(ReaderError::CorruptSegment {
                        topic: self.topic.to_string(),
                        segment: segment.id,
                        from: state.cursor,
                        to: batch_end,
                        source,
                    })
                }
            };
            state.summary.batches += 1;

            for raw in entries {
                let entry = match DecodedEntry::decode(&raw) {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::warn!(
                            topic = %self.topic,
                            segment = %segment.id,
                            index = raw.index,
                            %err,
                            "unreadable message found"
                        );
                        state.summary.malformed += 1;
                        expected += 1;
                        continue;
                    }
                };

                if entry.index != expected || entry.seq_id.checked_sub(segment.start) != Some(expected) {
                    return Err(ReaderError::OrderingViolation {
                        topic: self.topic.to_string(),
                        segment: segment.id,
                        expected_index: expected,
                        entry_index: entry.index,
                        seq_id: entry.seq_id,
                    });
                }
                expected += 1;
                sink.deliver(entry).map_err(ReaderError::Sink)?;
                state.summary.entries += 1;
            }

            let next = batch_end.checked_add(1);
            if let Some(next) = next {
                state.cursor = next;
            }
            if self.interactive && !prompt.proceed().map_err(ReaderError::Prompt)? {
                return Ok(Step::Done(WalkOutcome::StoppedByOperator, state));
            }
            if next.is_none() {
                // the last possible message id was delivered
                break;
            }
        }

        Ok(match segment.end {
            Bound::Closed(end) => state.next_segment(end),
            // caught up with the live tail
            Bound::Open => Step::Done(WalkOutcome::Completed, state),
        })
    }
}
