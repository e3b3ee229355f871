use crate::error::Result;
use crate::index::SegmentIndex;
use crate::prompt::ContinuePrompt;
use crate::resume::{ResumePoint, ResumeStatus};
use crate::segment::SeqId;
use crate::store::{Metadata, Storage};
use crate::walker::{Sink, StreamWalker, WalkOutcome, WalkSummary, DEFAULT_BATCH_SIZE};

/// How a read of a topic ended, short of a fatal error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    Completed {
        resume: ResumePoint,
        summary: WalkSummary,
    },
    StoppedByOperator {
        resume: ResumePoint,
        summary: WalkSummary,
    },
    NoTopic,
    /// The topic exists but nothing has been published to it.
    NoSegments,
}

/// Reads a topic's messages from the first one not yet consumed by every subscriber.
pub struct TopicReader<'a, M, S> {
    metadata: &'a M,
    storage: &'a S,
    batch_size: u64,
    interactive: bool,
}

impl<'a, M: Metadata, S: Storage> TopicReader<'a, M, S> {
    pub fn new(metadata: &'a M, storage: &'a S) -> Self {
        Self {
            metadata,
            storage,
            batch_size: DEFAULT_BATCH_SIZE,
            interactive: false,
        }
    }

    pub fn batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Delivers every message of `topic` from the resume point onwards to `sink`. The resume
    /// point is the later of `requested_start` and the entry after the least-advanced
    /// subscriber's marker.
    #[tracing::instrument(skip(self, sink, prompt))]
    pub fn read<K: Sink, P: ContinuePrompt>(
        &self,
        topic: &str,
        requested_start: SeqId,
        sink: &mut K,
        prompt: &mut P,
    ) -> Result<ReadOutcome> {
        if !self.metadata.topic_exists(topic)? {
            tracing::info!("no such topic");
            return Ok(ReadOutcome::NoTopic);
        }

        let descriptors = self.metadata.segments(topic)?;
        let index = match SegmentIndex::build(topic, &descriptors)? {
            Some(index) => index,
            None => {
                tracing::info!("no messages published to topic");
                return Ok(ReadOutcome::NoSegments);
            }
        };

        let resume = ResumePoint::calculate(&self.metadata.subscribers(topic)?, requested_start);
        match &resume.status {
            ResumeStatus::NoSubscribers => {
                tracing::info!(seq_id = resume.seq_id, "topic has no subscribers")
            }
            ResumeStatus::Subscribers {
                least_subscriber,
                least_consumed,
            } => tracing::info!(
                seq_id = resume.seq_id,
                %least_subscriber,
                least_consumed,
                "resuming after least-advanced subscriber"
            ),
        }

        let (outcome, state) = StreamWalker::new(topic, &index, self.storage)
            .batch_size(self.batch_size)
            .interactive(self.interactive)
            .walk(resume.seq_id, sink, prompt)?;

        Ok(match outcome {
            WalkOutcome::Completed => ReadOutcome::Completed {
                resume,
                summary: state.summary,
            },
            WalkOutcome::StoppedByOperator => ReadOutcome::StoppedByOperator {
                resume,
                summary: state.summary,
            },
        })
    }
}
