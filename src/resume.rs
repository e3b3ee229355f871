use std::collections::HashMap;

use crate::segment::SeqId;

/// Consumption marker of one subscriber: the last sequence id it has fully consumed. A subscriber
/// that has never consumed anything reports `None`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SubscriberState {
    pub consumed: Option<SeqId>,
}

impl SubscriberState {
    pub fn consumed(seq_id: SeqId) -> Self {
        Self {
            consumed: Some(seq_id),
        }
    }
}

/// How the resume point was derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResumeStatus {
    /// The topic has no subscribers; the requested start is used as-is.
    NoSubscribers,
    /// Derived from the least-advanced subscriber.
    Subscribers {
        least_subscriber: String,
        least_consumed: SeqId,
    },
}

/// The first sequence id still to be delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResumePoint {
    pub seq_id: SeqId,
    pub status: ResumeStatus,
}

impl ResumePoint {
    /// Combines the subscribers' markers with the operator's requested start. The walk never
    /// re-delivers a message the least-advanced subscriber already consumed, while a later
    /// requested start is still honored.
    pub fn calculate(subscribers: &HashMap<String, SubscriberState>, requested_start: SeqId) -> Self {
        let least = subscribers
            .iter()
            .map(|(id, state)| (id, state.consumed.unwrap_or(0)))
            .min_by(|(a_id, a), (b_id, b)| a.cmp(b).then_with(|| a_id.cmp(b_id)));

        match least {
            None => ResumePoint {
                seq_id: requested_start,
                status: ResumeStatus::NoSubscribers,
            },
            Some((id, consumed)) => ResumePoint {
                seq_id: requested_start.max(consumed.saturating_add(1)),
                status: ResumeStatus::Subscribers {
                    least_subscriber: id.clone(),
                    least_consumed: consumed,
                },
            },
        }
    }
}
