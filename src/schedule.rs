//! Scheduling metadata and the schedule-aware channel components.

use crate::channel::{MessageSink, MessageSource};
use crate::connector::{MessageKind, QueueConnector, QueueProducer};
use crate::error::{QueueError, ValidationError};
use crate::message::{ChannelMessage, FutureTimepoint};
use crate::props::{self, MessageProps};
use serde::{Deserialize, Serialize};
use std::io;
use tracing::debug;

// ============================================================================
// Scheduling Metadata
// ============================================================================

/// How many times a message has been scheduled; always >= 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScheduleCount(i64);

impl ScheduleCount {
    /// Create a schedule count with validation
    pub fn new(count: i64) -> Result<Self, ValidationError> {
        if count < 1 {
            return Err(ValidationError::OutOfRange {
                field: "schedule_count".to_string(),
                message: format!("must be >= 1, got {count}"),
            });
        }

        Ok(Self(count))
    }

    /// The count of a message scheduled for the first time
    pub fn first() -> Self {
        Self(1)
    }

    /// The count after one more scheduling round
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Get the raw count
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ScheduleCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receive-side scheduling metadata: the message has been scheduled `count`
/// times, most recently around `when`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedSchedule {
    when: Option<FutureTimepoint>,
    count: ScheduleCount,
}

impl CountedSchedule {
    /// Metadata with a count but no known timepoint
    pub fn new(count: ScheduleCount) -> Self {
        Self { when: None, count }
    }

    /// Metadata with a count pinned to the timepoint it was observed at
    pub fn at(when: FutureTimepoint, count: ScheduleCount) -> Self {
        Self {
            when: Some(when),
            count,
        }
    }

    /// When the schedule was last observed, if known
    pub fn when(&self) -> Option<&FutureTimepoint> {
        self.when.as_ref()
    }

    /// How many times the message has been scheduled
    pub fn count(&self) -> ScheduleCount {
        self.count
    }
}

// ============================================================================
// Counted-Schedule Sink
// ============================================================================

/// Maps raw provider messages into typed counted-schedule metadata before
/// forwarding to the sink it wraps.
///
/// The incoming envelope carries the raw provider message in its metadata
/// slot and the decoded payload as data. Mapping reads the reserved
/// schedule-count property:
///
/// - absent: the message was never scheduled; forward an envelope with no
///   metadata and the configured sentinel as data, so "never scheduled" is
///   distinguishable from "scheduled once";
/// - present and positive: forward [`CountedSchedule`] metadata (count from
///   the property, `when` pinned to the moment of mapping) with the
///   original data unchanged;
/// - present but non-positive: upstream corruption; fail with a validation
///   error before anything reaches the wrapped sink.
pub struct CountedScheduleSink<S, D> {
    next: S,
    sentinel: D,
}

impl<S, D> CountedScheduleSink<S, D> {
    /// Wrap `next`, substituting `sentinel` for the data of never-scheduled
    /// messages
    pub fn new(next: S, sentinel: D) -> Self {
        Self { next, sentinel }
    }

    /// Recover the wrapped sink
    pub fn into_inner(self) -> S {
        self.next
    }
}

impl<M, S, D> MessageSink<M, D> for CountedScheduleSink<S, D>
where
    M: MessageProps,
    S: MessageSink<CountedSchedule, D>,
    D: Clone,
{
    fn consume(&mut self, message: ChannelMessage<M, D>) -> Result<(), QueueError> {
        let (raw, data) = message.into_parts();
        let raw = raw.ok_or_else(|| ValidationError::Required {
            field: "queue_message".to_string(),
        })?;

        match props::schedule_count(&raw) {
            None => self
                .next
                .consume(ChannelMessage::new(self.sentinel.clone())),
            Some(count) => {
                let count = ScheduleCount::new(count)?;
                let schedule = CountedSchedule::at(FutureTimepoint::now(), count);
                self.next
                    .consume(ChannelMessage::with_metadata(schedule, data))
            }
        }
    }
}

// ============================================================================
// Schedule Task
// ============================================================================

/// Send side of a scheduling channel over one queue.
///
/// Owns a producer created from the given connector and an encoder for the
/// payload. When an envelope carries a [`FutureTimepoint`], its resolved
/// instant is stamped on the reserved scheduled-delivery header so the
/// broker holds the message back until then; without one the broker
/// delivers on its default timing. Outgoing messages are created durable:
/// a scheduled message that evaporated on broker restart would silently
/// drop work.
pub struct ScheduleTask<C: QueueConnector, D> {
    producer: C::Producer,
    encode: Box<dyn Fn(&D, &mut dyn io::Write) -> io::Result<()> + Send + Sync>,
}

impl<C: QueueConnector, D> ScheduleTask<C, D> {
    /// Create the task's producer from `connector`, keeping `encode` for
    /// payload serialization
    pub fn new<E>(connector: &C, encode: E) -> Result<Self, QueueError>
    where
        E: Fn(&D, &mut dyn io::Write) -> io::Result<()> + Send + Sync + 'static,
    {
        Ok(Self {
            producer: connector.producer()?,
            encode: Box::new(encode),
        })
    }
}

impl<C: QueueConnector, D> MessageSource<FutureTimepoint, D> for ScheduleTask<C, D> {
    fn send(&self, message: ChannelMessage<FutureTimepoint, D>) -> Result<(), QueueError> {
        let (when, data) = message.into_parts();

        self.producer.send(
            |factory| {
                let mut outgoing = factory.message(MessageKind::Durable)?;
                if let Some(when) = &when {
                    debug!(%when, "stamping scheduled delivery");
                    props::set_scheduled_delivery(&mut outgoing, when);
                }
                Ok(outgoing)
            },
            |body| (self.encode)(&data, body),
        )
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
