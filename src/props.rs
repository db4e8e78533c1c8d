//! Message property bag contract and the reserved keys schedule-aware
//! components rely on.

use crate::message::{FutureTimepoint, Timestamp};
use crate::schedule::ScheduleCount;

#[cfg(test)]
use mockall::automock;

/// Reserved property key carrying the schedule count.
///
/// The value is an i64 and is >= 1 whenever the key is present.
pub const SCHEDULE_COUNT: &str = "x-schedule-count";

/// Reserved header key carrying the scheduled-delivery instant as
/// milliseconds since the Unix epoch (i64).
pub const SCHEDULED_DELIVERY_TIME: &str = "x-scheduled-delivery-time";

/// Mutable key/value property bag scoped to one provider message.
///
/// Provider message types implement this over their native message
/// properties and translate the reserved keys above to whatever their broker
/// uses for the same purpose. A bag is created by a message factory, mutated
/// on the send path before the message leaves the producer, and read-only by
/// convention on the receive side. Looking up a key that was never stored
/// yields `None`; substituting defaults is the caller's policy, never the
/// bag's.
#[cfg_attr(test, automock)]
pub trait MessageProps {
    /// Store a string property, overwriting any previous value for the key
    fn put_string(&mut self, key: &str, value: &str);

    /// Store an integer property, overwriting any previous value for the key
    fn put_long(&mut self, key: &str, value: i64);

    /// Whether any property is stored under the key
    fn contains_prop(&self, key: &str) -> bool;

    /// Look up a string property
    fn string_prop(&self, key: &str) -> Option<String>;

    /// Look up an integer property
    fn long_prop(&self, key: &str) -> Option<i64>;
}

/// Stamp the scheduled-delivery header with the resolved instant of `when`
pub fn set_scheduled_delivery<P: MessageProps + ?Sized>(message: &mut P, when: &FutureTimepoint) {
    message.put_long(SCHEDULED_DELIVERY_TIME, when.get().epoch_millis());
}

/// Read back the scheduled-delivery header, if stamped
pub fn scheduled_delivery<P: MessageProps + ?Sized>(message: &P) -> Option<Timestamp> {
    message
        .long_prop(SCHEDULED_DELIVERY_TIME)
        .and_then(Timestamp::from_epoch_millis)
}

/// Stamp the schedule-count property
pub fn set_schedule_count<P: MessageProps + ?Sized>(message: &mut P, count: &ScheduleCount) {
    message.put_long(SCHEDULE_COUNT, count.get());
}

/// Read back the raw schedule-count property, if present.
///
/// The value is not validated here; mapping it into a [`ScheduleCount`] is
/// the receive side's job.
pub fn schedule_count<P: MessageProps + ?Sized>(message: &P) -> Option<i64> {
    message.long_prop(SCHEDULE_COUNT)
}

#[cfg(test)]
#[path = "props_tests.rs"]
mod tests;
