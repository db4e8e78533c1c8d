//! Send and receive contracts for typed queue channels.

use crate::error::QueueError;
use crate::message::ChannelMessage;

/// Receiving end of a typed channel.
///
/// A sink consumes metadata/data envelopes. Sinks compose: an adapter sink
/// such as [`CountedScheduleSink`](crate::schedule::CountedScheduleSink)
/// reshapes the envelope before forwarding it to the sink it wraps.
pub trait MessageSink<M, D> {
    /// Consume one envelope
    fn consume(&mut self, message: ChannelMessage<M, D>) -> Result<(), QueueError>;
}

/// Sending end of a typed channel.
///
/// `send` is the one required operation; the rest are conveniences layered
/// on it. The unchecked variants panic with the underlying error instead of
/// returning it, for call sites where a send failure is unrecoverable anyway
/// and per-call error plumbing is noise. What fails, and why, is identical
/// either way.
pub trait MessageSource<M, D> {
    /// Send one envelope
    fn send(&self, message: ChannelMessage<M, D>) -> Result<(), QueueError>;

    /// Send bare data, leaving the metadata slot empty
    fn send_data(&self, data: D) -> Result<(), QueueError> {
        self.send(ChannelMessage::new(data))
    }

    /// Send one envelope, panicking on failure
    fn send_unchecked(&self, message: ChannelMessage<M, D>) {
        if let Err(e) = self.send(message) {
            panic!("queue channel send failed: {e}");
        }
    }

    /// Send bare data, panicking on failure
    fn send_data_unchecked(&self, data: D) {
        if let Err(e) = self.send_data(data) {
            panic!("queue channel send failed: {e}");
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
