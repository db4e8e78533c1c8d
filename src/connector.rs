//! Provider SPI: the surface a broker adapter implements.

use crate::error::QueueError;
use crate::props::MessageProps;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io;
use std::str::FromStr;

/// Persistence kind selected when a new provider message is created.
///
/// Non-exhaustive so adapter crates must keep an explicit rejection arm
/// (`QueueError::UnsupportedMessageKind`) for kinds they do not understand
/// instead of silently defaulting to one they do.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// Message survives a broker restart
    Durable,
    /// Message is lost on broker restart
    NonDurable,
}

impl MessageKind {
    /// Whether messages of this kind survive a broker restart
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Durable)
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Durable => write!(f, "durable"),
            Self::NonDurable => write!(f, "non-durable"),
        }
    }
}

impl FromStr for MessageKind {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "durable" => Ok(Self::Durable),
            "non-durable" => Ok(Self::NonDurable),
            other => Err(QueueError::UnsupportedMessageKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// Handler invoked by a provider's delivery thread for each received
/// message, paired with the message's payload bytes.
///
/// Handler failures are the provider's concern; this crate's in-memory
/// provider logs them and keeps delivering.
pub type MessageHandler<M> = Box<dyn FnMut(M, Bytes) -> Result<(), QueueError> + Send>;

/// Factory for new outgoing provider messages.
///
/// Message creation touches the shared session, so implementations run it
/// through their session synchronizer.
pub trait MessageFactory {
    type Message: MessageProps;

    /// Create a new, empty message of the given kind
    fn message(&self, kind: MessageKind) -> Result<Self::Message, QueueError>;
}

/// Access to one queue over a shared broker session.
///
/// A connector is bound to a queue and its producer-side address, both of
/// which must already exist on the broker. Registering consumers and
/// browsers and creating producers mutates the session's resource set, so
/// all three operations run through the session synchronizer. Provider
/// failures surface as [`QueueError::Provider`].
pub trait QueueConnector {
    type Message: MessageProps;
    type Producer: QueueProducer<Message = Self::Message>;
    type Consumer: QueueConsumer;

    /// Register a receive-and-remove consumer on the bound queue
    fn consumer(
        &self,
        handler: MessageHandler<Self::Message>,
    ) -> Result<Self::Consumer, QueueError>;

    /// Register a browser on the bound queue: messages are delivered but
    /// never removed
    fn browser(
        &self,
        handler: MessageHandler<Self::Message>,
    ) -> Result<Self::Consumer, QueueError>;

    /// Create a producer sending to the bound address
    fn producer(&self) -> Result<Self::Producer, QueueError>;
}

/// Sending half of a queue channel at the provider level.
pub trait QueueProducer {
    type Message: MessageProps;

    /// Build and send one message.
    ///
    /// `build` receives the message factory and returns the fully-addressed
    /// message: create it, then stamp its properties. `write` streams the
    /// payload into the message body. The ordering per message is fixed:
    /// property mutation, then body write, then the send itself, which runs
    /// through the session synchronizer.
    fn send(
        &self,
        build: impl FnOnce(
            &dyn MessageFactory<Message = Self::Message>,
        ) -> Result<Self::Message, QueueError>,
        write: impl FnOnce(&mut dyn io::Write) -> io::Result<()>,
    ) -> Result<(), QueueError>;
}

/// Handle for a registered consumer or browser.
pub trait QueueConsumer {
    /// Stop delivery and release the registration.
    ///
    /// Runs through the session synchronizer. An in-flight delivery
    /// completes; no new delivery begins after this returns. Closing twice
    /// is a no-op.
    fn close(&mut self) -> Result<(), QueueError>;
}

#[cfg(test)]
#[path = "connector_tests.rs"]
mod tests;
