//! # Queue Channel
//!
//! Provider-agnostic queue channel abstraction over message brokers, with
//! scheduled delivery, retry counting, and an in-memory provider.
//!
//! This library provides:
//! - Typed channel messages pairing optional metadata with a data payload
//! - Reserved headers for scheduled delivery and schedule counts
//! - A provider SPI covering connectors, producers, consumers, and message
//!   factories
//! - Session synchronization for providers whose sessions are single-threaded
//! - An in-memory broker for tests and development
//!
//! ## Module Organization
//!
//! - [channel] - Typed message sink and source contracts
//! - [connector] - Provider SPI for broker adapters
//! - [error] - Error types for all channel operations
//! - [message] - Message structures, queue names, and timepoints
//! - [props] - Message property bag and reserved keys
//! - [providers] - Provider implementations
//! - [schedule] - Schedule counts, schedule metadata, and the schedule task
//! - [session] - Session synchronization

// Module declarations
pub mod channel;
pub mod connector;
pub mod error;
pub mod message;
pub mod props;
pub mod providers;
pub mod schedule;
pub mod session;

// Re-export commonly used types at crate root for convenience
pub use channel::{MessageSink, MessageSource};
pub use connector::{
    MessageFactory, MessageHandler, MessageKind, QueueConnector, QueueConsumer, QueueProducer,
};
pub use error::{QueueError, ValidationError};
pub use message::{ChannelMessage, FutureTimepoint, MessageId, QueueBinding, QueueName, Timestamp};
pub use props::MessageProps;
pub use schedule::{CountedSchedule, CountedScheduleSink, ScheduleCount, ScheduleTask};
pub use session::SessionSynchronizer;
