//! Message types for queue channels including core domain identifiers.

use crate::error::ValidationError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated queue name with length and character restrictions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueName(String);

impl QueueName {
    /// Create new queue name with validation
    pub fn new(name: String) -> Result<Self, ValidationError> {
        // Validate length
        if name.is_empty() || name.len() > 260 {
            return Err(ValidationError::OutOfRange {
                field: "queue_name".to_string(),
                message: "must be 1-260 characters".to_string(),
            });
        }

        // Validate characters (ASCII alphanumeric, hyphens, underscores)
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "only ASCII alphanumeric, hyphens, and underscores allowed".to_string(),
            });
        }

        // Validate no consecutive hyphens or leading/trailing hyphens
        if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "no leading/trailing hyphens or consecutive hyphens".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get queue name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Binding of a consumer-side queue to the producer-side address brokers
/// route sends through. Several queues may bind the same address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueBinding {
    name: QueueName,
    address: QueueName,
}

impl QueueBinding {
    /// Bind a queue to the address producers send to
    pub fn new(name: QueueName, address: QueueName) -> Self {
        Self { name, address }
    }

    /// The common case where the address is the queue name itself
    pub fn direct(name: QueueName) -> Self {
        Self {
            address: name.clone(),
            name,
        }
    }

    /// Consumer-side queue name
    pub fn name(&self) -> &QueueName {
        &self.name
    }

    /// Producer-side address
    pub fn address(&self) -> &QueueName {
        &self.address
    }
}

/// Unique identifier for messages within the queue system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Generate new random message ID
    pub fn new() -> Self {
        let id = uuid::Uuid::new_v4();
        Self(id.to_string())
    }

    /// Get message ID as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "message_id".to_string(),
            });
        }

        Ok(Self(s.to_string()))
    }
}

// ============================================================================
// Time
// ============================================================================

/// Timestamp wrapper for consistent time handling
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current time
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create timestamp from DateTime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Create timestamp from milliseconds since the Unix epoch
    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp_millis(millis).map(Self)
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Milliseconds since the Unix epoch, as carried in scheduling headers
    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dt = s.parse::<DateTime<Utc>>()?;
        Ok(Self::from_datetime(dt))
    }
}

/// A point in the future, resolved against the wall clock when constructed
/// and stable thereafter.
///
/// Two timepoints built in sequence never run backwards relative to each
/// other as long as the wall clock itself does not.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FutureTimepoint(Timestamp);

impl FutureTimepoint {
    /// The zero-offset timepoint: effectively right now
    pub fn now() -> Self {
        Self(Timestamp::now())
    }

    /// The timepoint `offset` from now
    pub fn from_now(offset: Duration) -> Self {
        Self(Timestamp::from_datetime(Utc::now() + offset))
    }

    /// Wrap an absolute instant
    pub fn at(when: Timestamp) -> Self {
        Self(when)
    }

    /// The resolved instant
    pub fn get(&self) -> Timestamp {
        self.0.clone()
    }
}

impl std::fmt::Display for FutureTimepoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Channel Messages
// ============================================================================

/// An immutable metadata/data pair travelling through a queue channel.
///
/// `data` is always present; `metadata` is optional. On the send side the
/// metadata slot typically carries scheduling information, on the receive
/// side the raw provider message. Equality and hashing are structural over
/// both slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelMessage<M, D> {
    metadata: Option<M>,
    data: D,
}

impl<M, D> ChannelMessage<M, D> {
    /// Create a message carrying only data
    pub fn new(data: D) -> Self {
        Self {
            metadata: None,
            data,
        }
    }

    /// Create a message carrying metadata alongside its data
    pub fn with_metadata(metadata: M, data: D) -> Self {
        Self {
            metadata: Some(metadata),
            data,
        }
    }

    /// The metadata, if any was attached
    pub fn metadata(&self) -> Option<&M> {
        self.metadata.as_ref()
    }

    /// The message data
    pub fn data(&self) -> &D {
        &self.data
    }

    /// Split into metadata and data
    pub fn into_parts(self) -> (Option<M>, D) {
        (self.metadata, self.data)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
