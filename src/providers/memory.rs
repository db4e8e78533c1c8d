//! In-memory queue provider for testing and development.
//!
//! This module provides a fully functional in-memory implementation of the
//! provider SPI that:
//! - routes sends through address bindings, including fan-out to several
//!   queues bound to one address
//! - honors the reserved scheduled-delivery header
//! - delivers to consumers and browsers from per-registration threads
//!
//! This provider is intended for:
//! - Unit testing of channel components
//! - Development and prototyping
//! - Reference implementation for broker adapters

use crate::connector::{
    MessageFactory, MessageHandler, MessageKind, QueueConnector, QueueConsumer, QueueProducer,
};
use crate::error::QueueError;
use crate::message::{MessageId, QueueBinding, QueueName, Timestamp};
use crate::props::{self, MessageProps};
use crate::session::SessionSynchronizer;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

// ============================================================================
// Provider Messages
// ============================================================================

/// Typed property value stored on an in-memory message
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(String),
    Long(i64),
}

/// Provider message for the in-memory broker.
///
/// The persistence kind is stamped but carries no storage semantics here;
/// delivery guarantees are a real broker's concern.
#[derive(Debug, Clone)]
pub struct MemoryMessage {
    id: MessageId,
    kind: MessageKind,
    props: HashMap<String, PropValue>,
}

impl MemoryMessage {
    fn new(kind: MessageKind) -> Self {
        Self {
            id: MessageId::new(),
            kind,
            props: HashMap::new(),
        }
    }

    /// Stable identifier stamped at creation
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Persistence kind the message was created with
    pub fn kind(&self) -> MessageKind {
        self.kind
    }
}

impl MessageProps for MemoryMessage {
    fn put_string(&mut self, key: &str, value: &str) {
        self.props
            .insert(key.to_string(), PropValue::Str(value.to_string()));
    }

    fn put_long(&mut self, key: &str, value: i64) {
        self.props.insert(key.to_string(), PropValue::Long(value));
    }

    fn contains_prop(&self, key: &str) -> bool {
        self.props.contains_key(key)
    }

    fn string_prop(&self, key: &str) -> Option<String> {
        match self.props.get(key) {
            Some(PropValue::Str(value)) => Some(value.clone()),
            _ => None,
        }
    }

    fn long_prop(&self, key: &str) -> Option<i64> {
        match self.props.get(key) {
            Some(PropValue::Long(value)) => Some(*value),
            _ => None,
        }
    }
}

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// A message at rest in a queue
#[derive(Clone)]
struct StoredMessage {
    seq: u64,
    message: MemoryMessage,
    body: Bytes,
    available_at: Timestamp,
}

impl StoredMessage {
    /// Check if the scheduled-delivery time has passed
    fn is_available(&self) -> bool {
        Timestamp::now() >= self.available_at
    }
}

/// State of a single declared queue
#[derive(Default)]
struct QueueState {
    pending: VecDeque<StoredMessage>,
}

/// Shared broker state: declared queues and address bindings
struct BrokerState {
    queues: HashMap<QueueName, QueueState>,
    bindings: HashMap<QueueName, Vec<QueueName>>,
    next_seq: u64,
}

struct Shared {
    state: Mutex<BrokerState>,
    delivery: Condvar,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration mode for delivery threads
#[derive(Debug, Clone, Copy)]
enum DeliveryMode {
    Consume,
    Browse,
}

// ============================================================================
// MemoryBroker
// ============================================================================

/// In-memory broker shared by the connectors opened against it.
///
/// Cloning yields another handle to the same broker.
#[derive(Clone)]
pub struct MemoryBroker {
    shared: Arc<Shared>,
}

impl MemoryBroker {
    /// Create an empty broker with no declared queues
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(BrokerState {
                    queues: HashMap::new(),
                    bindings: HashMap::new(),
                    next_seq: 0,
                }),
                delivery: Condvar::new(),
            }),
        }
    }

    /// Declare a queue and bind it under its address.
    ///
    /// Redeclaring is idempotent; declaring an existing queue under a second
    /// address adds another route to it.
    pub fn declare_queue(&self, binding: &QueueBinding) {
        let mut state = self.shared.lock_state();

        state.queues.entry(binding.name().clone()).or_default();

        let bound = state.bindings.entry(binding.address().clone()).or_default();
        if !bound.contains(binding.name()) {
            bound.push(binding.name().clone());
        }

        info!(queue = %binding.name(), address = %binding.address(), "queue declared");
    }

    /// Open a connector against a declared queue.
    ///
    /// The connector owns a fresh session; everything created from it shares
    /// that session's synchronizer. Fails if the queue or its address has
    /// not been declared.
    pub fn connector(&self, binding: &QueueBinding) -> Result<MemoryConnector, QueueError> {
        let state = self.shared.lock_state();

        if !state.queues.contains_key(binding.name()) {
            return Err(QueueError::QueueNotFound {
                queue: binding.name().to_string(),
            });
        }
        if !state.bindings.contains_key(binding.address()) {
            return Err(QueueError::QueueNotFound {
                queue: binding.address().to_string(),
            });
        }
        drop(state);

        debug!(queue = %binding.name(), "connector opened");
        Ok(MemoryConnector {
            binding: binding.clone(),
            shared: Arc::clone(&self.shared),
            synchronizer: Arc::new(SessionSynchronizer::new()),
        })
    }

    /// Number of messages currently at rest in a queue, or `None` if the
    /// queue was never declared
    pub fn pending_count(&self, queue: &QueueName) -> Option<usize> {
        let state = self.shared.lock_state();
        state.queues.get(queue).map(|q| q.pending.len())
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MemoryConnector
// ============================================================================

/// Connector over one queue of a [`MemoryBroker`].
#[derive(Clone)]
pub struct MemoryConnector {
    binding: QueueBinding,
    shared: Arc<Shared>,
    synchronizer: Arc<SessionSynchronizer>,
}

impl MemoryConnector {
    /// The binding this connector was opened against
    pub fn binding(&self) -> &QueueBinding {
        &self.binding
    }

    /// The synchronizer guarding this connector's session
    pub fn synchronizer(&self) -> &Arc<SessionSynchronizer> {
        &self.synchronizer
    }

    fn spawn_delivery(
        &self,
        mode: DeliveryMode,
        handler: MessageHandler<MemoryMessage>,
    ) -> Result<MemoryConsumer, QueueError> {
        self.synchronizer.atomically(|| {
            let state = self.shared.lock_state();
            if !state.queues.contains_key(self.binding.name()) {
                return Err(QueueError::QueueNotFound {
                    queue: self.binding.name().to_string(),
                });
            }
            drop(state);

            let stop = Arc::new(AtomicBool::new(false));
            let thread = {
                let shared = Arc::clone(&self.shared);
                let queue = self.binding.name().clone();
                let stop = Arc::clone(&stop);
                thread::spawn(move || run_delivery(shared, queue, mode, handler, stop))
            };

            info!(queue = %self.binding.name(), ?mode, "delivery registered");
            Ok(MemoryConsumer {
                queue: self.binding.name().clone(),
                stop,
                thread: Some(thread),
                shared: Arc::clone(&self.shared),
                synchronizer: Arc::clone(&self.synchronizer),
            })
        })
    }

    fn route(&self, message: MemoryMessage, body: Bytes) -> Result<(), QueueError> {
        let available_at = props::scheduled_delivery(&message).unwrap_or_else(Timestamp::now);
        let mut state = self.shared.lock_state();

        let bound = match state.bindings.get(self.binding.address()) {
            Some(bound) => bound.clone(),
            None => {
                return Err(QueueError::QueueNotFound {
                    queue: self.binding.address().to_string(),
                })
            }
        };

        debug!(
            message_id = %message.id(),
            address = %self.binding.address(),
            queues = bound.len(),
            "message routed"
        );

        for queue in bound {
            let seq = state.next_seq;
            state.next_seq += 1;

            if let Some(q) = state.queues.get_mut(&queue) {
                q.pending.push_back(StoredMessage {
                    seq,
                    message: message.clone(),
                    body: body.clone(),
                    available_at: available_at.clone(),
                });
            }
        }

        self.shared.delivery.notify_all();
        Ok(())
    }
}

impl MessageFactory for MemoryConnector {
    type Message = MemoryMessage;

    fn message(&self, kind: MessageKind) -> Result<MemoryMessage, QueueError> {
        self.synchronizer.atomically(|| Ok(MemoryMessage::new(kind)))
    }
}

impl QueueConnector for MemoryConnector {
    type Message = MemoryMessage;
    type Producer = MemoryProducer;
    type Consumer = MemoryConsumer;

    fn consumer(
        &self,
        handler: MessageHandler<MemoryMessage>,
    ) -> Result<MemoryConsumer, QueueError> {
        self.spawn_delivery(DeliveryMode::Consume, handler)
    }

    fn browser(
        &self,
        handler: MessageHandler<MemoryMessage>,
    ) -> Result<MemoryConsumer, QueueError> {
        self.spawn_delivery(DeliveryMode::Browse, handler)
    }

    fn producer(&self) -> Result<MemoryProducer, QueueError> {
        self.synchronizer.atomically(|| {
            let state = self.shared.lock_state();
            if !state.bindings.contains_key(self.binding.address()) {
                return Err(QueueError::QueueNotFound {
                    queue: self.binding.address().to_string(),
                });
            }
            drop(state);

            Ok(MemoryProducer {
                connector: self.clone(),
            })
        })
    }
}

// ============================================================================
// MemoryProducer
// ============================================================================

/// Producer sending to the address its connector is bound to.
pub struct MemoryProducer {
    connector: MemoryConnector,
}

impl QueueProducer for MemoryProducer {
    type Message = MemoryMessage;

    fn send(
        &self,
        build: impl FnOnce(
            &dyn MessageFactory<Message = MemoryMessage>,
        ) -> Result<MemoryMessage, QueueError>,
        write: impl FnOnce(&mut dyn io::Write) -> io::Result<()>,
    ) -> Result<(), QueueError> {
        let message = build(&self.connector)?;

        let mut body = Vec::new();
        write(&mut body)?;
        let body = Bytes::from(body);

        self.connector
            .synchronizer
            .atomically(|| self.connector.route(message, body))
    }
}

// ============================================================================
// MemoryConsumer
// ============================================================================

/// Handle for a registered in-memory consumer or browser.
///
/// Dropping the handle closes it best-effort; call [`close`](Self::close)
/// for the checked path. `close` must not be called from inside the
/// consumer's own handler.
pub struct MemoryConsumer {
    queue: QueueName,
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
    shared: Arc<Shared>,
    synchronizer: Arc<SessionSynchronizer>,
}

impl QueueConsumer for MemoryConsumer {
    fn close(&mut self) -> Result<(), QueueError> {
        let thread = match self.thread.take() {
            Some(thread) => thread,
            None => return Ok(()),
        };

        self.synchronizer.atomically(|| {
            self.stop.store(true, Ordering::SeqCst);
            self.shared.delivery.notify_all();
            Ok::<_, QueueError>(())
        })?;

        // Join outside the gate; the delivery thread may be mid-handler
        if thread.join().is_err() {
            error!(queue = %self.queue, "delivery thread panicked");
        }

        info!(queue = %self.queue, "consumer closed");
        Ok(())
    }
}

impl Drop for MemoryConsumer {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

// ============================================================================
// Delivery Loop
// ============================================================================

fn run_delivery(
    shared: Arc<Shared>,
    queue: QueueName,
    mode: DeliveryMode,
    mut handler: MessageHandler<MemoryMessage>,
    stop: Arc<AtomicBool>,
) {
    // Browsers walk the queue by sequence number without removing anything
    let mut cursor = 0u64;
    let mut state = shared.lock_state();

    loop {
        if stop.load(Ordering::SeqCst) {
            break;
        }

        let next = match mode {
            DeliveryMode::Consume => take_available(&mut state, &queue),
            DeliveryMode::Browse => peek_after(&state, &queue, &mut cursor),
        };

        match next {
            Some(stored) => {
                // The handler runs outside the store lock so it can send,
                // consume, or take its time without stalling the broker
                drop(state);

                debug!(queue = %queue, message_id = %stored.message.id(), "delivering message");
                if let Err(e) = handler(stored.message, stored.body) {
                    error!(queue = %queue, error = %e, "message handler failed");
                }

                state = shared.lock_state();
            }
            None => {
                // Timed wait: scheduled messages become available by clock,
                // not by notification
                let (reacquired, _) = shared
                    .delivery
                    .wait_timeout(state, Duration::from_millis(20))
                    .unwrap_or_else(PoisonError::into_inner);
                state = reacquired;
            }
        }
    }
}

fn take_available(state: &mut BrokerState, queue: &QueueName) -> Option<StoredMessage> {
    let q = state.queues.get_mut(queue)?;
    let idx = q.pending.iter().position(StoredMessage::is_available)?;
    q.pending.remove(idx)
}

/// Clone the first available message past the cursor, advancing it.
///
/// Browse follows arrival order; a message still held back by its schedule
/// when the cursor passes it is not revisited.
fn peek_after(state: &BrokerState, queue: &QueueName, cursor: &mut u64) -> Option<StoredMessage> {
    let q = state.queues.get(queue)?;
    let stored = q
        .pending
        .iter()
        .find(|m| m.seq >= *cursor && m.is_available())?;

    *cursor = stored.seq + 1;
    Some(stored.clone())
}
