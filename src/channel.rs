//! Named, bounded subscriptions to structured log records.
//!
//! Each subscription is a FIFO queue with a fixed capacity. When the emitter
//! finds a queue full it evicts the single oldest record and enqueues the new
//! one, inside one critical section, so the emitter never waits for a slow
//! consumer and a consumer that falls behind sees the most recent records in
//! emission order.
//!
//! ```
//! use fanout_logger::{channel::ChannelRegistry, Level, LogRecord};
//!
//! let registry = ChannelRegistry::new(100);
//! let sub = registry.subscribe_with_capacity("audit", 2);
//! for msg in ["a", "b", "c"] {
//!     registry.broadcast(LogRecord::new(Level::Info, msg, "App"));
//! }
//! let seen: Vec<String> = sub.drain().iter().map(|r| r.message().to_owned()).collect();
//! assert_eq!(seen, ["b", "c"]);
//! assert_eq!(sub.dropped(), 1);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, warn};

use crate::record::LogRecord;

/// Capacity used when neither the caller nor the configuration gives one.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

struct QueueState {
    records: VecDeque<Arc<LogRecord>>,
    closed: bool,
}

struct ChannelQueue {
    name: String,
    capacity: usize,
    state: Mutex<QueueState>,
    available: Condvar,
    dropped: AtomicU64,
}

/// What happened to a record offered to one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Offer {
    Queued,
    EvictedOldest,
    Closed,
}

impl ChannelQueue {
    fn new(name: &str, capacity: usize) -> Self {
        Self {
            name: name.to_owned(),
            capacity,
            state: Mutex::new(QueueState {
                records: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            available: Condvar::new(),
            dropped: AtomicU64::new(0),
        }
    }

    fn offer(&self, record: Arc<LogRecord>) -> Offer {
        let mut state = self.state.lock();
        if state.closed {
            return Offer::Closed;
        }

        let outcome = if state.records.len() >= self.capacity {
            state.records.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
            Offer::EvictedOldest
        } else {
            Offer::Queued
        };
        state.records.push_back(record);
        drop(state);

        self.available.notify_one();
        outcome
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.records.clear();
        self.available.notify_all();
    }
}

/// A consumer's view of one named channel.
///
/// Handles are cheap to clone; clones share the same queue, so each record
/// is received by exactly one of them. Once the channel is unsubscribed,
/// buffered records are discarded and every receive reports end-of-stream.
#[derive(Clone)]
pub struct Subscription {
    queue: Arc<ChannelQueue>,
}

impl Subscription {
    pub fn name(&self) -> &str {
        &self.queue.name
    }

    /// Fixed capacity chosen when the channel was created.
    pub fn capacity(&self) -> usize {
        self.queue.capacity
    }

    /// Records currently buffered.
    pub fn len(&self) -> usize {
        self.queue.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records evicted from this channel to make room for newer ones.
    pub fn dropped(&self) -> u64 {
        self.queue.dropped.load(Ordering::Relaxed)
    }

    /// Whether the channel has been unsubscribed.
    pub fn is_closed(&self) -> bool {
        self.queue.state.lock().closed
    }

    /// Takes the oldest buffered record without waiting.
    pub fn try_recv(&self) -> Option<Arc<LogRecord>> {
        self.queue.state.lock().records.pop_front()
    }

    /// Waits for the next record. Returns `None` once the channel is closed.
    pub fn recv(&self) -> Option<Arc<LogRecord>> {
        let mut state = self.queue.state.lock();
        loop {
            if let Some(record) = state.records.pop_front() {
                return Some(record);
            }
            if state.closed {
                return None;
            }
            self.queue.available.wait(&mut state);
        }
    }

    /// Waits up to `timeout` for the next record.
    ///
    /// Returns `None` on timeout or when the channel is closed; use
    /// [`is_closed`](Self::is_closed) to tell the two apart. A timeout too
    /// large to express as a deadline behaves like [`recv`](Self::recv).
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Arc<LogRecord>> {
        let deadline = match Instant::now().checked_add(timeout) {
            Some(deadline) => deadline,
            None => return self.recv(),
        };
        let mut state = self.queue.state.lock();
        loop {
            if let Some(record) = state.records.pop_front() {
                return Some(record);
            }
            if state.closed {
                return None;
            }
            if self.queue.available.wait_until(&mut state, deadline).timed_out() {
                return state.records.pop_front();
            }
        }
    }

    /// Takes every buffered record, oldest first, without waiting.
    pub fn drain(&self) -> Vec<Arc<LogRecord>> {
        self.queue.state.lock().records.drain(..).collect()
    }

    /// Blocking iterator over records that ends when the channel is closed.
    pub fn iter(&self) -> Iter<'_> {
        Iter { sub: self }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.queue.name)
            .field("capacity", &self.queue.capacity)
            .field("dropped", &self.dropped())
            .finish()
    }
}

/// Iterator returned by [`Subscription::iter`].
pub struct Iter<'a> {
    sub: &'a Subscription,
}

impl Iterator for Iter<'_> {
    type Item = Arc<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.sub.recv()
    }
}

impl<'a> IntoIterator for &'a Subscription {
    type Item = Arc<LogRecord>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Map from channel name to its queue.
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, Arc<ChannelQueue>>>,
    default_capacity: AtomicUsize,
}

impl ChannelRegistry {
    /// Creates an empty registry. A `default_capacity` of zero selects
    /// [`DEFAULT_CHANNEL_CAPACITY`].
    pub fn new(default_capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            default_capacity: AtomicUsize::new(normalize(default_capacity)),
        }
    }

    /// Sets the capacity used by future subscriptions made without one.
    pub fn set_default_capacity(&self, capacity: usize) {
        self.default_capacity.store(normalize(capacity), Ordering::Relaxed);
    }

    pub fn default_capacity(&self) -> usize {
        self.default_capacity.load(Ordering::Relaxed)
    }

    /// Returns the channel `name`, creating it with the default capacity.
    pub fn subscribe(&self, name: &str) -> Subscription {
        self.subscribe_with_capacity(name, 0)
    }

    /// Returns the channel `name`, creating it with `capacity` if needed.
    ///
    /// An existing channel keeps its original capacity. A `capacity` of zero
    /// selects the registry default.
    pub fn subscribe_with_capacity(&self, name: &str, capacity: usize) -> Subscription {
        if let Some(queue) = self.channels.read().get(name) {
            return Subscription {
                queue: Arc::clone(queue),
            };
        }

        let capacity = if capacity == 0 {
            self.default_capacity()
        } else {
            capacity
        };

        let mut channels = self.channels.write();
        let queue = channels.entry(name.to_owned()).or_insert_with(|| {
            debug!(channel = name, capacity, "channel created");
            Arc::new(ChannelQueue::new(name, capacity))
        });
        Subscription {
            queue: Arc::clone(queue),
        }
    }

    /// Removes the channel `name`, discarding anything still buffered.
    ///
    /// Unknown names are ignored.
    pub fn unsubscribe(&self, name: &str) {
        let removed = self.channels.write().remove(name);
        if let Some(queue) = removed {
            queue.close();
            debug!(channel = name, "channel removed");
        }
    }

    /// Offers `record` to every channel without waiting on any consumer.
    pub fn broadcast(&self, record: LogRecord) {
        let channels = self.channels.read();
        if channels.is_empty() {
            return;
        }

        let record = Arc::new(record);
        for (name, queue) in channels.iter() {
            if queue.offer(Arc::clone(&record)) == Offer::Closed {
                warn!(channel = name.as_str(), "channel closed during broadcast, record lost");
            }
        }
    }

    /// Names of all registered channels, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

fn normalize(capacity: usize) -> usize {
    if capacity == 0 {
        DEFAULT_CHANNEL_CAPACITY
    } else {
        capacity
    }
}
