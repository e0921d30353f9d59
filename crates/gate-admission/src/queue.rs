//! Priority-ordered waiting list for denied execution requests.
//!
//! Entries are ordered priority-major, FIFO-minor: a new entry is inserted
//! immediately before the first existing entry of strictly lower priority,
//! so entries at the same priority keep their arrival order.
//!
//! # Known Limitation
//!
//! A continuous stream of high-priority requests can indefinitely delay a
//! low-priority entry until it ages out via [`AdmissionQueue::evict_stale`].
//! There is no anti-starvation logic.
//!
//! # Examples
//!
//! ```
//! use gate_admission::queue::{AdmissionQueue, QueueEntry};
//! use gate_core::{ExecutionId, FunctionName, PluginId, Priority};
//!
//! let mut queue = AdmissionQueue::new();
//! queue.enqueue(QueueEntry::new(
//!     ExecutionId::generate(),
//!     PluginId::new("p1"),
//!     FunctionName::new("run"),
//!     Priority::Low,
//! ));
//! queue.enqueue(QueueEntry::new(
//!     ExecutionId::generate(),
//!     PluginId::new("p2"),
//!     FunctionName::new("run"),
//!     Priority::High,
//! ));
//!
//! // High priority drains first despite arriving later
//! let head = queue.dequeue_next().unwrap();
//! assert_eq!(head.plugin_id.as_str(), "p2");
//! ```

use gate_core::{ExecutionId, FunctionName, PluginId, Priority};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A deferred execution request waiting for a slot to free up.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    /// Execution id handed to the caller at request time; reused when the
    /// entry is promoted to an active execution.
    pub id: ExecutionId,
    /// Plugin whose function will run.
    pub plugin_id: PluginId,
    /// Function the caller wants to execute.
    pub function_name: FunctionName,
    /// Priority tier used for queue ordering.
    pub priority: Priority,
    /// When the entry joined the queue.
    pub queued_at: Instant,
}

impl QueueEntry {
    /// Creates an entry queued now.
    #[must_use]
    pub fn new(
        id: ExecutionId,
        plugin_id: PluginId,
        function_name: FunctionName,
        priority: Priority,
    ) -> Self {
        Self {
            id,
            plugin_id,
            function_name,
            priority,
            queued_at: Instant::now(),
        }
    }

    /// Returns how long the entry has been waiting.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.queued_at.elapsed()
    }
}

/// Priority queue of execution requests not yet admitted.
///
/// Owned exclusively by the admission controller; all mutation goes through
/// the methods below.
#[derive(Debug, Default)]
pub struct AdmissionQueue {
    entries: VecDeque<QueueEntry>,
}

impl AdmissionQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Inserts an entry at its priority position.
    ///
    /// The entry lands immediately before the first existing entry of
    /// strictly lower rank, or at the tail if none exists. This keeps FIFO
    /// order within a priority tier.
    pub fn enqueue(&mut self, entry: QueueEntry) {
        let rank = entry.priority.rank();
        let position = self
            .entries
            .iter()
            .position(|existing| existing.priority.rank() < rank);
        match position {
            Some(index) => self.entries.insert(index, entry),
            None => self.entries.push_back(entry),
        }
    }

    /// Pops the head entry: highest priority, oldest within its tier.
    pub fn dequeue_next(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Removes entries older than `max_age` without admitting them.
    ///
    /// Callers must treat eviction as an implicit rejection; the return
    /// value makes the removal observable.
    pub fn evict_stale(&mut self, max_age: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.age() <= max_age);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!("Evicted {evicted} stale queue entries (max age {max_age:?})");
        }
        evicted
    }

    /// Returns the number of waiting entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entries are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
