//! AuditLogger - durable audit recording that never fails the pipeline.
//!
//! - The durable store is an injected `Arc<dyn AuditStore>`
//! - Events the store rejects wait in a bounded local buffer and are retried,
//!   in order, before every later write
//! - Overflow evicts the oldest buffered event and leaves one
//!   `AuditDegraded` marker per degradation episode
//! - Subscribers get every recorded event over `mpsc` channels

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{info, warn};
use voxroute_models::AuditEvent;
use voxroute_persistence::AuditStore;

use crate::error::Result;
use crate::filter::AuditFilter;

/// Default number of events held while the store is unreachable.
pub const DEFAULT_AUDIT_BUFFER: usize = 256;

// Room for the degradation marker plus one event.
const MIN_BUFFER: usize = 2;

/// Where a recorded event ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Appended to the durable store.
    Persisted,
    /// Held in the local buffer until the store recovers.
    Buffered,
}

#[derive(Debug)]
struct Buffer {
    events: VecDeque<AuditEvent>,
    capacity: usize,
    /// Index of this episode's degradation marker, while one is buffered.
    marker: Option<usize>,
    /// Events dropped in the current episode.
    dropped: usize,
    /// True from the first store failure until the buffer drains.
    degraded: bool,
    /// Whether this episode's marker was already created.
    marker_emitted: bool,
}

impl Buffer {
    fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(MIN_BUFFER),
            marker: None,
            dropped: 0,
            degraded: false,
            marker_emitted: false,
        }
    }

    /// Appends an event, evicting as needed. Returns the marker when this
    /// push started dropping events for the current episode.
    fn push(&mut self, event: AuditEvent) -> Option<AuditEvent> {
        let mut new_marker = None;

        while self.events.len() >= self.capacity {
            let Some(victim) = (0..self.events.len()).find(|i| Some(*i) != self.marker) else {
                break;
            };
            let evicted = self.events.remove(victim);
            if let Some(m) = self.marker.as_mut() {
                if *m > victim {
                    *m -= 1;
                }
            }
            self.dropped += 1;

            if let Some(marker) = self.marker.and_then(|m| self.events.get_mut(m)) {
                marker
                    .payload
                    .insert("dropped".to_string(), self.dropped.into());
            } else if !self.marker_emitted {
                // Takes the evicted slot, so it takes the evicted timestamp.
                let mut marker = AuditEvent::degraded(self.dropped, self.capacity);
                if let Some(evicted) = evicted {
                    marker.timestamp = evicted.timestamp;
                }
                self.events.insert(victim, marker.clone());
                self.marker = Some(victim);
                self.marker_emitted = true;
                new_marker = Some(marker);
            }
        }

        self.events.push_back(event);
        new_marker
    }

    /// Appends buffered events to the store in order until one fails.
    /// Returns the number flushed.
    fn drain_into(&mut self, store: &dyn AuditStore) -> usize {
        let mut flushed = 0;
        while let Some(front) = self.events.front() {
            if let Err(e) = store.append(front) {
                warn!(error = %e, pending = self.events.len(), "audit store still unavailable");
                break;
            }
            self.events.pop_front();
            self.marker = match self.marker {
                Some(0) => None,
                Some(m) => Some(m - 1),
                None => None,
            };
            flushed += 1;
        }
        flushed
    }

    /// Ends the degradation episode once everything has been flushed.
    fn settle(&mut self) {
        if self.events.is_empty() && self.degraded {
            info!(dropped = self.dropped, "audit store recovered, buffer drained");
            self.degraded = false;
            self.dropped = 0;
            self.marker = None;
            self.marker_emitted = false;
        }
    }
}

/// Records audit events without ever failing the caller.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use voxroute_events::{AuditLogger, RecordOutcome};
/// use voxroute_models::{AuditEvent, AuditEventType};
/// use voxroute_persistence::MemoryAuditStore;
///
/// let store = Arc::new(MemoryAuditStore::new());
/// let logger = AuditLogger::new(store.clone(), 16);
///
/// store.set_available(false);
/// let outcome = logger.record(AuditEvent::new(AuditEventType::Blocked));
/// assert_eq!(outcome, RecordOutcome::Buffered);
///
/// store.set_available(true);
/// assert_eq!(logger.flush_buffered(), 1);
/// assert_eq!(store.len(), 1);
/// ```
pub struct AuditLogger {
    store: Arc<dyn AuditStore>,
    buffer: Mutex<Buffer>,
    subscribers: RwLock<Vec<Sender<AuditEvent>>>,
}

impl AuditLogger {
    /// Creates a logger buffering at most `buffer_capacity` events.
    pub fn new(store: Arc<dyn AuditStore>, buffer_capacity: usize) -> Self {
        Self {
            store,
            buffer: Mutex::new(Buffer::new(buffer_capacity)),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribes to every recorded event, persisted or buffered.
    pub fn subscribe(&self) -> Receiver<AuditEvent> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subs) = self.subscribers.write() {
            subs.push(tx);
        }
        rx
    }

    fn broadcast(&self, event: &AuditEvent) {
        if let Ok(mut subs) = self.subscribers.write() {
            subs.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    /// Records an event.
    ///
    /// Buffered events are retried first so the durable log keeps timestamp
    /// order. If they cannot all be flushed, this event is buffered behind
    /// them.
    pub fn record(&self, event: AuditEvent) -> RecordOutcome {
        let mut buffer = match self.buffer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        buffer.drain_into(self.store.as_ref());

        let (outcome, marker) = if buffer.events.is_empty() {
            buffer.settle();
            match self.store.append(&event) {
                Ok(()) => (RecordOutcome::Persisted, None),
                Err(e) => {
                    warn!(event_type = %event.event_type, error = %e, "audit store unavailable, buffering");
                    buffer.degraded = true;
                    (RecordOutcome::Buffered, buffer.push(event.clone()))
                }
            }
        } else {
            (RecordOutcome::Buffered, buffer.push(event.clone()))
        };
        drop(buffer);

        if let Some(marker) = marker {
            warn!("audit buffer overflowed, dropping oldest events");
            self.broadcast(&marker);
        }
        self.broadcast(&event);
        outcome
    }

    /// Flushes buffered events to the store. Returns how many were written.
    pub fn flush_buffered(&self) -> usize {
        let mut buffer = match self.buffer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let flushed = buffer.drain_into(self.store.as_ref());
        buffer.settle();
        flushed
    }

    /// Number of events waiting in the local buffer.
    pub fn buffered_len(&self) -> usize {
        self.buffer.lock().map(|b| b.events.len()).unwrap_or(0)
    }

    /// True while a degradation episode is in progress.
    pub fn is_degraded(&self) -> bool {
        self.buffer.lock().map(|b| b.degraded).unwrap_or(true)
    }

    /// Reads the durable log back, oldest first, keeping matching events.
    ///
    /// Attempts a flush first so buffered events are included when the store
    /// is reachable again.
    pub fn replay(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>> {
        self.flush_buffered();
        let mut events: Vec<AuditEvent> = self
            .store
            .load()?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(events)
    }

    /// Counts terminal events recorded for a command.
    pub fn terminal_count(&self, command_id: &str) -> Result<usize> {
        let filter = AuditFilter::new().with_command_id(command_id).terminal_only();
        Ok(self.replay(&filter)?.len())
    }
}

#[cfg(test)]
mod tests;
