//! Process-local publish/subscribe of pipeline stage transitions

use crate::types::{ProgressEvent, ProgressStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::trace;

pub type ProgressListener = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Handle returned by [`ProgressBroadcaster::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Holds the current progress snapshot and notifies listeners synchronously
///
/// Publishes are serialized, so the snapshot is always the last event every
/// listener saw. A listener must not publish on the broadcaster that called it.
pub struct ProgressBroadcaster {
    current: RwLock<ProgressEvent>,
    listeners: RwLock<Vec<(ListenerId, ProgressListener)>>,
    publishing: Mutex<()>,
    next_id: AtomicU64,
}

impl ProgressBroadcaster {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(ProgressEvent::default()),
            listeners: RwLock::new(Vec::new()),
            publishing: Mutex::new(()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns false when the id was not registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Replace the snapshot and notify every listener with it
    pub fn publish(&self, event: ProgressEvent) {
        trace!(status = %event.status(), message = ?event.message(), "progress");

        let _publishing = self.publishing.lock().unwrap_or_else(|e| e.into_inner());
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = event.clone();

        // Snapshot so listeners may add or remove listeners re-entrantly
        let listeners: Vec<ProgressListener> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(&event);
        }
    }

    /// Shorthand for publishing a bare status with a message
    pub fn update(&self, status: ProgressStatus, message: impl Into<String>) {
        self.publish(ProgressEvent::new(status).with_message(message));
    }

    pub fn current(&self) -> ProgressEvent {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn status(&self) -> ProgressStatus {
        self.current.read().unwrap_or_else(|e| e.into_inner()).status()
    }
}

impl Default for ProgressBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProgressBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressBroadcaster")
            .field("status", &self.status())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
