//! Delivery of auto-save notifications.
//!
//! Status and the last save time are folded into a [`StatusSignal`] held in a
//! `tokio::sync::watch` channel, so a late observer reads the current value
//! instead of replaying history. The events themselves go to registered
//! callbacks in publish order. A `StatusChanged` that would not move the
//! published status is dropped before delivery.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::types::SaveStatus;

use super::event::AutosaveEvent;

/// Returned by [`AutosaveEmitter::subscribe`].
pub type ListenerId = u64;

type Listener = Arc<dyn Fn(&AutosaveEvent) + Send + Sync>;

/// Latest published status of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSignal {
    pub status: SaveStatus,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl StatusSignal {
    fn idle() -> Self {
        Self {
            status: SaveStatus::Idle,
            last_saved_at: None,
        }
    }
}

#[derive(Default)]
struct Registry {
    last_id: ListenerId,
    listeners: BTreeMap<ListenerId, Listener>,
}

pub struct AutosaveEmitter {
    signal: watch::Sender<StatusSignal>,
    registry: Mutex<Registry>,
}

impl AutosaveEmitter {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(StatusSignal::idle());
        Self {
            signal,
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Receiver that always holds the latest [`StatusSignal`].
    pub fn watch(&self) -> watch::Receiver<StatusSignal> {
        self.signal.subscribe()
    }

    pub fn current(&self) -> StatusSignal {
        *self.signal.borrow()
    }

    pub fn subscribe(&self, listener: impl Fn(&AutosaveEvent) + Send + Sync + 'static) -> ListenerId {
        let mut registry = self.registry.lock();
        registry.last_id += 1;
        let id = registry.last_id;
        registry.listeners.insert(id, Arc::new(listener));
        id
    }

    /// Returns `false` for an unknown id.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.registry.lock().listeners.remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.registry.lock().listeners.len()
    }

    /// Fold `events` into the status signal, then hand the surviving ones to
    /// every listener. Listeners run with no lock held and may subscribe or
    /// unsubscribe; changes apply from the next publish.
    pub fn publish(&self, events: Vec<AutosaveEvent>) {
        let delivered: Vec<AutosaveEvent> =
            events.into_iter().filter(|event| self.fold(event)).collect();
        if delivered.is_empty() {
            return;
        }
        let listeners: Vec<Listener> = self.registry.lock().listeners.values().cloned().collect();
        for event in &delivered {
            for listener in &listeners {
                listener(event);
            }
        }
    }

    /// Apply `event` to the signal; `false` when it carries nothing new.
    fn fold(&self, event: &AutosaveEvent) -> bool {
        match event {
            AutosaveEvent::StatusChanged { to, .. } => self.signal.send_if_modified(|signal| {
                if signal.status == *to {
                    return false;
                }
                signal.status = *to;
                true
            }),
            AutosaveEvent::Saved { at, .. } => {
                self.signal.send_modify(|signal| signal.last_saved_at = Some(*at));
                true
            }
            AutosaveEvent::SaveFailed { .. } => true,
        }
    }
}
