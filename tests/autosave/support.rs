//! Shared mock store and helpers for the auto-save tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use itinerary_autosave::reconcile::{CreateHandoff, RemoteStore};
use itinerary_autosave::{
    ActivityDetails, ActivityDraft, AutosaveConfig, AutosaveEntity, AutosaveEvent, AutosaveHandle,
    PersistError, PersistedRecord, RemoteId,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::time::Instant;

/// Debounce window used throughout the tests.
pub const W: u64 = 1000;

// ============================================================================
// MockStore
// ============================================================================

#[derive(Debug, Clone)]
pub struct Call {
    pub id: Option<RemoteId>,
    pub body: Value,
    pub at: Instant,
}

#[derive(Default)]
struct MockStoreInner {
    creates: Vec<Call>,
    updates: Vec<Call>,
    attached: Vec<(RemoteId, CreateHandoff)>,
    /// Consumed one per create/update call.
    failures: VecDeque<PersistError>,
    attach_failure: Option<PersistError>,
}

pub struct MockStore {
    inner: Mutex<MockStoreInner>,
    latency: Duration,
    next_id: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockStoreInner::default()),
            latency: Duration::ZERO,
            next_id: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, ms: u64) -> Self {
        self.latency = Duration::from_millis(ms);
        self
    }

    pub fn fail_next(&self, error: PersistError) {
        self.inner.lock().failures.push_back(error);
    }

    pub fn fail_attach(&self, error: PersistError) {
        self.inner.lock().attach_failure = Some(error);
    }

    pub fn create_count(&self) -> usize {
        self.inner.lock().creates.len()
    }

    pub fn update_count(&self) -> usize {
        self.inner.lock().updates.len()
    }

    pub fn creates(&self) -> Vec<Call> {
        self.inner.lock().creates.clone()
    }

    pub fn updates(&self) -> Vec<Call> {
        self.inner.lock().updates.clone()
    }

    pub fn attached(&self) -> Vec<(RemoteId, CreateHandoff)> {
        self.inner.lock().attached.clone()
    }

    async fn respond(&self) -> Result<(), PersistError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.inner.lock().failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<E: AutosaveEntity> RemoteStore<E> for MockStore {
    async fn create(&self, draft: &E) -> Result<PersistedRecord, PersistError> {
        let body = serde_json::to_value(draft).expect("draft serializes");
        self.inner.lock().creates.push(Call {
            id: None,
            body,
            at: Instant::now(),
        });
        self.respond().await?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PersistedRecord::new(format!("rec-{n}"))
            .with_field("pricing_id", json!(format!("pricing-{n}"))))
    }

    async fn update(&self, id: &RemoteId, draft: &E) -> Result<PersistedRecord, PersistError> {
        let body = serde_json::to_value(draft).expect("draft serializes");
        self.inner.lock().updates.push(Call {
            id: Some(id.clone()),
            body,
            at: Instant::now(),
        });
        self.respond().await?;
        Ok(PersistedRecord::new(id.clone()))
    }

    async fn attach_handoff(
        &self,
        id: &RemoteId,
        handoff: &CreateHandoff,
    ) -> Result<(), PersistError> {
        let mut inner = self.inner.lock();
        if let Some(error) = inner.attach_failure.clone() {
            return Err(error);
        }
        inner.attached.push((id.clone(), handoff.clone()));
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn config() -> AutosaveConfig {
    AutosaveConfig::default().with_debounce_ms(W)
}

/// A valid lodging draft with no dates entered.
pub fn hotel() -> ActivityDraft {
    ActivityDraft::lodging("Hotel Arts")
        .with_itinerary("itin-1")
        .with_details(ActivityDetails::Lodging {
            property_name: Some("Hotel Arts".to_string()),
            check_in_date: None,
            check_out_date: None,
            rooms: Some(1),
        })
}

pub fn build(store: &Arc<MockStore>) -> AutosaveHandle<ActivityDraft> {
    AutosaveHandle::builder(hotel(), store.clone())
        .config(config())
        .build()
        .expect("controller builds")
}

/// Sleep on the (paused) clock, then let spawned tasks run.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

pub fn record_events(handle: &AutosaveHandle<ActivityDraft>) -> Arc<Mutex<Vec<AutosaveEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    handle.subscribe(move |event| sink.lock().push(event.clone()));
    events
}
