//! Create-or-update dispatch with a synchronous duplicate-create guard.
//!
//! The guard is an `AtomicBool` flipped before the create call is issued, so
//! a second attempt arriving while the first create is still awaiting its
//! response sees it immediately and backs off with `Deferred`.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::draft::AutosaveEntity;
use crate::error::PersistError;
use crate::types::RemoteId;

use super::handoff::CreateHandoff;
use super::types::{DispatchOutcome, RemoteStore};

// ============================================================================
// CreateGuard
// ============================================================================

/// Held for the duration of a create call; released on drop, including when
/// the call fails or the future is dropped.
struct CreateGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CreateGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for CreateGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

pub struct Dispatcher<E: AutosaveEntity> {
    store: Arc<dyn RemoteStore<E>>,
    /// Set once by the first successful create.
    remote_id: OnceLock<RemoteId>,
    create_in_progress: AtomicBool,
    handoff: Mutex<Option<CreateHandoff>>,
    _entity: PhantomData<fn(&E)>,
}

impl<E: AutosaveEntity> Dispatcher<E> {
    pub fn new(store: Arc<dyn RemoteStore<E>>) -> Self {
        Self {
            store,
            remote_id: OnceLock::new(),
            create_in_progress: AtomicBool::new(false),
            handoff: Mutex::new(None),
            _entity: PhantomData,
        }
    }

    /// Dispatcher for a record that already exists remotely.
    pub fn for_existing(store: Arc<dyn RemoteStore<E>>, id: RemoteId) -> Self {
        let dispatcher = Self::new(store);
        let _ = dispatcher.remote_id.set(id);
        dispatcher
    }

    pub fn remote_id(&self) -> Option<&RemoteId> {
        self.remote_id.get()
    }

    pub fn create_in_progress(&self) -> bool {
        self.create_in_progress.load(Ordering::Acquire)
    }

    /// Stage a payload for the first create. Ignored once the record exists.
    pub fn stage_handoff(&self, handoff: CreateHandoff) {
        if self.remote_id.get().is_some() {
            debug!(source_ref = %handoff.source_ref, "record exists; dropping hand-off");
            return;
        }
        *self.handoff.lock() = Some(handoff);
    }

    pub fn has_handoff(&self) -> bool {
        self.handoff.lock().is_some()
    }

    /// Persist `draft`: update when the identity is known, otherwise create
    /// under the guard.
    pub async fn dispatch(&self, draft: &E) -> Result<DispatchOutcome, PersistError> {
        if let Some(id) = self.remote_id.get() {
            return self.update(id, draft).await;
        }

        let Some(_guard) = CreateGuard::acquire(&self.create_in_progress) else {
            debug!(kind = draft.kind(), "create already in flight; deferring");
            return Ok(DispatchOutcome::Deferred);
        };

        // A create may have finished between the identity check and acquiring
        // the guard.
        if let Some(id) = self.remote_id.get() {
            return self.update(id, draft).await;
        }

        // Taken before the call: the hand-off is consumed by this attempt
        // whether it succeeds or not.
        let handoff = self.handoff.lock().take();
        let record = self.store.create(draft).await?;

        if self.remote_id.set(record.id.clone()).is_err() {
            warn!(id = %record.id, "remote identity already assigned; keeping the first");
        }

        if let Some(handoff) = handoff {
            if let Err(e) = self.store.attach_handoff(&record.id, &handoff).await {
                warn!(
                    id = %record.id,
                    source_ref = %handoff.source_ref,
                    error = %e,
                    "Failed to attach hand-off to new record"
                );
            }
        }

        Ok(DispatchOutcome::Created(record))
    }

    async fn update(&self, id: &RemoteId, draft: &E) -> Result<DispatchOutcome, PersistError> {
        let record = self.store.update(id, draft).await?;
        Ok(DispatchOutcome::Updated(record))
    }
}
