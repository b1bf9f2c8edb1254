//! AutosaveHandle: debounce, status and retry around the [`Dispatcher`].
//!
//! Every edit runs the dirty gate. A qualifying edit moves the status to
//! `DirtyPending` and (re)starts the debounce timer; when the timer fires the
//! draft is dispatched. Success replaces the save snapshot with exactly what
//! was sent, failure leaves the snapshot alone so the next attempt carries
//! the whole accumulated change.
//!
//! Controller state lives behind a `parking_lot::Mutex` that is never held
//! across an `.await` or while listeners run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AutosaveConfig;
use crate::day::{self, DayAssignment, DayResolution, ItineraryDay};
use crate::draft::{AutosaveEntity, Canonical, SaveSnapshot};
use crate::error::{AutosaveError, Result};
use crate::events::{AutosaveEmitter, AutosaveEvent, ListenerId, StatusSignal};
use crate::types::{RemoteId, SaveStatus};

use super::dispatcher::Dispatcher;
use super::gate::{self, GateDecision, GateInput};
use super::handoff::CreateHandoff;
use super::types::{DispatchOutcome, RemoteStore, SaveOutcome, SaveTrigger};

// ============================================================================
// Builder
// ============================================================================

pub struct AutosaveBuilder<E: AutosaveEntity> {
    draft: E,
    store: Arc<dyn RemoteStore<E>>,
    config: AutosaveConfig,
    assignment: DayAssignment,
    days: Vec<ItineraryDay>,
    remote_id: Option<RemoteId>,
    handoff: Option<CreateHandoff>,
}

impl<E: AutosaveEntity> AutosaveBuilder<E> {
    pub fn config(mut self, config: AutosaveConfig) -> Self {
        self.config = config;
        self
    }

    /// Place the draft on the day matching its assignment date.
    pub fn date_driven(mut self, days: Vec<ItineraryDay>) -> Self {
        self.assignment = DayAssignment::DateDriven;
        self.days = days;
        self
    }

    /// Start from a record the server already holds; `draft` is its
    /// acknowledged state.
    pub fn existing(mut self, id: impl Into<RemoteId>) -> Self {
        self.remote_id = Some(id.into());
        self
    }

    pub fn handoff(mut self, handoff: CreateHandoff) -> Self {
        self.handoff = Some(handoff);
        self
    }

    /// Must be called from within a Tokio runtime; the debounce timer is
    /// spawned on it.
    pub fn build(self) -> Result<AutosaveHandle<E>> {
        self.config.validate()?;
        let runtime = Handle::try_current().map_err(|_| AutosaveError::NoRuntime)?;

        let existing = self.remote_id.is_some();
        let dispatcher = match self.remote_id {
            Some(id) => Dispatcher::for_existing(self.store, id),
            None => Dispatcher::new(self.store),
        };
        if let Some(handoff) = self.handoff {
            dispatcher.stage_handoff(handoff);
        }

        let baseline = SaveSnapshot::capture(&self.draft)?;
        let mut state = ControllerState {
            draft: self.draft,
            days: self.days,
            assignment: self.assignment,
            snapshot: existing.then(|| baseline.clone()),
            baseline,
            status: SaveStatus::Idle,
            dirty: false,
            saving: false,
            follow_up: false,
            last_saved_at: None,
            last_error: None,
            gate: GateDecision::Unchanged,
            timer: None,
            timer_generation: 0,
        };
        // A date-driven draft may be re-linked to another day right here.
        state.resolve_day();
        let canonical = Canonical::of(&state.draft)?;
        state.dirty = !state.reference().matches(&canonical);
        let decision = if state.dirty {
            state.evaluate(&canonical)
        } else {
            GateDecision::Unchanged
        };
        state.gate = decision.clone();

        let session = Uuid::new_v4();
        debug!(
            session = %session,
            kind = state.draft.kind(),
            existing,
            dirty = state.dirty,
            debounce_ms = self.config.debounce_ms,
            "autosave started"
        );

        let handle = AutosaveHandle {
            inner: Arc::new(Inner {
                session,
                config: self.config,
                runtime,
                dispatcher,
                state: Mutex::new(state),
                disposed: AtomicBool::new(false),
                events: AutosaveEmitter::new(),
            }),
        };

        let mut events = Vec::new();
        {
            let mut st = handle.inner.state.lock();
            handle.respond(&mut *st, &decision, &mut events);
        }
        handle.inner.events.publish(events);
        Ok(handle)
    }
}

// ============================================================================
// State
// ============================================================================

struct ControllerState<E> {
    draft: E,
    days: Vec<ItineraryDay>,
    assignment: DayAssignment,
    /// Last server-acknowledged serialisation.
    snapshot: Option<SaveSnapshot>,
    /// Serialisation at mount; stands in for the snapshot before the first save.
    baseline: SaveSnapshot,
    status: SaveStatus,
    dirty: bool,
    saving: bool,
    /// Set when an attempt was turned away because a save was in flight.
    follow_up: bool,
    last_saved_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    gate: GateDecision,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every schedule/cancel; a firing timer with an older value
    /// has been superseded.
    timer_generation: u64,
}

impl<E: AutosaveEntity> ControllerState<E> {
    fn reference(&self) -> &SaveSnapshot {
        self.snapshot.as_ref().unwrap_or(&self.baseline)
    }

    fn resolve_day(&mut self) {
        if self.assignment != DayAssignment::DateDriven {
            return;
        }
        let resolved = day::resolve_day(self.draft.assignment_date(), &self.days).map(|d| d.id.clone());
        if self.draft.day_id() != resolved.as_deref() {
            self.draft.set_day_id(resolved);
        }
    }

    fn evaluate(&self, canonical: &Canonical) -> GateDecision {
        gate::evaluate(&GateInput {
            draft: &self.draft,
            canonical,
            snapshot: self.snapshot.as_ref(),
            in_flight: self.saving,
            assignment: self.assignment,
        })
    }

    fn transition(&mut self, to: SaveStatus, events: &mut Vec<AutosaveEvent>) {
        if self.status != to {
            events.push(AutosaveEvent::StatusChanged {
                from: self.status,
                to,
            });
            self.status = to;
        }
    }

    fn cancel_timer(&mut self) {
        self.timer_generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Status to rest in when nothing is pending.
    fn settled_status(&self) -> SaveStatus {
        if self.last_saved_at.is_some() {
            SaveStatus::Saved
        } else {
            SaveStatus::Idle
        }
    }
}

/// Point-in-time view of a controller.
#[derive(Debug, Clone, PartialEq)]
pub struct AutosaveState {
    pub status: SaveStatus,
    pub dirty: bool,
    pub remote_id: Option<RemoteId>,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

// ============================================================================
// AutosaveHandle
// ============================================================================

struct Inner<E: AutosaveEntity> {
    session: Uuid,
    config: AutosaveConfig,
    runtime: Handle,
    dispatcher: Dispatcher<E>,
    state: Mutex<ControllerState<E>>,
    disposed: AtomicBool,
    events: AutosaveEmitter,
}

/// Auto-save controller for one draft. Cheap to clone; clones share state.
pub struct AutosaveHandle<E: AutosaveEntity> {
    inner: Arc<Inner<E>>,
}

impl<E: AutosaveEntity> Clone for AutosaveHandle<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: AutosaveEntity> AutosaveHandle<E> {
    pub fn builder(draft: E, store: Arc<dyn RemoteStore<E>>) -> AutosaveBuilder<E> {
        AutosaveBuilder {
            draft,
            store,
            config: AutosaveConfig::default(),
            assignment: DayAssignment::Explicit,
            days: Vec::new(),
            remote_id: None,
            handoff: None,
        }
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Apply a field change and run the dirty gate.
    pub fn edit(&self, change: impl FnOnce(&mut E)) -> Result<GateDecision> {
        self.apply(|state| change(&mut state.draft))
    }

    /// Replace the itinerary day list. Date-driven drafts are re-resolved
    /// against it immediately.
    pub fn set_days(&self, days: Vec<ItineraryDay>) -> Result<GateDecision> {
        self.apply(|state| state.days = days)
    }

    fn apply(&self, change: impl FnOnce(&mut ControllerState<E>)) -> Result<GateDecision> {
        self.check_disposed()?;
        let mut events = Vec::new();
        let decision = {
            let mut st = self.inner.state.lock();
            change(&mut *st);
            st.resolve_day();

            let canonical = Canonical::of(&st.draft)?;
            st.dirty = !st.reference().matches(&canonical);
            let decision = if st.dirty {
                st.evaluate(&canonical)
            } else {
                GateDecision::Unchanged
            };
            st.gate = decision.clone();
            self.respond(&mut *st, &decision, &mut events);
            decision
        };
        self.inner.events.publish(events);
        Ok(decision)
    }

    /// Act on a gate decision reached outside a save: schedule, hold or settle.
    fn respond(
        &self,
        st: &mut ControllerState<E>,
        decision: &GateDecision,
        events: &mut Vec<AutosaveEvent>,
    ) {
        match decision {
            GateDecision::Ready => {
                st.transition(SaveStatus::DirtyPending, events);
                self.schedule(st);
            }
            GateDecision::InFlight => {
                st.follow_up = true;
            }
            GateDecision::Invalid(_) | GateDecision::DayUnresolved { .. } => {
                st.cancel_timer();
                if !st.saving {
                    st.transition(SaveStatus::DirtyPending, events);
                }
            }
            GateDecision::Unchanged => {
                st.cancel_timer();
                if !st.saving {
                    let settled = st.settled_status();
                    st.transition(settled, events);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Saving
    // -----------------------------------------------------------------------

    /// Save now, skipping the debounce window. Validation and day-linkage
    /// failures come back as errors so the caller can point at the field.
    pub async fn force_save(&self) -> Result<SaveOutcome> {
        self.check_disposed()?;
        self.inner.state.lock().cancel_timer();
        self.run_save(SaveTrigger::Manual).await
    }

    fn schedule(&self, st: &mut ControllerState<E>) {
        st.timer_generation += 1;
        let generation = st.timer_generation;
        let delay = self.inner.config.debounce();
        let weak = Arc::downgrade(&self.inner);
        let timer = self.inner.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                AutosaveHandle { inner }.fire(generation).await;
            }
        });
        if let Some(previous) = st.timer.replace(timer) {
            previous.abort();
        }
    }

    async fn fire(&self, generation: u64) {
        {
            let mut st = self.inner.state.lock();
            if st.timer_generation != generation {
                return;
            }
            // Detach: from here on the save runs to completion.
            st.timer = None;
        }
        match self.run_save(SaveTrigger::Debounce).await {
            Ok(_) | Err(AutosaveError::Disposed) | Err(AutosaveError::Persist(_)) => {}
            Err(e) => debug!(session = %self.inner.session, error = %e, "debounced save skipped"),
        }
    }

    async fn run_save(&self, trigger: SaveTrigger) -> Result<SaveOutcome> {
        self.check_disposed()?;
        let mut events = Vec::new();
        let (draft, sent) = {
            let mut st = self.inner.state.lock();
            let canonical = Canonical::of(&st.draft)?;
            let decision = st.evaluate(&canonical);
            st.gate = decision.clone();
            match decision {
                GateDecision::Ready => {}
                GateDecision::InFlight => {
                    st.follow_up = true;
                    return Ok(SaveOutcome::Deferred);
                }
                GateDecision::Unchanged => return Ok(SaveOutcome::Unchanged),
                GateDecision::Invalid(errors) => return Err(errors.into()),
                GateDecision::DayUnresolved { date } => {
                    return Err(AutosaveError::DayUnresolved { date })
                }
            }
            st.saving = true;
            st.transition(SaveStatus::Saving, &mut events);
            (st.draft.clone(), canonical)
        };
        self.inner.events.publish(events);

        debug!(
            session = %self.inner.session,
            kind = draft.kind(),
            trigger = trigger.as_str(),
            create = self.inner.dispatcher.remote_id().is_none(),
            "dispatching save"
        );
        let result = self.inner.dispatcher.dispatch(&draft).await;

        let mut events = Vec::new();
        let outcome = {
            let mut st = self.inner.state.lock();
            st.saving = false;
            if self.inner.disposed.load(Ordering::SeqCst) {
                debug!(session = %self.inner.session, "disposed during save; result not applied");
                return result.map(SaveOutcome::from).map_err(AutosaveError::from);
            }
            let current = Canonical::of(&st.draft)?;

            match result {
                Ok(DispatchOutcome::Deferred) => {
                    st.follow_up = false;
                    st.transition(SaveStatus::DirtyPending, &mut events);
                    self.schedule(&mut *st);
                    Ok(SaveOutcome::Deferred)
                }
                Ok(dispatched) => {
                    let now = Utc::now();
                    let created = matches!(dispatched, DispatchOutcome::Created(_));
                    let outcome = SaveOutcome::from(dispatched);
                    let Some(record) = outcome.record() else {
                        return Ok(outcome);
                    };

                    st.dirty = current.text != sent.text;
                    st.snapshot = Some(SaveSnapshot::from_canonical(sent));
                    st.last_saved_at = Some(now);
                    st.last_error = None;
                    st.follow_up = false;
                    events.push(AutosaveEvent::Saved {
                        id: record.id.clone(),
                        created,
                        at: now,
                    });
                    st.transition(SaveStatus::Saved, &mut events);
                    info!(
                        session = %self.inner.session,
                        kind = draft.kind(),
                        id = %record.id,
                        created,
                        "draft saved"
                    );

                    // Edits made while the request was out.
                    if st.dirty {
                        let decision = st.evaluate(&current);
                        st.gate = decision.clone();
                        if decision.should_save() {
                            st.transition(SaveStatus::DirtyPending, &mut events);
                            self.schedule(&mut *st);
                        } else if decision.is_blocking() {
                            st.transition(SaveStatus::DirtyPending, &mut events);
                        }
                    } else {
                        st.gate = GateDecision::Unchanged;
                    }
                    Ok(outcome)
                }
                Err(e) => {
                    let message = e
                        .user_message()
                        .unwrap_or_else(|| self.inner.config.failure_fallback_message.clone());
                    st.dirty = true;
                    st.last_error = Some(message.clone());
                    st.transition(SaveStatus::Error, &mut events);
                    events.push(AutosaveEvent::SaveFailed {
                        message,
                        field_errors: e.field_errors().cloned(),
                    });
                    warn!(
                        session = %self.inner.session,
                        kind = draft.kind(),
                        trigger = trigger.as_str(),
                        error = %e,
                        "Failed to save draft"
                    );

                    // Only a change made during the failed attempt earns a
                    // retry; otherwise wait for the next edit or force save.
                    if std::mem::take(&mut st.follow_up) {
                        let decision = st.evaluate(&current);
                        st.gate = decision.clone();
                        if decision.should_save() {
                            st.transition(SaveStatus::DirtyPending, &mut events);
                            self.schedule(&mut *st);
                        }
                    }
                    Err(e.into())
                }
            }
        };
        self.inner.events.publish(events);
        outcome
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Cancel any pending save and reject further edits. A request already
    /// on the wire completes but its result is not applied.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.state.lock().cancel_timer();
        debug!(session = %self.inner.session, "autosave disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    fn check_disposed(&self) -> Result<()> {
        if self.is_disposed() {
            Err(AutosaveError::Disposed)
        } else {
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    pub fn subscribe(&self, listener: impl Fn(&AutosaveEvent) + Send + Sync + 'static) -> ListenerId {
        self.inner.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Status and last save time, updated as they change.
    pub fn watch_status(&self) -> watch::Receiver<StatusSignal> {
        self.inner.events.watch()
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session
    }

    pub fn status(&self) -> SaveStatus {
        self.inner.state.lock().status
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.state.lock().dirty
    }

    pub fn remote_id(&self) -> Option<RemoteId> {
        self.inner.dispatcher.remote_id().cloned()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.inner.state.lock().last_saved_at
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.state.lock().last_error.clone()
    }

    pub fn state(&self) -> AutosaveState {
        let st = self.inner.state.lock();
        AutosaveState {
            status: st.status,
            dirty: st.dirty,
            remote_id: self.inner.dispatcher.remote_id().cloned(),
            last_saved_at: st.last_saved_at,
            last_error: st.last_error.clone(),
        }
    }

    /// Decision recorded by the most recent edit or save.
    pub fn gate(&self) -> GateDecision {
        self.inner.state.lock().gate.clone()
    }

    /// Run the gate against the current draft without side effects.
    pub fn check(&self) -> Result<GateDecision> {
        let st = self.inner.state.lock();
        let canonical = Canonical::of(&st.draft)?;
        Ok(st.evaluate(&canonical))
    }

    pub fn draft(&self) -> E {
        self.inner.state.lock().draft.clone()
    }

    pub fn snapshot(&self) -> Option<SaveSnapshot> {
        self.inner.state.lock().snapshot.clone()
    }

    pub fn day_resolution(&self) -> DayResolution {
        let st = self.inner.state.lock();
        day::resolve(st.draft.assignment_date(), &st.days)
    }

    /// Fields that differ from the last acknowledged save (or from the
    /// initial draft before the first save).
    pub fn pending_changes(&self) -> Result<Vec<String>> {
        let st = self.inner.state.lock();
        let canonical = Canonical::of(&st.draft)?;
        Ok(st.reference().changed_paths(&canonical))
    }

    pub fn has_pending_timer(&self) -> bool {
        self.inner.state.lock().timer.is_some()
    }

    pub fn stage_handoff(&self, handoff: CreateHandoff) {
        self.inner.dispatcher.stage_handoff(handoff);
    }

    pub fn has_handoff(&self) -> bool {
        self.inner.dispatcher.has_handoff()
    }
}
