use std::sync::Arc;

use itinerary_autosave::{
    ActivityDraft, AutosaveEntity, AutosaveError, AutosaveHandle, CreateHandoff, DayResolution,
    GateDecision, ItineraryDay, RemoteId, SaveStatus,
};
use serde_json::json;

use super::support::{advance, config, hotel, MockStore, W};

fn trip() -> Vec<ItineraryDay> {
    vec![
        ItineraryDay::new("day-1", "2025-06-01", 1),
        ItineraryDay::new("day-2", "2025-06-02", 2),
    ]
}

fn date_driven(store: &Arc<MockStore>, days: Vec<ItineraryDay>) -> AutosaveHandle<ActivityDraft> {
    AutosaveHandle::builder(hotel(), store.clone())
        .config(config())
        .date_driven(days)
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn check_in_date_selects_the_day() {
    let store = Arc::new(MockStore::new());
    let handle = date_driven(&store, trip());

    let decision = handle.edit(|d| d.set_start_date(Some("2025-06-02"))).unwrap();
    assert_eq!(decision, GateDecision::Ready);
    assert_eq!(handle.draft().day_id(), Some("day-2"));

    advance(W + 1).await;
    assert_eq!(store.creates()[0].body["day_id"], json!("day-2"));

    handle.edit(|d| d.set_start_date(Some("2025-06-01"))).unwrap();
    assert_eq!(handle.draft().day_id(), Some("day-1"));
    advance(W + 1).await;
    assert_eq!(store.updates()[0].body["day_id"], json!("day-1"));
}

#[tokio::test(start_paused = true)]
async fn missing_date_blocks_the_save() {
    let store = Arc::new(MockStore::new());
    let handle = date_driven(&store, trip());

    let decision = handle.edit(|d| d.title = "Hotel Arts Barcelona".into()).unwrap();
    assert_eq!(decision, GateDecision::DayUnresolved { date: None });
    assert_eq!(handle.day_resolution(), DayResolution::NoCandidate);

    advance(2 * W).await;
    assert_eq!(store.create_count(), 0);
    assert_eq!(handle.status(), SaveStatus::DirtyPending);
}

#[tokio::test(start_paused = true)]
async fn date_outside_the_trip_warns_and_blocks() {
    let store = Arc::new(MockStore::new());
    let handle = date_driven(&store, trip());

    handle.edit(|d| d.set_start_date(Some("2025-06-02"))).unwrap();
    advance(W + 1).await;
    assert_eq!(store.create_count(), 1);

    let decision = handle.edit(|d| d.set_start_date(Some("2025-06-09"))).unwrap();
    assert_eq!(
        decision,
        GateDecision::DayUnresolved {
            date: Some("2025-06-09".to_string())
        }
    );
    assert_eq!(handle.draft().day_id(), None);
    assert!(handle.day_resolution().warning().is_some());

    advance(2 * W).await;
    assert_eq!(store.update_count(), 0);

    match handle.force_save().await {
        Err(AutosaveError::DayUnresolved { date }) => assert_eq!(date.as_deref(), Some("2025-06-09")),
        other => panic!("expected unresolved day, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn new_day_list_re_resolves_the_draft() {
    let store = Arc::new(MockStore::new());
    let handle = date_driven(&store, trip());

    handle.edit(|d| d.set_start_date(Some("2025-06-03"))).unwrap();
    assert_eq!(handle.draft().day_id(), None);

    let mut extended = trip();
    extended.push(ItineraryDay::new("day-3", "2025-06-03", 3));
    let decision = handle.set_days(extended).unwrap();

    assert_eq!(decision, GateDecision::Ready);
    assert_eq!(handle.draft().day_id(), Some("day-3"));
    assert_eq!(handle.day_resolution().day_id(), Some("day-3"));

    advance(W + 1).await;
    assert_eq!(store.creates()[0].body["day_id"], json!("day-3"));
}

#[tokio::test(start_paused = true)]
async fn explicit_assignment_ignores_dates() {
    let store = Arc::new(MockStore::new());
    let handle = AutosaveHandle::builder(hotel(), store.clone())
        .config(config())
        .build()
        .unwrap();

    let decision = handle.edit(|d| d.set_start_date(Some("2025-06-02"))).unwrap();
    assert_eq!(decision, GateDecision::Ready);
    assert_eq!(handle.draft().day_id(), None);

    advance(W + 1).await;
    assert_eq!(store.create_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn handoff_rides_along_with_the_first_create() {
    let store = Arc::new(MockStore::new());
    let handle = AutosaveHandle::builder(hotel(), store.clone())
        .config(config())
        .date_driven(trip())
        .handoff(CreateHandoff::new("hotel-search:8812"))
        .build()
        .unwrap();
    assert!(handle.has_handoff());

    handle.edit(|d| d.set_start_date(Some("2025-06-01"))).unwrap();
    advance(W + 1).await;
    handle.edit(|d| d.notes = Some("corner suite".into())).unwrap();
    advance(W + 1).await;

    assert_eq!(store.create_count(), 1);
    assert_eq!(store.update_count(), 1);
    let attached = store.attached();
    assert_eq!(attached.len(), 1);
    assert_eq!(attached[0].1.source_ref, "hotel-search:8812");
    assert!(!handle.has_handoff());
}

#[tokio::test(start_paused = true)]
async fn stale_day_link_on_an_existing_record_is_saved_once() {
    let store = Arc::new(MockStore::new());
    let mut draft = hotel();
    draft.day_id = Some("day-1".to_string());
    draft.set_start_date(Some("2025-06-02"));

    let handle = AutosaveHandle::builder(draft, store.clone())
        .config(config())
        .existing("act-1")
        .date_driven(trip())
        .build()
        .unwrap();

    assert_eq!(handle.draft().day_id(), Some("day-2"));
    assert!(handle.is_dirty());
    assert_eq!(handle.status(), SaveStatus::DirtyPending);
    assert_eq!(handle.gate(), GateDecision::Ready);
    assert_eq!(handle.gate(), handle.check().unwrap());
    assert_eq!(handle.pending_changes().unwrap(), vec!["day_id".to_string()]);
    assert!(handle.has_pending_timer());

    advance(W - 1).await;
    assert_eq!(store.update_count(), 0);

    advance(2).await;
    assert_eq!(store.update_count(), 1);
    let update = &store.updates()[0];
    assert_eq!(update.id, Some(RemoteId::from("act-1")));
    assert_eq!(update.body["day_id"], json!("day-2"));

    advance(5 * W).await;
    assert_eq!(store.update_count(), 1);
    assert_eq!(store.create_count(), 0);
    assert_eq!(handle.status(), SaveStatus::Saved);
    assert!(!handle.is_dirty());
}

#[tokio::test(start_paused = true)]
async fn correct_day_link_at_build_stays_idle() {
    let store = Arc::new(MockStore::new());
    let mut draft = hotel();
    draft.day_id = Some("day-2".to_string());
    draft.set_start_date(Some("2025-06-02"));

    let handle = AutosaveHandle::builder(draft, store.clone())
        .config(config())
        .existing("act-1")
        .date_driven(trip())
        .build()
        .unwrap();

    assert!(!handle.is_dirty());
    assert_eq!(handle.status(), SaveStatus::Idle);
    assert_eq!(handle.gate(), GateDecision::Unchanged);
    assert!(!handle.has_pending_timer());

    advance(3 * W).await;
    assert_eq!(store.update_count(), 0);
}
