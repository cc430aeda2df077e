//! The event store.
//!
//! Holds the canonical list of events. Mutations are applied only after the
//! server confirms them; a failed request leaves the list as it was and
//! raises an error notice instead.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use super::lifecycle::{RequestStatus, Seq, Sequencer, notice_for};
use crate::api::{Backend, Operation};
use crate::config::ClientConfig;
use crate::error::{DayplanError, DayplanResult};
use crate::model::{EventDraft, EventId, EventRecord};
use crate::time::{parse_timestamp, same_day};
use crate::wire;

/// What a response is about, for staleness checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventResource {
    List,
    Event(EventId),
}

#[derive(Debug, Clone)]
pub enum EventAction {
    Fetched {
        seq: Seq,
        events: Vec<EventRecord>,
    },
    Created {
        seq: Seq,
        event: EventRecord,
    },
    Updated {
        seq: Seq,
        id: EventId,
        event: EventRecord,
    },
    Deleted {
        seq: Seq,
        id: EventId,
    },
    Failed {
        seq: Seq,
        /// `None` for creates, which have no resource to go stale against.
        resource: Option<EventResource>,
        message: String,
        at: Instant,
    },
    ClearError,
    ExpireError {
        now: Instant,
        timeout: Duration,
    },
}

/// What a reducer step did with an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// A newer response for the same resource was already applied.
    Stale,
    /// An update whose target is not in the list.
    Unresolved,
    Unchanged,
}

#[derive(Debug, Clone, Default)]
pub struct EventState {
    events: Vec<EventRecord>,
    status: RequestStatus,
    sequencer: Sequencer<EventResource>,
}

impl EventState {
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn loading(&self) -> bool {
        self.status.loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.status.error()
    }

    pub fn status(&self) -> &RequestStatus {
        &self.status
    }

    /// Start a request and tag it.
    pub fn begin(&mut self) -> Seq {
        self.status.begin();
        self.sequencer.issue()
    }

    pub fn reduce(&mut self, action: EventAction) -> Applied {
        match action {
            EventAction::Fetched { seq, events } => {
                self.status.finish();
                if !self.sequencer.accept(EventResource::List, seq) {
                    return self.discard(&EventResource::List, seq);
                }
                self.events = events;
                Applied::Applied
            }
            EventAction::Created { seq, event } => {
                self.status.finish();
                self.supersede_list(seq);
                self.events.push(event);
                Applied::Applied
            }
            EventAction::Updated { seq, id, event } => {
                self.status.finish();
                let resource = EventResource::Event(id.clone());
                if !self.sequencer.accept(resource.clone(), seq) {
                    return self.discard(&resource, seq);
                }
                self.supersede_list(seq);
                self.replace_same_day(&id, event)
            }
            EventAction::Deleted { seq, id } => {
                self.status.finish();
                let resource = EventResource::Event(id.clone());
                if !self.sequencer.accept(resource.clone(), seq) {
                    return self.discard(&resource, seq);
                }
                self.supersede_list(seq);
                self.events.retain(|e| !e.has_id(&id));
                self.sequencer.forget(&resource);
                Applied::Applied
            }
            EventAction::Failed {
                seq,
                resource,
                message,
                at,
            } => {
                self.status.finish();
                if let Some(resource) = resource {
                    if !self.sequencer.accept(resource.clone(), seq) {
                        return self.discard(&resource, seq);
                    }
                }
                self.status.raise(message, at);
                Applied::Applied
            }
            EventAction::ClearError => {
                self.status.clear_error();
                Applied::Applied
            }
            EventAction::ExpireError { now, timeout } => {
                if self.status.expire_error(now, timeout) {
                    Applied::Applied
                } else {
                    Applied::Unchanged
                }
            }
        }
    }

    /// A confirmed mutation is newer than any list fetch issued before it,
    /// so such a fetch must not overwrite it when it lands late.
    fn supersede_list(&mut self, seq: Seq) {
        self.sequencer.accept(EventResource::List, seq);
    }

    fn discard(&self, resource: &EventResource, seq: Seq) -> Applied {
        debug!(
            ?resource,
            seq = seq.get(),
            newest = self.sequencer.last_applied(resource).map(|s| s.get()),
            "discarding stale response"
        );
        Applied::Stale
    }

    /// Replace the entry with identity `id` whose start falls on the same day
    /// as the updated start. Guards against a response for an event moved
    /// across midnight overwriting an unrelated stale entry.
    fn replace_same_day(&mut self, id: &EventId, updated: EventRecord) -> Applied {
        let Some(new_start) = parse_timestamp(&updated.start) else {
            warn!(%id, start = %updated.start, "updated event has an unparsable start");
            return Applied::Unresolved;
        };

        let position = self.events.iter().position(|e| {
            e.has_id(id)
                && parse_timestamp(&e.start).is_some_and(|start| same_day(start, new_start))
        });

        match position {
            Some(index) => {
                self.events[index] = updated;
                Applied::Applied
            }
            None => {
                warn!(%id, "could not find event to update");
                Applied::Unresolved
            }
        }
    }
}

pub struct EventStore<B> {
    backend: Arc<B>,
    error_timeout: Duration,
    state: Mutex<EventState>,
}

impl<B: Backend> EventStore<B> {
    pub fn new(backend: Arc<B>, config: &ClientConfig) -> Self {
        EventStore {
            backend,
            error_timeout: config.error_timeout,
            state: Mutex::new(EventState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, EventState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state for presentation.
    pub fn snapshot(&self) -> EventState {
        self.state().clone()
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.state().events.clone()
    }

    pub fn find(&self, id: &EventId) -> Option<EventRecord> {
        self.state().events.iter().find(|e| e.has_id(id)).cloned()
    }

    pub fn dispatch(&self, action: EventAction) -> Applied {
        self.state().reduce(action)
    }

    /// Dismiss the current error notice.
    pub fn clear_error(&self) {
        self.dispatch(EventAction::ClearError);
    }

    /// Drop the error notice if it has been shown long enough.
    pub fn expire_error(&self, now: Instant) -> bool {
        self.dispatch(EventAction::ExpireError {
            now,
            timeout: self.error_timeout,
        }) == Applied::Applied
    }

    fn fail(
        &self,
        op: Operation,
        seq: Seq,
        resource: Option<EventResource>,
        err: &DayplanError,
    ) {
        error!(op = op.name(), seq = seq.get(), error = %err, "event request failed");
        let applied = self.dispatch(EventAction::Failed {
            seq,
            resource,
            message: notice_for(op, err),
            at: Instant::now(),
        });
        if applied == Applied::Stale {
            debug!(op = op.name(), seq = seq.get(), "discarded stale failure");
        }
    }

    fn log_outcome(op: Operation, seq: Seq, applied: Applied) {
        debug!(op = op.name(), seq = seq.get(), ?applied, "response handled");
    }

    /// Load the full event list. A response that isn't a list is rejected
    /// and the current events are kept.
    pub async fn fetch(&self) -> DayplanResult<Vec<EventRecord>> {
        let seq = self.state().begin();
        debug!(seq = seq.get(), "fetching events");

        let result = self
            .backend
            .list_events()
            .await
            .and_then(|body| wire::decode_list(body, "event", wire::decode_event));

        match result {
            Ok(events) => {
                let applied = self.dispatch(EventAction::Fetched {
                    seq,
                    events: events.clone(),
                });
                Self::log_outcome(Operation::FetchEvents, seq, applied);
                Ok(events)
            }
            Err(e) => {
                self.fail(Operation::FetchEvents, seq, Some(EventResource::List), &e);
                Err(e)
            }
        }
    }

    /// Create an event and append the server's copy (with its id).
    pub async fn create(&self, draft: &EventDraft) -> DayplanResult<EventRecord> {
        let body = wire::encode_draft(draft, None)?;
        let seq = self.state().begin();
        debug!(seq = seq.get(), title = %draft.title, "creating event");

        let result = self
            .backend
            .create_event(body)
            .await
            .and_then(decode_confirmed);

        match result {
            Ok(event) => {
                let applied = self.dispatch(EventAction::Created {
                    seq,
                    event: event.clone(),
                });
                Self::log_outcome(Operation::CreateEvent, seq, applied);
                Ok(event)
            }
            Err(e) => {
                self.fail(Operation::CreateEvent, seq, None, &e);
                Err(e)
            }
        }
    }

    /// Replace event `id` with `draft`.
    pub async fn update(&self, id: &EventId, draft: &EventDraft) -> DayplanResult<EventRecord> {
        let body = wire::encode_draft(draft, Some(id))?;
        let seq = self.state().begin();
        debug!(seq = seq.get(), %id, "updating event");

        let result = self
            .backend
            .update_event(id, body)
            .await
            .and_then(decode_confirmed);

        match result {
            Ok(event) => {
                // Reconcile by the identity the server answered with.
                let confirmed_id = event.id.clone().unwrap_or_else(|| id.clone());
                let applied = self.dispatch(EventAction::Updated {
                    seq,
                    id: confirmed_id,
                    event: event.clone(),
                });
                Self::log_outcome(Operation::UpdateEvent, seq, applied);
                Ok(event)
            }
            Err(e) => {
                self.fail(
                    Operation::UpdateEvent,
                    seq,
                    Some(EventResource::Event(id.clone())),
                    &e,
                );
                Err(e)
            }
        }
    }

    /// Delete event `id`. Every entry with that identity is removed.
    pub async fn delete(&self, id: &EventId) -> DayplanResult<EventId> {
        let seq = self.state().begin();
        debug!(seq = seq.get(), %id, "deleting event");

        match self.backend.delete_event(id).await {
            Ok(()) => {
                let applied = self.dispatch(EventAction::Deleted {
                    seq,
                    id: id.clone(),
                });
                Self::log_outcome(Operation::DeleteEvent, seq, applied);
                Ok(id.clone())
            }
            Err(e) => {
                self.fail(
                    Operation::DeleteEvent,
                    seq,
                    Some(EventResource::Event(id.clone())),
                    &e,
                );
                Err(e)
            }
        }
    }
}

/// Decode a single-event response body.
fn decode_confirmed(body: serde_json::Value) -> DayplanResult<EventRecord> {
    wire::decode_event(body)
        .map_err(|_| DayplanError::Validation(wire::INVALID_LIST_MESSAGE.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::testing::FakeBackend;
    use chrono::NaiveDate;
    use serde_json::json;

    fn record(id: &str, start: &str) -> EventRecord {
        EventRecord {
            id: Some(EventId::from(id)),
            title: Some(format!("event {id}")),
            start: start.to_string(),
            end: start.to_string(),
            category: Some(Category::Work),
            color: None,
        }
    }

    fn draft(title: &str, day: u32, hour: u32) -> EventDraft {
        let start = NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        EventDraft {
            title: title.to_string(),
            category: Category::Work,
            start,
            end: start + chrono::Duration::minutes(30),
            color: Category::Work.color().to_string(),
        }
    }

    fn store(backend: FakeBackend) -> (Arc<FakeBackend>, EventStore<FakeBackend>) {
        let backend = Arc::new(backend);
        let config = ClientConfig::new("http://localhost:5000").unwrap();
        let store = EventStore::new(Arc::clone(&backend), &config);
        (backend, store)
    }

    // --- reducer ---

    #[test]
    fn stale_fetch_is_discarded() {
        let mut state = EventState::default();
        let older = state.begin();
        let newer = state.begin();

        let applied = state.reduce(EventAction::Fetched {
            seq: newer,
            events: vec![record("b", "2024-06-10T09:00")],
        });
        assert_eq!(applied, Applied::Applied);

        let applied = state.reduce(EventAction::Fetched {
            seq: older,
            events: vec![record("a", "2024-06-10T09:00")],
        });
        assert_eq!(applied, Applied::Stale);
        assert_eq!(state.events()[0].id, Some(EventId::from("b")));
        assert!(!state.loading());
    }

    #[test]
    fn update_requires_same_day_match() {
        let mut state = EventState::default();
        let seq = state.begin();
        state.reduce(EventAction::Fetched {
            seq,
            events: vec![
                record("a", "2024-06-10T09:00"),
                record("b", "2024-06-10T09:00"),
            ],
        });

        let seq = state.begin();
        let moved = record("a", "2024-06-11T09:00");
        let applied = state.reduce(EventAction::Updated {
            seq,
            id: EventId::from("a"),
            event: moved,
        });
        assert_eq!(applied, Applied::Unresolved);
        assert_eq!(state.events()[0].start, "2024-06-10T09:00");
        assert_eq!(state.events().len(), 2);

        let seq = state.begin();
        let mut retimed = record("a", "2024-06-10T15:00");
        retimed.title = Some("retimed".into());
        let applied = state.reduce(EventAction::Updated {
            seq,
            id: EventId::from("a"),
            event: retimed,
        });
        assert_eq!(applied, Applied::Applied);
        assert_eq!(state.events()[0].title.as_deref(), Some("retimed"));
        assert_eq!(state.events()[1].title.as_deref(), Some("event b"));
    }

    #[test]
    fn delete_removes_every_matching_entry() {
        let mut state = EventState::default();
        let seq = state.begin();
        state.reduce(EventAction::Fetched {
            seq,
            events: vec![
                record("x", "2024-06-10T09:00"),
                record("y", "2024-06-10T10:00"),
                record("x", "2024-06-12T09:00"),
            ],
        });

        let seq = state.begin();
        state.reduce(EventAction::Deleted {
            seq,
            id: EventId::from("x"),
        });
        assert_eq!(state.events().len(), 1);
        assert_eq!(state.events()[0].id, Some(EventId::from("y")));
    }

    #[test]
    fn failure_keeps_events_and_sets_error() {
        let mut state = EventState::default();
        let seq = state.begin();
        state.reduce(EventAction::Fetched {
            seq,
            events: vec![record("a", "2024-06-10T09:00")],
        });

        let seq = state.begin();
        assert!(state.loading());
        state.reduce(EventAction::Failed {
            seq,
            resource: Some(EventResource::Event(EventId::from("a"))),
            message: "Failed to update event".into(),
            at: Instant::now(),
        });
        assert!(!state.loading());
        assert_eq!(state.error(), Some("Failed to update event"));
        assert_eq!(state.events().len(), 1);
    }

    // --- store ---

    #[tokio::test]
    async fn fetch_rejects_non_list_and_keeps_empty_list() {
        let (backend, store) = store(FakeBackend::new());
        backend.respond_to_next_list(json!({ "events": "nope" }));

        let err = store.fetch().await.unwrap_err();
        assert!(matches!(err, DayplanError::Validation(_)));

        let state = store.snapshot();
        assert!(state.events().is_empty());
        assert_eq!(state.error(), Some(wire::INVALID_LIST_MESSAGE));
        assert!(!state.loading());
    }

    #[tokio::test]
    async fn fetch_rejection_does_not_clear_events() {
        let (backend, store) = store(FakeBackend::with_events(vec![
            json!({ "_id": "a", "title": "Standup", "start": "2024-06-10T09:00", "end": "2024-06-10T09:15" }),
        ]));
        store.fetch().await.unwrap();

        backend.respond_to_next_list(json!("not a list"));
        assert!(store.fetch().await.is_err());
        assert_eq!(store.events().len(), 1);
    }

    #[tokio::test]
    async fn create_appends_server_copy() {
        let (backend, store) = store(FakeBackend::new());

        let created = store.create(&draft("Run", 10, 9)).await.unwrap();
        assert_eq!(created.id, Some(EventId::from("evt-1")));
        assert_eq!(store.events(), vec![created]);

        let (op, _, body) = backend.requests().pop().unwrap();
        assert_eq!(op, Operation::CreateEvent);
        assert!(body.get("_id").is_none());
    }

    #[tokio::test]
    async fn update_replaces_in_place() {
        let (backend, store) = store(FakeBackend::new());
        store.create(&draft("first", 10, 9)).await.unwrap();
        store.create(&draft("second", 10, 11)).await.unwrap();

        let id = EventId::from("evt-1");
        store.update(&id, &draft("renamed", 10, 14)).await.unwrap();

        let events = store.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title.as_deref(), Some("renamed"));
        assert_eq!(events[1].title.as_deref(), Some("second"));

        let (_, path_id, body) = backend.requests().pop().unwrap();
        assert_eq!(path_id.as_deref(), Some("evt-1"));
        assert_eq!(body["_id"], "evt-1");
    }

    #[tokio::test]
    async fn update_across_days_leaves_list_unchanged() {
        let (_backend, store) = store(FakeBackend::new());
        store.create(&draft("first", 10, 9)).await.unwrap();
        let before = store.events();

        let id = EventId::from("evt-1");
        let confirmed = store.update(&id, &draft("first", 11, 9)).await.unwrap();

        assert_eq!(confirmed.id, Some(id));
        assert_eq!(store.events(), before);
        assert_eq!(store.snapshot().error(), None);
    }

    #[tokio::test]
    async fn failed_mutation_sets_server_message() {
        let (backend, store) = store(FakeBackend::new());
        store.create(&draft("first", 10, 9)).await.unwrap();

        backend.fail_next("Event is locked");
        let err = store.delete(&EventId::from("evt-1")).await.unwrap_err();
        assert_eq!(err.to_string(), "Event is locked");

        let state = store.snapshot();
        assert_eq!(state.error(), Some("Event is locked"));
        assert_eq!(state.events().len(), 1);
    }

    #[tokio::test]
    async fn delete_by_identity() {
        let (_backend, store) = store(FakeBackend::with_events(vec![
            json!({ "_id": "x", "start": "2024-06-10T09:00", "end": "2024-06-10T10:00" }),
            json!({ "id": "x", "start": "2024-06-11T09:00", "end": "2024-06-11T10:00" }),
            json!({ "_id": "y", "start": "2024-06-10T09:00", "end": "2024-06-10T10:00" }),
        ]));
        store.fetch().await.unwrap();
        assert_eq!(store.events().len(), 3);

        store.delete(&EventId::from("x")).await.unwrap();
        let remaining = store.events();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, Some(EventId::from("y")));
    }

    #[tokio::test]
    async fn slower_older_fetch_does_not_win() {
        let (backend, store) = store(FakeBackend::new());

        backend.delay_next(Duration::from_millis(80));
        backend.respond_to_next_list(json!([{ "_id": "old", "start": "2024-06-10T09:00" }]));
        backend.respond_to_next_list(json!([{ "_id": "new", "start": "2024-06-10T09:00" }]));

        let (first, second) = tokio::join!(store.fetch(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.fetch().await
        });
        first.unwrap();
        second.unwrap();

        let events = store.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, Some(EventId::from("new")));
        assert!(!store.snapshot().loading());
    }

    #[tokio::test]
    async fn older_fetch_does_not_undo_confirmed_create() {
        let (backend, store) = store(FakeBackend::new());

        backend.delay_next(Duration::from_millis(80));
        backend.respond_to_next_list(json!([]));

        let (fetched, created) = tokio::join!(store.fetch(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.create(&draft("Run", 10, 9)).await
        });
        fetched.unwrap();
        let created = created.unwrap();

        assert_eq!(store.events(), vec![created]);
        assert!(!store.snapshot().loading());
    }

    #[test]
    fn older_fetch_does_not_resurrect_deleted_event() {
        let mut state = EventState::default();
        let seq = state.begin();
        state.reduce(EventAction::Fetched {
            seq,
            events: vec![record("a", "2024-06-10T09:00")],
        });

        let slow_fetch = state.begin();
        let delete = state.begin();
        state.reduce(EventAction::Deleted {
            seq: delete,
            id: EventId::from("a"),
        });

        let applied = state.reduce(EventAction::Fetched {
            seq: slow_fetch,
            events: vec![record("a", "2024-06-10T09:00")],
        });
        assert_eq!(applied, Applied::Stale);
        assert!(state.events().is_empty());
    }

    #[test]
    fn applied_delete_stops_tracking_the_event() {
        let mut state = EventState::default();
        let id = EventId::from("a");
        let resource = EventResource::Event(id.clone());

        let seq = state.begin();
        state.reduce(EventAction::Deleted {
            seq,
            id: id.clone(),
        });
        assert_eq!(state.sequencer.last_applied(&resource), None);
        assert_eq!(state.sequencer.last_applied(&EventResource::List), Some(seq));
    }

    #[tokio::test]
    async fn clear_and_expire_error() {
        let (backend, store) = store(FakeBackend::new());
        backend.fail_next("down");
        let _ = store.fetch().await;
        assert_eq!(store.snapshot().error(), Some("down"));

        store.clear_error();
        assert_eq!(store.snapshot().error(), None);

        backend.fail_next("down again");
        let _ = store.fetch().await;
        let raised = store.snapshot().status().notice().unwrap().raised_at;
        assert!(!store.expire_error(raised + Duration::from_secs(1)));
        assert!(store.expire_error(raised + Duration::from_secs(5)));
        assert_eq!(store.snapshot().error(), None);
    }
}
