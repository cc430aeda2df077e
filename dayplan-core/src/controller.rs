//! Turns calendar gestures into store operations.
//!
//! Selecting a slot or an event opens the event modal; saving it creates or
//! updates. Drag and resize update directly without a modal.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::Backend;
use crate::error::{DayplanError, DayplanResult};
use crate::model::{Category, EventDraft, EventId, EventRecord};
use crate::presenter::{CalendarEvent, UNTITLED};
use crate::store::EventStore;
use crate::time::{Timestamp, apply_time_of_day, ensure_ordered, format_time_of_day};

/// A range picked on the calendar to seed a new event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: Timestamp,
    pub end: Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalKind {
    Add { slot: Slot },
    Edit { event: CalendarEvent },
}

/// Editable fields of the event modal. Times are `HH:mm`; a blank time keeps
/// the original time of day.
#[derive(Debug, Clone, PartialEq)]
pub struct EventForm {
    pub title: String,
    pub category: Category,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Modal {
    pub kind: ModalKind,
    pub form: EventForm,
    /// Message of the last failed save or delete.
    pub error: Option<String>,
}

impl Modal {
    pub fn add(slot: Slot) -> Self {
        Modal {
            kind: ModalKind::Add { slot },
            form: EventForm {
                title: String::new(),
                category: Category::Exercise,
                start_time: format_time_of_day(slot.start),
                end_time: format_time_of_day(slot.end),
            },
            error: None,
        }
    }

    pub fn edit(event: CalendarEvent) -> Self {
        let category = match event.category {
            Category::Default => Category::Exercise,
            other => other,
        };
        Modal {
            form: EventForm {
                title: event.title.clone(),
                category,
                start_time: format_time_of_day(event.start),
                end_time: format_time_of_day(event.end),
            },
            kind: ModalKind::Edit { event },
            error: None,
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.kind, ModalKind::Edit { .. })
    }

    /// Identity of the event being edited, if any.
    pub fn event_id(&self) -> Option<&EventId> {
        match &self.kind {
            ModalKind::Edit { event } => event.id.as_ref(),
            ModalKind::Add { .. } => None,
        }
    }

    /// Build the payload to save: the original dates with the form's times,
    /// end rolled past start if needed, color taken from the category.
    pub fn build_draft(&self) -> DayplanResult<EventDraft> {
        let (start, end) = match &self.kind {
            ModalKind::Add { slot } => (slot.start, slot.end),
            ModalKind::Edit { event } => (event.start, event.end),
        };
        let start = apply_time_of_day(start, Some(&self.form.start_time))?;
        let end = apply_time_of_day(end, Some(&self.form.end_time))?;
        let (start, end) = ensure_ordered(start, end);

        let title = match self.form.title.trim() {
            "" => UNTITLED.to_string(),
            t => t.to_string(),
        };

        Ok(EventDraft {
            title,
            category: self.form.category,
            start,
            end,
            color: self.form.category.color().to_string(),
        })
    }
}

pub struct InteractionController<B> {
    store: Arc<EventStore<B>>,
    modal: Option<Modal>,
}

impl<B: Backend> InteractionController<B> {
    pub fn new(store: Arc<EventStore<B>>) -> Self {
        InteractionController { store, modal: None }
    }

    pub fn store(&self) -> &Arc<EventStore<B>> {
        &self.store
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    /// Open the Add modal for `slot`, replacing any open modal.
    pub fn select_slot(&mut self, slot: Slot) -> &mut Modal {
        self.modal.insert(Modal::add(slot))
    }

    /// Open the Edit modal for `event`, replacing any open modal.
    pub fn select_event(&mut self, event: CalendarEvent) -> &mut Modal {
        self.modal.insert(Modal::edit(event))
    }

    pub fn close(&mut self) {
        self.modal = None;
    }

    /// Save the open modal. Closes it on success; on failure it stays open
    /// with the error attached.
    pub async fn submit(&mut self) -> DayplanResult<EventRecord> {
        let Some(modal) = self.modal.as_ref() else {
            return Err(DayplanError::Validation("No event form is open".into()));
        };

        let draft = modal.build_draft();
        let target = match &modal.kind {
            ModalKind::Add { .. } => Ok(None),
            ModalKind::Edit { event } => event
                .id
                .clone()
                .map(Some)
                .ok_or_else(|| event.title.clone()),
        };

        let draft = match draft {
            Ok(draft) => draft,
            Err(e) => return Err(self.keep_open(e)),
        };

        let result = match target {
            Ok(None) => self.store.create(&draft).await,
            Ok(Some(id)) => self.store.update(&id, &draft).await,
            Err(title) => {
                warn!(%title, "cannot save event without id");
                self.close();
                return Err(DayplanError::DataIntegrity("event has no id".into()));
            }
        };

        match result {
            Ok(record) => {
                self.close();
                Ok(record)
            }
            Err(e) => Err(self.keep_open(e)),
        }
    }

    /// Delete the event of the open Edit modal.
    pub async fn delete(&mut self) -> DayplanResult<EventId> {
        let Some(id) = self.modal.as_ref().and_then(Modal::event_id).cloned() else {
            return Err(DayplanError::Validation("No event selected".into()));
        };

        match self.store.delete(&id).await {
            Ok(id) => {
                self.close();
                Ok(id)
            }
            Err(e) => Err(self.keep_open(e)),
        }
    }

    /// Move `event` to a new range. Other fields are kept as they are.
    pub async fn drag(
        &self,
        event: &CalendarEvent,
        start: Timestamp,
        end: Timestamp,
    ) -> DayplanResult<Option<EventRecord>> {
        self.reschedule(event, start, end).await
    }

    /// Change the range of `event` by pulling one of its edges.
    pub async fn resize(
        &self,
        event: &CalendarEvent,
        start: Timestamp,
        end: Timestamp,
    ) -> DayplanResult<Option<EventRecord>> {
        self.reschedule(event, start, end).await
    }

    async fn reschedule(
        &self,
        event: &CalendarEvent,
        start: Timestamp,
        end: Timestamp,
    ) -> DayplanResult<Option<EventRecord>> {
        let Some(id) = event.id.as_ref() else {
            warn!(title = %event.title, "event missing id, ignoring gesture");
            return Ok(None);
        };

        debug!(%id, %start, %end, "rescheduling event");
        let draft = EventDraft {
            title: event.title.clone(),
            category: event.category,
            start,
            end,
            color: event.color.clone(),
        };
        self.store.update(id, &draft).await.map(Some)
    }

    fn keep_open(&mut self, err: DayplanError) -> DayplanError {
        if let Some(modal) = self.modal.as_mut() {
            modal.error = Some(err.notice_message());
        }
        err
    }
}
