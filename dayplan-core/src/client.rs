//! Wires the stores to one backend.

use std::sync::Arc;
use std::time::Instant;

use crate::api::{Backend, HttpBackend};
use crate::config::ClientConfig;
use crate::controller::InteractionController;
use crate::error::DayplanResult;
use crate::store::{EventStore, GoalStore};

/// The event store, goal store and config sharing a single backend.
pub struct DayplanClient<B> {
    config: ClientConfig,
    events: Arc<EventStore<B>>,
    goals: Arc<GoalStore<B>>,
}

impl DayplanClient<HttpBackend> {
    /// Client talking to the REST backend at `config.api_base_url`.
    pub fn connect(config: ClientConfig) -> DayplanResult<Self> {
        let backend = Arc::new(HttpBackend::new(config.clone())?);
        Ok(DayplanClient::with_backend(backend, config))
    }
}

impl<B: Backend> DayplanClient<B> {
    pub fn with_backend(backend: Arc<B>, config: ClientConfig) -> Self {
        DayplanClient {
            events: Arc::new(EventStore::new(Arc::clone(&backend), &config)),
            goals: Arc::new(GoalStore::new(backend, &config)),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventStore<B>> {
        &self.events
    }

    pub fn goals(&self) -> &Arc<GoalStore<B>> {
        &self.goals
    }

    /// A fresh controller over the event store, with no modal open.
    pub fn controller(&self) -> InteractionController<B> {
        InteractionController::new(Arc::clone(&self.events))
    }

    /// Expire error notices that have been visible long enough. Returns true
    /// if any notice was removed.
    pub fn tick(&self, now: Instant) -> bool {
        let events = self.events.expire_error(now);
        let goals = self.goals.expire_error(now);
        events || goals
    }
}
