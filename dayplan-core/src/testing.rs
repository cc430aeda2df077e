//! In-memory backend for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::api::{Backend, Operation};
use crate::error::{DayplanError, DayplanResult};
use crate::model::{EventId, GoalId};

/// Behaves like the REST backend: assigns `_id`s on create, replaces on
/// update, removes on delete. Failures and delays can be queued per call.
#[derive(Default)]
pub struct FakeBackend {
    events: Mutex<Vec<Value>>,
    goals: Mutex<Vec<Value>>,
    tasks: Mutex<HashMap<String, Vec<Value>>>,
    next_id: Mutex<u32>,
    list_override: Mutex<VecDeque<Value>>,
    failures: Mutex<VecDeque<DayplanError>>,
    delays: Mutex<VecDeque<Duration>>,
    requests: Mutex<Vec<(Operation, Option<String>, Value)>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        FakeBackend::default()
    }

    pub fn with_events(events: Vec<Value>) -> Self {
        let backend = FakeBackend::new();
        *backend.events.lock().unwrap() = events;
        backend
    }

    pub fn set_goals(&self, goals: Vec<Value>) {
        *self.goals.lock().unwrap() = goals;
    }

    pub fn set_tasks(&self, goal_id: &str, tasks: Vec<Value>) {
        self.tasks
            .lock()
            .unwrap()
            .insert(goal_id.to_string(), tasks);
    }

    /// The next list request returns `body` instead of the stored events.
    pub fn respond_to_next_list(&self, body: Value) {
        self.list_override.lock().unwrap().push_back(body);
    }

    /// The next request of any kind fails with `message`.
    pub fn fail_next(&self, message: &str) {
        self.fail_next_with(DayplanError::Network(message.to_string()));
    }

    /// The next request of any kind fails with `err`.
    pub fn fail_next_with(&self, err: DayplanError) {
        self.failures.lock().unwrap().push_back(err);
    }

    /// The next request waits `delay` before answering.
    pub fn delay_next(&self, delay: Duration) {
        self.delays.lock().unwrap().push_back(delay);
    }

    pub fn stored_events(&self) -> Vec<Value> {
        self.events.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<(Operation, Option<String>, Value)> {
        self.requests.lock().unwrap().clone()
    }

    async fn enter(&self, op: Operation, id: Option<&str>, body: &Value) -> DayplanResult<()> {
        self.requests
            .lock()
            .unwrap()
            .push((op, id.map(str::to_string), body.clone()));

        let delay = self.delays.lock().unwrap().pop_front();
        let failure = self.failures.lock().unwrap().pop_front();

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn list_events(&self) -> DayplanResult<Value> {
        let body = self.list_override.lock().unwrap().pop_front();
        self.enter(Operation::FetchEvents, None, &Value::Null).await?;
        Ok(body.unwrap_or_else(|| Value::Array(self.stored_events())))
    }

    async fn create_event(&self, body: Value) -> DayplanResult<Value> {
        self.enter(Operation::CreateEvent, None, &body).await?;

        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("evt-{}", *next)
        };

        let mut created = body;
        created["_id"] = json!(id);
        self.events.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_event(&self, id: &EventId, body: Value) -> DayplanResult<Value> {
        self.enter(Operation::UpdateEvent, Some(id.as_str()), &body)
            .await?;

        let mut events = self.events.lock().unwrap();
        let slot = events
            .iter_mut()
            .find(|e| e["_id"] == id.as_str())
            .ok_or_else(|| DayplanError::Network("Event not found".into()))?;

        let mut updated = body;
        updated["_id"] = json!(id.as_str());
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete_event(&self, id: &EventId) -> DayplanResult<()> {
        self.enter(Operation::DeleteEvent, Some(id.as_str()), &Value::Null)
            .await?;
        self.events
            .lock()
            .unwrap()
            .retain(|e| e["_id"] != id.as_str());
        Ok(())
    }

    async fn list_goals(&self) -> DayplanResult<Value> {
        self.enter(Operation::FetchGoals, None, &Value::Null).await?;
        Ok(Value::Array(self.goals.lock().unwrap().clone()))
    }

    async fn list_tasks(&self, goal_id: &GoalId) -> DayplanResult<Value> {
        self.enter(Operation::FetchTasks, Some(goal_id.as_str()), &Value::Null)
            .await?;
        let tasks = self
            .tasks
            .lock()
            .unwrap()
            .get(goal_id.as_str())
            .cloned()
            .unwrap_or_default();
        Ok(Value::Array(tasks))
    }
}
