//! REST backend for events, goals and tasks.
//!
//! [`Backend`] is the seam between the stores and the network. It moves raw
//! JSON; decoding into domain types happens in [`crate::wire`] so that a
//! malformed payload is a store-level validation error rather than a
//! transport failure.

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::error::{DayplanError, DayplanResult};
use crate::model::{EventId, GoalId};
use crate::wire::INVALID_LIST_MESSAGE;

/// A backend request, used for log fields and fallback error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchEvents,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    FetchGoals,
    FetchTasks,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::FetchEvents => "fetch_events",
            Operation::CreateEvent => "create_event",
            Operation::UpdateEvent => "update_event",
            Operation::DeleteEvent => "delete_event",
            Operation::FetchGoals => "fetch_goals",
            Operation::FetchTasks => "fetch_tasks",
        }
    }

    /// Shown when the server gives no message of its own.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Operation::FetchEvents => "Failed to fetch events",
            Operation::CreateEvent => "Failed to add event",
            Operation::UpdateEvent => "Failed to update event",
            Operation::DeleteEvent => "Failed to delete event",
            Operation::FetchGoals => "Failed to fetch goals",
            Operation::FetchTasks => "Failed to fetch tasks",
        }
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// GET /api/events
    async fn list_events(&self) -> DayplanResult<Value>;

    /// POST /api/events
    async fn create_event(&self, body: Value) -> DayplanResult<Value>;

    /// PUT /api/events/{id}
    async fn update_event(&self, id: &EventId, body: Value) -> DayplanResult<Value>;

    /// DELETE /api/events/{id}
    async fn delete_event(&self, id: &EventId) -> DayplanResult<()>;

    /// GET /api/events/goals
    async fn list_goals(&self) -> DayplanResult<Value>;

    /// GET /api/events/tasks/{goalId}
    async fn list_tasks(&self, goal_id: &GoalId) -> DayplanResult<Value>;
}

/// [`Backend`] over HTTP.
pub struct HttpBackend {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> DayplanResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DayplanError::Config(format!("Could not build HTTP client: {e}")))?;

        Ok(HttpBackend { http, config })
    }

    async fn send(
        &self,
        op: Operation,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> DayplanResult<Response> {
        let url = self.config.endpoint(segments)?;
        debug!(op = op.name(), %method, %url, "sending request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let resp = request.send().await.map_err(|e| {
            error!(op = op.name(), error = %e, "request failed");
            DayplanError::Network(op.fallback_message().to_string())
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = server_message(&text).unwrap_or_else(|| op.fallback_message().to_string());
        error!(op = op.name(), status = status.as_u16(), %message, "server rejected request");
        Err(DayplanError::Network(message))
    }

    async fn send_json(
        &self,
        op: Operation,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> DayplanResult<Value> {
        let resp = self.send(op, method, segments, body).await?;

        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        resp.json::<Value>().await.map_err(|e| {
            error!(op = op.name(), error = %e, "response body is not JSON");
            DayplanError::Validation(INVALID_LIST_MESSAGE.to_string())
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_events(&self) -> DayplanResult<Value> {
        self.send_json(Operation::FetchEvents, Method::GET, &["api", "events"], None)
            .await
    }

    async fn create_event(&self, body: Value) -> DayplanResult<Value> {
        self.send_json(
            Operation::CreateEvent,
            Method::POST,
            &["api", "events"],
            Some(body),
        )
        .await
    }

    async fn update_event(&self, id: &EventId, body: Value) -> DayplanResult<Value> {
        self.send_json(
            Operation::UpdateEvent,
            Method::PUT,
            &["api", "events", id.as_str()],
            Some(body),
        )
        .await
    }

    async fn delete_event(&self, id: &EventId) -> DayplanResult<()> {
        self.send(
            Operation::DeleteEvent,
            Method::DELETE,
            &["api", "events", id.as_str()],
            None,
        )
        .await?;
        Ok(())
    }

    async fn list_goals(&self) -> DayplanResult<Value> {
        self.send_json(
            Operation::FetchGoals,
            Method::GET,
            &["api", "events", "goals"],
            None,
        )
        .await
    }

    async fn list_tasks(&self, goal_id: &GoalId) -> DayplanResult<Value> {
        self.send_json(
            Operation::FetchTasks,
            Method::GET,
            &["api", "events", "tasks", goal_id.as_str()],
            None,
        )
        .await
    }
}

/// Extract a human-readable message from an error response body.
///
/// Accepts `{"error": "..."}`, `{"message": "..."}`, a bare JSON string, or
/// plain text.
pub fn server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => ["error", "message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        Ok(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Ok(_) => None,
        Err(_) => Some(body.to_string()),
    }
}
