//! Wire format adapter.
//!
//! The backend identifies entities by `_id` (and sometimes `id`), sends
//! timestamps as ISO-8601 strings, and is not always consistent about either.
//! Everything is normalized here on ingress so the rest of the crate only sees
//! [`EntityId`] and wall-clock [`Timestamp`]s.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{DayplanError, DayplanResult};
use crate::model::{Category, EntityId, EventDraft, EventRecord, Goal, Task};
use crate::time::Timestamp;

/// Message used when a list endpoint returns something other than a list.
pub const INVALID_LIST_MESSAGE: &str = "Invalid data format received from server";

#[derive(Deserialize)]
struct InboundEvent {
    #[serde(rename = "_id")]
    underscore_id: Option<Value>,
    id: Option<Value>,
    title: Option<String>,
    start: Option<Value>,
    end: Option<Value>,
    category: Option<Category>,
    color: Option<String>,
}

#[derive(Deserialize)]
struct InboundGoal {
    #[serde(rename = "_id")]
    underscore_id: Option<Value>,
    id: Option<Value>,
    name: Option<Value>,
}

#[derive(Deserialize)]
struct InboundTask {
    #[serde(rename = "_id")]
    underscore_id: Option<Value>,
    id: Option<Value>,
    name: Option<Value>,
    #[serde(rename = "goalId", alias = "goal")]
    goal_id: Option<Value>,
}

#[derive(Serialize)]
struct OutboundEvent<'a> {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    title: &'a str,
    start: String,
    end: String,
    category: Category,
    color: &'a str,
}

/// Resolve the identity from either wire field, preferring `_id`.
fn resolve_id(underscore_id: Option<Value>, id: Option<Value>) -> Option<EntityId> {
    underscore_id
        .and_then(id_from_value)
        .or_else(|| id.and_then(id_from_value))
}

fn id_from_value(value: Value) -> Option<EntityId> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(EntityId::new(s)),
        Value::Number(n) => Some(EntityId::new(n.to_string())),
        _ => None,
    }
}

/// Timestamps normally arrive as strings. Numbers are epoch milliseconds.
/// Anything else becomes an empty string, which the presenter rejects.
fn timestamp_from_value(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn name_from_value(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

/// Decode a single event object.
pub fn decode_event(value: Value) -> DayplanResult<EventRecord> {
    let inbound: InboundEvent = serde_json::from_value(value)?;

    Ok(EventRecord {
        id: resolve_id(inbound.underscore_id, inbound.id),
        title: inbound.title,
        start: timestamp_from_value(inbound.start),
        end: timestamp_from_value(inbound.end),
        category: inbound.category,
        color: inbound.color.filter(|c| !c.trim().is_empty()),
    })
}

pub fn decode_goal(value: Value) -> DayplanResult<Goal> {
    let inbound: InboundGoal = serde_json::from_value(value)?;
    let id = resolve_id(inbound.underscore_id, inbound.id)
        .ok_or_else(|| DayplanError::DataIntegrity("goal without identity".into()))?;

    Ok(Goal {
        id,
        name: name_from_value(inbound.name),
    })
}

pub fn decode_task(value: Value) -> DayplanResult<Task> {
    let inbound: InboundTask = serde_json::from_value(value)?;
    let id = resolve_id(inbound.underscore_id, inbound.id)
        .ok_or_else(|| DayplanError::DataIntegrity("task without identity".into()))?;

    Ok(Task {
        id,
        name: name_from_value(inbound.name),
        goal_id: inbound.goal_id.and_then(id_from_value),
    })
}

/// Decode a list response.
///
/// A body that is not a JSON array is a validation error and the caller must
/// keep its previous state. Elements that fail to decode are logged and
/// skipped.
pub fn decode_list<T>(
    value: Value,
    kind: &str,
    decode: fn(Value) -> DayplanResult<T>,
) -> DayplanResult<Vec<T>> {
    let Value::Array(items) = value else {
        warn!(kind, "server did not return a list");
        return Err(DayplanError::Validation(INVALID_LIST_MESSAGE.to_string()));
    };

    let decoded = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match decode(item) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(kind, index, error = %e, "skipping malformed list entry");
                None
            }
        })
        .collect();

    Ok(decoded)
}

/// Serialize a local timestamp the way the backend stores them:
/// UTC, millisecond precision, `Z` suffix.
pub fn format_timestamp(ts: Timestamp) -> String {
    let utc = Local
        .from_local_datetime(&ts)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // Wall-clock times skipped by a DST jump have no local instant.
        .unwrap_or_else(|| ts.and_utc());

    utc.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Request body for create (`id == None`) and update (`id` sent as `_id`).
pub fn encode_draft(draft: &EventDraft, id: Option<&EntityId>) -> DayplanResult<Value> {
    let outbound = OutboundEvent {
        id: id.map(EntityId::as_str),
        title: &draft.title,
        start: format_timestamp(draft.start),
        end: format_timestamp(draft.end),
        category: draft.category,
        color: &draft.color,
    };

    Ok(serde_json::to_value(outbound)?)
}
