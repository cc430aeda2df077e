//! Domain types shared by the stores, presenter and controller.
//!
//! These are the canonical in-memory shapes. How they look on the wire
//! (`_id` vs `id`, ISO-8601 strings) is handled in [`crate::wire`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::time::Timestamp;

/// Server-assigned identity of an event, goal or task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

pub type EventId = EntityId;
pub type GoalId = EntityId;
pub type TaskId = EntityId;

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        EntityId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId(s)
    }
}

/// Event category. Drives the fallback display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Exercise,
    Eating,
    Work,
    Relax,
    Family,
    Social,
    #[default]
    Default,
}

/// Gray used when neither an explicit nor a category color applies.
pub const DEFAULT_COLOR: &str = "#757575";

impl Category {
    /// Categories offered by the event form, in display order.
    pub const SELECTABLE: [Category; 6] = [
        Category::Exercise,
        Category::Eating,
        Category::Work,
        Category::Relax,
        Category::Family,
        Category::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Exercise => "exercise",
            Category::Eating => "eating",
            Category::Work => "work",
            Category::Relax => "relax",
            Category::Family => "family",
            Category::Social => "social",
            Category::Default => "default",
        }
    }

    /// Parse a category name. Unknown names fall back to `Default`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "exercise" => Category::Exercise,
            "eating" => Category::Eating,
            "work" => Category::Work,
            "relax" => Category::Relax,
            "family" => Category::Family,
            "social" => Category::Social,
            _ => Category::Default,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Category::Exercise => "#8bc34a",
            Category::Eating => "#ff9800",
            Category::Work => "#3f51b5",
            Category::Relax => "#9c27b0",
            Category::Family => "#f44336",
            Category::Social => "#2196f3",
            Category::Default => DEFAULT_COLOR,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Category::parse(&s))
    }
}

/// An event as confirmed by the server and held by the event store.
///
/// Timestamps stay in their wire form: malformed dates are kept here and
/// only dropped when the presenter derives display events.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: Option<EventId>,
    pub title: Option<String>,
    pub start: String,
    pub end: String,
    pub category: Option<Category>,
    pub color: Option<String>,
}

impl EventRecord {
    /// Whether this record carries the given identity.
    pub fn has_id(&self, id: &EventId) -> bool {
        self.id.as_ref() == Some(id)
    }
}

/// A user-entered event payload. Also used as the full replacement body
/// of an update.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub category: Category,
    pub start: Timestamp,
    pub end: Timestamp,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub goal_id: Option<GoalId>,
}
