//! Client core for the dayplan planner.
//!
//! This crate holds everything below the user interface:
//! - [`store`] keeps events, goals and tasks in sync with the REST backend
//! - [`presenter`] turns stored events into render-ready calendar events
//! - [`controller`] maps calendar gestures and the event modal onto store operations
//!
//! [`client::DayplanClient`] wires these together over a single [`api::Backend`].

pub mod api;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod presenter;
pub mod store;
pub mod time;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use client::DayplanClient;
pub use config::ClientConfig;
pub use error::{DayplanError, DayplanResult};
pub use model::{Category, EntityId, EventDraft, EventId, EventRecord, Goal, GoalId, Task, TaskId};
pub use presenter::CalendarEvent;
