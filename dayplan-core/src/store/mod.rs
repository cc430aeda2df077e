//! Client-side state containers.
//!
//! Each store pairs a plain state struct with a `reduce` step and wraps it
//! in a lock so operations can be awaited concurrently.

pub mod events;
pub mod goals;
pub mod lifecycle;

pub use events::{Applied, EventAction, EventResource, EventState, EventStore};
pub use goals::{GoalAction, GoalResource, GoalState, GoalStore};
pub use lifecycle::{Notice, RequestStatus, Seq, Sequencer};
