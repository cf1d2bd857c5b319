//! Event Calendar Core Library
//!
//! Recurrence expansion and time-conflict detection for calendar events,
//! plus a small planner that applies edits to an event store.

pub mod conflict;
pub mod error;
pub mod planner;
pub mod query;
pub mod recurrence;
pub mod store;
pub mod types;

// Re-export core types and error handling
pub use error::{Error, Result};
pub use types::*;

/// Commonly used items
pub mod prelude {
    pub use crate::{conflict::*, planner::*, query::*, recurrence::*, store::*, types::*};
}
