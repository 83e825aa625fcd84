//! `platetrack-protocol` — shared data model for the plate tracker.
//!
//! Types in this crate are the contract between the lifecycle engine
//! (`platetrack-core`) and its consumers: the plate entity and its two
//! state axes, the closed audit-action vocabulary, actor capabilities,
//! and the query vocabulary used by list views.
//!
//! The crate is intentionally logic-free: transition rules live in
//! `platetrack-core`.

pub mod actor;
pub mod history;
pub mod plate;
pub mod query;

pub use actor::{Actor, Role};
pub use history::{HistoryAction, HistoryEntry};
pub use plate::{ArtifactKind, ArtifactRef, Health, Occupancy, Plate};
pub use query::{SortDirection, SortKey, StatusClass};
