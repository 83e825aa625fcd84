//! Audit-trail entry types.
//!
//! The action vocabulary is a closed enumeration: new kinds are added
//! here explicitly, never inferred from free text, so role-visibility
//! rules and any action-specific logic stay exhaustive-checked.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The fixed vocabulary of auditable actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    PlateCreated,
    WorkStarted,
    WorkPaused,
    WorkStopped,
    WorkCompleted,
    AdminEdit,
    FileUploaded,
}

impl HistoryAction {
    /// Display label, as rendered in audit views.
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryAction::PlateCreated => "Plate created",
            HistoryAction::WorkStarted => "Work started",
            HistoryAction::WorkPaused => "Work paused",
            HistoryAction::WorkStopped => "Work stopped",
            HistoryAction::WorkCompleted => "Work completed",
            HistoryAction::AdminEdit => "Admin edit",
            HistoryAction::FileUploaded => "File uploaded",
        }
    }

    /// Whether a non-administrator may see entries of this kind.
    ///
    /// A pure function of the action: operators see completions,
    /// uploads and creation regardless of who authored the entry.
    pub fn operator_visible(self) -> bool {
        matches!(
            self,
            HistoryAction::WorkCompleted
                | HistoryAction::FileUploaded
                | HistoryAction::PlateCreated
        )
    }
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable audit record of a state-changing action on a plate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Unique within the owning plate's history.
    pub id: String,

    pub action: HistoryAction,

    /// Actor name. String identity only; no account reference is
    /// resolved or enforced.
    pub user: String,

    /// Timestamp; non-decreasing from older to newer entries within a
    /// single plate's history.
    pub date: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
