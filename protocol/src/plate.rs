//! The plate entity and its two state axes.
//!
//! A plate carries two independent axes:
//! - `health` — durability/condition (`new`, `used`, `locked`)
//! - `occupancy` — whether someone is actively working on it right now
//!
//! The audit history is the single source of truth for "last modified":
//! [`Plate::last_modified_by`] and [`Plate::last_modified_date`] are
//! projections of the newest history entry, never stored separately.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::history::{HistoryAction, HistoryEntry};

/// Durability/condition axis of a plate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    /// Never used for production work.
    New,
    /// Has completed or hosted at least one work session.
    Used,
    /// Pulled from service; no new work may start.
    Locked,
}

impl Health {
    pub fn as_str(self) -> &'static str {
        match self {
            Health::New => "new",
            Health::Used => "used",
            Health::Locked => "locked",
        }
    }
}

impl std::str::FromStr for Health {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Health::New),
            "used" => Ok(Health::Used),
            "locked" => Ok(Health::Locked),
            other => Err(format!("unknown health: {other}")),
        }
    }
}

/// Concurrency axis of a plate: is someone working on it right now.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Occupancy {
    Free,
    InUse,
}

impl Occupancy {
    pub fn as_str(self) -> &'static str {
        match self {
            Occupancy::Free => "free",
            Occupancy::InUse => "in-use",
        }
    }
}

/// Which per-plate artifact slot an upload targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    PreviewImage,
    ExchangeFile,
}

impl ArtifactKind {
    /// Human-readable label used in history details and error messages.
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::PreviewImage => "preview image",
            ArtifactKind::ExchangeFile => "X_T file",
        }
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preview-image" => Ok(ArtifactKind::PreviewImage),
            "exchange-file" => Ok(ArtifactKind::ExchangeFile),
            other => Err(format!("unknown artifact kind: {other}")),
        }
    }
}

/// Reference to an artifact held by the external artifact store.
///
/// The core never sees file bytes; only a display name travels through.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ArtifactRef {
    pub file_name: String,
}

impl ArtifactRef {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

/// A tracked clamping plate.
///
/// Immutable fields: `id` (never reused). Everything else is mutated
/// only through lifecycle transitions, each of which appends exactly one
/// history entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Plate {
    /// Stable unique identifier (immutable).
    pub id: String,

    /// Optional human label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Physical location; free text, always non-empty.
    pub shelf: String,

    pub health: Health,
    pub occupancy: Occupancy,

    /// Free text, overwritten (not appended) by most transitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Identifier of the most recently completed job; assigned only on
    /// successful completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_work_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<ArtifactRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xt_file: Option<ArtifactRef>,

    /// Audit trail, newest first, append-only, never empty after
    /// creation.
    pub history: Vec<HistoryEntry>,
}

impl Plate {
    /// Actor of the most recent history entry.
    pub fn last_modified_by(&self) -> Option<&str> {
        self.history.first().map(|e| e.user.as_str())
    }

    /// Timestamp of the most recent history entry.
    pub fn last_modified_date(&self) -> Option<DateTime<Utc>> {
        self.history.first().map(|e| e.date)
    }

    /// Author of the most recent `Work started` entry.
    ///
    /// Meaningful only while `occupancy` is `in-use`: the current
    /// session's owner. Upload events may interleave, so this scans past
    /// them rather than assuming `history[0]`.
    pub fn session_owner(&self) -> Option<&str> {
        self.history
            .iter()
            .find(|e| e.action == HistoryAction::WorkStarted)
            .map(|e| e.user.as_str())
    }

    /// Case-insensitive substring match over id, name, last work name
    /// and shelf. An empty needle matches everything.
    pub fn matches_search(&self, search: &str) -> bool {
        if search.is_empty() {
            return true;
        }
        let needle = search.to_lowercase();
        let hit = |field: &str| field.to_lowercase().contains(&needle);
        hit(&self.id)
            || self.name.as_deref().is_some_and(hit)
            || self.last_work_name.as_deref().is_some_and(hit)
            || hit(&self.shelf)
    }
}
