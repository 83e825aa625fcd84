//! Query vocabulary for list views: status classes, sort keys and sort
//! direction.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Named predicate over a plate's health/occupancy/work fields.
///
/// Three disjoint families: health classes, occupancy classes, and the
/// derived classes `ongoing-work` (in-use, optionally scoped to the
/// caller's own sessions) and `history` (has a completed job on record).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StatusClass {
    NewHealth,
    UsedHealth,
    LockedHealth,
    FreeOccupancy,
    InUseOccupancy,
    OngoingWork,
    History,
}

impl StatusClass {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusClass::NewHealth => "new-health",
            StatusClass::UsedHealth => "used-health",
            StatusClass::LockedHealth => "locked-health",
            StatusClass::FreeOccupancy => "free-occupancy",
            StatusClass::InUseOccupancy => "in-use-occupancy",
            StatusClass::OngoingWork => "ongoing-work",
            StatusClass::History => "history",
        }
    }
}

impl std::str::FromStr for StatusClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new-health" => Ok(StatusClass::NewHealth),
            "used-health" => Ok(StatusClass::UsedHealth),
            "locked-health" => Ok(StatusClass::LockedHealth),
            "free-occupancy" => Ok(StatusClass::FreeOccupancy),
            "in-use-occupancy" => Ok(StatusClass::InUseOccupancy),
            "ongoing-work" => Ok(StatusClass::OngoingWork),
            "history" => Ok(StatusClass::History),
            other => Err(format!("unknown status class: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Status,
    Shelf,
    #[default]
    Modified,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortKey::Name),
            "status" => Ok(SortKey::Status),
            "shelf" => Ok(SortKey::Shelf),
            "modified" => Ok(SortKey::Modified),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}
