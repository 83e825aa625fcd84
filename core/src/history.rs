//! Append-only audit log per plate, plus the role visibility filter.
//!
//! Entries are prepended (newest first) and never reordered or pruned.
//! The newest entry doubles as the plate's "last modified" record, so
//! the append and every dependent field update must happen under the
//! same plate lock (see `catalog`).

use chrono::Utc;
use platetrack_protocol::{HistoryAction, HistoryEntry, Plate, Role};
use uuid::Uuid;

/// Append an audit entry for `action` to the front of `plate.history`.
///
/// Entry timestamps are clamped to the previous newest entry so a
/// plate's history stays monotonically non-decreasing even if the wall
/// clock steps backwards between appends.
pub fn record(plate: &mut Plate, action: HistoryAction, user: &str, details: Option<String>) {
    let now = Utc::now();
    let date = plate.last_modified_date().map_or(now, |prev| now.max(prev));
    let entry = HistoryEntry {
        id: Uuid::new_v4().to_string(),
        action,
        user: user.to_string(),
        date,
        details,
    };
    plate.history.insert(0, entry);
}

/// Role-filtered view of a history.
///
/// Administrators see every entry. Operators see only completion,
/// upload and creation entries; the filter depends on the action kind
/// alone, never on who authored the entry.
pub fn visible_to(role: Role, entries: &[HistoryEntry]) -> Vec<HistoryEntry> {
    match role {
        Role::Administrator => entries.to_vec(),
        Role::Operator => entries
            .iter()
            .filter(|e| e.action.operator_visible())
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use platetrack_protocol::{Health, Occupancy};
    use pretty_assertions::assert_eq;

    use super::*;

    fn bare_plate() -> Plate {
        Plate {
            id: "P100".to_string(),
            name: None,
            shelf: "A-01".to_string(),
            health: Health::New,
            occupancy: Occupancy::Free,
            notes: None,
            last_work_name: None,
            preview_image: None,
            xt_file: None,
            history: Vec::new(),
        }
    }

    #[test]
    fn record_prepends_newest_first() {
        let mut plate = bare_plate();
        record(&mut plate, HistoryAction::PlateCreated, "Admin", None);
        record(&mut plate, HistoryAction::WorkStarted, "John Smith", None);

        assert_eq!(plate.history.len(), 2);
        assert_eq!(plate.history[0].action, HistoryAction::WorkStarted);
        assert_eq!(plate.history[1].action, HistoryAction::PlateCreated);
        assert!(plate.history[0].date >= plate.history[1].date);
    }

    #[test]
    fn record_clamps_to_previous_entry_date() {
        let mut plate = bare_plate();
        record(&mut plate, HistoryAction::PlateCreated, "Admin", None);
        // Simulate a clock that ran ahead: newest entry is in the future.
        let future = Utc::now() + Duration::hours(1);
        plate.history[0].date = future;

        record(&mut plate, HistoryAction::WorkStarted, "John Smith", None);
        assert_eq!(plate.history[0].date, future);
    }

    #[test]
    fn record_assigns_unique_entry_ids() {
        let mut plate = bare_plate();
        record(&mut plate, HistoryAction::PlateCreated, "Admin", None);
        record(&mut plate, HistoryAction::WorkStarted, "John Smith", None);
        assert_ne!(plate.history[0].id, plate.history[1].id);
    }

    #[test]
    fn operator_sees_only_completion_upload_creation() {
        let mut plate = bare_plate();
        record(&mut plate, HistoryAction::PlateCreated, "Admin", None);
        record(&mut plate, HistoryAction::WorkStarted, "John Smith", None);
        record(&mut plate, HistoryAction::WorkCompleted, "Sarah Johnson", None);
        record(&mut plate, HistoryAction::AdminEdit, "Admin", None);
        record(&mut plate, HistoryAction::FileUploaded, "Mike Wilson", None);

        let visible = visible_to(Role::Operator, &plate.history);
        let actions: Vec<HistoryAction> = visible.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                HistoryAction::FileUploaded,
                HistoryAction::WorkCompleted,
                HistoryAction::PlateCreated,
            ]
        );
    }

    #[test]
    fn operator_filter_ignores_author() {
        let mut plate = bare_plate();
        // A completion by someone else is still visible to an operator.
        record(&mut plate, HistoryAction::WorkCompleted, "Sarah Johnson", None);
        let visible = visible_to(Role::Operator, &plate.history);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].user, "Sarah Johnson");
    }

    #[test]
    fn visibility_filter_is_idempotent_and_admin_is_identity() {
        let mut plate = bare_plate();
        record(&mut plate, HistoryAction::PlateCreated, "Admin", None);
        record(&mut plate, HistoryAction::WorkStopped, "John Smith", None);
        record(&mut plate, HistoryAction::WorkCompleted, "John Smith", None);

        let once = visible_to(Role::Operator, &plate.history);
        let twice = visible_to(Role::Operator, &once);
        assert_eq!(once, twice);

        let admin = visible_to(Role::Administrator, &plate.history);
        assert_eq!(admin, plate.history);
    }
}
