//! Stable multi-key ordering over a query result set.
//!
//! The sort must be stable: two plates can share an identical key
//! (same shelf, same modification instant) and must not visibly
//! reorder between renders.

use platetrack_protocol::{Plate, SortDirection, SortKey};

/// Order `plates` in place by `key` and `direction`.
pub fn order(plates: &mut [Plate], key: SortKey, direction: SortDirection) {
    plates.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Name => name_key(a).cmp(name_key(b)),
            SortKey::Status => status_key(a).cmp(&status_key(b)),
            SortKey::Shelf => a.shelf.cmp(&b.shelf),
            SortKey::Modified => a.last_modified_date().cmp(&b.last_modified_date()),
        };
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Plates without a label sort by id.
fn name_key(plate: &Plate) -> &str {
    plate.name.as_deref().unwrap_or(&plate.id)
}

/// Composite status key: health is the primary sub-key, occupancy the
/// secondary, compared as one concatenated string.
fn status_key(plate: &Plate) -> String {
    format!("{}{}", plate.health.as_str(), plate.occupancy.as_str())
}
