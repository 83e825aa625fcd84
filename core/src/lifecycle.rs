//! Plate lifecycle state machine.
//!
//! Five operations drive the `health × occupancy` machine; each is
//! atomic: it either fully applies (field updates plus exactly one
//! history append) or leaves the plate untouched and reports which
//! precondition failed.
//!
//! StartWork/PauseWork/StopWork/FinishWork model a single work session
//! (`free → in-use → free`) nested inside the coarser health
//! progression (`new → used`, or anything `→ locked`). Locking is
//! reachable only through AdminEdit.

use chrono::Utc;
use platetrack_protocol::{
    Actor, ArtifactKind, ArtifactRef, Health, HistoryAction, Occupancy, Plate,
};
use uuid::Uuid;

use crate::history;

/// A lifecycle operation was rejected: the named precondition was not
/// met. The plate is unchanged, history included.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InvalidTransition {
    #[error("plate is locked")]
    PlateLocked,

    #[error("plate is already in use")]
    AlreadyInUse,

    #[error("no active work session on this plate")]
    NoActiveSession,

    #[error("confirmation text must match plate id {expected} exactly")]
    ConfirmationMismatch { expected: String },

    #[error("missing required {} artifact", .0.label())]
    MissingArtifact(ArtifactKind),

    #[error("requires administrator capability")]
    RequiresAdministrator,

    #[error("shelf location cannot be empty")]
    EmptyShelf,
}

/// Field changes requested by an administrator edit.
///
/// `None` leaves a field unchanged; for the optional text fields an
/// empty string clears the value.
#[derive(Debug, Clone, Default)]
pub struct AdminEdit {
    pub name: Option<String>,
    pub shelf: Option<String>,
    pub health: Option<Health>,
    pub notes: Option<String>,
    pub new_preview_image: Option<ArtifactRef>,
    pub new_xt_file: Option<ArtifactRef>,
}

/// Begin a work session. Requires an unlocked, free plate.
pub fn start_work(plate: &mut Plate, actor: &Actor) -> Result<(), InvalidTransition> {
    if plate.health == Health::Locked {
        return Err(InvalidTransition::PlateLocked);
    }
    if plate.occupancy == Occupancy::InUse {
        return Err(InvalidTransition::AlreadyInUse);
    }

    plate.occupancy = Occupancy::InUse;
    history::record(
        plate,
        HistoryAction::WorkStarted,
        &actor.name,
        Some("Work session began".to_string()),
    );
    Ok(())
}

/// Pause the active session: the plate becomes free and is marked used.
pub fn pause_work(plate: &mut Plate, actor: &Actor) -> Result<(), InvalidTransition> {
    if plate.occupancy != Occupancy::InUse {
        return Err(InvalidTransition::NoActiveSession);
    }

    plate.health = Health::Used;
    plate.occupancy = Occupancy::Free;
    history::record(
        plate,
        HistoryAction::WorkPaused,
        &actor.name,
        Some("Work session paused".to_string()),
    );
    Ok(())
}

/// Abort the active session without producing artifacts.
///
/// Discards in-progress work context, so the caller must retype the
/// plate id verbatim as an extra confirmation gate. The operator
/// message overwrites the plate notes and is recorded as the entry
/// details.
pub fn stop_work(
    plate: &mut Plate,
    actor: &Actor,
    confirm_text: &str,
    message: &str,
) -> Result<(), InvalidTransition> {
    if plate.occupancy != Occupancy::InUse {
        return Err(InvalidTransition::NoActiveSession);
    }
    if confirm_text != plate.id {
        return Err(InvalidTransition::ConfirmationMismatch {
            expected: plate.id.clone(),
        });
    }

    plate.occupancy = Occupancy::Free;
    plate.notes = Some(message.to_string());
    history::record(
        plate,
        HistoryAction::WorkStopped,
        &actor.name,
        Some(message.to_string()),
    );
    Ok(())
}

/// Complete the active session. Both artifacts must be present.
///
/// Installs the new artifact references, assigns a freshly generated
/// job identifier (returned to the caller), and overwrites the notes.
pub fn finish_work(
    plate: &mut Plate,
    actor: &Actor,
    new_xt_file: Option<ArtifactRef>,
    new_preview_image: Option<ArtifactRef>,
    notes: Option<String>,
) -> Result<String, InvalidTransition> {
    if plate.occupancy != Occupancy::InUse {
        return Err(InvalidTransition::NoActiveSession);
    }
    let Some(xt_file) = new_xt_file else {
        return Err(InvalidTransition::MissingArtifact(ArtifactKind::ExchangeFile));
    };
    let Some(preview_image) = new_preview_image else {
        return Err(InvalidTransition::MissingArtifact(ArtifactKind::PreviewImage));
    };

    let notes = notes.filter(|n| !n.trim().is_empty());
    let details = match &notes {
        Some(n) => format!("Work finished with file updates: {n}"),
        None => "Work finished with file updates".to_string(),
    };
    let work_name = new_work_name();

    plate.health = Health::Used;
    plate.occupancy = Occupancy::Free;
    plate.last_work_name = Some(work_name.clone());
    plate.notes = notes;
    plate.xt_file = Some(xt_file);
    plate.preview_image = Some(preview_image);
    history::record(plate, HistoryAction::WorkCompleted, &actor.name, Some(details));
    Ok(work_name)
}

/// Apply an administrator edit.
///
/// Health may be set to any of new/used/locked; occupancy is never set
/// directly. Setting `health = locked` on an in-use plate force-ends
/// the session (occupancy resets to free) and the details note it.
pub fn admin_edit(
    plate: &mut Plate,
    actor: &Actor,
    edit: AdminEdit,
) -> Result<(), InvalidTransition> {
    if !actor.role.is_administrator() {
        return Err(InvalidTransition::RequiresAdministrator);
    }
    if edit.shelf.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(InvalidTransition::EmptyShelf);
    }

    let mut changes: Vec<&str> = Vec::new();

    if let Some(name) = edit.name {
        let name = if name.is_empty() { None } else { Some(name) };
        if name != plate.name {
            changes.push("name");
            plate.name = name;
        }
    }
    if let Some(shelf) = edit.shelf
        && shelf != plate.shelf
    {
        changes.push("shelf");
        plate.shelf = shelf;
    }
    let mut force_released = false;
    if let Some(health) = edit.health
        && health != plate.health
    {
        changes.push("status");
        plate.health = health;
        if health == Health::Locked && plate.occupancy == Occupancy::InUse {
            plate.occupancy = Occupancy::Free;
            force_released = true;
        }
    }
    if let Some(notes) = edit.notes {
        let notes = if notes.is_empty() { None } else { Some(notes) };
        if notes != plate.notes {
            changes.push("notes");
            plate.notes = notes;
        }
    }
    if let Some(preview) = edit.new_preview_image {
        changes.push("preview image");
        plate.preview_image = Some(preview);
    }
    if let Some(xt) = edit.new_xt_file {
        changes.push("X_T file");
        plate.xt_file = Some(xt);
    }

    let mut details = format!(
        "Updated by administrator: {}",
        if changes.is_empty() {
            "no changes".to_string()
        } else {
            changes.join(", ")
        }
    );
    if force_released {
        details.push_str("; active session force-released");
    }

    history::record(plate, HistoryAction::AdminEdit, &actor.name, Some(details));
    Ok(())
}

/// Record a completed artifact upload reported by the artifact store.
///
/// Replaces the targeted artifact slot. Uploads are an administrative
/// surface, so the administrator capability is required.
pub fn record_upload(
    plate: &mut Plate,
    actor: &Actor,
    kind: ArtifactKind,
    artifact: ArtifactRef,
) -> Result<(), InvalidTransition> {
    if !actor.role.is_administrator() {
        return Err(InvalidTransition::RequiresAdministrator);
    }

    let details = format!("Uploaded new {}: {}", kind.label(), artifact.file_name);
    match kind {
        ArtifactKind::PreviewImage => plate.preview_image = Some(artifact),
        ArtifactKind::ExchangeFile => plate.xt_file = Some(artifact),
    }
    history::record(plate, HistoryAction::FileUploaded, &actor.name, Some(details));
    Ok(())
}

/// Generate a job identifier: `W<utc timestamp>_<short suffix>`.
fn new_work_name() -> String {
    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("W{stamp}_{}", &suffix[..4])
}
