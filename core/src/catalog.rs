//! In-memory working set of plates, keyed by id.
//!
//! Each plate sits behind its own `Arc<Mutex<_>>` so transitions on
//! distinct plates never contend, while two concurrent transitions on
//! the same plate serialize: the second sees the first's result and
//! fails its precondition check instead of double-applying. Readers
//! clone a snapshot under the plate lock, so they can never observe a
//! half-applied transition (the history append and every dependent
//! field update happen under that same lock).

use std::collections::HashMap;
use std::sync::Arc;

use platetrack_protocol::{
    Actor, ArtifactKind, ArtifactRef, Health, HistoryAction, HistoryEntry, Occupancy, Plate, Role,
    StatusClass,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::history;
use crate::lifecycle::{self, AdminEdit, InvalidTransition};

/// Error type for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("plate not found: {id}")]
    NotFound { id: String },

    #[error("duplicate plate id: {id}")]
    DuplicateId { id: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// Fields for a new plate. The catalog seeds the `Plate created` audit
/// entry itself.
#[derive(Debug, Clone, Default)]
pub struct NewPlate {
    pub id: String,
    pub name: Option<String>,
    pub shelf: String,
    pub notes: Option<String>,
    pub preview_image: Option<ArtifactRef>,
    pub xt_file: Option<ArtifactRef>,
}

/// Dashboard counts over the working set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogSummary {
    pub total: usize,
    pub new: usize,
    pub used: usize,
    pub locked: usize,
    pub free: usize,
    pub in_use: usize,
    /// Plates whose active session belongs to the caller.
    pub my_active: usize,
}

/// One row of the cross-plate activity feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityEntry {
    pub plate_id: String,
    pub entry: HistoryEntry,
}

/// The working set of plates for one session.
#[derive(Default)]
pub struct Catalog {
    plates: RwLock<HashMap<String, Arc<Mutex<Plate>>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a persisted snapshot, rejecting duplicate
    /// ids.
    pub fn from_snapshot(plates: Vec<Plate>) -> Result<Self, CatalogError> {
        let mut map = HashMap::new();
        for plate in plates {
            let id = plate.id.clone();
            if map.insert(id.clone(), Arc::new(Mutex::new(plate))).is_some() {
                return Err(CatalogError::DuplicateId { id });
            }
        }
        Ok(Self {
            plates: RwLock::new(map),
        })
    }

    pub async fn len(&self) -> usize {
        self.plates.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.plates.read().await.is_empty()
    }

    /// Register a new plate. Administrator only; ids are never reused.
    pub async fn create(&self, actor: &Actor, request: NewPlate) -> Result<Plate, CatalogError> {
        if !actor.role.is_administrator() {
            return Err(CatalogError::InvalidRequest {
                reason: "plate creation requires administrator".to_string(),
            });
        }
        if request.id.trim().is_empty() {
            return Err(CatalogError::InvalidRequest {
                reason: "plate id cannot be empty".to_string(),
            });
        }
        if request.shelf.trim().is_empty() {
            return Err(CatalogError::InvalidRequest {
                reason: "shelf location cannot be empty".to_string(),
            });
        }

        let mut plate = Plate {
            id: request.id.clone(),
            name: request.name,
            shelf: request.shelf,
            health: Health::New,
            occupancy: Occupancy::Free,
            notes: request.notes,
            last_work_name: None,
            preview_image: request.preview_image,
            xt_file: request.xt_file,
            history: Vec::new(),
        };
        history::record(
            &mut plate,
            HistoryAction::PlateCreated,
            &actor.name,
            Some("New plate added to system".to_string()),
        );

        let mut map = self.plates.write().await;
        if map.contains_key(&request.id) {
            return Err(CatalogError::DuplicateId { id: request.id });
        }
        map.insert(request.id.clone(), Arc::new(Mutex::new(plate.clone())));
        tracing::info!("plate {} created by {}", request.id, actor.name);
        Ok(plate)
    }

    /// Snapshot of a single plate.
    pub async fn get(&self, id: &str) -> Result<Plate, CatalogError> {
        let slot = self.slot(id).await?;
        let plate = slot.lock().await;
        Ok(plate.clone())
    }

    /// Snapshot of every plate, ordered by id for deterministic output.
    pub async fn snapshot(&self) -> Vec<Plate> {
        let slots: Vec<Arc<Mutex<Plate>>> = {
            let map = self.plates.read().await;
            map.values().cloned().collect()
        };
        let mut plates = Vec::with_capacity(slots.len());
        for slot in slots {
            plates.push(slot.lock().await.clone());
        }
        plates.sort_by(|a, b| a.id.cmp(&b.id));
        plates
    }

    pub async fn start_work(&self, id: &str, actor: &Actor) -> Result<Plate, CatalogError> {
        self.transition(id, actor, "work started", |plate, actor| {
            lifecycle::start_work(plate, actor)
        })
        .await
    }

    pub async fn pause_work(&self, id: &str, actor: &Actor) -> Result<Plate, CatalogError> {
        self.transition(id, actor, "work paused", |plate, actor| {
            lifecycle::pause_work(plate, actor)
        })
        .await
    }

    pub async fn stop_work(
        &self,
        id: &str,
        actor: &Actor,
        confirm_text: &str,
        message: &str,
    ) -> Result<Plate, CatalogError> {
        self.transition(id, actor, "work stopped", |plate, actor| {
            lifecycle::stop_work(plate, actor, confirm_text, message)
        })
        .await
    }

    pub async fn finish_work(
        &self,
        id: &str,
        actor: &Actor,
        new_xt_file: Option<ArtifactRef>,
        new_preview_image: Option<ArtifactRef>,
        notes: Option<String>,
    ) -> Result<Plate, CatalogError> {
        self.transition(id, actor, "work completed", move |plate, actor| {
            lifecycle::finish_work(plate, actor, new_xt_file, new_preview_image, notes)
                .map(|_work_name| ())
        })
        .await
    }

    pub async fn admin_edit(
        &self,
        id: &str,
        actor: &Actor,
        edit: AdminEdit,
    ) -> Result<Plate, CatalogError> {
        self.transition(id, actor, "admin edit", move |plate, actor| {
            lifecycle::admin_edit(plate, actor, edit)
        })
        .await
    }

    pub async fn record_upload(
        &self,
        id: &str,
        actor: &Actor,
        kind: ArtifactKind,
        artifact: ArtifactRef,
    ) -> Result<Plate, CatalogError> {
        self.transition(id, actor, "file uploaded", move |plate, actor| {
            lifecycle::record_upload(plate, actor, kind, artifact)
        })
        .await
    }

    /// Compose the status-class filter with free-text search
    /// (intersection, search applied after the class filter).
    pub async fn filter(
        &self,
        class: Option<StatusClass>,
        search: &str,
        caller: Option<&str>,
    ) -> Vec<Plate> {
        let mut plates = self.snapshot().await;
        if let Some(class) = class {
            plates.retain(|p| matches_class(p, class, caller));
        }
        if !search.is_empty() {
            plates.retain(|p| p.matches_search(search));
        }
        plates
    }

    /// Dashboard counts; `caller` scopes the active-session count.
    pub async fn summary(&self, caller: &str) -> CatalogSummary {
        let plates = self.snapshot().await;
        let mut summary = CatalogSummary {
            total: plates.len(),
            new: 0,
            used: 0,
            locked: 0,
            free: 0,
            in_use: 0,
            my_active: 0,
        };
        for plate in &plates {
            match plate.health {
                Health::New => summary.new += 1,
                Health::Used => summary.used += 1,
                Health::Locked => summary.locked += 1,
            }
            match plate.occupancy {
                Occupancy::Free => summary.free += 1,
                Occupancy::InUse => summary.in_use += 1,
            }
            if plate.occupancy == Occupancy::InUse && plate.session_owner() == Some(caller) {
                summary.my_active += 1;
            }
        }
        summary
    }

    /// Newest history entries across all plates, role-filtered, newest
    /// first.
    pub async fn recent_activity(&self, role: Role, limit: usize) -> Vec<ActivityEntry> {
        let plates = self.snapshot().await;
        let mut feed: Vec<ActivityEntry> = plates
            .iter()
            .flat_map(|plate| {
                history::visible_to(role, &plate.history)
                    .into_iter()
                    .map(move |entry| ActivityEntry {
                        plate_id: plate.id.clone(),
                        entry,
                    })
            })
            .collect();
        feed.sort_by(|a, b| b.entry.date.cmp(&a.entry.date));
        feed.truncate(limit);
        feed
    }

    async fn slot(&self, id: &str) -> Result<Arc<Mutex<Plate>>, CatalogError> {
        let map = self.plates.read().await;
        map.get(id).cloned().ok_or_else(|| CatalogError::NotFound {
            id: id.to_string(),
        })
    }

    /// Apply `op` to one plate under its lock and return the updated
    /// snapshot. Rejections leave the plate untouched.
    async fn transition<F>(
        &self,
        id: &str,
        actor: &Actor,
        label: &str,
        op: F,
    ) -> Result<Plate, CatalogError>
    where
        F: FnOnce(&mut Plate, &Actor) -> Result<(), InvalidTransition>,
    {
        let slot = self.slot(id).await?;
        let mut plate = slot.lock().await;
        match op(&mut plate, actor) {
            Ok(()) => {
                tracing::info!("plate {id}: {label} by {}", actor.name);
                Ok(plate.clone())
            }
            Err(rejection) => {
                tracing::debug!("plate {id}: {label} rejected: {rejection}");
                Err(rejection.into())
            }
        }
    }
}

fn matches_class(plate: &Plate, class: StatusClass, caller: Option<&str>) -> bool {
    match class {
        StatusClass::NewHealth => plate.health == Health::New,
        StatusClass::UsedHealth => plate.health == Health::Used,
        StatusClass::LockedHealth => plate.health == Health::Locked,
        StatusClass::FreeOccupancy => plate.occupancy == Occupancy::Free,
        StatusClass::InUseOccupancy => plate.occupancy == Occupancy::InUse,
        StatusClass::OngoingWork => {
            plate.occupancy == Occupancy::InUse
                && caller.is_none_or(|name| plate.session_owner() == Some(name))
        }
        StatusClass::History => plate.last_work_name.as_deref().is_some_and(|w| !w.is_empty()),
    }
}
