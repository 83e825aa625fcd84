// End-to-end lifecycle and query flows through the catalog.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use platetrack_core::catalog::{Catalog, CatalogError, NewPlate};
use platetrack_core::lifecycle::{AdminEdit, InvalidTransition};
use platetrack_core::{history, sort};
use platetrack_protocol::{
    Actor, ArtifactRef, Health, HistoryAction, Occupancy, Role, SortDirection, SortKey,
    StatusClass,
};

fn admin() -> Actor {
    Actor::administrator("Admin")
}

fn operator() -> Actor {
    Actor::operator("John Smith")
}

fn new_plate(id: &str, name: &str, shelf: &str) -> NewPlate {
    NewPlate {
        id: id.to_string(),
        name: Some(name.to_string()),
        shelf: shelf.to_string(),
        ..NewPlate::default()
    }
}

async fn seeded() -> Catalog {
    let catalog = Catalog::new();
    for (id, name, shelf) in [
        ("P001", "Standard Clamp A1", "A-12"),
        ("P002", "Heavy Duty B3", "B-05"),
        ("P003", "Precision C2", "C-08"),
        ("P004", "Compact D1", "D-03"),
    ] {
        catalog
            .create(&admin(), new_plate(id, name, shelf))
            .await
            .expect("create plate");
    }
    catalog
}

#[tokio::test]
async fn stop_work_releases_plate_and_keeps_health() {
    let catalog = seeded().await;
    catalog
        .start_work("P001", &operator())
        .await
        .expect("start");
    catalog
        .pause_work("P001", &operator())
        .await
        .expect("pause");
    catalog
        .start_work("P001", &operator())
        .await
        .expect("restart");
    // Now {health: used, occupancy: in-use}.

    let plate = catalog
        .stop_work("P001", &operator(), "P001", "Work stopped - shift end")
        .await
        .expect("stop");

    assert_eq!(plate.health, Health::Used);
    assert_eq!(plate.occupancy, Occupancy::Free);
    assert_eq!(plate.history[0].action, HistoryAction::WorkStopped);
}

#[tokio::test]
async fn second_start_on_same_plate_is_rejected() {
    let catalog = seeded().await;
    catalog
        .start_work("P002", &operator())
        .await
        .expect("first start");

    let err = catalog
        .start_work("P002", &Actor::operator("Sarah Johnson"))
        .await;
    assert!(matches!(
        err,
        Err(CatalogError::Transition(InvalidTransition::AlreadyInUse))
    ));

    let plate = catalog.get("P002").await.expect("get");
    assert_eq!(plate.occupancy, Occupancy::InUse);
    assert_eq!(plate.session_owner(), Some("John Smith"));
}

#[tokio::test]
async fn locked_plate_rejects_start_work() {
    let catalog = seeded().await;
    catalog
        .admin_edit(
            "P004",
            &admin(),
            AdminEdit {
                health: Some(Health::Locked),
                notes: Some("Damaged - requires inspection".to_string()),
                ..AdminEdit::default()
            },
        )
        .await
        .expect("lock");

    let before = catalog.get("P004").await.expect("get");
    let err = catalog.start_work("P004", &operator()).await;
    assert!(matches!(
        err,
        Err(CatalogError::Transition(InvalidTransition::PlateLocked))
    ));
    let after = catalog.get("P004").await.expect("get");
    assert_eq!(before, after);
}

#[tokio::test]
async fn finish_without_preview_leaves_plate_untouched() {
    let catalog = seeded().await;
    catalog
        .start_work("P003", &operator())
        .await
        .expect("start");
    let before = catalog.get("P003").await.expect("get");

    let err = catalog
        .finish_work(
            "P003",
            &operator(),
            Some(ArtifactRef::new("P003.x_t")),
            None,
            None,
        )
        .await;
    assert!(matches!(
        err,
        Err(CatalogError::Transition(InvalidTransition::MissingArtifact(
            _
        )))
    ));

    let after = catalog.get("P003").await.expect("get");
    assert_eq!(before, after);
    assert_eq!(after.last_work_name, None);
}

#[tokio::test]
async fn history_length_tracks_successful_operations() {
    let catalog = seeded().await;
    let op = operator();
    catalog.start_work("P001", &op).await.expect("start");
    catalog.pause_work("P001", &op).await.expect("pause");
    catalog.start_work("P001", &op).await.expect("restart");
    catalog
        .finish_work(
            "P001",
            &op,
            Some(ArtifactRef::new("P001.x_t")),
            Some(ArtifactRef::new("P001.png")),
            Some("Surface refinished".to_string()),
        )
        .await
        .expect("finish");

    // A failed operation must not grow the history.
    let _ = catalog.pause_work("P001", &op).await;

    let plate = catalog.get("P001").await.expect("get");
    assert_eq!(plate.history.len(), 5);
    assert!(plate.history.windows(2).all(|w| w[0].date >= w[1].date));
    assert_eq!(
        plate.last_modified_by(),
        plate.history.first().map(|e| e.user.as_str())
    );
    assert_eq!(
        plate.last_modified_date(),
        plate.history.first().map(|e| e.date)
    );
}

#[tokio::test]
async fn filter_search_composition_law() {
    let catalog = seeded().await;
    let op = operator();
    catalog.start_work("P001", &op).await.expect("start");
    catalog.start_work("P002", &op).await.expect("start");

    let class = Some(StatusClass::InUseOccupancy);
    let both = catalog.filter(class, "clamp", None).await;
    let class_only = catalog.filter(class, "", None).await;
    let search_only = catalog.filter(None, "clamp", None).await;

    for plate in &both {
        assert!(class_only.iter().any(|p| p.id == plate.id));
        assert!(search_only.iter().any(|p| p.id == plate.id));
    }
    assert_eq!(both.len(), 1);
    assert_eq!(both[0].id, "P001");
}

#[tokio::test]
async fn visibility_filter_flows_through_query_path() {
    let catalog = seeded().await;
    let op = operator();
    catalog.start_work("P001", &op).await.expect("start");
    catalog
        .finish_work(
            "P001",
            &op,
            Some(ArtifactRef::new("P001.x_t")),
            Some(ArtifactRef::new("P001.png")),
            None,
        )
        .await
        .expect("finish");

    let plate = catalog.get("P001").await.expect("get");
    let operator_view = history::visible_to(Role::Operator, &plate.history);
    let actions: Vec<HistoryAction> = operator_view.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![HistoryAction::WorkCompleted, HistoryAction::PlateCreated]
    );

    let again = history::visible_to(Role::Operator, &operator_view);
    assert_eq!(again, operator_view);

    let admin_view = history::visible_to(Role::Administrator, &plate.history);
    assert_eq!(admin_view, plate.history);
}

#[tokio::test]
async fn sorted_listing_is_stable_across_renders() {
    let catalog = seeded().await;
    let mut first = catalog.filter(None, "", None).await;
    sort::order(&mut first, SortKey::Modified, SortDirection::Desc);

    let mut second = first.clone();
    sort::order(&mut second, SortKey::Modified, SortDirection::Desc);
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_on_same_plate_admit_exactly_one() {
    let catalog = Arc::new(seeded().await);

    let a = {
        let catalog = Arc::clone(&catalog);
        tokio::spawn(async move {
            catalog
                .start_work("P001", &Actor::operator("John Smith"))
                .await
        })
    };
    let b = {
        let catalog = Arc::clone(&catalog);
        tokio::spawn(async move {
            catalog
                .start_work("P001", &Actor::operator("Sarah Johnson"))
                .await
        })
    };

    let outcomes = [a.await.expect("join"), b.await.expect("join")];
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(outcomes.iter().any(|r| matches!(
        r,
        Err(CatalogError::Transition(InvalidTransition::AlreadyInUse))
    )));

    let plate = catalog.get("P001").await.expect("get");
    assert_eq!(plate.occupancy, Occupancy::InUse);
    // Exactly one Work started entry was appended.
    let starts = plate
        .history
        .iter()
        .filter(|e| e.action == HistoryAction::WorkStarted)
        .count();
    assert_eq!(starts, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn transitions_on_distinct_plates_proceed_independently() {
    let catalog = Arc::new(seeded().await);

    let mut handles = Vec::new();
    for id in ["P001", "P002", "P003", "P004"] {
        let catalog = Arc::clone(&catalog);
        handles.push(tokio::spawn(async move {
            catalog
                .start_work(id, &Actor::operator("John Smith"))
                .await
        }));
    }

    for handle in handles {
        handle.await.expect("join").expect("start");
    }

    let in_use = catalog
        .filter(Some(StatusClass::InUseOccupancy), "", None)
        .await;
    assert_eq!(in_use.len(), 4);
}
