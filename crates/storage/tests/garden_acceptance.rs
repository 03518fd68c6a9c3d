use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use coordinator::{Coordinator, CoordinatorConfig, WaterTarget};
use shared::{
    domain::{GrowthStage, PlantId, SurfaceId, Variety},
    protocol::DisplayUpdate,
};
use storage::Storage;
use tokio::task::JoinSet;

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_225_600, 0).expect("timestamp")
}

#[tokio::test]
async fn three_plants_refresh_thirstiest_first_acceptance() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let now = t0();
    let created = now - Duration::hours(120);
    let ten = storage
        .insert_plant(Variety::Tulip, created, now - Duration::hours(10))
        .await
        .expect("ten");
    let five = storage
        .insert_plant(Variety::Fern, created, now - Duration::hours(5))
        .await
        .expect("five");
    let seventy = storage
        .insert_plant(Variety::Cactus, created, now - Duration::hours(70))
        .await
        .expect("seventy");

    let coordinator = Coordinator::new(storage, CoordinatorConfig::default());
    let mut updates = coordinator.subscribe();
    coordinator
        .attach_surface(SurfaceId(1), 110, now)
        .await
        .expect("attach single");
    coordinator
        .attach_surface(SurfaceId(2), 640, now)
        .await
        .expect("attach grid");
    while updates.try_recv().is_ok() {}

    let snapshot = coordinator.refresh(now).await.expect("refresh");

    let order: Vec<PlantId> = snapshot.garden.iter().map(|view| view.plant_id).collect();
    assert_eq!(order, vec![seventy, ten, five]);
    assert_eq!(
        snapshot.featured.as_ref().map(|view| view.plant_id),
        Some(seventy)
    );

    let mut pushed = Vec::new();
    while let Ok(update) = updates.try_recv() {
        pushed.push(update);
    }
    assert_eq!(pushed.len(), 3);
    assert!(matches!(
        pushed.last(),
        Some(DisplayUpdate::DataSetChanged { surface_ids }) if surface_ids == &vec![SurfaceId(2)]
    ));
}

#[tokio::test]
async fn dead_plant_stays_dead_after_watering_acceptance() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let planted = t0();
    let plant_id = storage.plant(Variety::Sunflower, planted).await.expect("plant");
    let coordinator = Coordinator::new(storage, CoordinatorConfig::default());

    let too_soon = coordinator
        .snapshot(planted + Duration::minutes(30))
        .await
        .expect("snapshot");
    assert!(!too_soon.view(plant_id).expect("view").can_water);

    let allowed = coordinator
        .snapshot(planted + Duration::hours(2))
        .await
        .expect("snapshot");
    assert!(allowed.view(plant_id).expect("view").can_water);

    let later = planted + Duration::hours(80);
    let outcome = coordinator
        .water_plant(WaterTarget::Plant(plant_id), later)
        .await
        .expect("water");
    assert_eq!(outcome.rows_updated, 0);
    let view = outcome.snapshot.view(plant_id).expect("dead plant listed");
    assert_eq!(view.stage, GrowthStage::Wilted);
    assert!(!view.can_water);
    assert!(outcome.snapshot.featured.is_none());
}

#[tokio::test]
async fn concurrent_waterings_keep_latest_time_acceptance() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("garden.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));
    let storage = Storage::new(&database_url).await.expect("db");
    let now = t0();
    let plant_id = storage
        .insert_plant(Variety::Fern, now - Duration::hours(30), now - Duration::hours(6))
        .await
        .expect("plant");

    let coordinator = Arc::new(Coordinator::new(storage, CoordinatorConfig::default()));
    let mut tasks = JoinSet::new();
    for offset in 0..8 {
        let coordinator = Arc::clone(&coordinator);
        let watered_at = now - Duration::minutes(offset);
        tasks.spawn(async move {
            coordinator
                .water_plant(WaterTarget::Plant(plant_id), watered_at)
                .await
                .expect("water")
                .rows_updated
        });
    }

    let mut written = 0;
    while let Some(rows) = tasks.join_next().await {
        written += rows.expect("task");
    }
    assert!((1..=8).contains(&written));

    let snapshot = coordinator.snapshot(now).await.expect("snapshot");
    assert_eq!(snapshot.view(plant_id).expect("view").last_watered_at, now);
}
