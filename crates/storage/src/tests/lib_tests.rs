use super::*;
use chrono::Duration;

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_225_600, 0).expect("timestamp")
}

fn water_at(plant_id: PlantId, now: DateTime<Utc>) -> ConditionalWater {
    ConditionalWater {
        plant_id,
        watered_at: now,
        alive_after: now - Duration::hours(72),
    }
}

#[tokio::test]
async fn plants_and_loads_by_id() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let plant_id = storage.plant(Variety::Tulip, t0()).await.expect("plant");

    let rows = storage
        .query(PlantFilter::ById(plant_id), PlantOrder::LastWateredAsc)
        .await
        .expect("query");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].variety, Variety::Tulip);
    assert_eq!(rows[0].created_at, t0());
    assert_eq!(rows[0].last_watered_at, t0());
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("garden.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn orders_thirstiest_first_and_filters_by_watering_time() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let now = t0();
    let created = now - Duration::hours(200);
    let recent = storage
        .insert_plant(Variety::Fern, created, now - Duration::hours(5))
        .await
        .expect("recent");
    let parched = storage
        .insert_plant(Variety::Cactus, created, now - Duration::hours(70))
        .await
        .expect("parched");
    let dead = storage
        .insert_plant(Variety::Tulip, created, now - Duration::hours(90))
        .await
        .expect("dead");

    let all = storage
        .query(PlantFilter::All, PlantOrder::LastWateredAsc)
        .await
        .expect("all");
    let ids: Vec<PlantId> = all.iter().map(|row| row.plant_id).collect();
    assert_eq!(ids, vec![dead, parched, recent]);

    let live = storage
        .query(
            PlantFilter::WateredAfter(now - Duration::hours(72)),
            PlantOrder::LastWateredAsc,
        )
        .await
        .expect("live");
    let ids: Vec<PlantId> = live.iter().map(|row| row.plant_id).collect();
    assert_eq!(ids, vec![parched, recent]);
}

#[tokio::test]
async fn orders_by_creation_time_when_asked() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let now = t0();
    let younger = storage
        .plant(Variety::Sunflower, now - Duration::hours(2))
        .await
        .expect("younger");
    let older = storage
        .plant(Variety::Sunflower, now - Duration::hours(9))
        .await
        .expect("older");

    let rows = storage
        .query(PlantFilter::All, PlantOrder::CreatedAsc)
        .await
        .expect("rows");
    let ids: Vec<PlantId> = rows.iter().map(|row| row.plant_id).collect();
    assert_eq!(ids, vec![older, younger]);
}

#[tokio::test]
async fn conditional_update_waters_any_live_plant() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let now = t0();
    let created = now - Duration::hours(100);
    let thirsty = storage
        .insert_plant(Variety::Fern, created, now - Duration::hours(10))
        .await
        .expect("thirsty");
    let dead = storage
        .insert_plant(Variety::Fern, created, now - Duration::hours(80))
        .await
        .expect("dead");
    let fresh = storage
        .insert_plant(Variety::Fern, created, now - Duration::minutes(20))
        .await
        .expect("fresh");

    assert_eq!(storage.conditional_update(water_at(thirsty, now)).await.expect("water"), 1);
    assert_eq!(storage.conditional_update(water_at(dead, now)).await.expect("water"), 0);
    assert_eq!(storage.conditional_update(water_at(fresh, now)).await.expect("water"), 1);
    assert_eq!(
        storage
            .conditional_update(water_at(PlantId(999), now))
            .await
            .expect("water"),
        0
    );

    let rows = storage
        .query(PlantFilter::ById(thirsty), PlantOrder::LastWateredAsc)
        .await
        .expect("query");
    assert_eq!(rows[0].last_watered_at, now);
    let rows = storage
        .query(PlantFilter::ById(dead), PlantOrder::LastWateredAsc)
        .await
        .expect("query");
    assert_eq!(rows[0].last_watered_at, now - Duration::hours(80));
}

#[tokio::test]
async fn conditional_update_never_moves_watering_time_backwards() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let now = t0();
    let plant_id = storage
        .insert_plant(Variety::Cactus, now - Duration::hours(5), now - Duration::hours(2))
        .await
        .expect("plant");

    assert_eq!(storage.conditional_update(water_at(plant_id, now)).await.expect("water"), 1);
    assert_eq!(storage.conditional_update(water_at(plant_id, now)).await.expect("same instant"), 1);
    let earlier = now - Duration::minutes(5);
    assert_eq!(storage.conditional_update(water_at(plant_id, earlier)).await.expect("earlier"), 0);

    let rows = storage
        .query(PlantFilter::ById(plant_id), PlantOrder::LastWateredAsc)
        .await
        .expect("query");
    assert_eq!(rows[0].last_watered_at, now);
}

#[tokio::test]
async fn rejects_watering_time_before_planting() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let err = storage
        .insert_plant(Variety::Tulip, t0(), t0() - Duration::hours(1))
        .await
        .expect_err("check constraint");
    assert!(format!("{err:#}").contains("failed to insert tulip plant"));
}

#[tokio::test]
async fn removes_plants() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let plant_id = storage.plant(Variety::Cactus, t0()).await.expect("plant");

    assert!(storage.remove_plant(plant_id).await.expect("remove"));
    assert!(!storage.remove_plant(plant_id).await.expect("remove again"));
    let rows = storage
        .query(PlantFilter::All, PlantOrder::LastWateredAsc)
        .await
        .expect("rows");
    assert!(rows.is_empty());
}

#[test]
fn memory_urls_have_no_parent_dir() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/garden.db?mode=rwc"),
        Some(PathBuf::from("./data/garden.db"))
    );
}
