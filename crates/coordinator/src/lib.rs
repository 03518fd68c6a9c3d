use chrono::{DateTime, Duration, Utc};
use lifecycle::WateringWindow;
use shared::{
    domain::{PlantId, PlantRecord, SurfaceId, SurfaceKind},
    error::GardenError,
    protocol::{DisplayUpdate, GardenSnapshot, PlantView, WaterOutcome},
};
use tokio::sync::broadcast;
use tracing::{debug, info};

mod registry;
mod store;
mod worker;

pub use registry::SurfaceRegistry;
pub use store::{ConditionalWater, PlantFilter, PlantOrder, PlantStore};
pub use worker::{run_trigger_worker, spawn_ticker, Trigger, TriggerQueue};

pub const DEFAULT_COLLECTION_MIN_WIDTH: u32 = 300;

#[derive(Debug, Clone, Copy)]
pub struct CoordinatorConfig {
    pub window: WateringWindow,
    /// How long a dead plant keeps showing up in garden listings.
    pub dead_plant_retention: Duration,
    pub collection_min_width: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            window: WateringWindow::default(),
            dead_plant_retention: Duration::hours(24),
            collection_min_width: DEFAULT_COLLECTION_MIN_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterTarget {
    Plant(PlantId),
    /// The live plant with the oldest watering time.
    Thirstiest,
}

impl WaterTarget {
    pub fn parse(raw: Option<&str>) -> Result<Self, GardenError> {
        match raw {
            None => Ok(WaterTarget::Thirstiest),
            Some(raw) => Ok(WaterTarget::Plant(raw.parse()?)),
        }
    }
}

pub struct Coordinator<S: PlantStore> {
    store: S,
    config: CoordinatorConfig,
    surfaces: SurfaceRegistry,
    updates: broadcast::Sender<DisplayUpdate>,
}

impl<S: PlantStore> Coordinator<S> {
    pub fn new(store: S, config: CoordinatorConfig) -> Self {
        let (updates, _) = broadcast::channel(256);
        Self {
            store,
            config,
            surfaces: SurfaceRegistry::default(),
            updates,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn surfaces(&self) -> &SurfaceRegistry {
        &self.surfaces
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DisplayUpdate> {
        self.updates.subscribe()
    }

    /// Conditionally stamps `now` as the watering time, then refreshes every
    /// surface whether or not a row was written.
    pub async fn water_plant(
        &self,
        target: WaterTarget,
        now: DateTime<Utc>,
    ) -> Result<WaterOutcome, GardenError> {
        let window = self.config.window;
        let record = match target {
            WaterTarget::Plant(plant_id) => Some(self.load_plant(plant_id).await?),
            WaterTarget::Thirstiest => self
                .store
                .query(
                    PlantFilter::WateredAfter(now - window.max_age_without_water()),
                    PlantOrder::LastWateredAsc,
                )
                .await
                .map_err(GardenError::storage_unavailable)?
                .into_iter()
                .next(),
        };

        let plant_id = record.as_ref().map(|record| record.plant_id);
        let rows_updated = match plant_id {
            Some(plant_id) => self
                .store
                .conditional_update(ConditionalWater {
                    plant_id,
                    watered_at: now,
                    alive_after: now - window.max_age_without_water(),
                })
                .await
                .map_err(GardenError::storage_unavailable)?,
            None => 0,
        };

        match plant_id {
            Some(plant_id) if rows_updated > 0 => {
                info!(plant_id = plant_id.0, "watered plant");
            }
            Some(plant_id) => {
                info!(plant_id = plant_id.0, "watering skipped; plant is dead");
            }
            None => info!("no live plant to water"),
        }

        let snapshot = self.refresh(now).await?;
        Ok(WaterOutcome {
            plant_id,
            rows_updated,
            snapshot,
        })
    }

    /// Read-only: one storage query, then one update per attached surface.
    pub async fn refresh(&self, now: DateTime<Utc>) -> Result<GardenSnapshot, GardenError> {
        let snapshot = self.snapshot(now).await?;
        self.publish(&snapshot).await;
        Ok(snapshot)
    }

    /// Derives a snapshot without pushing it anywhere.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Result<GardenSnapshot, GardenError> {
        let window = self.config.window;
        let display_after =
            now - window.max_age_without_water() - self.config.dead_plant_retention;
        let records = self
            .store
            .query(
                PlantFilter::WateredAfter(display_after),
                PlantOrder::LastWateredAsc,
            )
            .await
            .map_err(GardenError::storage_unavailable)?;

        let mut snapshot = GardenSnapshot::empty(now);
        snapshot.garden.reserve(records.len());
        for record in &records {
            let view = self.view_of(record, now);
            if snapshot.featured.is_none() && !window.is_dead(record.age_since_watering(now)) {
                snapshot.featured = Some(view.clone());
            }
            snapshot.garden.push(view);
        }
        Ok(snapshot)
    }

    pub async fn attach_surface(
        &self,
        surface_id: SurfaceId,
        min_width: u32,
        now: DateTime<Utc>,
    ) -> Result<GardenSnapshot, GardenError> {
        let kind = SurfaceKind::for_min_width(min_width, self.config.collection_min_width);
        match self.surfaces.attach(surface_id, kind).await {
            Some(previous) if previous != kind => {
                info!(surface_id = surface_id.0, ?previous, ?kind, "display surface changed kind");
            }
            Some(_) => {}
            None => info!(surface_id = surface_id.0, ?kind, "display surface attached"),
        }
        self.refresh(now).await
    }

    pub async fn detach_surface(&self, surface_id: SurfaceId) -> bool {
        let removed = self.surfaces.detach(surface_id).await;
        if removed {
            info!(surface_id = surface_id.0, "display surface detached");
        }
        removed
    }

    pub async fn on_water_requested(
        &self,
        plant_id: Option<&str>,
    ) -> Result<WaterOutcome, GardenError> {
        let target = WaterTarget::parse(plant_id)?;
        self.water_plant(target, Utc::now()).await
    }

    pub async fn on_periodic_tick(&self) -> Result<GardenSnapshot, GardenError> {
        self.refresh(Utc::now()).await
    }

    pub async fn on_display_surface_attached(
        &self,
        surface_id: SurfaceId,
        min_width: u32,
    ) -> Result<GardenSnapshot, GardenError> {
        self.attach_surface(surface_id, min_width, Utc::now()).await
    }

    /// Resizing may flip a surface between single-item and collection.
    pub async fn on_display_surface_resized(
        &self,
        surface_id: SurfaceId,
        min_width: u32,
    ) -> Result<GardenSnapshot, GardenError> {
        self.attach_surface(surface_id, min_width, Utc::now()).await
    }

    pub async fn on_display_surface_detached(&self, surface_id: SurfaceId) -> bool {
        self.detach_surface(surface_id).await
    }

    async fn load_plant(&self, plant_id: PlantId) -> Result<PlantRecord, GardenError> {
        self.store
            .query(PlantFilter::ById(plant_id), PlantOrder::LastWateredAsc)
            .await
            .map_err(GardenError::storage_unavailable)?
            .into_iter()
            .next()
            .ok_or_else(|| GardenError::invalid_reference(format!("plant {plant_id} not found")))
    }

    fn view_of(&self, record: &PlantRecord, now: DateTime<Utc>) -> PlantView {
        let state = self.config.window.evaluate(
            record.age_since_creation(now),
            record.age_since_watering(now),
            record.variety,
        );
        PlantView {
            plant_id: record.plant_id,
            variety: record.variety,
            stage: state.stage,
            thirsty: state.thirsty,
            can_water: state.can_water,
            last_watered_at: record.last_watered_at,
        }
    }

    async fn publish(&self, snapshot: &GardenSnapshot) {
        let mut collections = Vec::new();
        for (surface_id, kind) in self.surfaces.snapshot().await {
            let update = match kind {
                SurfaceKind::SingleItem => DisplayUpdate::PlantShown {
                    surface_id,
                    plant: snapshot.featured.clone(),
                },
                SurfaceKind::Collection => {
                    collections.push(surface_id);
                    DisplayUpdate::GardenListed {
                        surface_id,
                        plants: snapshot.garden.clone(),
                    }
                }
            };
            self.emit(update);
        }

        if !collections.is_empty() {
            self.emit(DisplayUpdate::DataSetChanged {
                surface_ids: collections,
            });
        }
    }

    fn emit(&self, update: DisplayUpdate) {
        if self.updates.send(update).is_err() {
            debug!("no display update subscribers");
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
