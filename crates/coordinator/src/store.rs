use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::domain::{PlantId, PlantRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantFilter {
    ById(PlantId),
    /// `last_watered_at > threshold`, strictly.
    WateredAfter(DateTime<Utc>),
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantOrder {
    /// Thirstiest first; ties broken by id.
    LastWateredAsc,
    CreatedAsc,
}

/// Sets `last_watered_at = watered_at` only when the stored value is after
/// `alive_after` and not later than `watered_at`. Implementations must check
/// and write in one atomic step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionalWater {
    pub plant_id: PlantId,
    pub watered_at: DateTime<Utc>,
    pub alive_after: DateTime<Utc>,
}

impl ConditionalWater {
    pub fn matches(&self, last_watered_at: DateTime<Utc>) -> bool {
        last_watered_at > self.alive_after && last_watered_at <= self.watered_at
    }
}

#[async_trait]
pub trait PlantStore: Send + Sync {
    async fn query(&self, filter: PlantFilter, order: PlantOrder) -> Result<Vec<PlantRecord>>;

    /// Returns the number of rows written, 0 or 1.
    async fn conditional_update(&self, update: ConditionalWater) -> Result<u64>;
}
