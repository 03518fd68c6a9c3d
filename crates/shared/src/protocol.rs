use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{GrowthStage, PlantId, SurfaceId, Variety},
    error::GardenError,
};

/// What a display surface needs to render one plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantView {
    pub plant_id: PlantId,
    pub variety: Variety,
    pub stage: GrowthStage,
    pub thirsty: bool,
    pub can_water: bool,
    pub last_watered_at: DateTime<Utc>,
}

/// Everything derived by one refresh, computed from a single storage read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GardenSnapshot {
    pub taken_at: DateTime<Utc>,
    /// Live plant that most needs water. `None` renders the placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<PlantView>,
    /// Thirstiest first.
    pub garden: Vec<PlantView>,
}

impl GardenSnapshot {
    pub fn empty(taken_at: DateTime<Utc>) -> Self {
        Self {
            taken_at,
            featured: None,
            garden: Vec::new(),
        }
    }

    pub fn view(&self, plant_id: PlantId) -> Option<&PlantView> {
        self.garden.iter().find(|view| view.plant_id == plant_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_id: Option<PlantId>,
    pub rows_updated: u64,
    pub snapshot: GardenSnapshot,
}

impl WaterOutcome {
    pub fn watered(&self) -> bool {
        self.rows_updated > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DisplayUpdate {
    PlantShown {
        surface_id: SurfaceId,
        #[serde(default)]
        plant: Option<PlantView>,
    },
    GardenListed {
        surface_id: SurfaceId,
        plants: Vec<PlantView>,
    },
    /// Collection surfaces must re-fetch every visible item; the count or
    /// order may have changed.
    DataSetChanged {
        surface_ids: Vec<SurfaceId>,
    },
    Error(GardenError),
}

impl DisplayUpdate {
    pub fn surface_ids(&self) -> Vec<SurfaceId> {
        match self {
            DisplayUpdate::PlantShown { surface_id, .. }
            | DisplayUpdate::GardenListed { surface_id, .. } => vec![*surface_id],
            DisplayUpdate::DataSetChanged { surface_ids } => surface_ids.clone(),
            DisplayUpdate::Error(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn display_update_uses_tagged_json() {
        let update = DisplayUpdate::PlantShown {
            surface_id: SurfaceId(7),
            plant: None,
        };
        let json = serde_json::to_value(&update).expect("json");
        assert_eq!(json["type"], "plant_shown");
        assert_eq!(json["payload"]["surface_id"], 7);
        assert!(json["payload"]["plant"].is_null());
    }

    #[test]
    fn error_update_round_trips_code() {
        let update = DisplayUpdate::Error(GardenError::new(
            ErrorCode::StorageUnavailable,
            "sqlite is gone",
        ));
        let raw = serde_json::to_string(&update).expect("json");
        let decoded: DisplayUpdate = serde_json::from_str(&raw).expect("decode");
        assert_eq!(decoded, update);
        assert!(decoded.surface_ids().is_empty());
    }
}
