use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, GardenError};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(PlantId);
id_newtype!(SurfaceId);

impl TryFrom<i64> for PlantId {
    type Error = GardenError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        if raw <= 0 {
            return Err(GardenError::new(
                ErrorCode::InvalidReference,
                format!("plant id must be positive, got {raw}"),
            ));
        }
        Ok(Self(raw))
    }
}

impl FromStr for PlantId {
    type Err = GardenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parsed = raw.trim().parse::<i64>().map_err(|_| {
            GardenError::new(
                ErrorCode::InvalidReference,
                format!("plant id '{raw}' is not a number"),
            )
        })?;
        Self::try_from(parsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variety {
    Cactus,
    Sunflower,
    Tulip,
    Fern,
}

impl Variety {
    pub const ALL: [Variety; 4] = [
        Variety::Cactus,
        Variety::Sunflower,
        Variety::Tulip,
        Variety::Fern,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Variety::Cactus => "cactus",
            Variety::Sunflower => "sunflower",
            Variety::Tulip => "tulip",
            Variety::Fern => "fern",
        }
    }
}

impl fmt::Display for Variety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variety {
    type Err = GardenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Variety::ALL
            .into_iter()
            .find(|variety| variety.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| {
                GardenError::new(ErrorCode::Validation, format!("unknown plant variety '{raw}'"))
            })
    }
}

/// Discrete visual stage of a plant. `Wilted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    Seed,
    Growing,
    Mature,
    Wilted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub plant_id: PlantId,
    pub variety: Variety,
    pub created_at: DateTime<Utc>,
    pub last_watered_at: DateTime<Utc>,
}

impl PlantRecord {
    pub fn age_since_creation(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }

    pub fn age_since_watering(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_watered_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    SingleItem,
    Collection,
}

impl SurfaceKind {
    /// Narrow surfaces show one plant; wide ones list the whole garden.
    pub fn for_min_width(min_width: u32, collection_min_width: u32) -> Self {
        if min_width < collection_min_width {
            SurfaceKind::SingleItem
        } else {
            SurfaceKind::Collection
        }
    }
}
