//! Pure mapping from plant ages to a visual stage and a watering flag.
//!
//! Callers pass already-computed durations, never timestamps, so nothing in
//! here reads a clock or touches storage.

use chrono::Duration;
use shared::{
    domain::{GrowthStage, Variety},
    error::GardenError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleState {
    pub stage: GrowthStage,
    /// Alive but past the danger age without water.
    pub thirsty: bool,
    pub can_water: bool,
}

impl LifecycleState {
    pub fn is_dead(&self) -> bool {
        self.stage == GrowthStage::Wilted
    }
}

/// Growth-stage boundaries for one variety, measured from planting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthTable {
    pub sprout_after: Duration,
    pub mature_after: Duration,
}

impl GrowthTable {
    pub fn for_variety(variety: Variety) -> Self {
        let (sprout_after, mature_after) = match variety {
            Variety::Cactus => (Duration::days(2), Duration::days(14)),
            Variety::Sunflower => (Duration::hours(12), Duration::days(3)),
            Variety::Tulip => (Duration::days(1), Duration::days(5)),
            Variety::Fern => (Duration::days(1), Duration::days(7)),
        };
        Self {
            sprout_after,
            mature_after,
        }
    }

    pub fn stage_at(&self, age_since_creation: Duration) -> GrowthStage {
        if age_since_creation < self.sprout_after {
            GrowthStage::Seed
        } else if age_since_creation < self.mature_after {
            GrowthStage::Growing
        } else {
            GrowthStage::Mature
        }
    }
}

/// Process-wide watering thresholds. Unlike growth boundaries these do not
/// vary by variety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WateringWindow {
    min_age_between_water: Duration,
    thirsty_age: Duration,
    max_age_without_water: Duration,
}

impl Default for WateringWindow {
    fn default() -> Self {
        Self {
            min_age_between_water: Duration::hours(1),
            thirsty_age: Duration::hours(48),
            max_age_without_water: Duration::hours(72),
        }
    }
}

impl WateringWindow {
    pub fn new(
        min_age_between_water: Duration,
        thirsty_age: Duration,
        max_age_without_water: Duration,
    ) -> Result<Self, GardenError> {
        if min_age_between_water < Duration::zero() {
            return Err(GardenError::validation(
                "minimum age between waterings must not be negative",
            ));
        }
        if min_age_between_water >= thirsty_age {
            return Err(GardenError::validation(
                "thirsty age must be greater than the minimum age between waterings",
            ));
        }
        if thirsty_age > max_age_without_water {
            return Err(GardenError::validation(
                "thirsty age must not exceed the maximum age without water",
            ));
        }
        Ok(Self {
            min_age_between_water,
            thirsty_age,
            max_age_without_water,
        })
    }

    pub fn min_age_between_water(&self) -> Duration {
        self.min_age_between_water
    }

    pub fn thirsty_age(&self) -> Duration {
        self.thirsty_age
    }

    pub fn max_age_without_water(&self) -> Duration {
        self.max_age_without_water
    }

    /// Open interval: too soon at or below the minimum, too late at or past
    /// the maximum.
    pub fn can_water(&self, age_since_watering: Duration) -> bool {
        age_since_watering > self.min_age_between_water
            && age_since_watering < self.max_age_without_water
    }

    pub fn is_dead(&self, age_since_watering: Duration) -> bool {
        age_since_watering >= self.max_age_without_water
    }

    pub fn evaluate(
        &self,
        age_since_creation: Duration,
        age_since_watering: Duration,
        variety: Variety,
    ) -> LifecycleState {
        let age_since_creation = age_since_creation.max(Duration::zero());
        let age_since_watering = age_since_watering.max(Duration::zero());

        if self.is_dead(age_since_watering) {
            return LifecycleState {
                stage: GrowthStage::Wilted,
                thirsty: false,
                can_water: false,
            };
        }

        LifecycleState {
            stage: GrowthTable::for_variety(variety).stage_at(age_since_creation),
            thirsty: age_since_watering > self.thirsty_age,
            can_water: self.can_water(age_since_watering),
        }
    }
}

/// Evaluates against the default watering window.
pub fn evaluate(
    age_since_creation: Duration,
    age_since_watering: Duration,
    variety: Variety,
) -> LifecycleState {
    WateringWindow::default().evaluate(age_since_creation, age_since_watering, variety)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
