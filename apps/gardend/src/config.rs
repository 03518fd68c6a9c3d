use std::{fs, path::Path};

use anyhow::Context;
use chrono::Duration;
use coordinator::CoordinatorConfig;
use lifecycle::WateringWindow;
use serde::Deserialize;
use shared::{domain::SurfaceId, error::GardenError};

pub const DEFAULT_CONFIG_PATH: &str = "gardend.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SurfaceSettings {
    pub id: i64,
    pub min_width: u32,
}

impl SurfaceSettings {
    pub fn surface_id(&self) -> SurfaceId {
        SurfaceId(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    pub tick_interval_seconds: u64,
    pub min_age_between_water_seconds: i64,
    pub thirsty_age_seconds: i64,
    pub max_age_without_water_seconds: i64,
    pub dead_plant_retention_seconds: i64,
    pub collection_min_width: u32,
    pub surfaces: Vec<SurfaceSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/garden.db".into(),
            tick_interval_seconds: 60,
            min_age_between_water_seconds: 60 * 60,
            thirsty_age_seconds: 48 * 60 * 60,
            max_age_without_water_seconds: 72 * 60 * 60,
            dead_plant_retention_seconds: 24 * 60 * 60,
            collection_min_width: coordinator::DEFAULT_COLLECTION_MIN_WIDTH,
            surfaces: Vec::new(),
        }
    }
}

impl Settings {
    pub fn coordinator_config(&self) -> Result<CoordinatorConfig, GardenError> {
        let window = WateringWindow::new(
            Duration::seconds(self.min_age_between_water_seconds),
            Duration::seconds(self.thirsty_age_seconds),
            Duration::seconds(self.max_age_without_water_seconds),
        )?;
        if self.dead_plant_retention_seconds < 0 {
            return Err(GardenError::validation(
                "dead plant retention must not be negative",
            ));
        }
        Ok(CoordinatorConfig {
            window,
            dead_plant_retention: Duration::seconds(self.dead_plant_retention_seconds),
            collection_min_width: self.collection_min_width,
        })
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tick_interval_seconds.max(1))
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let path = std::env::var("GARDEND_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut settings = read_settings_file(Path::new(&path))?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

/// A missing file yields the defaults; an unreadable or malformed one is an
/// error.
pub fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))
}

pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    override_parsed(&lookup, "APP__TICK_INTERVAL_SECONDS", &mut settings.tick_interval_seconds);
    override_parsed(
        &lookup,
        "APP__MIN_AGE_BETWEEN_WATER_SECONDS",
        &mut settings.min_age_between_water_seconds,
    );
    override_parsed(&lookup, "APP__THIRSTY_AGE_SECONDS", &mut settings.thirsty_age_seconds);
    override_parsed(
        &lookup,
        "APP__MAX_AGE_WITHOUT_WATER_SECONDS",
        &mut settings.max_age_without_water_seconds,
    );
    override_parsed(
        &lookup,
        "APP__DEAD_PLANT_RETENTION_SECONDS",
        &mut settings.dead_plant_retention_seconds,
    );
    override_parsed(&lookup, "APP__COLLECTION_MIN_WIDTH", &mut settings.collection_min_width);
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => tracing::warn!(key, value = %raw, "ignoring unparsable setting override"),
    }
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
