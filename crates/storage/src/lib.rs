use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coordinator::{ConditionalWater, PlantFilter, PlantOrder, PlantStore};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{PlantId, PlantRecord, Variety};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Plants a new seed, watered at the moment it goes in.
    pub async fn plant(&self, variety: Variety, planted_at: DateTime<Utc>) -> Result<PlantId> {
        self.insert_plant(variety, planted_at, planted_at).await
    }

    pub async fn insert_plant(
        &self,
        variety: Variety,
        created_at: DateTime<Utc>,
        last_watered_at: DateTime<Utc>,
    ) -> Result<PlantId> {
        let rec = sqlx::query(
            "INSERT INTO plants (variety, created_at, last_watered_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(variety.as_str())
        .bind(created_at.timestamp_millis())
        .bind(last_watered_at.timestamp_millis())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert {variety} plant"))?;
        Ok(PlantId(rec.get::<i64, _>(0)))
    }

    pub async fn remove_plant(&self, plant_id: PlantId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM plants WHERE id = ?")
            .bind(plant_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove plant {plant_id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn plant_from_row(row: SqliteRow) -> Result<PlantRecord> {
    let variety: String = row.try_get("variety")?;
    Ok(PlantRecord {
        plant_id: PlantId(row.try_get::<i64, _>("id")?),
        variety: variety.parse()?,
        created_at: from_millis(row.try_get("created_at")?)?,
        last_watered_at: from_millis(row.try_get("last_watered_at")?)?,
    })
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| anyhow!("stored timestamp {millis} is out of range"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[async_trait]
impl PlantStore for Storage {
    async fn query(&self, filter: PlantFilter, order: PlantOrder) -> Result<Vec<PlantRecord>> {
        let (predicate, bound) = match filter {
            PlantFilter::ById(plant_id) => ("id = ?", Some(plant_id.0)),
            PlantFilter::WateredAfter(threshold) => {
                ("last_watered_at > ?", Some(threshold.timestamp_millis()))
            }
            PlantFilter::All => ("1 = 1", None),
        };
        let order_by = match order {
            PlantOrder::LastWateredAsc => "last_watered_at ASC, id ASC",
            PlantOrder::CreatedAsc => "created_at ASC, id ASC",
        };
        let sql = format!(
            "SELECT id, variety, created_at, last_watered_at
             FROM plants
             WHERE {predicate}
             ORDER BY {order_by}"
        );

        let mut query = sqlx::query(&sql);
        if let Some(value) = bound {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to query plants ({filter:?})"))?;

        rows.into_iter().map(plant_from_row).collect()
    }

    async fn conditional_update(&self, update: ConditionalWater) -> Result<u64> {
        let updated = sqlx::query(
            "UPDATE plants
             SET last_watered_at = ?
             WHERE id = ? AND last_watered_at > ? AND last_watered_at <= ?",
        )
        .bind(update.watered_at.timestamp_millis())
        .bind(update.plant_id.0)
        .bind(update.alive_after.timestamp_millis())
        .bind(update.watered_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to water plant {}", update.plant_id))?
        .rows_affected();
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
