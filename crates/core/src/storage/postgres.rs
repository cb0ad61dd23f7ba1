use crate::domain::contract::validate_snapshot;
use crate::domain::radar::{CarModel, Month, Nation, RadarData, RadarKey};
use crate::storage::RadarStore;
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

/// Durable snapshot store: one row per (month, nation), models kept as JSONB.
#[derive(Debug, Clone)]
pub struct PgRadarStore {
    pool: sqlx::PgPool,
}

impl PgRadarStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl RadarStore for PgRadarStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, key: &RadarKey) -> anyhow::Result<Option<RadarData>> {
        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>, Json<Vec<CarModel>>)>(
            "SELECT month, nation, fetched_at, models \
             FROM radar_snapshots \
             WHERE month = $1 AND nation = $2",
        )
        .persistent(false)
        .bind(key.month.to_string())
        .bind(key.nation.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("select radar_snapshots failed for {key}"))?;

        let Some((month, nation, fetched_at, Json(models))) = row else {
            return Ok(None);
        };

        let data = RadarData {
            month: Month::parse(&month)?,
            nation: nation.parse::<Nation>()?,
            models,
            fetched_at,
        };
        validate_snapshot(&data)
            .with_context(|| format!("stored snapshot for {key} is invalid"))?;

        Ok(Some(data))
    }

    async fn put(&self, data: RadarData) -> anyhow::Result<()> {
        let key = data.key();
        validate_snapshot(&data).with_context(|| format!("refusing to store snapshot {key}"))?;

        sqlx::query(
            "INSERT INTO radar_snapshots (month, nation, fetched_at, models) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (month, nation) DO UPDATE \
               SET fetched_at = EXCLUDED.fetched_at, models = EXCLUDED.models, updated_at = now()",
        )
        .persistent(false)
        .bind(data.month.to_string())
        .bind(data.nation.as_str())
        .bind(data.fetched_at)
        .bind(Json(&data.models))
        .execute(&self.pool)
        .await
        .with_context(|| format!("upsert radar_snapshots failed for {key}"))?;

        tracing::debug!(%key, models = data.models.len(), "upserted radar snapshot");
        Ok(())
    }

    async fn list_available_months(&self) -> anyhow::Result<Vec<Month>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT month FROM radar_snapshots ORDER BY month DESC",
        )
        .persistent(false)
        .fetch_all(&self.pool)
        .await
        .context("select distinct months failed")?;

        rows.into_iter()
            .map(|(m,)| Month::parse(&m))
            .collect()
    }
}
