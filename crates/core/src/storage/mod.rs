pub mod files;
pub mod lock;
pub mod memory;
pub mod postgres;
pub mod seed;

use crate::domain::radar::{Month, RadarData, RadarKey};
use anyhow::Context;

pub use memory::MemRadarStore;
pub use postgres::PgRadarStore;

/// Keyed snapshot storage: (month, nation) -> `RadarData`.
///
/// Reads never recompute; `put` replaces the whole snapshot for its key. Every
/// backend runs `validate_snapshot` in `put` and refuses data that fails it, so
/// a stored snapshot always reads back equal to what was written.
#[async_trait::async_trait]
pub trait RadarStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn get(&self, key: &RadarKey) -> anyhow::Result<Option<RadarData>>;

    async fn put(&self, data: RadarData) -> anyhow::Result<()>;

    /// Distinct months across both nations, newest first.
    async fn list_available_months(&self) -> anyhow::Result<Vec<Month>>;
}

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}
