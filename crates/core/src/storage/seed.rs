use crate::catalog::sample_catalog;
use crate::config::Settings;
use crate::domain::radar::{Nation, RadarData, RadarKey};
use crate::ranking::{build_snapshot, FreshVariance, SeededVariance, VarianceSource};
use crate::storage::{files, MemRadarStore, RadarStore};
use crate::time::kst::recent_months;
use anyhow::bail;
use chrono::{DateTime, Utc};
use std::str::FromStr;

/// Months of sample data to seed: the prior month and the one before it.
const SAMPLE_MONTHS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedStrategy {
    /// Same numbers for the same (month, nation) on every run.
    #[default]
    Seeded,
    Fresh,
}

impl SeedStrategy {
    pub fn source_for(self, key: RadarKey) -> Box<dyn VarianceSource> {
        match self {
            SeedStrategy::Seeded => Box::new(SeededVariance::for_key(key.month, key.nation)),
            SeedStrategy::Fresh => Box::new(FreshVariance::new()),
        }
    }
}

impl FromStr for SeedStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seeded" => Ok(SeedStrategy::Seeded),
            "fresh" => Ok(SeedStrategy::Fresh),
            other => bail!("unknown seed strategy {other:?} (expected seeded or fresh)"),
        }
    }
}

pub fn sample_snapshot(
    key: RadarKey,
    strategy: SeedStrategy,
    fetched_at: DateTime<Utc>,
) -> anyhow::Result<RadarData> {
    let raw = sample_catalog(key.nation);
    let mut source = strategy.source_for(key);
    let data = build_snapshot(&raw, key.month, key.nation, source.as_mut(), fetched_at)?;
    Ok(data)
}

/// Put sample snapshots for the two most recent closed months, both nations.
pub async fn seed_sample_snapshots(
    store: &dyn RadarStore,
    now: DateTime<Utc>,
    strategy: SeedStrategy,
) -> anyhow::Result<Vec<RadarKey>> {
    let mut seeded = Vec::new();
    for month in recent_months(now, SAMPLE_MONTHS)? {
        for nation in Nation::ALL {
            let key = RadarKey::new(month, nation);
            let data = sample_snapshot(key, strategy, now)?;
            store.put(data).await?;
            seeded.push(key);
        }
    }

    tracing::info!(
        backend = store.backend_name(),
        ?strategy,
        snapshots = seeded.len(),
        "seeded sample radar snapshots"
    );
    Ok(seeded)
}

/// Populate any backend at startup. Sample data is written only when the store
/// holds no months yet, so data persisted by the worker is never replaced.
/// Snapshot files are always applied last and win on key collisions.
pub async fn populate_store(
    store: &dyn RadarStore,
    settings: &Settings,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    if settings.seed_samples {
        let existing = store.list_available_months().await?;
        if existing.is_empty() {
            seed_sample_snapshots(store, now, settings.seed_strategy).await?;
        } else {
            tracing::info!(
                backend = store.backend_name(),
                months = existing.len(),
                "radar store already populated; skipping sample data"
            );
        }
    }

    if let Some(dir) = settings.snapshot_dir.as_deref() {
        let snapshots = files::load_snapshot_dir(dir).await?;
        let loaded = snapshots.len();
        for data in snapshots {
            store.put(data).await?;
        }
        tracing::info!(
            backend = store.backend_name(),
            dir = %dir.display(),
            loaded,
            "loaded radar snapshot files"
        );
    }

    Ok(())
}

/// The in-memory store the api falls back to, populated per `settings`.
pub async fn init_memory_store(
    settings: &Settings,
    now: DateTime<Utc>,
) -> anyhow::Result<MemRadarStore> {
    let store = MemRadarStore::new();
    populate_store(&store, settings, now).await?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::radar::Month;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 3, 0, 0).unwrap()
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("seeded".parse::<SeedStrategy>().unwrap(), SeedStrategy::Seeded);
        assert_eq!(" Fresh ".parse::<SeedStrategy>().unwrap(), SeedStrategy::Fresh);
        assert!("random".parse::<SeedStrategy>().is_err());
    }

    #[tokio::test]
    async fn seeds_two_months_for_both_nations() {
        let store = MemRadarStore::new();
        let keys = seed_sample_snapshots(&store, now(), SeedStrategy::Seeded)
            .await
            .unwrap();
        assert_eq!(keys.len(), 4);

        let months: Vec<String> = store
            .list_available_months()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.to_string())
            .collect();
        assert_eq!(months, vec!["2026-09", "2026-08"]);

        for key in keys {
            let data = store.get(&key).await.unwrap().unwrap();
            assert_eq!(data.models.len(), sample_catalog(key.nation).len());
            crate::domain::contract::validate_snapshot(&data).unwrap();
        }
    }

    #[test]
    fn seeded_samples_repeat_per_key() {
        let key = RadarKey::new(Month::parse("2026-09").unwrap(), Nation::Domestic);
        let a = sample_snapshot(key, SeedStrategy::Seeded, now()).unwrap();
        let b = sample_snapshot(key, SeedStrategy::Seeded, now()).unwrap();

        let figures = |d: &RadarData| -> Vec<(String, u32, u32)> {
            d.models
                .iter()
                .map(|m| (m.name.clone(), m.sales, m.prev_sales))
                .collect()
        };
        assert_eq!(figures(&a), figures(&b));
    }

    #[tokio::test]
    async fn init_without_samples_or_files_is_empty() {
        let settings = Settings {
            seed_samples: false,
            ..Settings::default()
        };
        let store = init_memory_store(&settings, now()).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn snapshot_files_override_samples() {
        let dir = std::env::temp_dir().join(format!("radar-seed-{}", uuid::Uuid::new_v4()));
        let key = RadarKey::new(Month::parse("2026-09").unwrap(), Nation::Export);
        let mut custom = sample_snapshot(key, SeedStrategy::Fresh, now()).unwrap();
        custom.models.truncate(3);
        files::write_snapshot(&dir, &custom).await.unwrap();

        let settings = Settings {
            seed_samples: true,
            snapshot_dir: Some(dir.clone()),
            ..Settings::default()
        };
        let store = init_memory_store(&settings, now()).await.unwrap();

        assert_eq!(store.len().await, 4);
        assert_eq!(store.get(&key).await.unwrap(), Some(custom));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    /// A non-memory backend that records every write it accepts.
    #[derive(Default)]
    struct RecordingStore {
        inner: MemRadarStore,
        puts: std::sync::Mutex<Vec<RadarKey>>,
    }

    impl RecordingStore {
        fn puts(&self) -> Vec<RadarKey> {
            self.puts.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl RadarStore for RecordingStore {
        fn backend_name(&self) -> &'static str {
            "recording"
        }

        async fn get(&self, key: &RadarKey) -> anyhow::Result<Option<RadarData>> {
            self.inner.get(key).await
        }

        async fn put(&self, data: RadarData) -> anyhow::Result<()> {
            let key = data.key();
            self.inner.put(data).await?;
            self.puts.lock().unwrap().push(key);
            Ok(())
        }

        async fn list_available_months(&self) -> anyhow::Result<Vec<Month>> {
            self.inner.list_available_months().await
        }
    }

    #[tokio::test]
    async fn populate_seeds_an_empty_external_backend() {
        let store = RecordingStore::default();
        populate_store(&store, &Settings::default(), now())
            .await
            .unwrap();

        assert_eq!(store.puts().len(), 4);
        let key = RadarKey::new(Month::parse("2026-09").unwrap(), Nation::Domestic);
        assert!(store.get(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn populate_leaves_existing_data_alone() {
        let store = RecordingStore::default();
        let key = RadarKey::new(Month::parse("2025-03").unwrap(), Nation::Export);
        let existing = sample_snapshot(key, SeedStrategy::Seeded, now()).unwrap();
        store.put(existing.clone()).await.unwrap();

        populate_store(&store, &Settings::default(), now())
            .await
            .unwrap();

        assert_eq!(store.puts(), vec![key]);
        assert_eq!(store.get(&key).await.unwrap(), Some(existing));
    }

    #[tokio::test]
    async fn populate_loads_files_into_populated_backend() {
        let dir = std::env::temp_dir().join(format!("radar-populate-{}", uuid::Uuid::new_v4()));
        let key = RadarKey::new(Month::parse("2026-09").unwrap(), Nation::Export);
        let file_data = sample_snapshot(key, SeedStrategy::Seeded, now()).unwrap();
        files::write_snapshot(&dir, &file_data).await.unwrap();

        let store = RecordingStore::default();
        let other = RadarKey::new(Month::parse("2025-03").unwrap(), Nation::Export);
        store
            .put(sample_snapshot(other, SeedStrategy::Seeded, now()).unwrap())
            .await
            .unwrap();

        let settings = Settings {
            snapshot_dir: Some(dir.clone()),
            ..Settings::default()
        };
        populate_store(&store, &settings, now()).await.unwrap();

        assert_eq!(store.puts(), vec![other, key]);
        assert_eq!(store.get(&key).await.unwrap(), Some(file_data));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
