use crate::domain::contract::validate_snapshot;
use crate::domain::radar::{Month, RadarData, RadarKey};
use crate::storage::RadarStore;
use anyhow::Context;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

/// Process-local snapshot map. Populated at startup, then read-mostly.
#[derive(Debug, Default)]
pub struct MemRadarStore {
    snapshots: RwLock<HashMap<RadarKey, RadarData>>,
}

impl MemRadarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl RadarStore for MemRadarStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &RadarKey) -> anyhow::Result<Option<RadarData>> {
        Ok(self.snapshots.read().await.get(key).cloned())
    }

    async fn put(&self, data: RadarData) -> anyhow::Result<()> {
        let key = data.key();
        validate_snapshot(&data).with_context(|| format!("refusing to store snapshot {key}"))?;

        let replaced = self.snapshots.write().await.insert(key, data).is_some();
        tracing::debug!(%key, replaced, "stored radar snapshot");
        Ok(())
    }

    async fn list_available_months(&self) -> anyhow::Result<Vec<Month>> {
        let months: BTreeSet<Month> = self
            .snapshots
            .read()
            .await
            .keys()
            .map(|k| k.month)
            .collect();
        Ok(months.into_iter().rev().collect())
    }
}
