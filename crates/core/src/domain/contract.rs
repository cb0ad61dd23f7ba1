use crate::domain::radar::RadarData;
use anyhow::{ensure, Context};
use chrono::SubsecRound;
use std::collections::{BTreeSet, HashSet};

/// Parse a snapshot produced outside this process (file, database row) and check it
/// before it can be served.
pub fn parse_snapshot_json(text: &str) -> anyhow::Result<RadarData> {
    let data = serde_json::from_str::<RadarData>(text)
        .context("snapshot is not valid JSON for the RadarData schema")?;
    validate_snapshot(&data)?;
    Ok(data)
}

pub fn validate_snapshot(data: &RadarData) -> anyhow::Result<()> {
    let total = data.models.len();
    let mut seen_ranks = BTreeSet::<u32>::new();
    let mut seen_ids = HashSet::with_capacity(total);

    // Postgres keeps microseconds; anything finer would not read back equal.
    ensure!(
        data.fetched_at == data.fetched_at.trunc_subsecs(6),
        "fetchedAt has sub-microsecond precision: {}",
        data.fetched_at
    );

    for (idx, model) in data.models.iter().enumerate() {
        ensure!(
            !model.name.trim().is_empty(),
            "model at position {} has an empty name",
            idx + 1
        );
        ensure!(
            model.month == data.month,
            "model {} month mismatch: expected {}, got {}",
            model.name,
            data.month,
            model.month
        );
        ensure!(
            model.nation == data.nation,
            "model {} nation mismatch: expected {}, got {}",
            model.name,
            data.nation,
            model.nation
        );
        ensure!(
            seen_ids.insert(model.id),
            "duplicate model id: {}",
            model.id
        );

        ensure!(
            (1..=total).contains(&(model.rank as usize)),
            "rank out of range for model {}: {}",
            model.name,
            model.rank
        );
        ensure!(
            seen_ranks.insert(model.rank),
            "duplicate rank: {}",
            model.rank
        );
        ensure!(
            model.rank as usize == idx + 1,
            "model {} is out of rank order (position {}, rank {})",
            model.name,
            idx + 1,
            model.rank
        );

        ensure!(
            model.score.is_finite() && model.mom_pct.is_finite(),
            "model {} has a non-finite score or momPct",
            model.name
        );
        if let Some(prev) = idx.checked_sub(1).map(|i| &data.models[i]) {
            ensure!(
                prev.score >= model.score,
                "scores must be non-increasing: rank {} ({}) < rank {} ({})",
                prev.rank,
                prev.score,
                model.rank,
                model.score
            );
        }

        if model.is_new_entry {
            ensure!(
                model.prev_sales == 0
                    && model.mom_abs == i64::from(model.sales)
                    && model.mom_pct == 0.0
                    && model.rank_change == 0,
                "new entry {} carries prior-period metrics",
                model.name
            );
        }
    }

    Ok(())
}
