use chrono::{DateTime, Utc};
use radar_core::domain::radar::{Month, Nation, RadarData, RadarKey};
use radar_core::storage::seed::{sample_snapshot, SeedStrategy};
use radar_core::time::kst::trailing_months;

const MAX_MONTHS: usize = 36;

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Most recent month to generate.
    pub last_month: Month,
    /// Number of consecutive months ending at `last_month`.
    pub months: usize,
    pub nations: Vec<Nation>,
    pub strategy: SeedStrategy,
}

pub fn generate_snapshots(
    opts: &GenerateOptions,
    fetched_at: DateTime<Utc>,
) -> anyhow::Result<Vec<RadarData>> {
    anyhow::ensure!(
        (1..=MAX_MONTHS).contains(&opts.months),
        "months must be 1..={MAX_MONTHS} (got {})",
        opts.months
    );
    anyhow::ensure!(!opts.nations.is_empty(), "at least one nation is required");

    let mut out = Vec::with_capacity(opts.months * opts.nations.len());
    for month in trailing_months(opts.last_month, opts.months)? {
        for nation in &opts.nations {
            let key = RadarKey::new(month, *nation);
            out.push(sample_snapshot(key, opts.strategy, fetched_at)?);
        }
    }

    Ok(out)
}

/// One-line summary for logs: the top riser and how many models moved up.
pub fn describe(data: &RadarData) -> String {
    let rising = data.models.iter().filter(|m| m.mom_abs > 0).count();
    match data.models.first() {
        Some(top) => format!(
            "{} models, {} rising, top: {} {} (score {:.3})",
            data.models.len(),
            rising,
            top.brand,
            top.name,
            top.score
        ),
        None => "no models".to_string(),
    }
}
