use anyhow::Context;
use clap::{Parser, ValueEnum};
use radar_core::domain::radar::{Month, Nation, RadarData};
use radar_core::storage::seed::SeedStrategy;
use radar_core::storage::{files, lock, PgRadarStore, RadarStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod generate;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NationArg {
    Domestic,
    Export,
    All,
}

impl NationArg {
    fn nations(self) -> Vec<Nation> {
        match self {
            NationArg::Domestic => vec![Nation::Domestic],
            NationArg::Export => vec![Nation::Export],
            NationArg::All => Nation::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "radar_worker")]
struct Args {
    /// Most recent month to generate (YYYY-MM). Defaults to the prior KST month.
    #[arg(long)]
    month: Option<String>,

    /// Number of consecutive months ending at --month.
    #[arg(long, default_value_t = 1)]
    months: usize,

    #[arg(long, value_enum, default_value_t = NationArg::All)]
    nation: NationArg,

    /// Use entropy-seeded variance instead of the per-(month, nation) seed.
    #[arg(long)]
    fresh: bool,

    /// Write JSON snapshot files here instead of upserting into Postgres.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Do everything except writing.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = radar_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(&settings, args).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "radar refresh failed");
    }
    result
}

async fn run(settings: &radar_core::config::Settings, args: Args) -> anyhow::Result<()> {
    let now = chrono::Utc::now();
    let last_month = match args.month.as_deref() {
        Some(s) => Month::parse(s)?,
        None => radar_core::time::kst::default_month(now)?,
    };

    let opts = generate::GenerateOptions {
        last_month,
        months: args.months,
        nations: args.nation.nations(),
        strategy: if args.fresh {
            SeedStrategy::Fresh
        } else {
            SeedStrategy::Seeded
        },
    };

    let snapshots = generate::generate_snapshots(&opts, now)?;
    for data in &snapshots {
        tracing::info!(key = %data.key(), "{}", generate::describe(data));
    }

    if args.dry_run {
        tracing::info!(
            %last_month,
            dry_run = true,
            snapshots = snapshots.len(),
            "radar refresh (dry-run)"
        );
        return Ok(());
    }

    if let Some(dir) = args.out_dir.as_deref() {
        for data in &snapshots {
            let path = files::write_snapshot(dir, data).await?;
            tracing::info!(key = %data.key(), path = %path.display(), "wrote radar snapshot");
        }
        return Ok(());
    }

    let db_url = settings.require_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    radar_core::storage::migrate(&pool).await?;
    let store = PgRadarStore::new(pool.clone());

    for (month, batch) in group_by_month(snapshots) {
        let mut conn = pool
            .acquire()
            .await
            .context("acquire connection for month lock failed")?;

        let acquired = lock::try_acquire_month_lock(&mut conn, month).await?;
        if !acquired {
            tracing::warn!(%month, "month lock not acquired; another refresh in progress");
            continue;
        }

        let res = persist_batch(&store, batch).await;
        let released = lock::release_month_lock(&mut conn, month).await;
        if let Some(problem) = release_problem(&released) {
            tracing::warn!(%month, %problem, "month lock release failed");
        }
        res?;

        tracing::info!(%month, "persisted radar snapshots");
    }

    Ok(())
}

fn release_problem(result: &anyhow::Result<bool>) -> Option<String> {
    match result {
        Ok(true) => None,
        Ok(false) => Some("lock was not held by this session".to_string()),
        Err(e) => Some(format!("{e:#}")),
    }
}

async fn persist_batch(store: &dyn RadarStore, batch: Vec<RadarData>) -> anyhow::Result<()> {
    for data in batch {
        store.put(data).await?;
    }
    Ok(())
}

fn group_by_month(snapshots: Vec<RadarData>) -> Vec<(Month, Vec<RadarData>)> {
    let mut out: Vec<(Month, Vec<RadarData>)> = Vec::new();
    for data in snapshots {
        match out.last_mut() {
            Some((month, batch)) if *month == data.month => batch.push(data),
            _ => out.push((data.month, vec![data])),
        }
    }
    out
}

fn init_sentry(settings: &radar_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use radar_core::domain::radar::RadarKey;
    use radar_core::storage::seed::sample_snapshot;

    #[test]
    fn release_problem_reports_unheld_and_failed_unlocks() {
        assert_eq!(release_problem(&Ok(true)), None);
        assert!(release_problem(&Ok(false)).unwrap().contains("not held"));

        let failed: anyhow::Result<bool> =
            Err(anyhow::anyhow!("connection reset").context("release failed"));
        let problem = release_problem(&failed).unwrap();
        assert!(problem.contains("release failed"));
        assert!(problem.contains("connection reset"));
    }

    #[test]
    fn groups_consecutive_snapshots_by_month() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 3, 0, 0).unwrap();
        let snap = |month: &str, nation: Nation| {
            let key = RadarKey::new(Month::parse(month).unwrap(), nation);
            sample_snapshot(key, SeedStrategy::Seeded, now).unwrap()
        };
        let grouped = group_by_month(vec![
            snap("2026-08", Nation::Domestic),
            snap("2026-08", Nation::Export),
            snap("2026-09", Nation::Domestic),
        ]);

        let shape: Vec<(String, usize)> = grouped
            .iter()
            .map(|(m, batch)| (m.to_string(), batch.len()))
            .collect();
        assert_eq!(shape, vec![("2026-08".to_string(), 2), ("2026-09".to_string(), 1)]);
    }
}
