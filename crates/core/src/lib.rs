pub mod catalog;
pub mod domain;
pub mod filter;
pub mod ranking;
pub mod storage;
pub mod time;

pub mod config {
    use crate::storage::seed::SeedStrategy;
    use anyhow::Context;
    use std::path::PathBuf;

    const DEFAULT_PORT: u16 = 3000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub snapshot_dir: Option<PathBuf>,
        pub seed_samples: bool,
        pub seed_strategy: SeedStrategy,
        pub port: u16,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                database_url: None,
                sentry_dsn: None,
                snapshot_dir: None,
                seed_samples: true,
                seed_strategy: SeedStrategy::default(),
                port: DEFAULT_PORT,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let seed_strategy = match non_empty_var("RADAR_SEED_STRATEGY") {
                Some(s) => s
                    .parse::<SeedStrategy>()
                    .context("invalid RADAR_SEED_STRATEGY")?,
                None => SeedStrategy::default(),
            };

            let seed_samples = match non_empty_var("RADAR_SEED_SAMPLES") {
                Some(s) => parse_flag(&s).context("invalid RADAR_SEED_SAMPLES")?,
                None => true,
            };

            Ok(Self {
                database_url: non_empty_var("DATABASE_URL"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                snapshot_dir: non_empty_var("RADAR_SNAPSHOT_DIR").map(PathBuf::from),
                seed_samples,
                seed_strategy,
                port: std::env::var("PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_PORT),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    fn parse_flag(s: &str) -> anyhow::Result<bool> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("expected a boolean flag, got {other:?}"),
        }
    }

}
