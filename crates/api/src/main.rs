use std::sync::Arc;

use anyhow::Context;
use radar_core::config::Settings;
use radar_core::storage::{seed, PgRadarStore, RadarStore};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let store = init_store(&settings).await?;
    let months = store.list_available_months().await?;
    tracing::info!(
        backend = store.backend_name(),
        months = months.len(),
        "radar store ready"
    );

    let app = routes::router(routes::AppState::new(store));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Postgres when configured and reachable; otherwise the in-memory store
/// (degraded mode when the database was configured but failed). Either backend
/// is populated from sample data and snapshot files per `settings`.
async fn init_store(settings: &Settings) -> anyhow::Result<Arc<dyn RadarStore>> {
    let now = chrono::Utc::now();

    let Ok(db_url) = settings.require_database_url() else {
        let store = seed::init_memory_store(settings, now).await?;
        return Ok(Arc::new(store));
    };

    match connect_pg(db_url).await {
        Ok(store) => {
            seed::populate_store(&store, settings, now).await?;
            Ok(Arc::new(store))
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(
                error = %format!("{e:#}"),
                "db unavailable; starting API with in-memory store"
            );
            let store = seed::init_memory_store(settings, now).await?;
            Ok(Arc::new(store))
        }
    }
}

async fn connect_pg(db_url: &str) -> anyhow::Result<PgRadarStore> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;
    radar_core::storage::migrate(&pool).await?;
    Ok(PgRadarStore::new(pool))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
