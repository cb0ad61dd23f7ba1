use crate::error::ApiError;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use radar_core::domain::radar::{CarModel, Month, Nation, RadarData, RadarKey};
use radar_core::filter::{ModelFilter, RadarStats};
use radar_core::storage::RadarStore;
use radar_core::time::kst::default_month;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RadarStore>,
    clock: fn() -> DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<dyn RadarStore>) -> Self {
        Self {
            store,
            clock: Utc::now,
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/radar", get(get_radar))
        .route("/api/radar/months", get(get_months))
        .route("/api/radar/top", get(get_top))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct RadarQuery {
    month: Option<String>,
    nation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopQuery {
    month: Option<String>,
    nation: Option<String>,
    min_sales: Option<u32>,
    exclude_new_entries: Option<bool>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct MonthsResponse {
    months: Vec<Month>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TopResponse {
    month: Month,
    nation: Nation,
    fetched_at: DateTime<Utc>,
    filter: ModelFilter,
    models: Vec<CarModel>,
    stats: RadarStats,
}

async fn get_radar(
    State(state): State<AppState>,
    Query(query): Query<RadarQuery>,
) -> Result<Json<RadarData>, ApiError> {
    let data = fetch_snapshot(&state, query.month.as_deref(), query.nation.as_deref()).await?;
    Ok(Json(data))
}

async fn get_months(State(state): State<AppState>) -> Result<Json<MonthsResponse>, ApiError> {
    let months = state.store.list_available_months().await?;
    Ok(Json(MonthsResponse { months }))
}

async fn get_top(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<TopResponse>, ApiError> {
    let data = fetch_snapshot(&state, query.month.as_deref(), query.nation.as_deref()).await?;

    let defaults = ModelFilter::default();
    let filter = ModelFilter {
        min_sales: query.min_sales.unwrap_or(defaults.min_sales),
        exclude_new_entries: query
            .exclude_new_entries
            .unwrap_or(defaults.exclude_new_entries),
        limit: query.limit.unwrap_or(defaults.limit),
    };

    Ok(Json(TopResponse {
        month: data.month,
        nation: data.nation,
        fetched_at: data.fetched_at,
        filter,
        stats: RadarStats::from_models(&data.models),
        models: filter.apply(&data.models),
    }))
}

/// Resolve query defaults, then look the snapshot up. No fallback to other keys.
async fn fetch_snapshot(
    state: &AppState,
    month: Option<&str>,
    nation: Option<&str>,
) -> Result<RadarData, ApiError> {
    let nation = match nation.filter(|s| !s.is_empty()) {
        Some(s) => s
            .parse::<Nation>()
            .map_err(|_| ApiError::InvalidNation(s.to_string()))?,
        None => Nation::Domestic,
    };

    let month = match month.filter(|s| !s.is_empty()) {
        Some(s) => s.to_string(),
        None => default_month((state.clock)())?.to_string(),
    };

    // A malformed month cannot address any snapshot.
    let Ok(parsed) = Month::parse(&month) else {
        return Err(ApiError::NotFound { month, nation });
    };

    let key = RadarKey::new(parsed, nation);
    match state.store.get(&key).await? {
        Some(data) => Ok(data),
        None => {
            tracing::debug!(%key, "radar snapshot not found");
            Err(ApiError::NotFound { month, nation })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::TimeZone;
    use radar_core::storage::seed::{seed_sample_snapshots, SeedStrategy};
    use radar_core::storage::MemRadarStore;
    use serde_json::Value;
    use tower::ServiceExt; // for oneshot

    // 2026-10-18 KST: default month is 2026-09, seeded months are 2026-09 and 2026-08.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 3, 0, 0).unwrap()
    }

    async fn seeded_store() -> Arc<MemRadarStore> {
        let store = Arc::new(MemRadarStore::new());
        seed_sample_snapshots(store.as_ref(), fixed_now(), SeedStrategy::Seeded)
            .await
            .unwrap();
        store
    }

    async fn app_with(store: Arc<dyn RadarStore>) -> Router {
        router(AppState::new(store).with_clock(fixed_now))
    }

    async fn send(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let app = app_with(seeded_store().await).await;
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn radar_defaults_to_prior_month_domestic() {
        let store = seeded_store().await;
        let (status, body) = send(app_with(store.clone()).await, "/api/radar").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["month"], "2026-09");
        assert_eq!(body["nation"], "domestic");
        assert!(body["fetchedAt"].is_string());

        let key = RadarKey::new(Month::parse("2026-09").unwrap(), Nation::Domestic);
        let stored = store.get(&key).await.unwrap().unwrap();
        assert_eq!(body, serde_json::to_value(&stored).unwrap());
    }

    #[tokio::test]
    async fn radar_serves_requested_key_verbatim() {
        let store = seeded_store().await;
        let (status, body) = send(
            app_with(store.clone()).await,
            "/api/radar?month=2026-08&nation=export",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let key = RadarKey::new(Month::parse("2026-08").unwrap(), Nation::Export);
        let stored = store.get(&key).await.unwrap().unwrap();
        assert_eq!(body, serde_json::to_value(&stored).unwrap());

        let first = &body["models"][0];
        for field in [
            "id", "rank", "name", "brand", "sales", "prevSales", "momAbs", "momPct",
            "rankChange", "score", "isNewEntry", "nation", "month", "danawaUrl",
        ] {
            assert!(!first[field].is_null(), "missing {field}");
        }
    }

    #[tokio::test]
    async fn invalid_nation_is_bad_request() {
        let app = app_with(seeded_store().await).await;
        let (status, body) = send(app, "/api/radar?nation=foo").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert_eq!(body["nation"], "foo");
    }

    #[tokio::test]
    async fn unknown_month_is_not_found_with_key_echoed() {
        let (status, body) = send(
            app_with(seeded_store().await).await,
            "/api/radar?month=2020-01&nation=export",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
        assert_eq!(body["month"], "2020-01");
        assert_eq!(body["nation"], "export");
    }

    #[tokio::test]
    async fn malformed_month_is_not_found() {
        let app = app_with(seeded_store().await).await;
        let (status, body) = send(app, "/api/radar?month=latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["month"], "latest");
        assert_eq!(body["nation"], "domestic");
    }

    #[tokio::test]
    async fn months_are_listed_newest_first() {
        let (status, body) = send(app_with(seeded_store().await).await, "/api/radar/months").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "months": ["2026-09", "2026-08"] }));
    }

    #[tokio::test]
    async fn months_of_empty_store() {
        let app = app_with(Arc::new(MemRadarStore::new())).await;
        let (status, body) = send(app, "/api/radar/months").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "months": [] }));
    }

    #[tokio::test]
    async fn top_applies_filter_and_reports_stats() {
        let store = seeded_store().await;
        let (status, body) = send(
            app_with(store.clone()).await,
            "/api/radar/top?month=2026-09&nation=export&minSales=1000&excludeNewEntries=true&limit=5",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let models = body["models"].as_array().unwrap();
        assert!(models.len() <= 5);
        for m in models {
            assert!(m["sales"].as_u64().unwrap() >= 1000);
            assert_eq!(m["isNewEntry"], false);
        }

        let key = RadarKey::new(Month::parse("2026-09").unwrap(), Nation::Export);
        let stored = store.get(&key).await.unwrap().unwrap();
        assert_eq!(
            body["stats"]["count"].as_u64().unwrap() as usize,
            stored.models.len()
        );
        assert_eq!(body["filter"]["limit"], 5);
    }

    #[tokio::test]
    async fn top_shares_not_found_semantics() {
        let app = app_with(seeded_store().await).await;
        let (status, _) = send(app, "/api/radar/top?month=2019-01").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[derive(Debug)]
    struct FailingStore;

    #[async_trait::async_trait]
    impl RadarStore for FailingStore {
        fn backend_name(&self) -> &'static str {
            "failing"
        }

        async fn get(&self, _key: &RadarKey) -> anyhow::Result<Option<RadarData>> {
            anyhow::bail!("connection reset: secret-host:5432")
        }

        async fn put(&self, _data: RadarData) -> anyhow::Result<()> {
            anyhow::bail!("read-only")
        }

        async fn list_available_months(&self) -> anyhow::Result<Vec<Month>> {
            anyhow::bail!("connection reset: secret-host:5432")
        }
    }

    #[tokio::test]
    async fn store_failures_are_generic_500s() {
        for uri in ["/api/radar?month=2026-09", "/api/radar/months"] {
            let (status, body) = send(app_with(Arc::new(FailingStore)).await, uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, serde_json::json!({ "error": "Internal server error" }));
        }
    }
}
