use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use radar_core::domain::radar::Nation;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    InvalidNation(String),
    NotFound { month: String, nation: Nation },
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidNation(nation) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Invalid nation parameter",
                    "nation": nation,
                    "expected": Nation::ALL,
                })),
            )
                .into_response(),
            ApiError::NotFound { month, nation } => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Data not found",
                    "month": month,
                    "nation": nation,
                })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %format!("{err:#}"), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
