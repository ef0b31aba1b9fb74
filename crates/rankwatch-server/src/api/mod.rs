mod cron;
mod keywords;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use rankwatch_core::{KeywordStore, StoreError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::jobs::{JobContext, JobError};
use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobContext>,
}

impl AppState {
    pub(super) fn store(&self) -> &dyn KeywordStore {
        self.jobs.store.as_ref()
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "store_unavailable" | "not_configured" => StatusCode::SERVICE_UNAVAILABLE,
            "dispatch_failed" | "rank_source_failed" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn ok<T: Serialize>(request_id: String, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(request_id),
    })
}

/// Validation failures go back to the caller verbatim; backend failures are
/// logged and reported as the store being unavailable.
pub(super) fn map_store_error(request_id: String, error: &StoreError) -> ApiError {
    match error {
        StoreError::Validation(e) => ApiError::new(request_id, "validation_error", e.to_string()),
        StoreError::Backend(_) => {
            tracing::error!(error = %error, "keyword store operation failed");
            ApiError::new(request_id, "store_unavailable", "keyword store is unavailable")
        }
    }
}

pub(super) fn map_job_error(request_id: String, error: &JobError) -> ApiError {
    match error {
        JobError::Store(e) => map_store_error(request_id, e),
        JobError::NotConfigured(_) => {
            tracing::warn!(error = %error, "job trigger rejected");
            ApiError::new(request_id, "not_configured", error.to_string())
        }
        JobError::RankSource(_) => {
            tracing::error!(error = %error, "rank provider fetch failed");
            ApiError::new(request_id, "rank_source_failed", error.to_string())
        }
        JobError::Dispatch(_) => {
            tracing::error!(error = %error, "alert dispatch failed");
            ApiError::new(request_id, "dispatch_failed", error.to_string())
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn admin_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/keywords", get(keywords::list_keywords))
        .route("/api/v1/keywords/history", get(keywords::keyword_history))
        .route("/api/v1/keywords/report", get(keywords::keyword_report))
        .route("/api/v1/keywords/reports", get(keywords::keyword_reports))
        .route("/api/v1/keywords/alerts", get(keywords::alert_preview))
        .route("/api/v1/keywords/import", post(keywords::import_keywords))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

fn cron_router(cron_auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/cron/update-rankings", post(cron::update_rankings))
        .route("/api/v1/cron/keyword-alerts", post(cron::keyword_alerts))
        .layer(axum::middleware::from_fn_with_state(
            cron_auth,
            require_bearer_auth,
        ))
}

pub fn build_app(
    state: AppState,
    admin_auth: AuthState,
    cron_auth: AuthState,
    rate_limit: RateLimitState,
) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(admin_router(admin_auth, rate_limit))
        .merge(cron_router(cron_auth))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match state.store().health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: keyword store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
