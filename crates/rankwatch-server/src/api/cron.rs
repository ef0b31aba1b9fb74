use axum::{extract::State, Extension, Json};
use rankwatch_core::DispatchOutcome;
use serde::Serialize;

use crate::jobs::{run_keyword_alerts, run_rank_update};
use crate::middleware::RequestId;

use super::{map_job_error, ok, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct UpdateResult {
    updated: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct AlertsResult {
    alerts_sent: usize,
    outcome: DispatchOutcome,
}

pub(super) async fn update_rankings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<UpdateResult>>, ApiError> {
    tracing::info!(request_id = %req_id.0, "cron: rank update triggered");
    let updated = run_rank_update(&state.jobs)
        .await
        .map_err(|e| map_job_error(req_id.0.clone(), &e))?;

    Ok(ok(req_id.0, UpdateResult { updated }))
}

pub(super) async fn keyword_alerts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<AlertsResult>>, ApiError> {
    tracing::info!(request_id = %req_id.0, "cron: keyword alerts triggered");
    let outcome = run_keyword_alerts(&state.jobs)
        .await
        .map_err(|e| map_job_error(req_id.0.clone(), &e))?;

    Ok(ok(
        req_id.0,
        AlertsResult {
            alerts_sent: outcome.alerts_sent(),
            outcome,
        },
    ))
}
