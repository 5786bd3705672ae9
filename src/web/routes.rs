//! Request handlers for the console API.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde::Deserialize;

use crate::core::{ExecError, RequestContext};
use crate::domain::{AuditView, JobView};

use super::AppState;

/// History is capped at the last 50 jobs
pub const JOB_HISTORY_LIMIT: usize = 50;

/// The activity view is capped at the last 100 events
pub const ACTIVITY_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteCommandRequest {
    // Defaults keep missing fields on the validation path (400, not a
    // deserialization rejection)
    #[serde(default)]
    pub host_id: String,
    #[serde(default)]
    pub command: String,
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn request_context(state: &AppState, headers: &HeaderMap) -> RequestContext {
    RequestContext {
        operator: state.operator.clone(),
        source_address: header_str(headers, "x-forwarded-for"),
        agent_string: header_str(headers, header::USER_AGENT.as_str()),
    }
}

/// `POST /api/commands/execute`
pub async fn execute_command(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ExecuteCommandRequest>,
) -> Result<Json<JobView>, ExecError> {
    let ctx = request_context(&state, &headers);
    let job = state
        .service
        .submit(&payload.host_id, &payload.command, &ctx)
        .await?;
    Ok(Json(job))
}

/// `GET /api/commands/history`
pub async fn command_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<JobView>>, ExecError> {
    let jobs = state.service.recent_jobs(JOB_HISTORY_LIMIT)?;
    Ok(Json(jobs))
}

/// `GET /api/logs/activity`
pub async fn activity_log(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AuditView>>, ExecError> {
    let events = state.service.recent_audit(ACTIVITY_LIMIT)?;
    Ok(Json(events))
}
