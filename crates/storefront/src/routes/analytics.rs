//! First-party analytics endpoints.
//!
//! ```text
//! POST /api/analytics/clicks      - Queue a click event
//! GET  /api/analytics/clicks      - Summary of stored clicks
//! POST /api/analytics/web-vitals  - Log a Core Web Vitals beacon
//! POST /api/errors                - Client error report (rate limited)
//! ```

use axum::{Json, body::Bytes, extract::State};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::instrument;

use super::extract::JsonBody;
use crate::analytics::{ClickEvent, ClickSummary, ErrorReport, WebVital};
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    pub data: ClickSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReportResponse {
    pub success: bool,
    pub error_id: String,
    pub message: &'static str,
}

/// Queue a click for the next batch.
#[instrument(skip_all)]
pub async fn track_click(
    State(state): State<AppState>,
    JsonBody(event): JsonBody<ClickEvent>,
) -> Result<Json<Value>> {
    let event = event
        .validated()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .clicks()
        .track(event)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store click data: {e}")))?;

    Ok(Json(json!({ "success": true })))
}

/// Summary over the clicks flushed so far.
pub async fn click_summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    Json(SummaryResponse {
        success: true,
        data: state.clicks().summary(),
    })
}

pub async fn web_vitals(JsonBody(vital): JsonBody<WebVital>) -> Json<Value> {
    vital.record();
    Json(json!({ "success": true }))
}

/// Accept a browser error report.
///
/// The body is parsed by hand so that malformed JSON gets the same answer
/// as a well-formed body that isn't a report.
#[instrument(skip_all)]
pub async fn report_error(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ErrorReportResponse>> {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let report = ErrorReport::sanitize(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let error_id = state.reporter().submit(&report).await;

    Ok(Json(ErrorReportResponse {
        success: true,
        error_id,
        message: "Error reported successfully",
    }))
}
