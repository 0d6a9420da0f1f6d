//! Handler for per-code statistics.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::url_record::UrlRecordResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the stored record for a short code with its effective visit count.
///
/// # Endpoint
///
/// `GET /api/stats/{code}`
///
/// `visits` is the durable count plus visits still held in the live
/// counter, so it may briefly lag a redirect that was just served.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<UrlRecordResponse>, AppError> {
    let record = state.stats_service.stats(&code).await?;
    Ok(Json(record.into()))
}
