//! Handler for link shortening endpoint.

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::api::dto::shorten::ShortenRequest;
use crate::api::dto::url_record::UrlRecordResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "long_url": "https://example.com/some/long/path",
///   "expires_at": "2030-01-01T00:00:00Z"
/// }
/// ```
///
/// # Response
///
/// **201 Created** with the stored record:
///
/// ```json
/// {
///   "id": 1,
///   "long_url": "https://example.com/some/long/path",
///   "short_code": "aB3_x9",
///   "visits": 0,
///   "created_at": "2025-01-01T00:00:00Z",
///   "expires_at": "2030-01-01T00:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request for malformed JSON or an invalid URL.
/// Returns 500 Internal Server Error if no unique code could be stored.
pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UrlRecordResponse>), AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        AppError::bad_request(
            "Malformed request body",
            json!({ "reason": rejection.body_text() }),
        )
    })?;
    payload.validate()?;

    let record = state
        .link_service
        .create_short_url(payload.long_url, payload.expires_at)
        .await?;

    info!(code = %record.short_code, "Short URL created");

    Ok((StatusCode::CREATED, Json(record.into())))
}
