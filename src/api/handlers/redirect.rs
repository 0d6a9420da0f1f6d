//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::application::services::Resolution;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Responses
///
/// - **301 Moved Permanently** with `Location` set to the long URL
/// - **404 Not Found** for unknown or malformed codes
/// - **410 Gone** when the record has expired
/// - **500 Internal Server Error** when the cache missed and the store failed
///
/// The visit is queued for the background worker; a full queue drops it
/// without affecting the response.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    match state.redirect_service.resolve(&code).await? {
        Resolution::Found { long_url, .. } => {
            let location = HeaderValue::from_str(&long_url).map_err(|e| {
                AppError::internal(
                    "Stored URL is not a valid Location header",
                    json!({ "code": code, "reason": e.to_string() }),
                )
            })?;
            Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response())
        }
        Resolution::NotFound => Err(AppError::not_found(
            "Short URL not found",
            json!({ "code": code }),
        )),
        Resolution::Expired => Err(AppError::gone(
            "Short URL has expired",
            json!({ "code": code }),
        )),
    }
}
