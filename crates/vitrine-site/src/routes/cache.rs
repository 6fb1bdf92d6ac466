//! Cache administration.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::SiteError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct InvalidateRequest {
    /// Key to drop. Absent clears everything.
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
}

/// `POST /api/cache/invalidate`, behind [`require_admin`](crate::auth::require_admin).
pub async fn invalidate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<InvalidateResponse>, SiteError> {
    let request: InvalidateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        InvalidateRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| SiteError::BadRequest(format!("invalid invalidate request: {e}")))?
    };

    match request.key.filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            state.cache.invalidate(&key).await;
            tracing::info!(key = %key, "cache key invalidated");
            Ok(Json(InvalidateResponse {
                status: "invalidated",
                key: Some(key),
            }))
        }
        None => {
            state.cache.clear();
            tracing::info!("cache cleared");
            Ok(Json(InvalidateResponse {
                status: "cleared",
                key: None,
            }))
        }
    }
}
