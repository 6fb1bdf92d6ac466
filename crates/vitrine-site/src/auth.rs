//! Bearer token check for administrative routes.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::SiteError;
use crate::state::AppState;

/// Middleware that requires the configured admin token.
///
/// The token must be provided in the `Authorization` header as:
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// With no `SITE_ADMIN_TOKEN` configured every request is rejected.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, SiteError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        tracing::debug!("admin route called with no admin token configured");
        return Err(SiteError::Unauthorized);
    };

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    match token {
        Some(token) if token == expected => Ok(next.run(request).await),
        Some(_) => {
            tracing::debug!("invalid admin token");
            Err(SiteError::Unauthorized)
        }
        None => {
            tracing::debug!("missing or malformed authorization header");
            Err(SiteError::Unauthorized)
        }
    }
}
