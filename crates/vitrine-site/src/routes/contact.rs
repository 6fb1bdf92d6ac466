//! Contact form submission endpoint.

use std::net::SocketAddr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{Extensions, HeaderMap};
use serde::Serialize;

use crate::contact::{ContactForm, SubmitOutcome};
use crate::error::SiteError;
use crate::state::AppState;

/// Client key used when no address can be determined.
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Serialize)]
pub struct ContactResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<u32>,
}

/// Identify the submitting client for rate limiting.
///
/// With `trust_proxy`, proxy headers win over the socket address: first
/// `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address.
/// Otherwise only the peer address is used.
pub fn client_key(headers: &HeaderMap, extensions: &Extensions, trust_proxy: bool) -> String {
    let from_header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let forwarded = if trust_proxy {
        from_header("x-forwarded-for").or_else(|| from_header("x-real-ip"))
    } else {
        None
    };

    forwarded
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// `POST /api/contact`
pub async fn submit_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> Result<Json<ContactResponse>, SiteError> {
    let form: ContactForm = serde_json::from_slice(&body)
        .map_err(|e| SiteError::BadRequest(format!("invalid contact form: {e}")))?;

    let client = client_key(&headers, &extensions, state.config.trust_proxy);
    let today = chrono::Utc::now().date_naive();

    let remaining = match state.contact.submit(&form, &client, today).await? {
        SubmitOutcome::Sent { remaining } => Some(remaining),
        SubmitOutcome::Dropped => None,
    };

    Ok(Json(ContactResponse {
        status: "sent",
        remaining,
    }))
}
